use serde::{Deserialize, Serialize};

/// Instruction prepended to every message. The model is asked to answer one
/// `#TICKER (company): message Оценка: N` line per mentioned company.
pub const ANNOTATION_INSTRUCTION: &str = "Раздели этот текст на список тикеров и сообщений, относящимся к ним, строго в формате: \
#TICKER (название компании): сообщение (в одно предложение без переноса), с новой строки для каждого тикера, \
без дублирования и без генерации своего текста. Затем оцени сентимент каждой пары #TICKER (компания): сообщение, на шкале от 0 до 5, \
добавив после сообщения 'Оценка: число', где: 0 означает отсутствие информации, 1 - очень негативная информация, \
2 - скорее негативная информация, 3 - нейтральная информация, 4 - положительная информация, 5 - очень положительная информация.\
ВНИМАНИЕ: Оценку следует добавить строго в этой же строке, без переноса на другу строку, даже если строка длинная и в ней есть непонятные символы. Это очень строгое условие. ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Chat-completions request body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

impl CompletionRequest {
    pub fn annotation(model: &str, message_text: &str) -> Self {
        Self {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: format!("{}\n\n{}", ANNOTATION_INSTRUCTION, message_text),
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_annotation_request_shape() {
        let request = CompletionRequest::annotation("gpt-3.5-turbo", "Сбербанк отчитался о прибыли");
        let body = serde_json::to_value(&request).unwrap();

        assert_eq!(body["model"], "gpt-3.5-turbo");
        assert_eq!(body["messages"][0]["role"], "user");
        let content = body["messages"][0]["content"].as_str().unwrap();
        assert!(content.starts_with("Раздели этот текст"));
        assert!(content.ends_with("\n\nСбербанк отчитался о прибыли"));
        assert!(content.contains("Оценка: число"));
    }
}
