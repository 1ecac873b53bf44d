use annotation_core::{AnnotationError, AnnotationResult, Message};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

const REQUIRED_COLUMNS: [&str; 2] = ["ChannelID", "MessageID"];

/// Read the message batch. Header names are whitespace-trimmed; rows that
/// fail to deserialize are logged and skipped.
pub fn read_messages<R: Read>(reader: R) -> AnnotationResult<Vec<Message>> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(AnnotationError::MissingColumn(column.to_string()));
        }
    }

    let mut messages = Vec::new();
    for (row_no, row) in reader.deserialize::<Message>().enumerate() {
        match row {
            Ok(message) => messages.push(message),
            Err(e) => tracing::warn!("Skipping message row {}: {}", row_no + 1, e),
        }
    }
    Ok(messages)
}

pub fn load_messages(path: impl AsRef<Path>) -> AnnotationResult<Vec<Message>> {
    let file = std::fs::File::open(path)?;
    read_messages(file)
}

/// Drop repeated `(channel_id, message_id)` pairs, keeping the first.
pub fn dedup_messages(messages: Vec<Message>) -> Vec<Message> {
    let mut seen = HashSet::new();
    messages
        .into_iter()
        .filter(|m| seen.insert((m.channel_id, m.message_id)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_messages_trims_headers() {
        let data = " MessageID , ChannelID ,issuerid,MessageText\n1,10,,\"Сбер, отчёт\"\n2,10,55,text\n";
        let messages = read_messages(data.as_bytes()).unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].text, "Сбер, отчёт");
        assert_eq!(messages[1].issuer_id, Some(55));
    }

    #[test]
    fn test_missing_required_column() {
        let data = "MessageID,MessageText\n1,x\n";
        let err = read_messages(data.as_bytes()).unwrap_err();
        assert!(matches!(err, AnnotationError::MissingColumn(c) if c == "ChannelID"));
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let data = "MessageID,ChannelID,issuerid,MessageText\nabc,1,,x\n2,1,,y\n";
        let messages = read_messages(data.as_bytes()).unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].message_id, 2);
    }

    #[test]
    fn test_dedup_keeps_first() {
        let data = "MessageID,ChannelID,issuerid,MessageText\n1,10,3,first\n1,11,,other channel\n1,10,4,dup\n2,10,,x\n";
        let messages = dedup_messages(read_messages(data.as_bytes()).unwrap());
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].text, "first");
        assert_eq!(messages[1].channel_id, 11);
    }
}
