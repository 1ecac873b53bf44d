use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::{AnnotationError, AnnotationResult};

pub type IssuerId = i64;
pub type ChannelId = i64;
pub type MessageId = i64;

/// Parse an identifier cell. Spreadsheet exports write integer columns that
/// contained blanks as floats (`"1234.0"`), so whole-valued floats are accepted.
pub fn parse_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(id) = raw.parse::<i64>() {
        return Some(id);
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 => Some(v as i64),
        _ => None,
    }
}

fn deserialize_id<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_id(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid identifier: {raw:?}")))
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_id))
}

/// One input row: a social/news excerpt to be annotated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    #[serde(rename = "MessageID", deserialize_with = "deserialize_id")]
    pub message_id: MessageId,
    #[serde(rename = "ChannelID", deserialize_with = "deserialize_id")]
    pub channel_id: ChannelId,
    /// Source issuer attached upstream; may be absent.
    #[serde(rename = "issuerid", default, deserialize_with = "deserialize_optional_id")]
    pub issuer_id: Option<IssuerId>,
    #[serde(rename = "MessageText", default)]
    pub text: String,
}

/// Discrete sentiment on the 0..=5 scale.
///
/// 0 means no information, 1 very negative, 3 neutral, 5 very positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct SentimentScore(u8);

impl SentimentScore {
    pub const MIN: i64 = 0;
    pub const MAX: i64 = 5;

    pub fn value(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for SentimentScore {
    type Error = AnnotationError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        if (Self::MIN..=Self::MAX).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(AnnotationError::ScoreOutOfRange(value))
        }
    }
}

impl From<SentimentScore> for i64 {
    fn from(score: SentimentScore) -> Self {
        score.0 as i64
    }
}

impl fmt::Display for SentimentScore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marker stored in place of a completion when the API call failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureMarker {
    pub error: String,
    pub status_code: Option<u16>,
}

impl FailureMarker {
    pub fn new(error: impl Into<String>, status_code: Option<u16>) -> Self {
        Self {
            error: error.into(),
            status_code,
        }
    }
}

impl fmt::Display for FailureMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {})", self.error, code),
            None => write!(f, "{} (API failure)", self.error),
        }
    }
}

/// Outcome of one completion call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ApiOutcome {
    Failure(FailureMarker),
    Completion(Value),
}

impl ApiOutcome {
    /// Extract `choices[0].message.content` from a completion payload.
    pub fn completion_text(&self) -> AnnotationResult<&str> {
        match self {
            ApiOutcome::Failure(marker) => Err(AnnotationError::MissingPayload(marker.to_string())),
            ApiOutcome::Completion(payload) => {
                let choices = payload
                    .get("choices")
                    .and_then(Value::as_array)
                    .filter(|choices| !choices.is_empty())
                    .ok_or_else(|| AnnotationError::MissingPayload("no choices in response".to_string()))?;

                choices[0]
                    .pointer("/message/content")
                    .and_then(Value::as_str)
                    .ok_or_else(|| {
                        AnnotationError::MissingPayload("choice has no message content".to_string())
                    })
            }
        }
    }
}

/// Unparsed outcome of one dispatched annotation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawResult {
    pub message_id: MessageId,
    pub channel_id: ChannelId,
    pub issuer_id: Option<IssuerId>,
    pub message_text: String,
    pub api_outcome: ApiOutcome,
}

impl RawResult {
    pub fn completed(message: Message, payload: Value) -> Self {
        Self::with_outcome(message, ApiOutcome::Completion(payload))
    }

    pub fn failed(message: Message, marker: FailureMarker) -> Self {
        Self::with_outcome(message, ApiOutcome::Failure(marker))
    }

    fn with_outcome(message: Message, api_outcome: ApiOutcome) -> Self {
        Self {
            message_id: message.message_id,
            channel_id: message.channel_id,
            issuer_id: message.issuer_id,
            message_text: message.text,
            api_outcome,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self.api_outcome, ApiOutcome::Failure(_))
    }

    pub fn completion_text(&self) -> AnnotationResult<&str> {
        self.api_outcome.completion_text()
    }
}

/// A validated sentiment observation, in sink column order.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParsedRecord {
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    pub issuer_id: IssuerId,
    pub sentiment_score: SentimentScore,
    pub processed_text: String,
}
