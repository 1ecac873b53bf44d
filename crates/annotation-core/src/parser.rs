//! Lenient parser for the model's free-text annotation.
//!
//! Each answer line is expected to look like
//! `#TICKER (Company name): one-sentence message Оценка: N`.
//! Lines are handled independently; a bad line is dropped without affecting
//! its neighbours or other messages.

use thiserror::Error;

use crate::directory::DirectoryIndex;
use crate::types::{IssuerId, ParsedRecord, RawResult, SentimentScore};

/// Separator between a mention and its score ("score:" in Russian).
pub const SCORE_MARKER: &str = " Оценка: ";
const TICKER_SEPARATOR: &str = ": ";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LineError {
    #[error("score marker not found")]
    MissingScoreMarker,

    #[error("ticker separator not found")]
    MissingTickerSeparator,

    #[error("score is not an integer: {0:?}")]
    InvalidScore(String),

    #[error("score {0} is outside 0..=5")]
    ScoreOutOfRange(i64),
}

/// One company mention recovered from an answer line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mention {
    /// Ticker with `#` stripped, as written by the model.
    pub ticker: String,
    /// Upper-cased company name, empty when the model gave only a ticker.
    pub company: String,
    pub description: String,
    pub score: SentimentScore,
}

pub fn parse_line(line: &str) -> Result<Mention, LineError> {
    let (description_part, raw_score) = line
        .rsplit_once(SCORE_MARKER)
        .ok_or(LineError::MissingScoreMarker)?;
    let (ticker_info, description) = description_part
        .split_once(TICKER_SEPARATOR)
        .ok_or(LineError::MissingTickerSeparator)?;

    let raw_score = raw_score.trim();
    let score: i64 = raw_score
        .parse()
        .map_err(|_| LineError::InvalidScore(raw_score.to_string()))?;
    let score = SentimentScore::try_from(score).map_err(|_| LineError::ScoreOutOfRange(score))?;

    let ticker_info = ticker_info.split_whitespace().collect::<Vec<_>>().join(" ");
    let (ticker, company) = ticker_info
        .split_once(' ')
        .unwrap_or((ticker_info.as_str(), ""));

    Ok(Mention {
        ticker: ticker.trim_matches('#').to_string(),
        company: company.trim_matches(|c| c == '(' || c == ')').to_uppercase(),
        description: description.to_string(),
        score,
    })
}

pub struct ResponseParser<'a> {
    directory: &'a DirectoryIndex,
}

impl<'a> ResponseParser<'a> {
    pub fn new(directory: &'a DirectoryIndex) -> Self {
        Self { directory }
    }

    /// Ticker first; the company name only when the ticker is unknown.
    pub fn resolve(&self, mention: &Mention) -> Option<IssuerId> {
        self.directory.lookup(&mention.ticker).or_else(|| {
            if mention.company.is_empty() {
                None
            } else {
                self.directory.lookup(&mention.company)
            }
        })
    }

    /// Records for one raw result, in the answer's line order.
    pub fn parse_result(&self, raw: &RawResult) -> Vec<ParsedRecord> {
        let content = match raw.completion_text() {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!("Insufficient data to process message {}: {}", raw.message_id, e);
                return Vec::new();
            }
        };

        let mut records = Vec::new();
        for line in content.split('\n') {
            if line.trim().is_empty() {
                continue;
            }

            let mention = match parse_line(line) {
                Ok(mention) => mention,
                Err(e) => {
                    tracing::warn!(
                        message_id = raw.message_id,
                        "Skipping line {:?}: {}",
                        line,
                        e
                    );
                    continue;
                }
            };

            // Unknown tickers and names are noise, dropped without logging.
            if let Some(issuer_id) = self.resolve(&mention) {
                records.push(ParsedRecord {
                    channel_id: raw.channel_id,
                    message_id: raw.message_id,
                    issuer_id,
                    sentiment_score: mention.score,
                    processed_text: line.to_string(),
                });
            }
        }
        records
    }

    pub fn parse_batch(&self, results: &[RawResult]) -> Vec<ParsedRecord> {
        results.iter().flat_map(|raw| self.parse_result(raw)).collect()
    }
}
