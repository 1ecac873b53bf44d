use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnnotationError {
    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Missing column: {0}")]
    MissingColumn(String),

    #[error("Sentiment score out of range: {0}")]
    ScoreOutOfRange(i64),

    #[error("Missing completion payload: {0}")]
    MissingPayload(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AnnotationResult<T> = Result<T, AnnotationError>;
