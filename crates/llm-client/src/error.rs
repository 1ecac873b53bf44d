use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Service returned status {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Invalid proxy configuration: {0}")]
    InvalidProxy(String),

    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("No API keys configured")]
    NoCredentials,

    #[error("Connection limiter closed")]
    LimiterClosed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl LlmError {
    /// HTTP status of the failed call, when the server answered at all.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            LlmError::HttpStatus { status, .. } => Some(*status),
            LlmError::RequestFailed(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Timeouts, connection failures, 429 and 5xx.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RequestFailed(e) => e.is_timeout() || e.is_connect(),
            LlmError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

pub type LlmResult<T> = Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_and_transience() {
        let throttled = LlmError::HttpStatus { status: 429, body: String::new() };
        assert_eq!(throttled.status_code(), Some(429));
        assert!(throttled.is_transient());

        let unauthorized = LlmError::HttpStatus { status: 401, body: "bad key".into() };
        assert!(!unauthorized.is_transient());

        let bad = LlmError::InvalidProxy("no host".into());
        assert_eq!(bad.status_code(), None);
        assert!(!bad.is_transient());
    }
}
