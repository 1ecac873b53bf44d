use std::fmt;
use std::path::Path;

use crate::error::{LlmError, LlmResult};

/// Ordered API keys, assigned round-robin by task index.
#[derive(Clone)]
pub struct CredentialPool {
    keys: Vec<String>,
}

impl CredentialPool {
    pub fn new(keys: Vec<String>) -> LlmResult<Self> {
        if keys.is_empty() {
            return Err(LlmError::NoCredentials);
        }
        Ok(Self { keys })
    }

    /// One key per line; blank lines and surrounding whitespace are ignored.
    pub fn from_lines(text: &str) -> LlmResult<Self> {
        let keys = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(keys)
    }

    pub async fn load(path: impl AsRef<Path>) -> LlmResult<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        Self::from_lines(&text)
    }

    /// Key for the `task_index`-th dispatched task.
    pub fn key_for(&self, task_index: usize) -> &str {
        &self.keys[task_index % self.keys.len()]
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

impl fmt::Debug for CredentialPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialPool")
            .field("keys", &format_args!("[{} redacted]", self.keys.len()))
            .finish()
    }
}
