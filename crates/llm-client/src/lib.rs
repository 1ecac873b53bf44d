pub mod completion;
pub mod credentials;
pub mod error;
pub mod host_limiter;
pub mod prompt;
pub mod provider;
pub mod proxy;
pub mod retry;

pub use completion::HttpCompletionClient;
pub use credentials::CredentialPool;
pub use error::{LlmError, LlmResult};
pub use host_limiter::HostLimiter;
pub use prompt::{ChatMessage, CompletionRequest, ANNOTATION_INSTRUCTION};
pub use provider::CompletionProvider;
pub use proxy::ProxySettings;
pub use retry::RetryPolicy;

use std::time::Duration;

pub const DEFAULT_COMPLETION_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Configuration for the completion endpoint
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub endpoint: String,
    pub model: String,
    /// Total per-request timeout.
    pub timeout: Duration,
    /// Simultaneous requests allowed against one host.
    pub host_connection_limit: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            endpoint: std::env::var("LLM_COMPLETION_URL")
                .unwrap_or_else(|_| DEFAULT_COMPLETION_URL.to_string()),
            model: std::env::var("LLM_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(60),
            host_connection_limit: 10,
        }
    }
}
