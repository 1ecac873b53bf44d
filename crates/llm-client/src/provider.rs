use async_trait::async_trait;
use serde_json::Value;

use crate::completion::HttpCompletionClient;
use crate::error::LlmResult;
use crate::prompt::CompletionRequest;

/// Backend-agnostic interface for chat-completion calls.
///
/// Implemented by the HTTP client; the dispatcher only depends on this trait.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    async fn complete(&self, api_key: &str, request: &CompletionRequest) -> LlmResult<Value>;

    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl CompletionProvider for HttpCompletionClient {
    async fn complete(&self, api_key: &str, request: &CompletionRequest) -> LlmResult<Value> {
        HttpCompletionClient::complete(self, api_key, request).await
    }

    fn backend_name(&self) -> &'static str {
        "http"
    }
}
