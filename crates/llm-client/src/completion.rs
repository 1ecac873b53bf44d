use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;

use crate::error::{LlmError, LlmResult};
use crate::host_limiter::HostLimiter;
use crate::prompt::CompletionRequest;
use crate::proxy::ProxySettings;
use crate::LlmConfig;

/// Shared HTTP session for chat-completion calls.
///
/// Every call holds a per-host permit for its full duration, so at most
/// `host_connection_limit` requests target one host at a time.
#[derive(Clone)]
pub struct HttpCompletionClient {
    client: reqwest::Client,
    endpoint: Url,
    host_limiter: Arc<HostLimiter>,
    proxy_label: Option<String>,
}

impl HttpCompletionClient {
    pub fn new(config: &LlmConfig, proxy: Option<&ProxySettings>) -> LlmResult<Self> {
        let endpoint = Url::parse(&config.endpoint)
            .map_err(|e| LlmError::InvalidEndpoint(format!("{}: {}", config.endpoint, e)))?;

        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(config.host_connection_limit);
        if let Some(proxy) = proxy {
            builder = builder.proxy(proxy.to_reqwest()?);
        }
        let client = builder.build()?;

        Ok(Self {
            client,
            endpoint,
            host_limiter: Arc::new(HostLimiter::new(config.host_connection_limit)),
            proxy_label: proxy.map(ProxySettings::redacted_url),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn route(&self) -> &str {
        self.proxy_label.as_deref().unwrap_or("direct")
    }

    /// POST one completion request and return the decoded JSON body.
    pub async fn complete(&self, api_key: &str, request: &CompletionRequest) -> LlmResult<Value> {
        let _permit = self.host_limiter.acquire(&self.endpoint).await?;

        tracing::debug!("POST {} via {}", self.endpoint, self.route());

        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.json::<Value>().await?;
        Ok(body)
    }
}
