use dashmap::DashMap;
use reqwest::Url;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::error::{LlmError, LlmResult};

/// Caps simultaneous requests per destination `host:port`.
///
/// The permit is held for the whole request and released when dropped,
/// whether the call succeeded, failed or timed out.
pub struct HostLimiter {
    per_host: usize,
    slots: DashMap<String, Arc<Semaphore>>,
}

impl HostLimiter {
    pub fn new(per_host: usize) -> Self {
        Self {
            per_host: per_host.max(1),
            slots: DashMap::new(),
        }
    }

    pub fn per_host(&self) -> usize {
        self.per_host
    }

    fn host_key(url: &Url) -> String {
        format!(
            "{}:{}",
            url.host_str().unwrap_or_default(),
            url.port_or_known_default().unwrap_or_default()
        )
    }

    pub async fn acquire(&self, url: &Url) -> LlmResult<OwnedSemaphorePermit> {
        let key = Self::host_key(url);
        let semaphore = self
            .slots
            .entry(key)
            .or_insert_with(|| Arc::new(Semaphore::new(self.per_host)))
            .clone();
        semaphore
            .acquire_owned()
            .await
            .map_err(|_| LlmError::LimiterClosed)
    }
}
