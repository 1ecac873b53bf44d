//! Bounded fan-out of one completion call per message.
//!
//! All tasks are multiplexed on the caller's task; each suspends only on the
//! in-flight semaphore, the client's host limiter and network I/O. Results
//! come back in completion order, one per message.

use annotation_core::{FailureMarker, Message, RawResult};
use futures_util::stream::{FuturesUnordered, StreamExt};
use llm_client::{CompletionProvider, CompletionRequest, CredentialPool, RetryPolicy};
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Max concurrent annotation tasks
pub const DEFAULT_MAX_IN_FLIGHT: usize = 20;

pub struct Dispatcher<P: ?Sized> {
    provider: Arc<P>,
    credentials: CredentialPool,
    model: String,
    max_in_flight: usize,
    retry: RetryPolicy,
}

impl<P> Dispatcher<P>
where
    P: CompletionProvider + ?Sized,
{
    pub fn new(provider: Arc<P>, credentials: CredentialPool, model: impl Into<String>) -> Self {
        Self {
            provider,
            credentials,
            model: model.into(),
            max_in_flight: DEFAULT_MAX_IN_FLIGHT,
            retry: RetryPolicy::none(),
        }
    }

    pub fn with_max_in_flight(mut self, max_in_flight: usize) -> Self {
        self.max_in_flight = max_in_flight.max(1);
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight
    }

    /// Annotate every message; the output holds exactly one result per input.
    ///
    /// The `k`-th message is sent with key `k mod pool size`.
    pub async fn dispatch(&self, messages: Vec<Message>) -> Vec<RawResult> {
        let total = messages.len();
        let semaphore = Semaphore::new(self.max_in_flight);

        tracing::info!(
            "Dispatching {} messages via {} backend (in-flight cap {}, {} keys)",
            total,
            self.provider.backend_name(),
            self.max_in_flight,
            self.credentials.len()
        );

        let mut pending: FuturesUnordered<_> = messages
            .into_iter()
            .enumerate()
            .map(|(index, message)| {
                let semaphore = &semaphore;
                let api_key = self.credentials.key_for(index);
                async move {
                    // Released on drop, on every exit path.
                    let _permit = match semaphore.acquire().await {
                        Ok(permit) => permit,
                        Err(_) => {
                            return RawResult::failed(
                                message,
                                FailureMarker::new("dispatcher shut down", None),
                            )
                        }
                    };
                    self.annotate(message, api_key).await
                }
            })
            .collect();

        let mut results = Vec::with_capacity(total);
        let mut failed = 0usize;

        while let Some(result) = pending.next().await {
            let status = if result.is_failure() {
                failed += 1;
                "failed"
            } else {
                "done"
            };
            tracing::info!("[{}/{}] message {} {}", results.len() + 1, total, result.message_id, status);
            results.push(result);
        }

        tracing::info!("Dispatch complete: {} results ({} failed)", results.len(), failed);
        results
    }

    async fn annotate(&self, message: Message, api_key: &str) -> RawResult {
        let request = CompletionRequest::annotation(&self.model, &message.text);
        let provider = &*self.provider;
        let request_ref = &request;

        match self
            .retry
            .run(move || provider.complete(api_key, request_ref))
            .await
        {
            Ok(payload) => RawResult::completed(message, payload),
            Err(e) => {
                tracing::warn!("Message {} failed: {}", message.message_id, e);
                RawResult::failed(message, FailureMarker::new(e.to_string(), e.status_code()))
            }
        }
    }
}
