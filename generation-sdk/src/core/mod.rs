//! Core abstractions for the generation layer
//!
//! - `CompletionTransport`: one attempt against a generation provider
//! - `ResilientTransport`: bounded retries, backoff and timeouts around a transport

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::resilience::{RetryExecutor, RetryOutcome, RetryPolicy};
use crate::services::provider::ChatCompletionRequest;

/// Raw text of a completion and its token cost
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub text: String,
    pub tokens_used: Option<u32>,
}

/// A single attempt against a generation provider.
///
/// Implementations classify every failure into an `ErrorKind` themselves;
/// callers never inspect error messages.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    /// The transport name used in logs
    fn name(&self) -> &str;

    /// Check the credential and endpoint before any request is built
    fn ensure_configured(&self) -> Result<()> {
        Ok(())
    }

    /// Perform one completion call
    async fn complete(&self, request: &ChatCompletionRequest) -> Result<Completion>;
}

/// Transport wrapper that applies a retry policy to every call
#[derive(Clone)]
pub struct ResilientTransport {
    inner: Arc<dyn CompletionTransport>,
}

impl ResilientTransport {
    /// Wrap a single-attempt transport
    pub fn new(inner: Arc<dyn CompletionTransport>) -> Self {
        Self { inner }
    }

    /// The wrapped transport
    pub fn inner(&self) -> &Arc<dyn CompletionTransport> {
        &self.inner
    }

    /// Execute `payload` under `policy`, ending in raw text or a terminal error kind
    pub async fn execute(
        &self,
        payload: &ChatCompletionRequest,
        policy: &RetryPolicy,
        cancel: &CancellationToken,
    ) -> RetryOutcome<Completion> {
        let executor = RetryExecutor::new(policy.clone());
        let transport = &self.inner;
        executor
            .execute(cancel, |attempt| {
                tracing::debug!(attempt, transport = transport.name(), "ATTEMPTING");
                transport.complete(payload)
            })
            .await
    }
}
