//! Generation pipeline
//!
//! [`Generator`] runs one tool call end to end: configuration check, request
//! building, the resilient transport, normalization, and, when live
//! generation cannot produce content, the fallback synthesizer. Every call
//! ends in exactly one [`GenerationResult`] and one [`UsageRecord`].

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn, Instrument};

use crate::config::ProviderConfig;
use crate::core::{CompletionTransport, ResilientTransport};
use crate::error::{ErrorKind, GenerationError, Result};
use crate::fallback::FallbackRegistry;
use crate::normalize;
use crate::request::{GenerateParams, GenerationRequest, RequestDefaults};
use crate::resilience::{AttemptOutcome, GenerationAttempt, RetryPolicy};
use crate::schema::ToolContent;
use crate::services::provider::ProviderClient;
use crate::util::generate_request_id;

/// How a call ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationStatus {
    Success,
    Fallback,
    Error,
}

/// Where the content came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Live,
    Fallback,
}

/// Outcome of one generation call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationResult {
    pub status: GenerationStatus,
    pub source: ResultSource,
    /// `None` only when `status` is `Error`
    pub content: Option<ToolContent>,
    pub error_kind: Option<ErrorKind>,
    /// User-facing message for errors
    pub message: Option<String>,
    pub attempts: Vec<GenerationAttempt>,
    pub tokens_used: Option<u32>,
    pub duration_ms: u64,
    pub request_id: String,
}

impl GenerationResult {
    pub fn is_success(&self) -> bool {
        self.status == GenerationStatus::Success
    }

    pub fn is_fallback(&self) -> bool {
        self.status == GenerationStatus::Fallback
    }

    pub fn is_error(&self) -> bool {
        self.status == GenerationStatus::Error
    }
}

/// Usage event emitted once per call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UsageRecord {
    pub tool_id: String,
    pub status: GenerationStatus,
    pub duration_ms: u64,
    pub tokens_used: Option<u32>,
    pub error_kind: Option<ErrorKind>,
    /// The failure was hidden from the user behind fallback content
    pub absorbed: bool,
    pub request_id: String,
}

/// Fire-and-forget destination for usage records
#[cfg_attr(test, mockall::automock)]
pub trait UsageSink: Send + Sync {
    fn record(&self, record: UsageRecord);
}

/// Forwards usage records to an async consumer
#[derive(Debug, Clone)]
pub struct ChannelUsageSink {
    tx: mpsc::UnboundedSender<UsageRecord>,
}

impl ChannelUsageSink {
    /// Create a sink and the receiver its records arrive on
    pub fn new() -> (Self, mpsc::UnboundedReceiver<UsageRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl UsageSink for ChannelUsageSink {
    fn record(&self, record: UsageRecord) {
        if let Err(e) = self.tx.send(record) {
            debug!(request_id = %e.0.request_id, "usage consumer is gone, record dropped");
        }
    }
}

/// What the live part of the pipeline produced
struct LiveOutcome {
    result: Result<ToolContent>,
    attempts: Vec<GenerationAttempt>,
    tokens_used: Option<u32>,
}

impl LiveOutcome {
    fn failed(err: GenerationError) -> Self {
        Self {
            result: Err(err),
            attempts: Vec::new(),
            tokens_used: None,
        }
    }
}

/// Entry point for tool generation
#[derive(Clone)]
pub struct Generator {
    transport: ResilientTransport,
    defaults: RequestDefaults,
    base_policy: RetryPolicy,
    usage: Option<Arc<dyn UsageSink>>,
}

impl Generator {
    /// Generator over the HTTP provider configured by `GENERATION_*` variables
    pub fn from_env() -> Result<Self> {
        Self::from_config(ProviderConfig::from_env())
    }

    /// Generator over the HTTP provider with an explicit configuration
    pub fn from_config(config: ProviderConfig) -> Result<Self> {
        let defaults = RequestDefaults::from(&config);
        let policy = config.retry_policy();
        let client = ProviderClient::new_with_config(config)?;
        Ok(Self::new(Arc::new(client), defaults, policy))
    }

    /// Generator over any transport
    pub fn new(
        transport: Arc<dyn CompletionTransport>,
        defaults: RequestDefaults,
        base_policy: RetryPolicy,
    ) -> Self {
        Self {
            transport: ResilientTransport::new(transport),
            defaults,
            base_policy,
            usage: None,
        }
    }

    /// Report every call to `sink`
    pub fn with_usage_sink(mut self, sink: Arc<dyn UsageSink>) -> Self {
        self.usage = Some(sink);
        self
    }

    pub fn defaults(&self) -> &RequestDefaults {
        &self.defaults
    }

    /// Policy applied before a request's own retry budget overrides it
    pub fn base_policy(&self) -> &RetryPolicy {
        &self.base_policy
    }

    /// Run one tool call to completion
    pub async fn generate(&self, params: GenerateParams) -> GenerationResult {
        self.generate_with_cancel(params, &CancellationToken::new()).await
    }

    /// Run one tool call, giving up as soon as `cancel` fires
    pub async fn generate_with_cancel(
        &self,
        params: GenerateParams,
        cancel: &CancellationToken,
    ) -> GenerationResult {
        let request_id = generate_request_id();
        let span = tracing::debug_span!("generate", request_id = %request_id, tool = %params.tool_id);

        async move {
            let started = tokio::time::Instant::now();
            let tool_id = params.tool_id.clone();
            debug!("INIT");

            let live = self.run_live(params, cancel).await;
            let duration_ms = started.elapsed().as_millis() as u64;
            let result = self.finish(&tool_id, live, duration_ms, request_id);
            self.report_usage(&tool_id, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn run_live(&self, params: GenerateParams, cancel: &CancellationToken) -> LiveOutcome {
        if let Err(err) = self.transport.inner().ensure_configured() {
            return LiveOutcome::failed(err);
        }

        debug!("BUILDING");
        let request = match GenerationRequest::build(params, &self.defaults) {
            Ok(request) => request,
            Err(err) => return LiveOutcome::failed(err),
        };

        let policy = request.retry_policy(&self.base_policy);
        let payload = request.payload();
        let outcome = self.transport.execute(&payload, &policy, cancel).await;
        let mut attempts = outcome.attempts;

        let completion = match outcome.result {
            Ok(completion) => completion,
            Err(err) => {
                debug!(kind = %err.kind(), "FATAL");
                return LiveOutcome {
                    result: Err(err),
                    attempts,
                    tokens_used: None,
                };
            }
        };

        debug!("PARSING");
        let result = normalize::normalize(request.tool(), &completion.text);
        match &result {
            Ok(_) => debug!("PARSED"),
            Err(err) => {
                debug!(error = %err, "PARSE_FAILED");
                if let Some(last) = attempts.last_mut() {
                    last.outcome = AttemptOutcome::ParseError;
                }
            }
        }

        LiveOutcome {
            result,
            attempts,
            tokens_used: completion.tokens_used,
        }
    }

    fn finish(
        &self,
        tool_id: &str,
        live: LiveOutcome,
        duration_ms: u64,
        request_id: String,
    ) -> GenerationResult {
        let LiveOutcome {
            result,
            attempts,
            tokens_used,
        } = live;

        match result {
            Ok(content) => {
                info!(attempts = attempts.len(), duration_ms, "generation succeeded");
                GenerationResult {
                    status: GenerationStatus::Success,
                    source: ResultSource::Live,
                    content: Some(content),
                    error_kind: None,
                    message: None,
                    attempts,
                    tokens_used,
                    duration_ms,
                    request_id,
                }
            }
            Err(err) if err.kind().triggers_fallback() => {
                let kind = err.kind();
                warn!(kind = %kind, attempts = attempts.len(), "serving fallback content: {}", err);
                GenerationResult {
                    status: GenerationStatus::Fallback,
                    source: ResultSource::Fallback,
                    content: Some(FallbackRegistry::global().template_for(tool_id)),
                    error_kind: Some(kind),
                    message: None,
                    attempts,
                    tokens_used,
                    duration_ms,
                    request_id,
                }
            }
            Err(err) => {
                let kind = err.kind();
                error!(kind = %kind, attempts = attempts.len(), "generation failed: {}", err);
                GenerationResult {
                    status: GenerationStatus::Error,
                    source: ResultSource::Live,
                    content: None,
                    error_kind: Some(kind),
                    message: Some(kind.user_message().to_string()),
                    attempts,
                    tokens_used,
                    duration_ms,
                    request_id,
                }
            }
        }
    }

    fn report_usage(&self, tool_id: &str, result: &GenerationResult) {
        let Some(sink) = &self.usage else {
            return;
        };

        sink.record(UsageRecord {
            tool_id: tool_id.to_string(),
            status: result.status,
            duration_ms: result.duration_ms,
            tokens_used: result.tokens_used,
            error_kind: result.error_kind,
            absorbed: result.status == GenerationStatus::Fallback,
            request_id: result.request_id.clone(),
        });
    }
}
