//! Client report composer
//!
//! Fans out to every metrics platform concurrently, aggregates what came
//! back, asks the generation pipeline for a narrative over those numbers, and
//! merges both halves into one [`ClientReport`]. The halves degrade
//! independently and the composite is always produced.

mod metrics;
mod period;

pub use metrics::{AggregateMetrics, ClientConfig, MetricsSource, PartialMetrics};
pub use period::{ReportPeriod, ReportingWindow};

#[cfg(test)]
pub use metrics::MockMetricsSource;

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Serialize;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::error::ErrorKind;
use crate::generator::{GenerationResult, GenerationStatus, Generator, ResultSource};
use crate::request::GenerateParams;
use crate::schema::{ReportInsights, ToolContent};
use crate::tools::ToolId;

/// How long a single metrics platform may take before it is reported unavailable
pub const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(30);

/// Inbound report request
#[derive(Debug, Clone, PartialEq)]
pub struct ReportRequest {
    pub client: ClientConfig,
    /// `weekly`, `monthly` or `quarterly`; anything else is monthly
    pub period: Option<String>,
}

impl ReportRequest {
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            period: None,
        }
    }

    pub fn period(mut self, period: impl Into<String>) -> Self {
        self.period = Some(period.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceStatus {
    Available,
    Unavailable,
}

/// Per-platform outcome of the metrics fan-out
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceReport {
    pub source: String,
    pub status: SourceStatus,
    pub error: Option<String>,
}

/// Composite client report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClientReport {
    pub client_id: String,
    pub client_name: String,
    pub window: ReportingWindow,
    pub metrics: AggregateMetrics,
    pub sources: Vec<SourceReport>,
    pub insights: ReportInsights,
    pub insights_source: ResultSource,
    /// Why the narrative is templated, when it is
    pub insights_error: Option<ErrorKind>,
    pub generated_at: DateTime<Utc>,
}

impl ClientReport {
    /// Platforms that answered
    pub fn available_sources(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| s.status == SourceStatus::Available)
            .count()
    }
}

/// Builds client reports from metrics platforms and the generation pipeline
#[derive(Clone)]
pub struct ReportComposer {
    generator: Generator,
    sources: Vec<Arc<dyn MetricsSource>>,
    source_timeout: Duration,
}

impl ReportComposer {
    pub fn new(generator: Generator) -> Self {
        Self {
            generator,
            sources: Vec::new(),
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
        }
    }

    /// Bound each platform fetch
    pub fn with_source_timeout(mut self, source_timeout: Duration) -> Self {
        self.source_timeout = source_timeout;
        self
    }

    /// Add a metrics platform
    pub fn with_source(mut self, source: Arc<dyn MetricsSource>) -> Self {
        self.sources.push(source);
        self
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Compose a report for the window ending now
    pub async fn compose(&self, request: &ReportRequest) -> ClientReport {
        self.compose_at(request, Utc::now(), &CancellationToken::new()).await
    }

    /// Compose a report for the window ending at `now`
    pub async fn compose_at(
        &self,
        request: &ReportRequest,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> ClientReport {
        let period = ReportPeriod::parse_or_default(request.period.as_deref());
        let window = ReportingWindow::ending_at(period, now);
        let client = &request.client;

        let (metrics, sources) = self.collect_metrics(client, &window, cancel).await;

        let params = narrative_params(client, &window, &metrics, &sources);
        let narrative = self.generator.generate_with_cancel(params, cancel).await;
        let (insights, insights_source, insights_error) =
            merge_narrative(narrative, client, &window, &metrics, &sources);

        ClientReport {
            client_id: client.client_id.clone(),
            client_name: client.client_name.clone(),
            window,
            metrics,
            sources,
            insights,
            insights_source,
            insights_error,
            generated_at: now,
        }
    }

    async fn collect_metrics(
        &self,
        client: &ClientConfig,
        window: &ReportingWindow,
        cancel: &CancellationToken,
    ) -> (AggregateMetrics, Vec<SourceReport>) {
        let source_timeout = self.source_timeout;
        let fetches = self.sources.iter().map(|source| async move {
            let fetch = source.fetch_metrics(client, window.start, window.end);
            let result = match timeout(source_timeout, fetch).await {
                Ok(result) => result.map_err(|e| format!("{:#}", e)),
                Err(_) => Err("timed out".to_string()),
            };
            (source.name(), result)
        });

        let results: Vec<(&'static str, std::result::Result<PartialMetrics, String>)> = tokio::select! {
            results = join_all(fetches) => results,
            _ = cancel.cancelled() => self
                .sources
                .iter()
                .map(|source| (source.name(), Err("cancelled".to_string())))
                .collect(),
        };

        let mut received = Vec::new();
        let mut reports = Vec::new();

        for (name, result) in results {
            match result {
                Ok(partial) => {
                    received.push(partial);
                    reports.push(SourceReport {
                        source: name.to_string(),
                        status: SourceStatus::Available,
                        error: None,
                    });
                }
                Err(e) => {
                    tracing::warn!(source = name, client = %client.client_id, "metric unavailable: {}", e);
                    reports.push(SourceReport {
                        source: name.to_string(),
                        status: SourceStatus::Unavailable,
                        error: Some(e),
                    });
                }
            }
        }

        (AggregateMetrics::from_partials(&received), reports)
    }
}

fn narrative_params(
    client: &ClientConfig,
    window: &ReportingWindow,
    metrics: &AggregateMetrics,
    sources: &[SourceReport],
) -> GenerateParams {
    let mut params = GenerateParams::new(ToolId::ClientReport.as_str())
        .field("client_name", client.client_name.as_str())
        .field("period", window.period.as_str())
        .field("window", window.label());

    for (name, value) in metrics.rendered() {
        params = params.field(name, value);
    }

    let missing: Vec<&str> = sources
        .iter()
        .filter(|s| s.status == SourceStatus::Unavailable)
        .map(|s| s.source.as_str())
        .collect();
    if !missing.is_empty() {
        params = params.field("unavailable_sources", missing.join(", "));
    }

    params
}

fn merge_narrative(
    narrative: GenerationResult,
    client: &ClientConfig,
    window: &ReportingWindow,
    metrics: &AggregateMetrics,
    sources: &[SourceReport],
) -> (ReportInsights, ResultSource, Option<ErrorKind>) {
    match (narrative.status, narrative.content) {
        (GenerationStatus::Success, Some(ToolContent::ClientReport(insights))) => {
            (insights, ResultSource::Live, None)
        }
        _ => {
            tracing::warn!(
                client = %client.client_id,
                kind = ?narrative.error_kind,
                "narrative generation did not succeed, using templated insights"
            );
            (
                templated_insights(client, window, metrics, sources),
                ResultSource::Fallback,
                narrative.error_kind,
            )
        }
    }
}

/// Deterministic insights built only from the numbers that arrived
fn templated_insights(
    client: &ClientConfig,
    window: &ReportingWindow,
    metrics: &AggregateMetrics,
    sources: &[SourceReport],
) -> ReportInsights {
    let available = sources
        .iter()
        .filter(|s| s.status == SourceStatus::Available)
        .count();

    let executive_summary = format!(
        "{} report for {} covering {}. {} of {} data sources reported for this period.",
        capitalize(window.period.as_str()),
        client.client_name,
        window.label(),
        available,
        sources.len()
    );

    let highlights = metrics
        .rendered()
        .into_iter()
        .filter(|(_, value)| value != "unavailable")
        .map(|(name, value)| format!("{}: {}", name.replace('_', " "), value))
        .collect();

    let concerns = sources
        .iter()
        .filter(|s| s.status == SourceStatus::Unavailable)
        .map(|s| format!("{} data was unavailable for this period", s.source))
        .collect();

    ReportInsights {
        executive_summary,
        highlights,
        concerns,
        recommendations: vec![
            "Review these figures against the previous period".to_string(),
            "Confirm tracking is active on every connected platform".to_string(),
        ],
        next_steps: vec!["Schedule a performance review call".to_string()],
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
