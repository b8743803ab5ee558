//! Client Report Example
//!
//! This example composes a client report from three in-process metrics
//! platforms, one of which always fails, plus a generated narrative.
//!
//! To run this example:
//! ```
//! GENERATION_PROVIDER_API_KEY=your_api_key cargo run --example client_report -- quarterly
//! ```

use std::sync::Arc;

use anyhow::{bail, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use generation_sdk::report::{ClientConfig, MetricsSource, PartialMetrics};
use generation_sdk::{Generator, ReportComposer, ReportRequest};
use tracing_subscriber::EnvFilter;

struct StaticTraffic;

#[async_trait]
impl MetricsSource for StaticTraffic {
    fn name(&self) -> &'static str {
        "traffic"
    }

    async fn fetch_metrics(
        &self,
        _client: &ClientConfig,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> anyhow::Result<PartialMetrics> {
        Ok(PartialMetrics {
            sessions: Some(12_400),
            users: Some(9_100),
            pageviews: Some(31_800),
            ..PartialMetrics::default()
        })
    }
}

struct StaticConversions;

#[async_trait]
impl MetricsSource for StaticConversions {
    fn name(&self) -> &'static str {
        "conversions"
    }

    async fn fetch_metrics(
        &self,
        _client: &ClientConfig,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> anyhow::Result<PartialMetrics> {
        Ok(PartialMetrics {
            conversions: Some(310),
            revenue: Some(27_900.0),
            ..PartialMetrics::default()
        })
    }
}

/// Stands in for an ads platform whose credentials have expired
struct UnreachableAds;

#[async_trait]
impl MetricsSource for UnreachableAds {
    fn name(&self) -> &'static str {
        "ads"
    }

    async fn fetch_metrics(
        &self,
        client: &ClientConfig,
        _start: DateTime<Utc>,
        _end: DateTime<Utc>,
    ) -> anyhow::Result<PartialMetrics> {
        let account = client.accounts.get("ads").context("no ads account configured")?;
        bail!("ads account {} rejected the token", account)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let period = std::env::args().nth(1);

    let composer = ReportComposer::new(Generator::from_env()?)
        .with_source(Arc::new(StaticTraffic))
        .with_source(Arc::new(UnreachableAds))
        .with_source(Arc::new(StaticConversions));

    let client = ClientConfig::new("client-001", "Northwind Outfitters").with_account("ads", "act_4471");
    let mut request = ReportRequest::new(client);
    if let Some(period) = period {
        request = request.period(period);
    }

    let report = composer.compose(&request).await;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
