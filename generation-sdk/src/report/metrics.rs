//! Metrics collaborators and aggregation
//!
//! Each platform (traffic, ads, conversions) reports only the numbers it
//! knows. Sums cover whatever arrived; a ratio is `None` when one of its
//! inputs never arrived or its denominator is zero.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Client account details passed to every metrics platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub client_id: String,
    pub client_name: String,
    /// Platform account identifiers, keyed by platform name
    #[serde(default)]
    pub accounts: BTreeMap<String, String>,
}

impl ClientConfig {
    pub fn new(client_id: impl Into<String>, client_name: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_name: client_name.into(),
            accounts: BTreeMap::new(),
        }
    }

    pub fn with_account(mut self, platform: impl Into<String>, account: impl Into<String>) -> Self {
        self.accounts.insert(platform.into(), account.into());
        self
    }
}

/// Whatever subset of numbers one platform reported
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialMetrics {
    pub sessions: Option<u64>,
    pub users: Option<u64>,
    pub pageviews: Option<u64>,
    pub impressions: Option<u64>,
    pub clicks: Option<u64>,
    pub ad_spend: Option<f64>,
    pub conversions: Option<u64>,
    pub revenue: Option<f64>,
}

/// An external metrics platform
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MetricsSource: Send + Sync {
    /// Platform name used in the report and logs
    fn name(&self) -> &'static str;

    /// Metrics for `client` between `start` and `end`
    async fn fetch_metrics(
        &self,
        client: &ClientConfig,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> anyhow::Result<PartialMetrics>;
}

/// Sums and ratios over every platform that answered
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetrics {
    pub sessions: Option<u64>,
    pub users: Option<u64>,
    pub pageviews: Option<u64>,
    pub impressions: Option<u64>,
    pub clicks: Option<u64>,
    pub ad_spend: Option<f64>,
    pub conversions: Option<u64>,
    pub revenue: Option<f64>,
    /// clicks / impressions
    pub ctr: Option<f64>,
    /// ad_spend / conversions
    pub cost_per_conversion: Option<f64>,
    /// revenue / ad_spend
    pub roas: Option<f64>,
    /// conversions / sessions
    pub conversion_rate: Option<f64>,
}

fn merge<T>(total: Option<T>, next: Option<T>, add: impl Fn(T, T) -> T) -> Option<T> {
    match (total, next) {
        (Some(a), Some(b)) => Some(add(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}

fn ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d > 0.0 => Some(((n / d) * 10_000.0).round() / 10_000.0),
        _ => None,
    }
}

impl AggregateMetrics {
    pub fn from_partials<'a>(parts: impl IntoIterator<Item = &'a PartialMetrics>) -> Self {
        let mut agg = Self::default();

        for part in parts {
            agg.sessions = merge(agg.sessions, part.sessions, u64::saturating_add);
            agg.users = merge(agg.users, part.users, u64::saturating_add);
            agg.pageviews = merge(agg.pageviews, part.pageviews, u64::saturating_add);
            agg.impressions = merge(agg.impressions, part.impressions, u64::saturating_add);
            agg.clicks = merge(agg.clicks, part.clicks, u64::saturating_add);
            agg.ad_spend = merge(agg.ad_spend, part.ad_spend, |a, b| a + b);
            agg.conversions = merge(agg.conversions, part.conversions, u64::saturating_add);
            agg.revenue = merge(agg.revenue, part.revenue, |a, b| a + b);
        }

        let as_f64 = |v: Option<u64>| v.map(|n| n as f64);
        agg.ctr = ratio(as_f64(agg.clicks), as_f64(agg.impressions));
        agg.cost_per_conversion = ratio(agg.ad_spend, as_f64(agg.conversions));
        agg.roas = ratio(agg.revenue, agg.ad_spend);
        agg.conversion_rate = ratio(as_f64(agg.conversions), as_f64(agg.sessions));
        agg
    }

    /// `(name, rendered value)` pairs in a fixed order; missing values render as `unavailable`
    pub fn rendered(&self) -> Vec<(&'static str, String)> {
        fn count(v: Option<u64>) -> String {
            v.map_or_else(|| "unavailable".to_string(), |n| n.to_string())
        }
        fn money(v: Option<f64>) -> String {
            v.map_or_else(|| "unavailable".to_string(), |n| format!("{:.2}", n))
        }
        fn percent(v: Option<f64>) -> String {
            v.map_or_else(|| "unavailable".to_string(), |n| format!("{:.2}%", n * 100.0))
        }
        fn multiple(v: Option<f64>) -> String {
            v.map_or_else(|| "unavailable".to_string(), |n| format!("{:.2}x", n))
        }

        vec![
            ("sessions", count(self.sessions)),
            ("users", count(self.users)),
            ("pageviews", count(self.pageviews)),
            ("impressions", count(self.impressions)),
            ("clicks", count(self.clicks)),
            ("ad_spend", money(self.ad_spend)),
            ("conversions", count(self.conversions)),
            ("revenue", money(self.revenue)),
            ("ctr", percent(self.ctr)),
            ("cost_per_conversion", money(self.cost_per_conversion)),
            ("roas", multiple(self.roas)),
            ("conversion_rate", percent(self.conversion_rate)),
        ]
    }
}
