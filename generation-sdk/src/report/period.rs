//! Reporting periods and the windows they resolve to

use std::fmt;

use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};

/// Requested reporting period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportPeriod {
    Weekly,
    Monthly,
    Quarterly,
}

impl Default for ReportPeriod {
    fn default() -> Self {
        ReportPeriod::Monthly
    }
}

impl ReportPeriod {
    /// Lenient parse; anything unrecognized, or nothing at all, is monthly
    pub fn parse_or_default(input: Option<&str>) -> Self {
        let Some(raw) = input else {
            return Self::default();
        };

        match raw.trim().to_ascii_lowercase().as_str() {
            "weekly" | "week" | "7d" => ReportPeriod::Weekly,
            "monthly" | "month" | "30d" => ReportPeriod::Monthly,
            "quarterly" | "quarter" | "90d" => ReportPeriod::Quarterly,
            other => {
                tracing::debug!(period = other, "unrecognized report period, using monthly");
                Self::default()
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportPeriod::Weekly => "weekly",
            ReportPeriod::Monthly => "monthly",
            ReportPeriod::Quarterly => "quarterly",
        }
    }
}

impl fmt::Display for ReportPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Half-open `[start, end)` window ending at the anchor time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportingWindow {
    pub period: ReportPeriod,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportingWindow {
    /// Window for `period` ending at `now`.
    ///
    /// Months are calendar months, clamped to the last day of a shorter month.
    pub fn ending_at(period: ReportPeriod, now: DateTime<Utc>) -> Self {
        let start = match period {
            ReportPeriod::Weekly => now - Duration::days(7),
            ReportPeriod::Monthly => now
                .checked_sub_months(Months::new(1))
                .unwrap_or_else(|| now - Duration::days(30)),
            ReportPeriod::Quarterly => now
                .checked_sub_months(Months::new(3))
                .unwrap_or_else(|| now - Duration::days(90)),
        };

        Self {
            period,
            start,
            end: now,
        }
    }

    /// `YYYY-MM-DD to YYYY-MM-DD`
    pub fn label(&self) -> String {
        format!(
            "{} to {}",
            self.start.format("%Y-%m-%d"),
            self.end.format("%Y-%m-%d")
        )
    }
}
