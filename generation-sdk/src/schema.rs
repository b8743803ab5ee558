//! Tool result schemas
//!
//! One typed shape per tool. Optional fields default when missing or `null`
//! (strings to `"N/A"`, lists to empty) so a partially populated answer still
//! validates. A field of the wrong primitive type, or a missing required
//! field, is a parse error. Nothing is coerced, except that a whole number may
//! arrive in float form (`85.0`) since JSON has a single number type.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{GenerationError, Result};
use crate::tools::ToolId;

/// Default for missing optional text
pub const NOT_AVAILABLE: &str = "N/A";

fn not_available() -> String {
    NOT_AVAILABLE.to_string()
}

fn text_or_na<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_else(not_available))
}

fn list_or_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Whole number in `0..=255`, written either as `85` or `85.0`
fn whole_number<'de, D>(deserializer: D) -> std::result::Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let number = f64::deserialize(deserializer)?;
    if number.fract() != 0.0 || !(0.0..=255.0).contains(&number) {
        return Err(D::Error::custom(format!("expected a whole number, got {}", number)));
    }
    Ok(number as u8)
}

/// `seo-audit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeoAudit {
    /// Overall score, 0-100 (required)
    #[serde(deserialize_with = "whole_number")]
    pub score: u8,
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub summary: String,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub issues: Vec<AuditIssue>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditIssue {
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub severity: String,
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub title: String,
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub recommendation: String,
}

/// `social-posts`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPosts {
    pub posts: Vec<SocialPost>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SocialPost {
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub platform: String,
    pub content: String,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub hashtags: Vec<String>,
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub best_time: String,
}

/// `ad-copy`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdCopy {
    pub headlines: Vec<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub descriptions: Vec<String>,
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub call_to_action: String,
}

/// `campaign-planner`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignPlan {
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub campaign_name: String,
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub objective: String,
    pub timeline: Vec<CampaignPhase>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub kpis: Vec<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub budget_split: Vec<BudgetShare>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CampaignPhase {
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub phase: String,
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub title: String,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub activities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetShare {
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub channel: String,
    #[serde(deserialize_with = "whole_number")]
    pub percent: u8,
}

/// `blog-outline`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlogOutline {
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub title: String,
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub meta_description: String,
    pub sections: Vec<OutlineSection>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub keywords: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineSection {
    pub heading: String,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub points: Vec<String>,
}

/// `competitor-analysis`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorAnalysis {
    #[serde(default = "not_available", deserialize_with = "text_or_na")]
    pub summary: String,
    pub competitors: Vec<CompetitorProfile>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub opportunities: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompetitorProfile {
    pub name: String,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub strengths: Vec<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub weaknesses: Vec<String>,
}

/// `client-report` narrative half
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportInsights {
    pub executive_summary: String,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub highlights: Vec<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub concerns: Vec<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub recommendations: Vec<String>,
    #[serde(default, deserialize_with = "list_or_empty")]
    pub next_steps: Vec<String>,
}

/// Generic shape for a tool id the catalog does not know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentUnavailable {
    pub tool_id: String,
    pub message: String,
}

/// Result content of any tool
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ToolContent {
    SeoAudit(SeoAudit),
    SocialPosts(SocialPosts),
    AdCopy(AdCopy),
    CampaignPlan(CampaignPlan),
    BlogOutline(BlogOutline),
    CompetitorAnalysis(CompetitorAnalysis),
    ClientReport(ReportInsights),
    Unavailable(ContentUnavailable),
}

impl ToolContent {
    /// Coerce a parsed value into the schema of `tool`
    pub fn from_value(tool: ToolId, value: Value) -> Result<Self> {
        if !value.is_object() {
            return Err(GenerationError::parse(format!(
                "{} response is not a JSON object",
                tool
            )));
        }

        let content = match tool {
            ToolId::SeoAudit => ToolContent::SeoAudit(decode(tool, value)?),
            ToolId::SocialPosts => ToolContent::SocialPosts(decode(tool, value)?),
            ToolId::AdCopy => ToolContent::AdCopy(decode(tool, value)?),
            ToolId::CampaignPlanner => ToolContent::CampaignPlan(decode(tool, value)?),
            ToolId::BlogOutline => ToolContent::BlogOutline(decode(tool, value)?),
            ToolId::CompetitorAnalysis => ToolContent::CompetitorAnalysis(decode(tool, value)?),
            ToolId::ClientReport => ToolContent::ClientReport(decode(tool, value)?),
        };

        content.check_ranges()?;
        Ok(content)
    }

    /// The tool this content belongs to, `None` for the generic shape
    pub fn tool(&self) -> Option<ToolId> {
        match self {
            ToolContent::SeoAudit(_) => Some(ToolId::SeoAudit),
            ToolContent::SocialPosts(_) => Some(ToolId::SocialPosts),
            ToolContent::AdCopy(_) => Some(ToolId::AdCopy),
            ToolContent::CampaignPlan(_) => Some(ToolId::CampaignPlanner),
            ToolContent::BlogOutline(_) => Some(ToolId::BlogOutline),
            ToolContent::CompetitorAnalysis(_) => Some(ToolId::CompetitorAnalysis),
            ToolContent::ClientReport(_) => Some(ToolId::ClientReport),
            ToolContent::Unavailable(_) => None,
        }
    }

    fn check_ranges(&self) -> Result<()> {
        match self {
            ToolContent::SeoAudit(audit) if audit.score > 100 => Err(GenerationError::parse(
                format!("seo-audit score {} is outside 0-100", audit.score),
            )),
            ToolContent::CampaignPlan(plan) if plan.budget_split.iter().any(|s| s.percent > 100) => {
                Err(GenerationError::parse("campaign-planner budget share above 100%"))
            }
            _ => Ok(()),
        }
    }
}

fn decode<T: for<'de> Deserialize<'de>>(tool: ToolId, value: Value) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| GenerationError::parse(format!("{} response does not match schema: {}", tool, e)))
}
