//! Tool catalog
//!
//! Every tool the layer can run, the family it belongs to, the input fields
//! it requires and the JSON shape its answer must follow.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::GenerationError;

/// Known tool identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ToolId {
    SeoAudit,
    SocialPosts,
    AdCopy,
    CampaignPlanner,
    BlogOutline,
    CompetitorAnalysis,
    ClientReport,
}

/// Tool families share one system instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolFamily {
    Audit,
    Social,
    Campaign,
    Content,
    Reporting,
}

impl ToolFamily {
    /// Fixed system instruction for the family
    pub fn system_instruction(&self) -> &'static str {
        match self {
            ToolFamily::Audit => {
                "You are a senior digital marketing auditor. Assess the subject objectively, \
                 name concrete issues, and rank what to fix first. Respond with JSON only."
            }
            ToolFamily::Social => {
                "You are a social media copywriter. Write concise, on-brand copy tuned to \
                 each platform's conventions. Respond with JSON only."
            }
            ToolFamily::Campaign => {
                "You are a marketing campaign strategist. Produce realistic, phased plans \
                 with measurable goals. Respond with JSON only."
            }
            ToolFamily::Content => {
                "You are a content strategist and SEO editor. Structure content for \
                 readers first and search engines second. Respond with JSON only."
            }
            ToolFamily::Reporting => {
                "You are a marketing analyst writing for a client. Explain what the numbers \
                 mean and what to do next, without inventing data. Respond with JSON only."
            }
        }
    }
}

impl ToolId {
    /// All tools, in catalog order
    pub const ALL: [ToolId; 7] = [
        ToolId::SeoAudit,
        ToolId::SocialPosts,
        ToolId::AdCopy,
        ToolId::CampaignPlanner,
        ToolId::BlogOutline,
        ToolId::CompetitorAnalysis,
        ToolId::ClientReport,
    ];

    /// The wire identifier, e.g. `seo-audit`
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolId::SeoAudit => "seo-audit",
            ToolId::SocialPosts => "social-posts",
            ToolId::AdCopy => "ad-copy",
            ToolId::CampaignPlanner => "campaign-planner",
            ToolId::BlogOutline => "blog-outline",
            ToolId::CompetitorAnalysis => "competitor-analysis",
            ToolId::ClientReport => "client-report",
        }
    }

    /// Human readable name for catalog listings
    pub fn display_name(&self) -> &'static str {
        match self {
            ToolId::SeoAudit => "SEO Audit",
            ToolId::SocialPosts => "Social Media Posts",
            ToolId::AdCopy => "Ad Copy",
            ToolId::CampaignPlanner => "Campaign Planner",
            ToolId::BlogOutline => "Blog Outline",
            ToolId::CompetitorAnalysis => "Competitor Analysis",
            ToolId::ClientReport => "Client Report",
        }
    }

    pub fn family(&self) -> ToolFamily {
        match self {
            ToolId::SeoAudit | ToolId::CompetitorAnalysis => ToolFamily::Audit,
            ToolId::SocialPosts | ToolId::AdCopy => ToolFamily::Social,
            ToolId::CampaignPlanner => ToolFamily::Campaign,
            ToolId::BlogOutline => ToolFamily::Content,
            ToolId::ClientReport => ToolFamily::Reporting,
        }
    }

    /// Input fields that must be present and non-blank
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            ToolId::SeoAudit => &["url"],
            ToolId::SocialPosts => &["topic", "platform"],
            ToolId::AdCopy => &["product", "audience"],
            ToolId::CampaignPlanner => &["goal", "duration"],
            ToolId::BlogOutline => &["topic"],
            ToolId::CompetitorAnalysis => &["business", "competitors"],
            ToolId::ClientReport => &["client_name", "period"],
        }
    }

    /// Instructions appended to the user message describing the answer shape
    pub fn format_instructions(&self) -> &'static str {
        match self {
            ToolId::SeoAudit => {
                r#"Respond with a JSON object of this shape:
{"score": <integer 0-100>, "summary": "<one paragraph>", "issues": [{"severity": "high|medium|low", "title": "<issue>", "recommendation": "<fix>"}], "strengths": ["<strength>"], "recommendations": ["<next step>"]}"#
            }
            ToolId::SocialPosts => {
                r##"Respond with a JSON object of this shape:
{"posts": [{"platform": "<platform>", "content": "<post text>", "hashtags": ["#tag"], "best_time": "<when to post>"}]}"##
            }
            ToolId::AdCopy => {
                r#"Respond with a JSON object of this shape:
{"headlines": ["<headline>"], "descriptions": ["<description>"], "call_to_action": "<cta>"}"#
            }
            ToolId::CampaignPlanner => {
                r#"Respond with a JSON object of this shape:
{"campaign_name": "<name>", "objective": "<objective>", "timeline": [{"phase": "<week or phase>", "title": "<title>", "activities": ["<activity>"]}], "kpis": ["<kpi>"], "budget_split": [{"channel": "<channel>", "percent": <integer>}]}"#
            }
            ToolId::BlogOutline => {
                r#"Respond with a JSON object of this shape:
{"title": "<title>", "meta_description": "<under 160 characters>", "sections": [{"heading": "<H2>", "points": ["<point>"]}], "keywords": ["<keyword>"]}"#
            }
            ToolId::CompetitorAnalysis => {
                r#"Respond with a JSON object of this shape:
{"summary": "<overview>", "competitors": [{"name": "<competitor>", "strengths": ["<strength>"], "weaknesses": ["<weakness>"]}], "opportunities": ["<opportunity>"]}"#
            }
            ToolId::ClientReport => {
                r#"Respond with a JSON object of this shape:
{"executive_summary": "<two or three sentences>", "highlights": ["<highlight>"], "concerns": ["<concern>"], "recommendations": ["<recommendation>"], "next_steps": ["<next step>"]}"#
            }
        }
    }
}

impl fmt::Display for ToolId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ToolId {
    type Err = GenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ToolId::ALL
            .iter()
            .copied()
            .find(|tool| tool.as_str() == s.trim())
            .ok_or_else(|| GenerationError::validation(format!("Unknown tool: {}", s)))
    }
}
