//! Fallback synthesizer
//!
//! Hand-curated, schema-valid placeholder content for every tool, held in a
//! read-only registry built once per process. Placeholders are returned
//! verbatim when live generation is rate limited, fails transiently, or
//! cannot be parsed.

use std::collections::HashMap;

use once_cell::sync::Lazy;

use crate::schema::{
    AdCopy, AuditIssue, BlogOutline, BudgetShare, CampaignPhase, CampaignPlan, CompetitorAnalysis,
    ContentUnavailable, OutlineSection, ReportInsights, SeoAudit, SocialPost,
    SocialPosts, ToolContent,
};
use crate::tools::ToolId;

/// Read-only map of tool id to placeholder content
#[derive(Debug)]
pub struct FallbackRegistry {
    templates: HashMap<ToolId, ToolContent>,
}

static REGISTRY: Lazy<FallbackRegistry> = Lazy::new(FallbackRegistry::build);

impl FallbackRegistry {
    /// The process-wide registry
    pub fn global() -> &'static FallbackRegistry {
        &REGISTRY
    }

    /// Template for a known tool
    pub fn template(&self, tool: ToolId) -> &ToolContent {
        // Every ToolId is inserted by `build`; see the registry tests.
        &self.templates[&tool]
    }

    /// Template for a raw tool id; unknown ids get the generic unavailable shape.
    ///
    /// `Generator::generate` rejects an unknown id with `ErrorKind::Validation`
    /// before any fallback decision, so the generic shape only reaches callers
    /// that look templates up by raw id themselves.
    pub fn template_for(&self, tool_id: &str) -> ToolContent {
        match tool_id.parse::<ToolId>() {
            Ok(tool) => self.template(tool).clone(),
            Err(_) => ToolContent::Unavailable(ContentUnavailable {
                tool_id: tool_id.to_string(),
                message: "This content is temporarily unavailable. Please try again shortly."
                    .to_string(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    fn build() -> Self {
        let templates = ToolId::ALL
            .iter()
            .map(|tool| (*tool, placeholder(*tool)))
            .collect();
        Self { templates }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn placeholder(tool: ToolId) -> ToolContent {
    match tool {
        ToolId::SeoAudit => ToolContent::SeoAudit(SeoAudit {
            score: 0,
            summary: "A live audit could not be completed right now. The checklist below covers \
                      the fundamentals most sites should verify."
                .to_string(),
            issues: vec![
                AuditIssue {
                    severity: "high".to_string(),
                    title: "Verify title tags and meta descriptions".to_string(),
                    recommendation: "Give every page a unique title under 60 characters and a \
                                     meta description under 160 characters."
                        .to_string(),
                },
                AuditIssue {
                    severity: "medium".to_string(),
                    title: "Check page speed".to_string(),
                    recommendation: "Compress images and defer non-critical scripts.".to_string(),
                },
                AuditIssue {
                    severity: "medium".to_string(),
                    title: "Confirm mobile usability".to_string(),
                    recommendation: "Use a responsive layout and readable tap targets.".to_string(),
                },
            ],
            strengths: Vec::new(),
            recommendations: strings(&[
                "Submit an XML sitemap to search engines",
                "Fix broken internal links",
                "Add descriptive alt text to images",
            ]),
        }),
        ToolId::SocialPosts => ToolContent::SocialPosts(SocialPosts {
            posts: vec![
                SocialPost {
                    platform: "general".to_string(),
                    content: "We're working on something new. Stay tuned for updates!".to_string(),
                    hashtags: strings(&["#ComingSoon", "#StayTuned"]),
                    best_time: "Weekdays, 9-11 AM".to_string(),
                },
                SocialPost {
                    platform: "general".to_string(),
                    content: "Thank you to our community for your continued support.".to_string(),
                    hashtags: strings(&["#ThankYou", "#Community"]),
                    best_time: "Weekdays, 12-2 PM".to_string(),
                },
            ],
        }),
        ToolId::AdCopy => ToolContent::AdCopy(AdCopy {
            headlines: strings(&["Discover What's Possible", "Built for You", "Start Today"]),
            descriptions: strings(&[
                "Find the solution that fits your needs.",
                "Join customers who already made the switch.",
            ]),
            call_to_action: "Learn More".to_string(),
        }),
        ToolId::CampaignPlanner => ToolContent::CampaignPlan(CampaignPlan {
            campaign_name: "Campaign Plan".to_string(),
            objective: "Grow awareness and conversions".to_string(),
            timeline: vec![
                CampaignPhase {
                    phase: "Week 1-2".to_string(),
                    title: "Research and setup".to_string(),
                    activities: strings(&["Define the audience", "Set up tracking"]),
                },
                CampaignPhase {
                    phase: "Week 3-6".to_string(),
                    title: "Launch".to_string(),
                    activities: strings(&["Publish content", "Start paid promotion"]),
                },
                CampaignPhase {
                    phase: "Week 7-8".to_string(),
                    title: "Optimize and report".to_string(),
                    activities: strings(&["Review results", "Reallocate budget"]),
                },
            ],
            kpis: strings(&["Reach", "Click-through rate", "Conversions"]),
            budget_split: vec![
                BudgetShare {
                    channel: "Paid social".to_string(),
                    percent: 40,
                },
                BudgetShare {
                    channel: "Search ads".to_string(),
                    percent: 40,
                },
                BudgetShare {
                    channel: "Content".to_string(),
                    percent: 20,
                },
            ],
        }),
        ToolId::BlogOutline => ToolContent::BlogOutline(BlogOutline {
            title: "Blog Post Outline".to_string(),
            meta_description: "An outline covering the essentials of the topic.".to_string(),
            sections: vec![
                OutlineSection {
                    heading: "Introduction".to_string(),
                    points: strings(&["Why the topic matters", "What the reader will learn"]),
                },
                OutlineSection {
                    heading: "Key Points".to_string(),
                    points: strings(&["Main idea", "Supporting examples"]),
                },
                OutlineSection {
                    heading: "Conclusion".to_string(),
                    points: strings(&["Summary", "Call to action"]),
                },
            ],
            keywords: Vec::new(),
        }),
        ToolId::CompetitorAnalysis => ToolContent::CompetitorAnalysis(CompetitorAnalysis {
            summary: "A live competitor analysis could not be completed right now.".to_string(),
            competitors: Vec::new(),
            opportunities: strings(&[
                "Compare pricing pages",
                "Review competitor content topics",
                "Monitor competitor ad messaging",
            ]),
        }),
        ToolId::ClientReport => ToolContent::ClientReport(ReportInsights {
            executive_summary: "Performance data for this period is summarized in the metrics \
                                section."
                .to_string(),
            highlights: Vec::new(),
            concerns: Vec::new(),
            recommendations: strings(&["Review the metrics with your account manager"]),
            next_steps: strings(&["Schedule a performance review call"]),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_every_tool() {
        let registry = FallbackRegistry::global();
        assert_eq!(registry.len(), ToolId::ALL.len());
        for tool in ToolId::ALL {
            assert_eq!(registry.template(tool).tool(), Some(tool));
        }
    }

    #[test]
    fn test_unknown_tool_gets_generic_shape() {
        let content = FallbackRegistry::global().template_for("horoscope");
        match content {
            ToolContent::Unavailable(unavailable) => assert_eq!(unavailable.tool_id, "horoscope"),
            other => panic!("unexpected content {:?}", other),
        }
    }

    #[test]
    fn test_templates_survive_schema_coercion() {
        let registry = FallbackRegistry::global();
        for tool in ToolId::ALL {
            let value = serde_json::to_value(registry.template(tool)).unwrap();
            let reparsed = ToolContent::from_value(tool, value).unwrap();
            assert_eq!(&reparsed, registry.template(tool));
        }
    }
}
