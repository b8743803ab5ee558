//! Shared fixtures for the test modules
//!
//! `ScriptedTransport` plays back a fixed sequence of attempt outcomes so the
//! pipeline can be driven without a network, including under paused time.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::core::{Completion, CompletionTransport};
use crate::error::{ErrorKind, GenerationError, Result};
use crate::generator::Generator;
use crate::request::{GenerateParams, RequestDefaults};
use crate::resilience::RetryPolicy;
use crate::services::provider::ChatCompletionRequest;
use crate::tools::ToolId;

/// One scripted attempt
#[derive(Debug, Clone)]
pub enum Step {
    Reply(String),
    Fail(ErrorKind),
    /// Never completes; the attempt timeout or cancellation ends it
    Hang,
}

pub fn reply(text: &str) -> Step {
    Step::Reply(text.to_string())
}

pub struct ScriptedTransport {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<ChatCompletionRequest>>,
    calls: AtomicU32,
    configured: bool,
}

impl ScriptedTransport {
    pub fn new(steps: Vec<Step>) -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(steps.into()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
            configured: true,
        })
    }

    /// A transport whose credential check always fails
    pub fn unconfigured() -> Arc<Self> {
        Arc::new(Self {
            steps: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            calls: AtomicU32::new(0),
            configured: false,
        })
    }

    /// Same step repeated `n` times
    pub fn repeating(step: Step, n: usize) -> Arc<Self> {
        Self::new(vec![step; n])
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<ChatCompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    fn name(&self) -> &str {
        "scripted"
    }

    fn ensure_configured(&self) -> Result<()> {
        if self.configured {
            Ok(())
        } else {
            Err(GenerationError::configuration("Provider API key is required"))
        }
    }

    async fn complete(&self, request: &ChatCompletionRequest) -> Result<Completion> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.requests.lock().unwrap().push(request.clone());
        let step = self.steps.lock().unwrap().pop_front();

        match step {
            Some(Step::Reply(text)) => Ok(Completion {
                text,
                tokens_used: Some(42),
            }),
            Some(Step::Fail(kind)) => Err(GenerationError::from_kind(kind, "scripted failure")),
            Some(Step::Hang) => std::future::pending().await,
            None => Err(GenerationError::transient("script exhausted")),
        }
    }
}

/// Generator over `transport` with production defaults
pub fn generator_with(transport: Arc<ScriptedTransport>) -> Generator {
    Generator::new(transport, RequestDefaults::default(), RetryPolicy::default())
}

/// Params with every required field of `tool` filled in
pub fn params_for(tool: ToolId) -> GenerateParams {
    tool.required_fields()
        .iter()
        .fold(GenerateParams::new(tool.as_str()), |params, name| {
            params.field(*name, format!("example {}", name))
        })
}

/// A well-formed provider answer for `tool`
pub fn sample_response(tool: ToolId) -> &'static str {
    match tool {
        ToolId::SeoAudit => {
            r#"{"score": 78, "summary": "Solid foundation with a few gaps.", "issues": [{"severity": "high", "title": "Missing meta descriptions", "recommendation": "Write a unique description per page."}], "strengths": ["Fast load times"], "recommendations": ["Fix meta descriptions first"]}"#
        }
        ToolId::SocialPosts => {
            r##"{"posts": [{"platform": "linkedin", "content": "Launch day is here.", "hashtags": ["#launch"], "best_time": "Tuesday 9 AM"}]}"##
        }
        ToolId::AdCopy => {
            r#"{"headlines": ["Ship Faster"], "descriptions": ["Build with confidence."], "call_to_action": "Start Free"}"#
        }
        ToolId::CampaignPlanner => {
            r#"{"campaign_name": "Spring Push", "objective": "Qualified leads", "timeline": [{"phase": "Week 1", "title": "Prep", "activities": ["Audit channels"]}], "kpis": ["Leads"], "budget_split": [{"channel": "Search", "percent": 60}]}"#
        }
        ToolId::BlogOutline => {
            r#"{"title": "Rust for Marketers", "meta_description": "Why speed matters.", "sections": [{"heading": "Intro", "points": ["Hook"]}], "keywords": ["rust"]}"#
        }
        ToolId::CompetitorAnalysis => {
            r#"{"summary": "A crowded field.", "competitors": [{"name": "Acme", "strengths": ["Brand"], "weaknesses": ["Price"]}], "opportunities": ["Small business tier"]}"#
        }
        ToolId::ClientReport => {
            r#"{"executive_summary": "Traffic grew steadily.", "highlights": ["Sessions up"], "concerns": [], "recommendations": ["Invest in search"], "next_steps": ["Review next week"]}"#
        }
    }
}
