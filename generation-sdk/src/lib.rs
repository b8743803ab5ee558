//! # Generation SDK
//!
//! The generation orchestration and resilience layer behind the content tool
//! catalog of the Phoenix ORCH project.
//!
//! This crate provides:
//!
//! - A request builder that validates tool input and produces provider payloads
//! - A resilient transport with per-attempt timeouts, bounded retries and backoff
//! - A response normalizer that recovers JSON from loosely formatted completions
//! - A fallback synthesizer with schema-valid placeholder content per tool
//! - A report composer that merges platform metrics with a generated narrative
//!
//! ## Architecture
//!
//! - `CompletionTransport`: one attempt against the generation provider
//! - `ResilientTransport`: retry policy, backoff and cancellation around a transport
//! - `Generator`: the end-to-end pipeline; every call yields one `GenerationResult`
//! - `ReportComposer`: metrics fan-out plus a narrative generation pass
//! - `GenerationError` / `ErrorKind`: structural error classification

pub mod core;
pub use core::{Completion, CompletionTransport, ResilientTransport};

pub mod services;
pub use services::provider::{ProviderClient, ProviderClientBuilder};

pub mod error;
pub use error::{ErrorContext, ErrorKind, GenerationError, Result};

pub mod resilience;
pub use resilience::{backoff_delay, GenerationAttempt, RetryExecutor, RetryPolicy};

pub mod config;
pub use config::{ConfigProvider, ProviderConfig};

pub mod tools;
pub use tools::{ToolFamily, ToolId};

pub mod request;
pub use request::{Fields, GenerateParams, GenerationRequest, RequestDefaults};

pub mod schema;
pub use schema::ToolContent;

pub mod normalize;

pub mod fallback;
pub use fallback::FallbackRegistry;

pub mod generator;
pub use generator::{
    ChannelUsageSink, GenerationResult, GenerationStatus, Generator, ResultSource, UsageRecord,
    UsageSink,
};

pub mod report;
pub use report::{ClientReport, ReportComposer, ReportRequest};

mod util;

#[cfg(test)]
mod tests;

/// Create a generator configured from the `GENERATION_*` environment
pub fn generator() -> Result<Generator> {
    Generator::from_env()
}
