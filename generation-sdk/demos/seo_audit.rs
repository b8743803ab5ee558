//! SEO Audit Example
//!
//! This example runs one `seo-audit` call through the generation pipeline.
//! Without a reachable provider the call still returns the audit placeholder.
//!
//! To run this example:
//! ```
//! GENERATION_PROVIDER_API_KEY=your_api_key cargo run --example seo_audit -- https://example.com
//! ```

use std::sync::Arc;

use generation_sdk::{
    error::Result, ChannelUsageSink, GenerateParams, GenerationStatus, Generator, ToolContent,
    ToolId,
};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com".to_string());

    println!("Available tools:");
    for tool in ToolId::ALL {
        println!("  {:<20} {} ({})", tool.as_str(), tool.display_name(), tool.required_fields().join(", "));
    }

    let (sink, mut usage) = ChannelUsageSink::new();
    let usage_logger = tokio::spawn(async move {
        while let Some(record) = usage.recv().await {
            println!(
                "usage: {} {:?} in {} ms (tokens: {:?}, absorbed: {})",
                record.tool_id, record.status, record.duration_ms, record.tokens_used, record.absorbed
            );
        }
    });

    let generator = Generator::from_env()?.with_usage_sink(Arc::new(sink));
    println!("\nAuditing {} (worst case {:?})...", url, generator.base_policy().worst_case_latency());

    let result = generator
        .generate(GenerateParams::new("seo-audit").field("url", url))
        .await;

    match (&result.status, &result.content) {
        (GenerationStatus::Error, _) => {
            println!("Error: {}", result.message.as_deref().unwrap_or("unknown error"));
        }
        (status, Some(ToolContent::SeoAudit(audit))) => {
            println!("Status: {:?} after {} attempt(s)", status, result.attempts.len());
            println!("Score: {}/100", audit.score);
            println!("Summary: {}", audit.summary);
            for issue in &audit.issues {
                println!("  [{}] {}: {}", issue.severity, issue.title, issue.recommendation);
            }
        }
        (status, content) => println!("Status: {:?}, content: {:?}", status, content),
    }

    drop(generator);
    let _ = usage_logger.await;

    Ok(())
}
