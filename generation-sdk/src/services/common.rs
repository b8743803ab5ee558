//! Common utilities for service clients
//!
//! This module provides shared HTTP plumbing for provider clients.

use std::fmt;
use std::time::Duration;

use reqwest::{header, Client};

use crate::error::{ErrorContext, GenerationError, Result};

/// UserAgent structure for identifying the client to upstream services
#[derive(Debug, Clone)]
pub struct UserAgent {
    /// Application name
    pub app_name: String,

    /// Version string
    pub version: String,

    /// Optional extra info
    pub extra: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            app_name: "Phoenix-ORCH".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            extra: Some("generation-sdk".to_string()),
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.app_name, self.version)?;

        if let Some(ref extra) = self.extra {
            write!(f, " ({})", extra)?;
        }

        Ok(())
    }
}

/// Build a standard HTTP client with default settings
pub fn build_http_client(user_agent: Option<UserAgent>, timeout: Option<Duration>) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    let ua = user_agent.unwrap_or_default().to_string();

    headers.insert(
        header::USER_AGENT,
        header::HeaderValue::from_str(&ua)
            .map_err(|e| GenerationError::configuration(format!("Invalid user agent: {}", e)))?,
    );

    reqwest::Client::builder()
        .default_headers(headers)
        .timeout(timeout.unwrap_or_else(|| Duration::from_secs(30)))
        .gzip(true)
        .build()
        .map_err(|e| GenerationError::configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Parse a non-success HTTP response into a classified error
pub async fn parse_error_response(service_name: &str, response: reqwest::Response) -> GenerationError {
    let status = response.status();
    let mut context = ErrorContext::for_service(service_name).status_code(status.as_u16());
    if let Some(id) = response
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
    {
        context = context.request_id(id);
    }

    let body = match response.text().await {
        Ok(body) => body,
        Err(e) => format!("Failed to read error response: {}", e),
    };

    crate::error::mapping::map_provider_error(status, &body, &mut context).with_context(context)
}
