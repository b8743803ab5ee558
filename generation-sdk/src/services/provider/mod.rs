//! Generation provider client
//!
//! This module provides the HTTP client for the OpenAI-compatible chat
//! completion endpoint. One call to [`ProviderClient::complete`] is exactly
//! one attempt; retries live in the resilient transport.

mod models;
pub use models::*;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::config::ProviderConfig;
use crate::core::{Completion, CompletionTransport};
use crate::error::{GenerationError, Result};
use crate::services::common::{build_http_client, parse_error_response, UserAgent};

const SERVICE_NAME: &str = "provider";

/// HTTP client for the generation provider
pub struct ProviderClient {
    http_client: Client,
    config: ProviderConfig,
}

impl ProviderClient {
    /// Create a client from the `GENERATION_*` environment
    pub fn from_env() -> Result<Self> {
        Self::new_with_config(ProviderConfig::from_env())
    }

    /// Create a new client with custom configuration.
    ///
    /// An incomplete configuration is accepted here; it is reported as
    /// `ErrorKind::Configuration` on every call instead.
    pub fn new_with_config(config: ProviderConfig) -> Result<Self> {
        // The per-attempt timeout is enforced by the retry executor; the
        // client timeout only backstops a hung connection.
        let timeout = Duration::from_secs(config.timeout_seconds.max(1)).saturating_mul(2);

        let http_client = build_http_client(
            Some(UserAgent {
                extra: Some("Provider-Client".to_string()),
                ..UserAgent::default()
            }),
            Some(timeout),
        )?;

        Ok(Self { http_client, config })
    }

    /// Create a new builder for the provider client
    pub fn builder() -> ProviderClientBuilder {
        ProviderClientBuilder::default()
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl CompletionTransport for ProviderClient {
    fn name(&self) -> &str {
        SERVICE_NAME
    }

    fn ensure_configured(&self) -> Result<()> {
        self.config.validate()
    }

    async fn complete(&self, request: &ChatCompletionRequest) -> Result<Completion> {
        let url = self.endpoint();
        debug!(model = %request.model, "POST {}", url);

        let start_time = Instant::now();

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(parse_error_response(SERVICE_NAME, response).await);
        }

        let body = response.json::<ChatCompletionResponse>().await.map_err(|e| {
            GenerationError::transient(format!("Undecodable completion envelope: {}", e))
        })?;

        debug!(
            status = status.as_u16(),
            elapsed_ms = start_time.elapsed().as_millis() as u64,
            "provider responded"
        );

        let tokens_used = body.usage.as_ref().map(|usage| usage.total_tokens);
        let text = body
            .first_content()
            .map(str::to_string)
            .ok_or_else(|| GenerationError::transient("Provider returned no completion content"))?;

        Ok(Completion { text, tokens_used })
    }
}

/// Builder for the provider client
#[derive(Default)]
pub struct ProviderClientBuilder {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    timeout_seconds: Option<u64>,
    from_env: bool,
}

impl ProviderClientBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from the environment configuration instead of defaults
    pub fn from_env(mut self) -> Self {
        self.from_env = true;
        self
    }

    /// Set the API key
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the base URL
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Set the default model
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the timeout in seconds
    pub fn timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = Some(seconds);
        self
    }

    /// Build the provider client
    pub fn build(self) -> Result<ProviderClient> {
        let mut config = if self.from_env {
            ProviderConfig::from_env()
        } else {
            ProviderConfig::default()
        };

        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }

        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }

        if let Some(model) = self.model {
            config.default_model = model;
        }

        if let Some(timeout) = self.timeout_seconds {
            config.timeout_seconds = timeout;
        }

        ProviderClient::new_with_config(config)
    }
}
