//! Configuration management for the generation layer
//!
//! This module provides utilities for loading and validating the provider
//! configuration, with support for environment variables.

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use std::time::Duration;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};
use crate::resilience::RetryPolicy;

/// Default provider endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model used when a request does not name one
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Upper bound on retries after the first attempt
pub const MAX_RETRY_BUDGET: u32 = 10;

/// Base trait for configuration providers
pub trait ConfigProvider: Send + Sync {
    /// Get a string configuration value
    fn get_string(&self, key: &str) -> Result<String>;
}

/// Extension methods for configuration providers
pub trait ConfigProviderExt: ConfigProvider {
    /// Get an integer configuration value
    fn get_int(&self, key: &str) -> Result<i64> {
        let value = self.get_string(key)?;
        value.trim().parse::<i64>().map_err(|e| {
            GenerationError::configuration(format!("Invalid integer for key {}: {}", key, e))
        })
    }

    /// Get a float configuration value
    fn get_float(&self, key: &str) -> Result<f64> {
        let value = self.get_string(key)?;
        value.trim().parse::<f64>().map_err(|e| {
            GenerationError::configuration(format!("Invalid float for key {}: {}", key, e))
        })
    }

    /// Get a boolean configuration value
    fn get_bool(&self, key: &str) -> Result<bool> {
        let value = self.get_string(key)?;
        match value.to_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Ok(true),
            "false" | "no" | "0" | "off" => Ok(false),
            _ => Err(GenerationError::configuration(format!(
                "Invalid boolean value for key {}: {}",
                key, value
            ))),
        }
    }

    /// Get a string configuration value with a default
    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get an integer configuration value with a default
    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    /// Get a non-negative integer that fits `T`, or `default` when the key is unset
    fn get_unsigned_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: TryFrom<i64>,
    {
        if self.get_string(key).is_err() {
            return Ok(default);
        }
        let value = self.get_int(key)?;
        T::try_from(value).map_err(|_| {
            GenerationError::configuration(format!(
                "Value for key {} is negative or out of range: {}",
                key, value
            ))
        })
    }

    /// Get a float configuration value with a default
    fn get_float_or(&self, key: &str, default: f64) -> f64 {
        self.get_float(key).unwrap_or(default)
    }

    /// Get a boolean configuration value with a default
    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Environment variable based configuration provider
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    /// Optional prefix for environment variables
    prefix: Option<String>,

    /// Optional namespace for variables (e.g., "PROVIDER")
    namespace: Option<String>,
}

impl EnvConfigProvider {
    /// Create a new environment variable config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a prefix for environment variables
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Set a namespace for environment variables
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Format a configuration key as an environment variable
    pub(crate) fn format_key(&self, key: &str) -> String {
        let mut env_key = String::new();

        if let Some(ref prefix) = self.prefix {
            env_key.push_str(prefix);
            env_key.push('_');
        }

        if let Some(ref namespace) = self.namespace {
            env_key.push_str(namespace);
            env_key.push('_');
        }

        env_key.push_str(&key.to_uppercase().replace(|c: char| !c.is_ascii_alphanumeric(), "_"));

        env_key
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let env_key = self.format_key(key);

        env::var(&env_key).map_err(|e| match e {
            env::VarError::NotPresent => {
                GenerationError::configuration(format!("Environment variable not set: {}", env_key))
            }
            env::VarError::NotUnicode(_) => GenerationError::configuration(format!(
                "Environment variable is not valid unicode: {}",
                env_key
            )),
        })
    }
}

/// In-memory config provider for testing or static configuration
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    /// Create a new empty memory config provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a memory config provider with initial values
    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    /// Set a configuration value
    pub fn set<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: ToString,
    {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values.get(key).cloned().ok_or_else(|| {
            GenerationError::configuration(format!("Configuration key not found: {}", key))
        })
    }
}

/// A composite config provider that tries multiple providers in order
pub struct CompositeConfigProvider {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    /// Create a new composite config provider
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Add a provider to the chain
    pub fn add_provider(&mut self, provider: impl ConfigProvider + 'static) {
        self.providers.push(Box::new(provider));
    }
}

impl Default for CompositeConfigProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigProvider for CompositeConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.providers
            .iter()
            .find_map(|provider| provider.get_string(key).ok())
            .ok_or_else(|| {
                GenerationError::configuration(format!(
                    "Configuration key not found in any provider: {}",
                    key
                ))
            })
    }
}

/// Global default configuration provider (`GENERATION_*` environment variables)
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> =
    Lazy::new(|| Arc::new(EnvConfigProvider::new().with_prefix("GENERATION")));

/// Configuration for the generation provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderConfig {
    /// Bearer credential
    pub api_key: String,

    /// Base URL (can be changed for proxies)
    pub base_url: String,

    /// Model used when the request does not name one
    pub default_model: String,

    /// Completion token cap used when the request does not set one
    pub max_tokens: u32,

    /// Sampling temperature used when the request does not set one
    pub temperature: f32,

    /// Per-attempt timeout in seconds
    pub timeout_seconds: u64,

    /// Retries allowed after the first attempt
    pub retry_budget: u32,

    /// Backoff base for rate-limited attempts, in milliseconds
    pub rate_limit_base_ms: u64,

    /// Backoff base for transient failures, in milliseconds
    pub transient_base_ms: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            default_model: DEFAULT_MODEL.to_string(),
            max_tokens: 2000,
            temperature: 0.7,
            timeout_seconds: 30,
            retry_budget: 2,
            rate_limit_base_ms: 2000,
            transient_base_ms: 1000,
        }
    }
}

impl ProviderConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();

        let config = Self {
            api_key: provider.get_string("provider_api_key")?,
            base_url: provider.get_string_or("provider_base_url", &defaults.base_url),
            default_model: provider.get_string_or("provider_model", &defaults.default_model),
            max_tokens: provider.get_unsigned_or("provider_max_tokens", defaults.max_tokens)?,
            temperature: provider.get_float_or("provider_temperature", defaults.temperature as f64)
                as f32,
            timeout_seconds: provider
                .get_unsigned_or("provider_timeout_seconds", defaults.timeout_seconds)?,
            retry_budget: provider.get_unsigned_or("retry_budget", defaults.retry_budget)?,
            rate_limit_base_ms: provider
                .get_unsigned_or("rate_limit_base_ms", defaults.rate_limit_base_ms)?,
            transient_base_ms: provider
                .get_unsigned_or("transient_base_ms", defaults.transient_base_ms)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Load from the `GENERATION_*` environment, falling back to defaults.
    ///
    /// A missing credential is not an error here: every call made with the
    /// resulting config reports `ErrorKind::Configuration` instead.
    pub fn from_env() -> Self {
        Self::from_provider(&**DEFAULT_PROVIDER).unwrap_or_else(|e| {
            log::warn!("Failed to load provider config from environment, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate this configuration
    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(GenerationError::configuration("Provider API key is required"));
        }

        url::Url::parse(&self.base_url).map_err(|e| {
            GenerationError::configuration(format!("Invalid provider base URL {}: {}", self.base_url, e))
        })?;

        if self.default_model.trim().is_empty() {
            return Err(GenerationError::configuration("Provider model is required"));
        }

        if self.timeout_seconds == 0 {
            return Err(GenerationError::configuration("Provider timeout must be positive"));
        }

        if self.retry_budget > MAX_RETRY_BUDGET {
            return Err(GenerationError::configuration(format!(
                "Retry budget {} exceeds the maximum of {}",
                self.retry_budget, MAX_RETRY_BUDGET
            )));
        }

        Ok(())
    }

    /// Retry policy derived from this configuration
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retry_budget: self.retry_budget,
            attempt_timeout: Duration::from_secs(self.timeout_seconds),
            rate_limit_base: Duration::from_millis(self.rate_limit_base_ms),
            transient_base: Duration::from_millis(self.transient_base_ms),
        }
    }
}
