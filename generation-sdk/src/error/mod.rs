//! Error handling for the generation layer
//!
//! This module provides the structural error taxonomy that:
//! - Classifies every failure once, at the transport/normalizer boundary
//! - Decides which failures are retried, absorbed by a fallback, or fatal
//! - Carries rich context (status code, provider code, attempt) for logging
//! - Provides a convenient Result type alias

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod mapping;

/// Result type for generation operations
pub type Result<T> = std::result::Result<T, GenerationError>;

/// Structural classification of a generation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or invalid provider credential, or a request the provider rejects as malformed
    Configuration,
    /// The provider refused the credential (HTTP 401/403)
    Authentication,
    /// The account has no quota left (HTTP 429 with a quota code)
    QuotaExceeded,
    /// The provider throttled the request (HTTP 429)
    RateLimitExceeded,
    /// Timeout, connection failure, 5xx or an empty completion
    TransientNetwork,
    /// The completion text could not be recovered into the tool schema
    Parse,
    /// Unknown tool or missing required input field
    Validation,
    /// The caller abandoned the call
    Cancelled,
}

impl ErrorKind {
    /// Fatal kinds surface to the caller as an error and are never retried
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ErrorKind::Configuration
                | ErrorKind::Authentication
                | ErrorKind::QuotaExceeded
                | ErrorKind::Validation
                | ErrorKind::Cancelled
        )
    }

    /// Whether another attempt may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::RateLimitExceeded | ErrorKind::TransientNetwork)
    }

    /// Whether the failure is absorbed by returning fallback content
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            ErrorKind::RateLimitExceeded | ErrorKind::TransientNetwork | ErrorKind::Parse
        )
    }

    /// Stable snake_case name used in logs and usage records
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration_error",
            ErrorKind::Authentication => "authentication_error",
            ErrorKind::QuotaExceeded => "quota_exceeded",
            ErrorKind::RateLimitExceeded => "rate_limit_exceeded",
            ErrorKind::TransientNetwork => "transient_network_error",
            ErrorKind::Parse => "parse_error",
            ErrorKind::Validation => "validation_error",
            ErrorKind::Cancelled => "cancelled",
        }
    }

    /// Message suitable for showing to the end user
    pub fn user_message(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => {
                "The content service is not configured. Please configure your API key."
            }
            ErrorKind::Authentication => {
                "The content service rejected the API key. Please check your API key."
            }
            ErrorKind::QuotaExceeded => {
                "The content service quota is exhausted. Please check your plan and billing."
            }
            ErrorKind::RateLimitExceeded => {
                "The content service is busy. Please retry later."
            }
            ErrorKind::TransientNetwork => {
                "The content service is temporarily unavailable. Please retry later."
            }
            ErrorKind::Parse => "The generated content could not be read. Please retry.",
            ErrorKind::Validation => "Some required fields are missing. Please complete the form.",
            ErrorKind::Cancelled => "The request was cancelled.",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Main error type for the generation layer
#[derive(Error, Debug)]
pub enum GenerationError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Authentication errors
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// Quota exhausted errors
    #[error("Quota exceeded: {0}")]
    QuotaExceeded(String),

    /// Rate limiting errors
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// Timeouts, connection failures and server errors
    #[error("Transient network error: {0}")]
    TransientNetwork(String),

    /// Response parsing errors
    #[error("Parsing error: {0}")]
    Parse(String),

    /// Request validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Cancelled by the caller
    #[error("Cancelled: {0}")]
    Cancelled(String),

    /// Errors with additional context
    #[error("{inner}")]
    WithContext {
        inner: Box<GenerationError>,
        context: ErrorContext,
    },
}

impl GenerationError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        GenerationError::Configuration(message.into())
    }

    /// Create an authentication error
    pub fn authentication(message: impl Into<String>) -> Self {
        GenerationError::Authentication(message.into())
    }

    /// Create a quota exceeded error
    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        GenerationError::QuotaExceeded(message.into())
    }

    /// Create a rate limit error
    pub fn rate_limit(message: impl Into<String>) -> Self {
        GenerationError::RateLimit(message.into())
    }

    /// Create a transient network error
    pub fn transient(message: impl Into<String>) -> Self {
        GenerationError::TransientNetwork(message.into())
    }

    /// Create a parsing error
    pub fn parse(message: impl Into<String>) -> Self {
        GenerationError::Parse(message.into())
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        GenerationError::Validation(message.into())
    }

    /// Create a cancellation error
    pub fn cancelled(message: impl Into<String>) -> Self {
        GenerationError::Cancelled(message.into())
    }

    /// Build an error of the given kind
    pub fn from_kind(kind: ErrorKind, message: impl Into<String>) -> Self {
        let message = message.into();
        match kind {
            ErrorKind::Configuration => GenerationError::Configuration(message),
            ErrorKind::Authentication => GenerationError::Authentication(message),
            ErrorKind::QuotaExceeded => GenerationError::QuotaExceeded(message),
            ErrorKind::RateLimitExceeded => GenerationError::RateLimit(message),
            ErrorKind::TransientNetwork => GenerationError::TransientNetwork(message),
            ErrorKind::Parse => GenerationError::Parse(message),
            ErrorKind::Validation => GenerationError::Validation(message),
            ErrorKind::Cancelled => GenerationError::Cancelled(message),
        }
    }

    /// The structural kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            GenerationError::Configuration(_) => ErrorKind::Configuration,
            GenerationError::Authentication(_) => ErrorKind::Authentication,
            GenerationError::QuotaExceeded(_) => ErrorKind::QuotaExceeded,
            GenerationError::RateLimit(_) => ErrorKind::RateLimitExceeded,
            GenerationError::TransientNetwork(_) => ErrorKind::TransientNetwork,
            GenerationError::Parse(_) => ErrorKind::Parse,
            GenerationError::Validation(_) => ErrorKind::Validation,
            GenerationError::Cancelled(_) => ErrorKind::Cancelled,
            GenerationError::WithContext { inner, .. } => inner.kind(),
        }
    }

    /// Add context to an existing error
    pub fn with_context(self, context: ErrorContext) -> Self {
        GenerationError::WithContext {
            inner: Box::new(self),
            context,
        }
    }

    /// Add a single context key/value to an existing error
    pub fn with_context_value(self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        match self {
            GenerationError::WithContext { inner, mut context } => {
                context.add(key, value);
                GenerationError::WithContext { inner, context }
            }
            other => {
                let mut context = ErrorContext::new();
                context.add(key, value);
                other.with_context(context)
            }
        }
    }

    /// Record the attempt index the error was observed on
    pub fn at_attempt(self, attempt: u32) -> Self {
        match self {
            GenerationError::WithContext { inner, context } => GenerationError::WithContext {
                inner,
                context: context.attempt(attempt),
            },
            other => other.with_context(ErrorContext::new().attempt(attempt)),
        }
    }

    /// Get the attached context, if any
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            GenerationError::WithContext { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Get the provider error code if available
    pub fn error_code(&self) -> Option<&str> {
        self.context().and_then(|c| c.error_code.as_deref())
    }

    /// Get the HTTP status code if available
    pub fn status_code(&self) -> Option<u16> {
        self.context().and_then(|c| c.status_code)
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        self.kind().is_retryable()
    }

    /// Check if this error must surface to the caller
    pub fn is_fatal(&self) -> bool {
        self.kind().is_fatal()
    }
}

/// Error context information
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorContext {
    /// Service that generated the error
    pub service: String,

    /// When the error was observed
    pub timestamp: Option<chrono::DateTime<chrono::Utc>>,

    /// HTTP status code if applicable
    pub status_code: Option<u16>,

    /// Provider-specific error code
    pub error_code: Option<String>,

    /// Request ID for tracing
    pub request_id: Option<String>,

    /// Attempt index the error was observed on
    pub attempt: Option<u32>,

    /// Additional context data
    pub data: HashMap<String, String>,
}

impl Default for ErrorContext {
    fn default() -> Self {
        Self {
            service: "unknown".to_string(),
            timestamp: Some(chrono::Utc::now()),
            status_code: None,
            error_code: None,
            request_id: None,
            attempt: None,
            data: HashMap::new(),
        }
    }
}

impl ErrorContext {
    /// Create a new error context
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new error context for a specific service
    pub fn for_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            ..Self::default()
        }
    }

    /// Add an HTTP status code
    pub fn status_code(mut self, code: u16) -> Self {
        self.status_code = Some(code);
        self
    }

    /// Add a provider error code
    pub fn error_code(mut self, code: impl Into<String>) -> Self {
        self.error_code = Some(code.into());
        self
    }

    /// Add a request ID
    pub fn request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }

    /// Add the attempt index
    pub fn attempt(mut self, attempt: u32) -> Self {
        self.attempt = Some(attempt);
        self
    }

    /// Add a context value
    pub fn add<K, V>(&mut self, key: K, value: V)
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.data.insert(key.into(), value.to_string());
    }

    /// Add a context value and return self (builder pattern)
    pub fn with<K, V>(mut self, key: K, value: V) -> Self
    where
        K: Into<String>,
        V: fmt::Display,
    {
        self.add(key, value);
        self
    }
}

/// Convert reqwest errors to GenerationError
impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        let context = ErrorContext::for_service("http_client");

        let error = if err.is_builder() {
            GenerationError::configuration(format!("Invalid request: {}", err))
        } else if err.is_timeout() {
            GenerationError::transient(format!("Request timed out: {}", err))
        } else if err.is_connect() {
            GenerationError::transient(format!("Connection error: {}", err))
        } else if err.is_decode() {
            GenerationError::transient(format!("Response decode error: {}", err))
        } else {
            GenerationError::transient(format!("HTTP client error: {}", err))
        };

        if let Some(status) = err.status() {
            error.with_context(context.status_code(status.as_u16()))
        } else {
            error.with_context(context)
        }
    }
}

/// Convert serde_json errors to GenerationError
impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::parse(format!("JSON error: {}", err))
            .with_context(ErrorContext::for_service("json"))
    }
}
