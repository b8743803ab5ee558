//! Error mapping for provider responses
//!
//! This module converts non-success HTTP responses from the generation
//! provider into a structural `GenerationError`. Classification looks only at
//! the status code and the provider's machine-readable error code, never at
//! the human-readable message.

use reqwest::StatusCode;
use serde_json::Value;

use super::{ErrorContext, ErrorKind, GenerationError};

/// Provider error codes that mean the account quota is exhausted
const QUOTA_CODES: &[&str] = &["insufficient_quota", "quota_exceeded", "billing_hard_limit_reached"];

/// Classify a non-success status into an error kind
pub fn classify_status(status: StatusCode, provider_code: Option<&str>) -> ErrorKind {
    match status.as_u16() {
        401 | 403 => ErrorKind::Authentication,
        429 if provider_code.map_or(false, is_quota_code) => ErrorKind::QuotaExceeded,
        429 => ErrorKind::RateLimitExceeded,
        408 => ErrorKind::TransientNetwork,
        500..=599 => ErrorKind::TransientNetwork,
        400..=499 => ErrorKind::Configuration,
        _ => ErrorKind::TransientNetwork,
    }
}

/// Whether a provider error code denotes an exhausted quota
pub fn is_quota_code(code: &str) -> bool {
    QUOTA_CODES.contains(&code)
}

/// Pull the machine-readable error code out of an OpenAI-style error body.
///
/// Both `error.code` and `error.type` are checked; providers disagree on
/// which one carries `insufficient_quota`.
pub fn provider_error_code(json: &Value) -> Option<String> {
    let error = json.get("error")?;
    let code = error.get("code").and_then(|c| c.as_str());
    let error_type = error.get("type").and_then(|t| t.as_str());

    match (code, error_type) {
        (Some(code), _) if is_quota_code(code) => Some(code.to_string()),
        (_, Some(error_type)) if is_quota_code(error_type) => Some(error_type.to_string()),
        (Some(code), _) => Some(code.to_string()),
        (None, Some(error_type)) => Some(error_type.to_string()),
        (None, None) => None,
    }
}

/// Map a provider error response to a GenerationError
pub fn map_provider_error(
    status: StatusCode,
    body: &str,
    context: &mut ErrorContext,
) -> GenerationError {
    context.status_code = Some(status.as_u16());

    let json = serde_json::from_str::<Value>(body).ok();
    let code = json.as_ref().and_then(provider_error_code);

    let message = json
        .as_ref()
        .and_then(|j| {
            j.get("error")
                .and_then(|e| e.get("message"))
                .or_else(|| j.get("message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.to_string()
            } else if body.len() > 100 {
                format!("{}: {}...", status, crate::util::truncate_string(body, 100))
            } else {
                format!("{}: {}", status, body)
            }
        });

    let kind = classify_status(status, code.as_deref());
    if let Some(code) = code {
        context.error_code = Some(code);
    }

    GenerationError::from_kind(kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_quota_code_is_read_from_code_or_type() {
        let by_code = json!({"error": {"code": "insufficient_quota", "type": "requests"}});
        let by_type = json!({"error": {"code": null, "type": "insufficient_quota"}});
        let plain = json!({"error": {"code": "rate_limit_exceeded", "type": "requests"}});

        assert_eq!(provider_error_code(&by_code).as_deref(), Some("insufficient_quota"));
        assert_eq!(provider_error_code(&by_type).as_deref(), Some("insufficient_quota"));
        assert_eq!(provider_error_code(&plain).as_deref(), Some("rate_limit_exceeded"));
        assert_eq!(provider_error_code(&json!({"message": "nope"})), None);
    }

    #[test]
    fn test_message_text_does_not_drive_classification() {
        let mut context = ErrorContext::for_service("provider");
        let body = r#"{"error": {"message": "You exceeded your current quota", "code": "rate_limit_exceeded"}}"#;
        let err = map_provider_error(StatusCode::TOO_MANY_REQUESTS, body, &mut context);
        assert_eq!(err.kind(), ErrorKind::RateLimitExceeded);
    }
}
