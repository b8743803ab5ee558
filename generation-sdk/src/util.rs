//! Utility module for common functionality
//!
//! This module provides small helpers shared across the generation layer.

use once_cell::sync::Lazy;
use regex::Regex;

/// Truncate a string to a maximum number of characters, adding ellipsis if truncated
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}

static SENSITIVE_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        (r"Bearer [A-Za-z0-9\-_\.]+", "Bearer [REDACTED]"),
        (r"sk-[A-Za-z0-9\-_]{8,}", "sk-[REDACTED]"),
        (r"api[_-]?key[=:]\s*[A-Za-z0-9\-_]+", "api_key=[REDACTED]"),
        (r"secret[=:]\s*[^\s&]+", "secret=[REDACTED]"),
    ]
    .into_iter()
    .filter_map(|(pattern, replacement)| Regex::new(pattern).ok().map(|re| (re, replacement)))
    .collect()
});

/// Sanitize a string for logging (remove credential patterns)
pub fn sanitize_for_logging(s: &str) -> String {
    let mut result = s.to_string();
    for (re, replacement) in SENSITIVE_PATTERNS.iter() {
        result = re.replace_all(&result, *replacement).to_string();
    }
    result
}

/// Short, sanitized excerpt of provider text for log lines
pub fn log_excerpt(s: &str) -> String {
    sanitize_for_logging(&truncate_string(s, 200))
}

/// Generate a unique request ID
pub fn generate_request_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("hi", 2), "hi");
        assert_eq!(truncate_string("résumé écrit", 6), "rés...");
    }

    #[test]
    fn test_sanitize_for_logging() {
        let output = sanitize_for_logging("Authorization: Bearer abc123xyz");
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("abc123xyz"));

        let output = sanitize_for_logging("key was sk-live1234567890abcdef");
        assert!(!output.contains("1234567890"));
    }

    #[test]
    fn test_request_ids_are_unique() {
        assert_ne!(generate_request_id(), generate_request_id());
    }
}
