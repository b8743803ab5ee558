//! Response normalizer
//!
//! Recovers a JSON object from completion text and coerces it into the tool's
//! schema. Recovery tries, in order: the whole text, the first fenced code
//! block, then the first balanced `{...}` span. Parse failures are final; the
//! caller falls back rather than retrying the provider.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::error::{GenerationError, Result};
use crate::schema::ToolContent;
use crate::tools::ToolId;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[ \t]*(?:json|JSON)?[ \t]*\r?\n?(.*?)```").expect("fence pattern is valid")
});

/// Which recovery step produced the object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extraction {
    Direct,
    Fenced,
    Braces,
}

/// Recover the first JSON object from `text`
pub fn extract_object(text: &str) -> Result<(Value, Extraction)> {
    let trimmed = text.trim();

    if let Some(value) = parse_object(trimmed) {
        return Ok((value, Extraction::Direct));
    }

    if let Some(value) = FENCED_BLOCK
        .captures_iter(trimmed)
        .filter_map(|caps| caps.get(1))
        .find_map(|interior| parse_object(interior.as_str().trim()))
    {
        return Ok((value, Extraction::Fenced));
    }

    if let Some(value) = first_balanced_object(trimmed) {
        return Ok((value, Extraction::Braces));
    }

    Err(GenerationError::parse(format!(
        "No JSON object found in response: {}",
        crate::util::log_excerpt(trimmed)
    )))
}

/// Recover and coerce the completion text for `tool`
pub fn normalize(tool: ToolId, text: &str) -> Result<ToolContent> {
    let (value, extraction) = extract_object(text)?;
    tracing::debug!(tool = %tool, ?extraction, "recovered JSON object");
    ToolContent::from_value(tool, value)
}

fn parse_object(candidate: &str) -> Option<Value> {
    serde_json::from_str::<Value>(candidate)
        .ok()
        .filter(Value::is_object)
}

/// Scan each `{` in order and parse the balanced span it opens.
///
/// Braces inside JSON string literals do not count toward nesting.
fn first_balanced_object(text: &str) -> Option<Value> {
    text.char_indices()
        .filter(|(_, c)| *c == '{')
        .find_map(|(start, _)| balanced_span(&text[start..]).and_then(parse_object))
}

fn balanced_span(text: &str) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[..=i]);
                }
            }
            _ => {}
        }
    }

    None
}
