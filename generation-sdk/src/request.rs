//! Request builder
//!
//! Turns a tool identifier and the user's field map into an immutable
//! [`GenerationRequest`] and, from that, a provider-ready two-message payload.
//! Validation happens here, before any network activity.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::config::{ProviderConfig, MAX_RETRY_BUDGET};
use crate::error::{GenerationError, Result};
use crate::resilience::RetryPolicy;
use crate::services::provider::{ChatCompletionRequest, ChatMessage};
use crate::tools::ToolId;

/// Ordered mapping of field name to value; insertion order is prompt order.
///
/// Serializes as a JSON object whose keys keep that order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields(Vec<(String, String)>);

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a field, replacing the value in place if the name already exists
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        match self.0.iter_mut().find(|(existing, _)| *existing == name) {
            Some(entry) => entry.1 = value,
            None => self.0.push((name, value)),
        }
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for Fields {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, value) in &self.0 {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

struct FieldsVisitor;

impl<'de> Visitor<'de> for FieldsVisitor {
    type Value = Fields;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map of field names to string values")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> std::result::Result<Fields, A::Error> {
        let mut fields = Fields(Vec::with_capacity(access.size_hint().unwrap_or(0)));
        while let Some((name, value)) = access.next_entry::<String, String>()? {
            fields.insert(name, value);
        }
        Ok(fields)
    }
}

impl<'de> Deserialize<'de> for Fields {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        deserializer.deserialize_map(FieldsVisitor)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Fields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Fields::new();
        for (name, value) in iter {
            fields.insert(name, value);
        }
        fields
    }
}

/// Inbound parameters of a `generate` call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerateParams {
    pub tool_id: String,
    #[serde(default)]
    pub fields: Fields,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub retry_budget: Option<u32>,
}

impl GenerateParams {
    pub fn new(tool_id: impl Into<String>) -> Self {
        Self {
            tool_id: tool_id.into(),
            ..Self::default()
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(name, value);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn retry_budget(mut self, retry_budget: u32) -> Self {
        self.retry_budget = Some(retry_budget);
        self
    }
}

/// Values used when a call leaves an optional parameter unset
#[derive(Debug, Clone, PartialEq)]
pub struct RequestDefaults {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    pub retry_budget: u32,
}

impl From<&ProviderConfig> for RequestDefaults {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            model: config.default_model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            retry_budget: config.retry_budget,
        }
    }
}

impl Default for RequestDefaults {
    fn default() -> Self {
        Self::from(&ProviderConfig::default())
    }
}

/// A validated, immutable generation request
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    tool: ToolId,
    fields: Fields,
    model: String,
    max_tokens: u32,
    temperature: f32,
    retry_budget: u32,
}

impl GenerationRequest {
    /// Validate `params` and fill unset values from `defaults`
    pub fn build(params: GenerateParams, defaults: &RequestDefaults) -> Result<Self> {
        let tool: ToolId = params.tool_id.parse()?;

        let missing: Vec<&str> = tool
            .required_fields()
            .iter()
            .copied()
            .filter(|name| params.fields.get(name).map_or(true, |v| v.trim().is_empty()))
            .collect();

        if !missing.is_empty() {
            return Err(GenerationError::validation(format!(
                "Missing required fields for {}: {}",
                tool,
                missing.join(", ")
            )));
        }

        if let Some(budget) = params.retry_budget.filter(|b| *b > MAX_RETRY_BUDGET) {
            return Err(GenerationError::validation(format!(
                "Retry budget {} exceeds the maximum of {}",
                budget, MAX_RETRY_BUDGET
            )));
        }

        let model = params
            .model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| defaults.model.clone());

        Ok(Self {
            tool,
            fields: params.fields,
            model,
            max_tokens: params.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: params.temperature.unwrap_or(defaults.temperature),
            retry_budget: params.retry_budget.unwrap_or(defaults.retry_budget),
        })
    }

    pub fn tool(&self) -> ToolId {
        self.tool
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn retry_budget(&self) -> u32 {
        self.retry_budget
    }

    /// The retry policy for this request: `base` with this request's budget
    pub fn retry_policy(&self, base: &RetryPolicy) -> RetryPolicy {
        base.clone().with_retry_budget(self.retry_budget)
    }

    /// User message: one `field: value` line per field, then the format instructions
    pub fn user_prompt(&self) -> String {
        let mut prompt = self
            .fields
            .iter()
            .map(|(name, value)| format!("{}: {}", name, value.trim()))
            .collect::<Vec<_>>()
            .join("\n");
        prompt.push_str("\n\n");
        prompt.push_str(self.tool.format_instructions());
        prompt
    }

    /// Provider-ready payload with the family system instruction and the user message
    pub fn payload(&self) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage::system(self.tool.family().system_instruction()),
                ChatMessage::user(self.user_prompt()),
            ],
            max_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }
}
