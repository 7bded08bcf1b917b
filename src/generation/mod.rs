//! Generation service collaborator: one trait, one adapter per provider.

mod claude;
mod gemini;

pub use claude::ClaudeClient;
pub use gemini::GeminiClient;

use crate::config::ApiConfig;
use crate::error::GenerationError;
use async_trait::async_trait;
use log::{info, warn};
use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use serde_json::{json, Map, Value};
use std::fmt;
use std::time::{Duration, Instant};
use url::Url;

/// Per-request timeout for provider calls
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Supported generation providers
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Provider {
    Gemini,
    Claude,
}

impl Provider {
    pub const ALL: [Provider; 2] = [Provider::Gemini, Provider::Claude];

    /// Identifier stored in the persisted config
    pub fn id(self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.5-flash",
            Provider::Claude => "claude-sonnet-4",
        }
    }

    /// Name used in messages and errors
    pub fn label(self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::Claude => "Claude",
        }
    }

    pub fn from_id(id: &str) -> Option<Provider> {
        Provider::ALL.into_iter().find(|p| p.id() == id)
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shape of one output field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldShape {
    /// An array of strings, optionally capped
    StringArray { max_items: Option<usize> },
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SchemaField {
    pub name: String,
    pub shape: FieldShape,
}

/// The JSON object a generation call must return
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputSchema {
    pub fields: Vec<SchemaField>,
}

impl OutputSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn array(mut self, name: &str, max_items: Option<usize>) -> Self {
        self.fields.push(SchemaField {
            name: name.to_string(),
            shape: FieldShape::StringArray { max_items },
        });
        self
    }

    pub fn string(mut self, name: &str) -> Self {
        self.fields.push(SchemaField {
            name: name.to_string(),
            shape: FieldShape::String,
        });
        self
    }

    /// Structured-output schema, as accepted by response-schema APIs
    pub fn to_json_schema(&self) -> Value {
        let mut properties = Map::new();
        for field in &self.fields {
            let property = match &field.shape {
                FieldShape::StringArray { max_items: Some(max) } => {
                    json!({ "type": "array", "items": { "type": "string" }, "maxItems": max })
                }
                FieldShape::StringArray { max_items: None } => {
                    json!({ "type": "array", "items": { "type": "string" } })
                }
                FieldShape::String => json!({ "type": "string" }),
            };
            properties.insert(field.name.clone(), property);
        }
        let required: Vec<&str> = self.fields.iter().map(|f| f.name.as_str()).collect();
        json!({ "type": "object", "properties": properties, "required": required })
    }

    /// Plain-text description of the expected JSON, for prompt-only providers
    pub fn describe(&self) -> String {
        let parts: Vec<String> = self
            .fields
            .iter()
            .map(|field| match &field.shape {
                FieldShape::StringArray { max_items: Some(max) } => {
                    format!("\"{}\": [up to {} strings]", field.name, max)
                }
                FieldShape::StringArray { max_items: None } => format!("\"{}\": [strings]", field.name),
                FieldShape::String => format!("\"{}\": \"string\"", field.name),
            })
            .collect();
        format!("{{{}}}", parts.join(", "))
    }
}

/// A role-tagged prompt plus the output contract
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system: String,
    pub user: String,
    pub schema: OutputSchema,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>, schema: OutputSchema) -> Self {
        GenerationRequest {
            system: system.into(),
            user: user.into(),
            schema,
            max_tokens: 2048,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// The parsed JSON object returned by a provider.
///
/// Accessors never trust the model: missing fields are empty and callers
/// clamp every string to its destination limit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeneratedContent {
    fields: Map<String, Value>,
}

impl GeneratedContent {
    /// Parse model text, tolerating a fenced code block around the JSON
    pub fn from_text(text: &str) -> Result<Self, GenerationError> {
        let trimmed = text.trim();
        let value: Value = match serde_json::from_str(trimmed) {
            Ok(value) => value,
            Err(_) => {
                let body = strip_code_fence(trimmed);
                serde_json::from_str(body).map_err(|e| {
                    GenerationError::MalformedOutput(format!("{}: {}", e, preview(body)))
                })?
            }
        };
        match value {
            Value::Object(fields) => Ok(GeneratedContent { fields }),
            other => Err(GenerationError::MalformedOutput(format!(
                "expected a JSON object, got {}",
                preview(&other.to_string())
            ))),
        }
    }

    pub fn from_value(fields: Map<String, Value>) -> Self {
        GeneratedContent { fields }
    }

    /// Items of an array field as strings; a missing field is empty
    pub fn strings(&self, name: &str) -> Vec<String> {
        match self.fields.get(name) {
            Some(Value::Array(items)) => items.iter().map(value_to_string).collect(),
            Some(Value::Null) | None => Vec::new(),
            Some(other) => vec![value_to_string(other)],
        }
    }

    /// A string field; a missing field is empty
    pub fn string(&self, name: &str) -> String {
        self.fields.get(name).map(value_to_string).unwrap_or_default()
    }
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    if text.chars().count() > MAX {
        format!("{}...", text.chars().take(MAX).collect::<String>())
    } else {
        text.to_string()
    }
}

/// Strip a Markdown code fence (optionally tagged, e.g. ```json) around model output
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after = &trimmed[start + 3..];
    let tag_len = after
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    let body = &after[tag_len..];
    match body.find("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Truncate to the destination field's limit
pub fn clamp(text: &str, max_len: usize) -> String {
    crate::models::truncate_chars(text, max_len)
}

/// Slot `index` of a generated list, empty when the model returned fewer items
pub fn slot(items: &[String], index: usize, max_len: usize) -> String {
    items
        .get(index)
        .map(|s| clamp(s, max_len))
        .unwrap_or_default()
}

/// Capability shared by every provider adapter
#[async_trait]
pub trait GenerationService: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent, GenerationError>;
}

/// Build the adapter for the configured provider
pub fn client_for(config: &ApiConfig) -> Result<Box<dyn GenerationService>, GenerationError> {
    let provider = Provider::from_id(&config.provider)
        .ok_or_else(|| GenerationError::UnsupportedProvider(config.provider.clone()))?;
    if config.key.is_empty() {
        return Err(GenerationError::MissingCredential);
    }
    Ok(match provider {
        Provider::Gemini => Box::new(GeminiClient::new(&config.key)),
        Provider::Claude => Box::new(ClaudeClient::new(&config.key)),
    })
}

pub(crate) fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_else(|e| {
            warn!("Failed to build HTTP client with timeout, using defaults: {}", e);
            reqwest::Client::new()
        })
}

/// Resolve `path` under `base`, appending rather than replacing the last segment
pub(crate) fn endpoint(base: &str, path: &str) -> Result<Url, GenerationError> {
    let mut base = base.to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    Ok(Url::parse(&base)?.join(path)?)
}

/// POST a JSON body and return the JSON response.
///
/// Non-2xx responses keep the raw body for diagnosis.
pub(crate) async fn post_json(
    client: &reqwest::Client,
    provider: Provider,
    url: Url,
    headers: &[(&str, &str)],
    body: &Value,
) -> Result<Value, GenerationError> {
    // Random request id for tracking in logs
    let req_id: String = thread_rng()
        .sample_iter(&Alphanumeric)
        .take(6)
        .map(char::from)
        .collect();

    info!("[{}] Sending request to {} at {}", req_id, provider, url.path());
    let start_time = Instant::now();

    let mut builder = client.post(url).json(body);
    for (name, value) in headers {
        builder = builder.header(*name, *value);
    }

    let response = builder.send().await.map_err(|e| {
        warn!("[{}] Request failed after {:?}", req_id, start_time.elapsed());
        GenerationError::Network {
            provider: provider.label(),
            message: e.to_string(),
        }
    })?;

    let status = response.status();
    info!("[{}] API response received - Status: {} in {:?}", req_id, status, start_time.elapsed());

    let text = response.text().await.map_err(|e| GenerationError::Network {
        provider: provider.label(),
        message: format!("failed to read response body: {}", e),
    })?;

    if !status.is_success() {
        return Err(GenerationError::Http {
            provider: provider.label(),
            status: status.as_u16(),
            body: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| {
        GenerationError::MalformedOutput(format!("{} response is not JSON: {}", provider, e))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fences() {
        assert_eq!(strip_code_fence("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("Here you go:\n```\n{\"a\": 1}\n```\nThanks"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("```json {\"a\": 1}```"), "{\"a\": 1}");
        assert_eq!(strip_code_fence("  {\"a\": 1} "), "{\"a\": 1}");
    }

    #[test]
    fn backticks_inside_unfenced_json_survive() {
        let content = GeneratedContent::from_text(r#"{"title": "Use ```code``` blocks"}"#).unwrap();
        assert_eq!(content.string("title"), "Use ```code``` blocks");

        let fenced = GeneratedContent::from_text("```json\n{\"title\": \"Plain\"}\n```").unwrap();
        assert_eq!(fenced.string("title"), "Plain");
    }

    #[test]
    fn content_accessors_tolerate_odd_output() {
        let content =
            GeneratedContent::from_text(r#"{"headlines": ["One", 2, null], "title": "T", "paths": "solo"}"#).unwrap();
        assert_eq!(content.strings("headlines"), vec!["One", "2", ""]);
        assert_eq!(content.strings("paths"), vec!["solo"]);
        assert!(content.strings("descriptions").is_empty());
        assert_eq!(content.string("title"), "T");
        assert_eq!(content.string("missing"), "");
    }

    #[test]
    fn non_object_output_is_malformed() {
        assert!(matches!(
            GeneratedContent::from_text("[1, 2]"),
            Err(GenerationError::MalformedOutput(_))
        ));
        assert!(matches!(
            GeneratedContent::from_text("not json"),
            Err(GenerationError::MalformedOutput(_))
        ));
    }

    #[test]
    fn slots_are_clamped_and_padded() {
        let items = vec!["a".repeat(40)];
        assert_eq!(slot(&items, 0, 30).len(), 30);
        assert_eq!(slot(&items, 5, 30), "");
    }

    #[test]
    fn schema_renders_both_ways() {
        let schema = OutputSchema::new().array("headlines", Some(15)).string("title");
        let json = schema.to_json_schema();
        assert_eq!(json["properties"]["headlines"]["maxItems"], 15);
        assert_eq!(json["properties"]["title"]["type"], "string");
        assert_eq!(json["required"], json!(["headlines", "title"]));
        assert_eq!(schema.describe(), r#"{"headlines": [up to 15 strings], "title": "string"}"#);
    }

    #[test]
    fn client_selection() {
        let mut config = ApiConfig {
            provider: "claude-sonnet-4".to_string(),
            key: "k".to_string(),
        };
        assert_eq!(client_for(&config).unwrap().provider(), Provider::Claude);

        config.key.clear();
        assert!(matches!(client_for(&config), Err(GenerationError::MissingCredential)));

        config.provider = "gpt".to_string();
        assert!(matches!(client_for(&config), Err(GenerationError::UnsupportedProvider(_))));
    }
}
