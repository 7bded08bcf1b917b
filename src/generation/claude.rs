use super::{GeneratedContent, GenerationRequest, GenerationService, Provider};
use crate::error::GenerationError;
use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/";
const MODEL: &str = "claude-sonnet-4-20250514";
const API_VERSION: &str = "2023-06-01";

/// Claude adapter: the output contract travels in the system prompt and the
/// reply is expected as JSON, possibly inside a fenced block
pub struct ClaudeClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl ClaudeClient {
    pub fn new(api_key: &str) -> Self {
        ClaudeClient {
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: super::http_client(),
        }
    }

    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        ClaudeClient {
            base_url: base_url.to_string(),
            ..ClaudeClient::new(api_key)
        }
    }

    fn endpoint(&self) -> Result<Url, GenerationError> {
        super::endpoint(&self.base_url, "v1/messages")
    }
}

pub fn request_body(request: &GenerationRequest) -> Value {
    let system = format!(
        "{}\n\nReturn ONLY valid JSON in this exact structure: {}",
        request.system,
        request.schema.describe()
    );
    json!({
        "model": MODEL,
        "max_tokens": request.max_tokens,
        "system": system,
        "messages": [{ "role": "user", "content": request.user }],
    })
}

/// The first text block of a messages response
pub fn extract_text(response: &Value) -> Result<String, GenerationError> {
    match response["content"][0]["text"].as_str() {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => Err(GenerationError::EmptyContent {
            provider: Provider::Claude.label(),
            detail: format!(
                "stop reason: {}",
                response["stop_reason"].as_str().unwrap_or("unknown")
            ),
        }),
    }
}

#[async_trait]
impl GenerationService for ClaudeClient {
    fn provider(&self) -> Provider {
        Provider::Claude
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent, GenerationError> {
        let response = super::post_json(
            &self.client,
            Provider::Claude,
            self.endpoint()?,
            &[
                ("x-api-key", self.api_key.as_str()),
                ("anthropic-version", API_VERSION),
            ],
            &request_body(request),
        )
        .await?;

        let text = extract_text(&response)?;
        debug!("Claude returned {} characters", text.len());
        GeneratedContent::from_text(&text)
    }
}
