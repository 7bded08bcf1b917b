use super::{GeneratedContent, GenerationRequest, GenerationService, Provider};
use crate::error::GenerationError;
use async_trait::async_trait;
use log::debug;
use serde_json::{json, Value};
use url::Url;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/";
const MODEL: &str = "gemini-2.5-flash";

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// Gemini adapter: the output contract is sent as a response schema
pub struct GeminiClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl GeminiClient {
    pub fn new(api_key: &str) -> Self {
        GeminiClient {
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            client: super::http_client(),
        }
    }

    /// Point the adapter at another host, e.g. a proxy or a test server
    pub fn with_base_url(api_key: &str, base_url: &str) -> Self {
        GeminiClient {
            base_url: base_url.to_string(),
            ..GeminiClient::new(api_key)
        }
    }

    fn endpoint(&self) -> Result<Url, GenerationError> {
        super::endpoint(&self.base_url, &format!("v1beta/models/{}:generateContent", MODEL))
    }
}

/// Request envelope: one text part holding system and user prompts
pub fn request_body(request: &GenerationRequest) -> Value {
    let safety: Vec<Value> = SAFETY_CATEGORIES
        .iter()
        .map(|category| json!({ "category": category, "threshold": "BLOCK_ONLY_HIGH" }))
        .collect();

    json!({
        "contents": [{ "parts": [{ "text": format!("{}\n\n{}", request.system, request.user) }] }],
        "generationConfig": {
            "temperature": 0.7,
            "topP": 0.8,
            "topK": 40,
            "maxOutputTokens": request.max_tokens,
            "responseMimeType": "application/json",
            "responseSchema": request.schema.to_json_schema(),
        },
        "safetySettings": safety,
    })
}

/// Pull the generated text out of a response.
///
/// No candidates, or a candidate without text, is reported as empty content
/// together with whatever feedback the API attached.
pub fn extract_text(response: &Value) -> Result<String, GenerationError> {
    let candidate = match response["candidates"].as_array().and_then(|c| c.first()) {
        Some(candidate) => candidate,
        None => {
            let detail = match response.get("promptFeedback") {
                Some(feedback) => format!("prompt feedback: {}", feedback),
                None => "no candidates returned".to_string(),
            };
            return Err(GenerationError::EmptyContent {
                provider: Provider::Gemini.label(),
                detail,
            });
        }
    };

    match candidate["content"]["parts"][0]["text"].as_str() {
        Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
        _ => {
            let detail = match candidate.get("safetyRatings") {
                Some(ratings) => format!("safety ratings: {}", ratings),
                None => format!(
                    "finish reason: {}",
                    candidate["finishReason"].as_str().unwrap_or("unknown")
                ),
            };
            Err(GenerationError::EmptyContent {
                provider: Provider::Gemini.label(),
                detail,
            })
        }
    }
}

#[async_trait]
impl GenerationService for GeminiClient {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent, GenerationError> {
        let response = super::post_json(
            &self.client,
            Provider::Gemini,
            self.endpoint()?,
            &[("x-goog-api-key", self.api_key.as_str())],
            &request_body(request),
        )
        .await?;

        let text = extract_text(&response)?;
        debug!("Gemini returned {} characters", text.len());
        GeneratedContent::from_text(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::OutputSchema;

    #[test]
    fn body_carries_schema_and_prompt() {
        let request = GenerationRequest::new("sys", "user", OutputSchema::new().string("title"))
            .with_max_tokens(1024);
        let body = request_body(&request);
        assert_eq!(body["contents"][0]["parts"][0]["text"], "sys\n\nuser");
        assert_eq!(body["generationConfig"]["maxOutputTokens"], 1024);
        assert_eq!(body["generationConfig"]["responseSchema"]["required"][0], "title");
        assert_eq!(body["safetySettings"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn text_is_extracted() {
        let response = json!({ "candidates": [{ "content": { "parts": [{ "text": "{\"a\":1}" }] } }] });
        assert_eq!(extract_text(&response).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn missing_candidates_is_empty_content() {
        let response = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        match extract_text(&response) {
            Err(GenerationError::EmptyContent { detail, .. }) => assert!(detail.contains("SAFETY")),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn filtered_candidate_is_empty_content() {
        let response = json!({ "candidates": [{ "finishReason": "SAFETY", "safetyRatings": [] }] });
        assert!(matches!(
            extract_text(&response),
            Err(GenerationError::EmptyContent { .. })
        ));
    }

    #[test]
    fn endpoint_appends_to_base() {
        let client = GeminiClient::with_base_url("k", "http://127.0.0.1:9999/proxy");
        assert_eq!(
            client.endpoint().unwrap().as_str(),
            "http://127.0.0.1:9999/proxy/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }
}
