use async_trait::async_trait;
use rsa_builder::error::GenerationError;
use rsa_builder::generation::{GeneratedContent, GenerationRequest, GenerationService, Provider};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

/// In-process generation service replaying canned replies in order
pub struct ScriptedService {
    replies: Mutex<VecDeque<Result<Value, GenerationError>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

#[allow(dead_code)]
impl ScriptedService {
    pub fn new(replies: Vec<Result<Value, GenerationError>>) -> Self {
        ScriptedService {
            replies: Mutex::new(replies.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn replying(reply: Value) -> Self {
        ScriptedService::new(vec![Ok(reply)])
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationService for ScriptedService {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn generate(&self, request: &GenerationRequest) -> Result<GeneratedContent, GenerationError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.replies.lock().unwrap().pop_front() {
            Some(Ok(Value::Object(fields))) => Ok(GeneratedContent::from_value(fields)),
            Some(Ok(other)) => GeneratedContent::from_text(&other.to_string()),
            Some(Err(e)) => Err(e),
            None => Err(GenerationError::MalformedOutput("no scripted reply left".to_string())),
        }
    }
}

#[allow(dead_code)]
pub fn http_error(status: u16) -> GenerationError {
    GenerationError::Http {
        provider: "Gemini",
        status,
        body: "quota exceeded".to_string(),
    }
}
