use super::error::ServiceError;
use crate::conversation::Turn;

/// Constrains the shape of the model's reply
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseFormat {
    /// e.g. "application/json"
    pub mime_type: String,
    /// Optional schema the reply must follow
    pub schema: Option<serde_json::Value>,
}

impl ResponseFormat {
    pub fn json(schema: serde_json::Value) -> Self {
        Self {
            mime_type: "application/json".to_string(),
            schema: Some(schema),
        }
    }
}

/// A single generation request: the conversation so far plus configuration
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// Model identifier (e.g. "gemini-2.5-flash")
    pub model: String,
    /// Ordered turns, oldest first
    pub contents: Vec<Turn>,
    /// System prompt, sent as configuration rather than as a turn
    pub system_instruction: Option<String>,
    pub response_format: Option<ResponseFormat>,
}

impl GenerateRequest {
    pub fn new(model: impl Into<String>, contents: Vec<Turn>) -> Self {
        Self {
            model: model.into(),
            contents,
            system_instruction: None,
            response_format: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    pub fn with_response_format(mut self, format: ResponseFormat) -> Self {
        self.response_format = Some(format);
        self
    }
}

/// The model's generated reply
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateResponse {
    pub text: String,
    pub finish_reason: Option<String>,
}

/// Remote text/audio understanding service
///
/// Implementations:
/// - `GeminiClient`: Gemini API or Vertex AI over HTTPS
/// - test doubles that record requests
#[async_trait::async_trait]
pub trait ModelService: Send + Sync {
    /// Generate a reply for the given request
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ServiceError>;

    /// Service name for logging
    fn name(&self) -> &str;
}
