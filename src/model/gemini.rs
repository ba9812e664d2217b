use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use super::error::ServiceError;
use super::service::{GenerateRequest, GenerateResponse, ModelService};
use crate::config::{ModelBackend, ModelConfig};
use crate::conversation::{Part, Role, Turn};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
const GEMINI_API_VERSION: &str = "v1beta";
const VERTEX_API_VERSION: &str = "v1";

/// Where requests are sent and how they are addressed
#[derive(Debug, Clone)]
enum Target {
    Gemini {
        base_url: String,
        api_version: String,
    },
    Vertex {
        base_url: String,
        api_version: String,
        project: String,
        location: String,
    },
}

/// Client for the `generateContent` endpoint (Gemini API or Vertex AI)
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: Client,
    target: Target,
    api_key: Option<String>,
    bearer_token: Option<String>,
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<WireGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireContent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<WirePart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<WireBlob>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireBlob {
    mime_type: String,
    /// Base64-encoded bytes
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireGenerationConfig {
    response_mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_schema: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    candidates: Vec<WireCandidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCandidate {
    content: Option<WireContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WireErrorBody {
    error: WireErrorDetail,
}

#[derive(Debug, Deserialize)]
struct WireErrorDetail {
    #[serde(default)]
    message: String,
}

// ============================================================================
// Conversion
// ============================================================================

fn convert_part(part: &Part) -> WirePart {
    match part {
        Part::Text(text) => WirePart {
            text: Some(text.clone()),
            inline_data: None,
        },
        Part::Blob { mime_type, data } => WirePart {
            text: None,
            inline_data: Some(WireBlob {
                mime_type: mime_type.clone(),
                data: base64::engine::general_purpose::STANDARD.encode(data),
            }),
        },
    }
}

fn convert_turn(turn: &Turn) -> WireContent {
    let role = match turn.role() {
        Role::User | Role::System => "user",
        Role::Model => "model",
    };

    WireContent {
        role: Some(role.to_string()),
        parts: turn.parts().iter().map(convert_part).collect(),
    }
}

fn build_wire_request(request: &GenerateRequest) -> WireRequest {
    // System turns are not valid in `contents`; fold them into the instruction
    let mut instruction_parts: Vec<WirePart> = request
        .system_instruction
        .iter()
        .map(|text| WirePart {
            text: Some(text.clone()),
            inline_data: None,
        })
        .collect();

    let mut contents = Vec::with_capacity(request.contents.len());
    for turn in &request.contents {
        if turn.role() == Role::System {
            instruction_parts.extend(turn.parts().iter().map(convert_part));
        } else {
            contents.push(convert_turn(turn));
        }
    }

    let system_instruction = if instruction_parts.is_empty() {
        None
    } else {
        Some(WireContent {
            role: None,
            parts: instruction_parts,
        })
    };

    let generation_config = request
        .response_format
        .as_ref()
        .map(|format| WireGenerationConfig {
            response_mime_type: format.mime_type.clone(),
            response_schema: format.schema.clone(),
        });

    WireRequest {
        contents,
        system_instruction,
        generation_config,
    }
}

/// JSON body sent to `generateContent` for a request
pub fn request_body(request: &GenerateRequest) -> Result<serde_json::Value, ServiceError> {
    Ok(serde_json::to_value(build_wire_request(request))?)
}

/// Extract the first candidate's text from a `generateContent` response body
pub fn decode_response(body: &str) -> Result<GenerateResponse, ServiceError> {
    let response: WireResponse = serde_json::from_str(body)?;

    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or(ServiceError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect()
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(ServiceError::EmptyResponse);
    }

    Ok(GenerateResponse {
        text,
        finish_reason: candidate.finish_reason,
    })
}

/// Build the error for a non-success response, using the API's own message when present
pub fn error_for_status(status: u16, body: &str) -> ServiceError {
    let message = serde_json::from_str::<WireErrorBody>(body)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {}", status));

    ServiceError::from_status(status, message)
}

// ============================================================================
// Client
// ============================================================================

impl GeminiClient {
    /// Create a client from model configuration
    pub fn new(config: &ModelConfig) -> Result<Self, ServiceError> {
        let target = match config.backend {
            ModelBackend::Gemini => Target::Gemini {
                base_url: config
                    .base_url
                    .clone()
                    .unwrap_or_else(|| GEMINI_BASE_URL.to_string()),
                api_version: config
                    .api_version
                    .clone()
                    .unwrap_or_else(|| GEMINI_API_VERSION.to_string()),
            },
            ModelBackend::Vertex => {
                let project = config.project.clone().ok_or_else(|| {
                    ServiceError::Config("Vertex AI backend requires model.project".to_string())
                })?;
                let location = config.location.clone().ok_or_else(|| {
                    ServiceError::Config("Vertex AI backend requires model.location".to_string())
                })?;
                Target::Vertex {
                    base_url: config
                        .base_url
                        .clone()
                        .unwrap_or_else(|| format!("https://{}-aiplatform.googleapis.com", location)),
                    api_version: config
                        .api_version
                        .clone()
                        .unwrap_or_else(|| VERTEX_API_VERSION.to_string()),
                    project,
                    location,
                }
            }
        };

        if config.api_key.is_none() && config.bearer_token.is_none() {
            return Err(ServiceError::Config(
                "no credentials configured; set GEMINI_API_KEY or model.bearer_token".to_string(),
            ));
        }

        let mut builder = Client::builder()
            .user_agent(concat!("tranquility/", env!("CARGO_PKG_VERSION")));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = reqwest::Proxy::all(proxy_url).map_err(|e| {
                ServiceError::Config(format!("invalid proxy URL {}: {}", proxy_url, e))
            })?;
            builder = builder.proxy(proxy);
        }

        if let Some(cert_path) = &config.tls_cert_path {
            let pem = std::fs::read(cert_path).map_err(|e| {
                ServiceError::Config(format!("failed to read certificate {}: {}", cert_path, e))
            })?;
            let cert = reqwest::Certificate::from_pem(&pem).map_err(|e| {
                ServiceError::Config(format!("invalid certificate {}: {}", cert_path, e))
            })?;
            builder = builder.add_root_certificate(cert);
        }

        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let http = builder.build()?;

        Ok(Self {
            http,
            target,
            api_key: config.api_key.clone(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    /// Full `generateContent` URL for a model
    pub fn endpoint_url(&self, model: &str) -> String {
        match &self.target {
            Target::Gemini {
                base_url,
                api_version,
            } => format!(
                "{}/{}/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                api_version,
                model
            ),
            Target::Vertex {
                base_url,
                api_version,
                project,
                location,
            } => format!(
                "{}/{}/projects/{}/locations/{}/publishers/google/models/{}:generateContent",
                base_url.trim_end_matches('/'),
                api_version,
                project,
                location,
                model
            ),
        }
    }
}

#[async_trait::async_trait]
impl ModelService for GeminiClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, ServiceError> {
        let url = self.endpoint_url(&request.model);
        let body = build_wire_request(request);

        debug!(
            "POST {} ({} contents, system instruction: {})",
            url,
            body.contents.len(),
            body.system_instruction.is_some()
        );

        let mut builder = self.http.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            builder = builder.header("x-goog-api-key", key);
        }
        if let Some(token) = &self.bearer_token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(error_for_status(status.as_u16(), &text));
        }

        let reply = decode_response(&text)?;
        info!(
            "Received {} chars from {} (finish reason: {})",
            reply.text.len(),
            request.model,
            reply.finish_reason.as_deref().unwrap_or("unknown")
        );

        Ok(reply)
    }

    fn name(&self) -> &str {
        match self.target {
            Target::Gemini { .. } => "gemini",
            Target::Vertex { .. } => "vertex-ai",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(backend: ModelBackend) -> ModelConfig {
        ModelConfig {
            backend,
            api_key: Some("test-key".to_string()),
            project: Some("demo-project".to_string()),
            location: Some("us-central1".to_string()),
            ..ModelConfig::default()
        }
    }

    #[test]
    fn gemini_endpoint_url() {
        let client = GeminiClient::new(&config(ModelBackend::Gemini)).unwrap();
        assert_eq!(
            client.endpoint_url("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(client.name(), "gemini");
    }

    #[test]
    fn vertex_endpoint_url() {
        let cfg = config(ModelBackend::Vertex);
        let client = GeminiClient::new(&cfg).unwrap();
        assert_eq!(
            client.endpoint_url("gemini-2.5-flash"),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/demo-project/locations/us-central1/publishers/google/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn vertex_defaults_to_v1() {
        let cfg = ModelConfig {
            backend: ModelBackend::Vertex,
            bearer_token: Some("token".to_string()),
            project: Some("p".to_string()),
            location: Some("us-central1".to_string()),
            ..ModelConfig::default()
        };
        let client = GeminiClient::new(&cfg).unwrap();
        assert_eq!(
            client.endpoint_url("gemini-2.5-flash"),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/p/locations/us-central1/publishers/google/models/gemini-2.5-flash:generateContent"
        );
        assert_eq!(client.name(), "vertex-ai");
    }

    #[test]
    fn explicit_api_version_wins() {
        let mut cfg = config(ModelBackend::Vertex);
        cfg.api_version = Some("v1beta1".to_string());
        let client = GeminiClient::new(&cfg).unwrap();
        assert!(client
            .endpoint_url("m")
            .starts_with("https://us-central1-aiplatform.googleapis.com/v1beta1/projects/"));
    }

    #[test]
    fn base_url_override_drops_trailing_slash() {
        let mut cfg = config(ModelBackend::Gemini);
        cfg.base_url = Some("https://gateway.example.com/".to_string());
        let client = GeminiClient::new(&cfg).unwrap();
        assert!(client
            .endpoint_url("m")
            .starts_with("https://gateway.example.com/v1beta/models/m"));
    }

    #[test]
    fn vertex_requires_project() {
        let mut cfg = config(ModelBackend::Vertex);
        cfg.project = None;
        assert!(matches!(
            GeminiClient::new(&cfg),
            Err(ServiceError::Config(_))
        ));
    }

    #[test]
    fn missing_credentials_rejected() {
        let mut cfg = config(ModelBackend::Gemini);
        cfg.api_key = None;
        assert!(matches!(
            GeminiClient::new(&cfg),
            Err(ServiceError::Config(_))
        ));
    }
}
