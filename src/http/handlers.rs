use super::state::AppState;
use crate::audio::AudioClip;
use crate::conversation::{ConversationSession, SessionOutcome};
use crate::mood::detect_mood;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use base64::Engine;
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

/// Media type assumed for uploads that do not name one (browser recorders emit WebM)
const DEFAULT_UPLOAD_MIME_TYPE: &str = "audio/webm";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub mood: String,
    pub intensity: u8,
}

#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub session_id: String,
    pub analysis: String,
    pub outline: String,
    pub transcript_turns: usize,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
}

impl ErrorResponse {
    fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            analysis: None,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /
/// Service banner
pub async fn root_status() -> impl IntoResponse {
    Json(StatusResponse {
        status: "Tranquility backend is running".to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// POST /api/chat
/// Reply to a chat message and report the detected mood
pub async fn chat(State(state): State<AppState>, Json(body): Json<Value>) -> impl IntoResponse {
    let message = match body.get("message").and_then(Value::as_str) {
        Some(m) if !m.is_empty() => m.to_string(),
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(
                    "Missing 'message' string in request body",
                )),
            )
                .into_response();
        }
    };

    info!("POST /api/chat ({} chars)", message.len());

    let reply = detect_mood(state.service.as_ref(), &state.model, &message).await;

    if reply.text.trim().is_empty() {
        error!("Empty reply from model service");
        return (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::new("Empty response from model service")),
        )
            .into_response();
    }

    (
        StatusCode::OK,
        Json(ChatResponse {
            reply: reply.text,
            mood: reply.mood,
            intensity: reply.rage_meter,
        }),
    )
        .into_response()
}

/// POST /api/analyze
/// Run the two-turn voice analysis on an uploaded clip
///
/// Body: `{"audio": "<base64>", "mimeType": "audio/ogg"}`; the media type
/// (also accepted as `mime_type`) defaults to audio/webm.
pub async fn analyze(State(state): State<AppState>, Json(body): Json<Value>) -> impl IntoResponse {
    let encoded = match body.get("audio").and_then(Value::as_str) {
        Some(a) if !a.is_empty() => a,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Missing 'audio' base64 string in request body")),
            )
                .into_response();
        }
    };

    let bytes = match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(b) if !b.is_empty() => b,
        Ok(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("Audio payload is empty")),
            )
                .into_response();
        }
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new(format!("Invalid base64 audio: {}", e))),
            )
                .into_response();
        }
    };

    let mime_type = match body.get("mimeType").or_else(|| body.get("mime_type")) {
        None | Some(Value::Null) => DEFAULT_UPLOAD_MIME_TYPE.to_string(),
        Some(Value::String(m)) if !m.is_empty() => m.clone(),
        Some(_) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse::new("'mimeType' must be a non-empty string")),
            )
                .into_response();
        }
    };
    let clip = AudioClip::new(bytes, mime_type);

    let mut session =
        ConversationSession::new(state.service.clone(), state.model.clone(), state.prompts.clone());
    let mut output = Vec::new();

    let outcome = match session.run(&clip, &mut output).await {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Failed to record session output: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Server error processing your request")),
            )
                .into_response();
        }
    };

    match outcome {
        SessionOutcome::Completed { analysis, outline } => (
            StatusCode::OK,
            Json(AnalyzeResponse {
                session_id: session.id().to_string(),
                analysis,
                outline,
                transcript_turns: session.transcript().len(),
            }),
        )
            .into_response(),
        SessionOutcome::AnalysisFailed { error } => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse::new(format!(
                "Voice analysis failed: {}",
                error
            ))),
        )
            .into_response(),
        SessionOutcome::OutlineFailed { analysis, error } => (
            StatusCode::BAD_GATEWAY,
            Json(ErrorResponse {
                error: format!("Emotional outline failed: {}", error),
                analysis: Some(analysis),
            }),
        )
            .into_response(),
    }
}
