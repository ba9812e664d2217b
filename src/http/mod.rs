//! HTTP API for the chat frontend
//!
//! This module provides a small REST API:
//! - GET / - Service banner with timestamp
//! - GET /health - Health check
//! - POST /api/chat - Reply to a message with mood detection
//! - POST /api/analyze - Two-turn voice analysis of a base64 audio clip

mod handlers;
mod routes;
mod state;

pub use handlers::{AnalyzeResponse, ChatResponse, ErrorResponse};
pub use routes::create_router;
pub use state::AppState;
