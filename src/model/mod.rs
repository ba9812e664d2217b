//! Model service seam
//!
//! `ModelService` is the only way the rest of the crate talks to the remote
//! generative-language API. `GeminiClient` is the production implementation.

pub mod error;
pub mod gemini;
mod service;

pub use error::ServiceError;
pub use gemini::GeminiClient;
pub use service::{GenerateRequest, GenerateResponse, ModelService, ResponseFormat};
