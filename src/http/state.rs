use crate::config::Config;
use crate::conversation::SessionPrompts;
use crate::model::ModelService;
use std::sync::Arc;

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Model service shared by every request
    pub service: Arc<dyn ModelService>,

    /// Model identifier passed on every request
    pub model: String,

    /// Prompts for `/api/analyze` sessions
    pub prompts: SessionPrompts,

    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,

    /// Upper bound for request bodies
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(service: Arc<dyn ModelService>, config: &Config) -> Self {
        Self {
            service,
            model: config.model.name.clone(),
            prompts: config.session.prompts(),
            allowed_origins: config.http.allowed_origins.clone(),
            max_body_bytes: config.http.max_body_bytes,
        }
    }
}
