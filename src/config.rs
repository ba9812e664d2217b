use anyhow::{Context, Result};
use serde::Deserialize;

use crate::conversation::{SessionPrompts, EMOTIONAL_OUTLINE_PROMPT, SYSTEM_PROMPT, VOICE_ANALYSIS_PROMPT};

/// Environment variables prefixed `TRANQUILITY__` override file values
/// (e.g. `TRANQUILITY__MODEL__NAME`)
const ENV_PREFIX: &str = "TRANQUILITY";
const ENV_SEPARATOR: &str = "__";

/// Conventional variable holding the Gemini API key
const API_KEY_VAR: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub session: SessionSettings,
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    /// Public Generative Language API (API key)
    #[default]
    Gemini,
    /// Vertex AI (project + location, bearer token)
    Vertex,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub name: String,
    pub backend: ModelBackend,
    /// Defaults per backend: `v1beta` for Gemini, `v1` for Vertex AI
    pub api_version: Option<String>,
    /// Overrides the backend's default endpoint (e.g. an API gateway)
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub project: Option<String>,
    pub location: Option<String>,
    pub bearer_token: Option<String>,
    pub proxy_url: Option<String>,
    /// PEM file added as a trusted root certificate
    pub tls_cert_path: Option<String>,
    pub request_timeout_secs: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: "gemini-2.5-flash".to_string(),
            backend: ModelBackend::Gemini,
            api_version: None,
            base_url: None,
            api_key: None,
            project: None,
            location: None,
            bearer_token: None,
            proxy_url: None,
            tls_cert_path: None,
            request_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub system_prompt: String,
    pub analysis_prompt: String,
    pub outline_prompt: String,
    /// Forces the media type of analyzed clips instead of detecting it
    pub audio_mime_type: Option<String>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            system_prompt: SYSTEM_PROMPT.to_string(),
            analysis_prompt: VOICE_ANALYSIS_PROMPT.to_string(),
            outline_prompt: EMOTIONAL_OUTLINE_PROMPT.to_string(),
            audio_mime_type: None,
        }
    }
}

impl SessionSettings {
    pub fn prompts(&self) -> SessionPrompts {
        SessionPrompts {
            system: self.system_prompt.clone(),
            analysis: self.analysis_prompt.clone(),
            outline: self.outline_prompt.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
    /// Origins allowed by CORS
    pub allowed_origins: Vec<String>,
    /// Upper bound for request bodies (base64 audio uploads)
    pub max_body_bytes: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3001,
            allowed_origins: vec![
                "http://localhost:5173".to_string(),
                "http://127.0.0.1:5173".to_string(),
                "http://localhost:5174".to_string(),
                "http://127.0.0.1:5174".to_string(),
            ],
            max_body_bytes: 25 * 1024 * 1024,
        }
    }
}

impl Config {
    /// Load configuration from an optional file plus environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR),
            )
            .build()
            .with_context(|| format!("Failed to read configuration from {}", path))?;

        let mut cfg: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;

        // Vertex AI takes a bearer token; only an explicitly configured key is sent there
        if cfg.model.api_key.is_none() && cfg.model.backend == ModelBackend::Gemini {
            cfg.model.api_key = std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty());
        }

        if let Some(cert) = cfg.model.tls_cert_path.take() {
            cfg.model.tls_cert_path = Some(shellexpand::tilde(&cert).into_owned());
        }

        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::path::Path;
    use std::sync::{Mutex, MutexGuard};

    /// Tests that read or write process environment variables hold this lock
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_lock() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_config(dir: &Path, contents: &str) -> String {
        let path = dir.join("tranquility.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", contents).unwrap();
        path.to_str().unwrap().to_string()
    }

    #[test]
    fn defaults_without_file() {
        let _env = env_lock();
        let cfg = Config::load("/nonexistent/tranquility").unwrap();
        assert_eq!(cfg.model.name, "gemini-2.5-flash");
        assert_eq!(cfg.model.backend, ModelBackend::Gemini);
        assert_eq!(cfg.http.port, 3001);
        assert_eq!(cfg.session.system_prompt, SYSTEM_PROMPT);
    }

    #[test]
    fn file_values_override_defaults() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            "[model]\nbackend = \"vertex\"\nproject = \"demo\"\nlocation = \"us-central1\"\ntls_cert_path = \"~/client.pem\"\n\n[http]\nport = 8080",
        );

        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.model.backend, ModelBackend::Vertex);
        assert_eq!(cfg.model.project.as_deref(), Some("demo"));
        assert_eq!(cfg.http.port, 8080);
        assert_eq!(cfg.http.bind, "127.0.0.1");
        assert!(cfg.model.tls_cert_path.unwrap().ends_with("client.pem"));
    }

    #[test]
    fn environment_overrides_file_and_defaults() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "[model]\nname = \"from-file\"\n\n[http]\nport = 8080");

        std::env::set_var("TRANQUILITY__MODEL__NAME", "gemini-2.5-pro");
        std::env::set_var("TRANQUILITY__HTTP__PORT", "4100");
        let loaded = Config::load(&path);
        std::env::remove_var("TRANQUILITY__MODEL__NAME");
        std::env::remove_var("TRANQUILITY__HTTP__PORT");

        let cfg = loaded.unwrap();
        assert_eq!(cfg.model.name, "gemini-2.5-pro");
        assert_eq!(cfg.http.port, 4100);
        assert_eq!(cfg.http.bind, "127.0.0.1");
    }

    #[test]
    fn api_key_variable_fills_only_missing_gemini_key() {
        let _env = env_lock();
        let dir = tempfile::tempdir().unwrap();
        let explicit = write_config(dir.path(), "[model]\napi_key = \"from-file\"");
        let vertex_dir = tempfile::tempdir().unwrap();
        let vertex = write_config(
            vertex_dir.path(),
            "[model]\nbackend = \"vertex\"\nproject = \"demo\"\nlocation = \"us-central1\"",
        );

        std::env::set_var(API_KEY_VAR, "from-env");
        let unset = Config::load("/nonexistent/tranquility");
        let set = Config::load(&explicit);
        let vertex = Config::load(&vertex);
        std::env::remove_var(API_KEY_VAR);

        assert_eq!(unset.unwrap().model.api_key.as_deref(), Some("from-env"));
        assert_eq!(set.unwrap().model.api_key.as_deref(), Some("from-file"));
        assert_eq!(vertex.unwrap().model.api_key, None);
    }

    #[test]
    fn session_prompts_follow_settings() {
        let settings = SessionSettings {
            analysis_prompt: "listen".to_string(),
            ..SessionSettings::default()
        };
        let prompts = settings.prompts();
        assert_eq!(prompts.analysis, "listen");
        assert_eq!(prompts.outline, EMOTIONAL_OUTLINE_PROMPT);
    }
}
