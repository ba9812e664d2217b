use super::prompts::SessionPrompts;
use super::turn::{Transcript, Turn};
use crate::audio::AudioClip;
use crate::model::{GenerateRequest, ModelService, ServiceError};
use std::io::Write;
use std::sync::Arc;
use tracing::{error, info};

/// Result of a two-turn analysis session
#[derive(Debug)]
pub enum SessionOutcome {
    /// Both turns succeeded
    Completed { analysis: String, outline: String },
    /// The voice analysis failed; the outline was never requested
    AnalysisFailed { error: ServiceError },
    /// The voice analysis succeeded but the outline failed
    OutlineFailed { analysis: String, error: ServiceError },
}

impl SessionOutcome {
    pub fn analysis(&self) -> Option<&str> {
        match self {
            SessionOutcome::Completed { analysis, .. }
            | SessionOutcome::OutlineFailed { analysis, .. } => Some(analysis),
            SessionOutcome::AnalysisFailed { .. } => None,
        }
    }

    pub fn outline(&self) -> Option<&str> {
        match self {
            SessionOutcome::Completed { outline, .. } => Some(outline),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ServiceError> {
        match self {
            SessionOutcome::Completed { .. } => None,
            SessionOutcome::AnalysisFailed { error }
            | SessionOutcome::OutlineFailed { error, .. } => Some(error),
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, SessionOutcome::Completed { .. })
    }
}

/// Build a user turn from a prompt and an optional audio attachment
pub fn build_user_turn(text: impl Into<String>, audio: Option<&AudioClip>) -> Turn {
    match audio {
        Some(clip) => Turn::user_with_blob(text, clip.mime_type.clone(), clip.bytes.clone()),
        None => Turn::user(text),
    }
}

/// Send the prior transcript plus a new turn and return the model's reply turn
pub async fn send_turn(
    service: &dyn ModelService,
    model: &str,
    transcript: &Transcript,
    new_turn: &Turn,
    system_prompt: &str,
) -> Result<Turn, ServiceError> {
    let mut contents: Vec<Turn> = transcript.turns().to_vec();
    contents.push(new_turn.clone());

    let request = GenerateRequest::new(model, contents).with_system_instruction(system_prompt);

    info!(
        "Sending turn to {} ({} prior turns, {} new parts)",
        service.name(),
        transcript.len(),
        new_turn.parts().len()
    );

    let response = service.generate(&request).await?;

    Ok(Turn::model(response.text))
}

/// A two-turn emotional analysis conversation over one audio clip
pub struct ConversationSession {
    /// Session identifier for logs
    id: String,

    /// Remote model service
    service: Arc<dyn ModelService>,

    /// Model identifier passed on every request
    model: String,

    /// System, analysis and outline prompts
    prompts: SessionPrompts,

    /// Turns exchanged so far (system prompt excluded)
    transcript: Transcript,
}

impl ConversationSession {
    pub fn new(
        service: Arc<dyn ModelService>,
        model: impl Into<String>,
        prompts: SessionPrompts,
    ) -> Self {
        let id = format!("session-{}", uuid::Uuid::new_v4());
        info!("Creating conversation session: {}", id);

        Self {
            id,
            service,
            model: model.into(),
            prompts,
            transcript: Transcript::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Send one user turn; on success record it together with the reply
    async fn exchange(&mut self, turn: Turn) -> Result<String, ServiceError> {
        let reply = send_turn(
            self.service.as_ref(),
            &self.model,
            &self.transcript,
            &turn,
            &self.prompts.system,
        )
        .await?;

        let text = reply.text();
        self.transcript.push(turn);
        self.transcript.push(reply);

        Ok(text)
    }

    /// Run the voice analysis and then the emotional outline, printing each reply to `out`
    ///
    /// Service failures are reported to `out` and in the returned outcome;
    /// only failures writing to `out` are returned as errors.
    pub async fn run<W: Write>(
        &mut self,
        audio: &AudioClip,
        out: &mut W,
    ) -> std::io::Result<SessionOutcome> {
        info!(
            "Session {}: analyzing {} bytes of {}",
            self.id,
            audio.len(),
            audio.mime_type
        );

        let first = build_user_turn(self.prompts.analysis.clone(), Some(audio));
        let analysis = match self.exchange(first).await {
            Ok(text) => text,
            Err(e) => {
                error!("Session {}: voice analysis failed: {}", self.id, e);
                writeln!(out, "Voice analysis failed: {}", e)?;
                return Ok(SessionOutcome::AnalysisFailed { error: e });
            }
        };
        writeln!(out, "{}", analysis)?;

        let second = build_user_turn(self.prompts.outline.clone(), None);
        let outline = match self.exchange(second).await {
            Ok(text) => text,
            Err(e) => {
                error!("Session {}: emotional outline failed: {}", self.id, e);
                writeln!(out, "Emotional outline failed: {}", e)?;
                return Ok(SessionOutcome::OutlineFailed { analysis, error: e });
            }
        };
        writeln!(out, "{}", outline)?;

        info!(
            "Session {} complete ({} turns recorded)",
            self.id,
            self.transcript.len()
        );

        Ok(SessionOutcome::Completed { analysis, outline })
    }
}
