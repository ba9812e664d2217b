use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Speaker of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
    System,
}

/// One piece of turn content
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text(String),
    /// Binary payload tagged with a media type (e.g. "audio/mp3")
    Blob { mime_type: String, data: Vec<u8> },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn blob(mime_type: impl Into<String>, data: Vec<u8>) -> Self {
        Part::Blob {
            mime_type: mime_type.into(),
            data,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text(text) => Some(text),
            Part::Blob { .. } => None,
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(self, Part::Blob { .. })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TurnError {
    #[error("a turn must contain at least one part")]
    Empty,

    #[error("binary parts are only allowed in user turns, not {0:?} turns")]
    BlobOutsideUserTurn(Role),
}

/// One message in a conversation
///
/// Always holds at least one part; binary parts only appear in user turns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    parts: Vec<Part>,
}

impl Turn {
    pub fn new(role: Role, parts: Vec<Part>) -> Result<Self, TurnError> {
        if parts.is_empty() {
            return Err(TurnError::Empty);
        }
        if role != Role::User && parts.iter().any(Part::is_blob) {
            return Err(TurnError::BlobOutsideUserTurn(role));
        }
        Ok(Self { role, parts })
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text)],
        }
    }

    /// User turn with a text prompt followed by one binary attachment
    pub fn user_with_blob(
        text: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            role: Role::User,
            parts: vec![Part::text(text), Part::blob(mime_type, data)],
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: Role::Model,
            parts: vec![Part::text(text)],
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            parts: vec![Part::text(text)],
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Concatenated text parts
    pub fn text(&self) -> String {
        self.parts.iter().filter_map(Part::as_text).collect()
    }

    pub fn has_blob(&self) -> bool {
        self.parts.iter().any(Part::is_blob)
    }
}

/// Ordered, append-only conversation history
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl<'a> IntoIterator for &'a Transcript {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_turn_rejected() {
        assert_eq!(Turn::new(Role::User, vec![]), Err(TurnError::Empty));
    }

    #[test]
    fn audio_only_in_user_turns() {
        let audio = Part::blob("audio/mp3", vec![1, 2, 3]);
        assert!(Turn::new(Role::User, vec![Part::text("hi"), audio.clone()]).is_ok());
        assert_eq!(
            Turn::new(Role::Model, vec![audio]),
            Err(TurnError::BlobOutsideUserTurn(Role::Model))
        );
    }

    #[test]
    fn text_skips_blobs() {
        let turn = Turn::new(
            Role::User,
            vec![
                Part::text("analyze "),
                Part::blob("audio/wav", vec![0; 4]),
                Part::text("this"),
            ],
        )
        .unwrap();
        assert_eq!(turn.text(), "analyze this");
        assert!(turn.has_blob());
    }

    #[test]
    fn transcript_keeps_insertion_order() {
        let mut transcript = Transcript::new();
        transcript.push(Turn::user("first"));
        transcript.push(Turn::model("second"));

        let texts: Vec<String> = transcript.iter().map(Turn::text).collect();
        assert_eq!(texts, vec!["first", "second"]);
        assert_eq!(transcript.last().map(Turn::role), Some(Role::Model));
    }
}
