//! Conversation session management
//!
//! This module provides the `ConversationSession` abstraction that manages:
//! - Turn and transcript bookkeeping
//! - Replaying the full history to the model service on each call
//! - The fixed two-turn voice analysis / emotional outline exchange

pub mod prompts;
mod session;
mod turn;

pub use prompts::{SessionPrompts, EMOTIONAL_OUTLINE_PROMPT, SYSTEM_PROMPT, VOICE_ANALYSIS_PROMPT};
pub use session::{build_user_turn, send_turn, ConversationSession, SessionOutcome};
pub use turn::{Part, Role, Transcript, Turn, TurnError};
