pub mod audio;
pub mod config;
pub mod conversation;
pub mod http;
pub mod model;
pub mod mood;

pub use audio::{load_audio, load_audio_or_placeholder, AudioClip, AudioError, LoadedAudio};
pub use config::Config;
pub use conversation::{
    build_user_turn, send_turn, ConversationSession, Part, Role, SessionOutcome, SessionPrompts,
    Transcript, Turn,
};
pub use http::{create_router, AppState};
pub use model::{GeminiClient, GenerateRequest, GenerateResponse, ModelService, ServiceError};
pub use mood::{detect_mood, MoodReply};
