//! Audio clip loading
//!
//! Clips are read fully into memory and sent inline to the model service.
//! A missing clip is replaced by placeholder silence so a session can still run.

pub mod file;
pub mod format;

pub use file::{load_audio, load_audio_or_placeholder, AudioClip, AudioError, LoadedAudio};
pub use format::{detect_mime_type, mime_type_for_path, probe_mime_type, FALLBACK_MIME_TYPE};
