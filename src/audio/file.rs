use std::io::Cursor;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use super::format::detect_mime_type;

/// Sample rate of the generated placeholder clip
const PLACEHOLDER_SAMPLE_RATE: u32 = 16000;

/// Length of the generated placeholder clip in milliseconds
const PLACEHOLDER_DURATION_MS: u32 = 1000;

#[derive(Debug, Error)]
pub enum AudioError {
    #[error("audio file not found: {0}")]
    NotFound(String),

    #[error("failed to read audio file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode placeholder audio: {0}")]
    Encode(#[from] hound::Error),
}

/// An in-memory audio payload tagged with its media type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioClip {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a clip from disk, detecting its media type from the extension or contents
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AudioError> {
        let path = path.as_ref();
        let bytes = load_audio(path)?;
        let mime_type = detect_mime_type(path, &bytes);

        Ok(Self::new(bytes, mime_type))
    }

    /// One second of 16kHz mono silence, encoded as WAV
    pub fn placeholder() -> Result<Self, AudioError> {
        Ok(Self::new(silent_wav(PLACEHOLDER_DURATION_MS)?, "audio/wav"))
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Where the audio handed to a session actually came from
#[derive(Debug, Clone)]
pub enum LoadedAudio {
    /// The requested file was read successfully
    File { path: String, clip: AudioClip },
    /// The requested file could not be used and placeholder audio was substituted
    Placeholder {
        path: String,
        reason: String,
        clip: AudioClip,
    },
}

impl LoadedAudio {
    pub fn clip(&self) -> &AudioClip {
        match self {
            LoadedAudio::File { clip, .. } | LoadedAudio::Placeholder { clip, .. } => clip,
        }
    }

    /// Label a loaded file with a configured media type
    ///
    /// Placeholder audio is always WAV and keeps its own type.
    pub fn override_mime_type(&mut self, mime_type: &str) {
        if let LoadedAudio::File { clip, .. } = self {
            clip.mime_type = mime_type.to_string();
        }
    }

    pub fn into_clip(self) -> AudioClip {
        match self {
            LoadedAudio::File { clip, .. } | LoadedAudio::Placeholder { clip, .. } => clip,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, LoadedAudio::Placeholder { .. })
    }
}

/// Read a local audio file fully into memory
pub fn load_audio(path: impl AsRef<Path>) -> Result<Vec<u8>, AudioError> {
    let path = path.as_ref();
    info!("Opening audio file: {}", path.display());

    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            AudioError::NotFound(path.display().to_string())
        } else {
            AudioError::Io {
                path: path.display().to_string(),
                source: e,
            }
        }
    })?;

    info!("Audio file loaded: {} bytes", bytes.len());

    Ok(bytes)
}

/// Load a clip, falling back to placeholder audio when the file cannot be read
///
/// Only fails if the placeholder itself cannot be encoded.
pub fn load_audio_or_placeholder(path: impl AsRef<Path>) -> Result<LoadedAudio, AudioError> {
    let path = path.as_ref();

    match AudioClip::open(path) {
        Ok(clip) => Ok(LoadedAudio::File {
            path: path.display().to_string(),
            clip,
        }),
        Err(AudioError::Encode(e)) => Err(AudioError::Encode(e)),
        Err(e) => {
            warn!("{}; substituting placeholder audio", e);
            Ok(LoadedAudio::Placeholder {
                path: path.display().to_string(),
                reason: e.to_string(),
                clip: AudioClip::placeholder()?,
            })
        }
    }
}

fn silent_wav(duration_ms: u32) -> Result<Vec<u8>, hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: PLACEHOLDER_SAMPLE_RATE,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let sample_count = PLACEHOLDER_SAMPLE_RATE * duration_ms / 1000;
    let mut buffer = Cursor::new(Vec::new());
    {
        let mut writer = hound::WavWriter::new(&mut buffer, spec)?;
        for _ in 0..sample_count {
            writer.write_sample(0i16)?;
        }
        writer.finalize()?;
    }

    Ok(buffer.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_is_valid_wav() {
        let clip = AudioClip::placeholder().unwrap();
        assert_eq!(clip.mime_type, "audio/wav");

        let reader = hound::WavReader::new(Cursor::new(clip.bytes)).unwrap();
        assert_eq!(reader.spec().sample_rate, 16000);
        assert_eq!(reader.spec().channels, 1);
        assert_eq!(reader.len(), 16000);
    }

    #[test]
    fn missing_file_is_not_found() {
        let err = load_audio("/nonexistent/path/to/clip.mp3").unwrap_err();
        assert!(matches!(err, AudioError::NotFound(_)));
    }
}
