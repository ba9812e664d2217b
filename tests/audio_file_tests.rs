// Integration tests for audio clip loading
//
// These tests verify that clips are read byte-for-byte, that media types are
// detected, and that missing files degrade to placeholder audio.

use anyhow::Result;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tranquility::audio::{
    detect_mime_type, load_audio, load_audio_or_placeholder, AudioClip, AudioError, LoadedAudio,
};

/// Write a short 16kHz mono tone to `path`
fn write_test_wav(path: &Path) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)?;
    for i in 0..1600 {
        let sample = ((i as f32 * 0.1).sin() * 8000.0) as i16;
        writer.write_sample(sample)?;
    }
    writer.finalize()?;

    Ok(())
}

fn fixture(dir: &TempDir, name: &str) -> Result<PathBuf> {
    let path = dir.path().join(name);
    write_test_wav(&path)?;
    Ok(path)
}

#[test]
fn test_load_audio_reads_whole_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = fixture(&temp_dir, "voice.wav")?;

    let bytes = load_audio(&path)?;

    assert_eq!(bytes, std::fs::read(&path)?);
    assert!(bytes.starts_with(b"RIFF"));

    Ok(())
}

#[test]
fn test_load_audio_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.mp3");
    let result = load_audio(&path);

    match result {
        Err(AudioError::NotFound(p)) => assert!(p.contains("audio.mp3")),
        other => panic!("expected NotFound, got {:?}", other),
    }
}

#[test]
fn test_clip_open_detects_mime_from_extension() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = fixture(&temp_dir, "voice.wav")?;

    let clip = AudioClip::open(&path)?;

    assert_eq!(clip.mime_type, "audio/wav");
    assert!(!clip.is_empty());

    Ok(())
}

#[test]
fn test_clip_open_probes_contents_without_extension() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = fixture(&temp_dir, "upload")?;

    let clip = AudioClip::open(&path)?;

    assert_eq!(clip.mime_type, "audio/wav");

    Ok(())
}

#[test]
fn test_extension_wins_over_contents() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = fixture(&temp_dir, "voice.mp3")?;
    let bytes = std::fs::read(&path)?;

    assert_eq!(detect_mime_type(&path, &bytes), "audio/mp3");

    Ok(())
}

#[test]
fn test_existing_file_is_not_placeholder() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = fixture(&temp_dir, "voice.wav")?;

    let loaded = load_audio_or_placeholder(&path)?;

    match &loaded {
        LoadedAudio::File { path: p, clip } => {
            assert!(p.ends_with("voice.wav"));
            assert_eq!(clip.bytes, std::fs::read(&path)?);
        }
        LoadedAudio::Placeholder { reason, .. } => panic!("unexpected placeholder: {}", reason),
    }

    Ok(())
}

#[test]
fn test_missing_file_becomes_placeholder() -> Result<()> {
    let loaded = load_audio_or_placeholder("/nonexistent/path/to/small-sample.mp3")?;

    assert!(loaded.is_placeholder());
    if let LoadedAudio::Placeholder { reason, .. } = &loaded {
        assert!(reason.contains("not found"));
    }

    let clip = loaded.into_clip();
    assert!(!clip.is_empty(), "placeholder must carry bytes");
    assert_eq!(clip.mime_type, "audio/wav");

    Ok(())
}

#[test]
fn test_mime_override_applies_to_files_only() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = fixture(&temp_dir, "voice.wav")?;

    let mut loaded = load_audio_or_placeholder(&path)?;
    loaded.override_mime_type("audio/mp3");
    assert_eq!(loaded.clip().mime_type, "audio/mp3");

    let mut placeholder = load_audio_or_placeholder("/nonexistent/path/to/small-sample.mp3")?;
    placeholder.override_mime_type("audio/mp3");
    assert!(placeholder.is_placeholder());
    assert_eq!(placeholder.clip().mime_type, "audio/wav");

    Ok(())
}
