use std::io::Cursor;
use std::path::Path;
use symphonia::core::codecs::{
    CodecType, CODEC_TYPE_AAC, CODEC_TYPE_ALAC, CODEC_TYPE_FLAC, CODEC_TYPE_MP3,
    CODEC_TYPE_OPUS, CODEC_TYPE_VORBIS,
};
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;
use tracing::debug;

/// Media type used when neither the extension nor the contents identify the clip
pub const FALLBACK_MIME_TYPE: &str = "application/octet-stream";

const EBML_MAGIC: &[u8] = &[0x1A, 0x45, 0xDF, 0xA3];

/// Map a file extension to the media type the model service expects
pub fn mime_type_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();

    let mime = match ext.as_str() {
        "mp3" => "audio/mp3",
        "wav" | "wave" => "audio/wav",
        "flac" => "audio/flac",
        "ogg" | "oga" | "opus" => "audio/ogg",
        "aac" => "audio/aac",
        "m4a" | "mp4" => "audio/mp4",
        "aif" | "aiff" => "audio/aiff",
        "webm" => "audio/webm",
        _ => return None,
    };

    Some(mime)
}

/// Identify a clip's media type from its contents
pub fn probe_mime_type(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(EBML_MAGIC) {
        return Some("audio/webm");
    }

    let source = MediaSourceStream::new(Box::new(Cursor::new(bytes.to_vec())), Default::default());
    let probed = symphonia::default::get_probe()
        .format(
            &Hint::new(),
            source,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .map_err(|e| debug!("Audio probe failed: {}", e))
        .ok()?;

    let codec = probed.format.default_track()?.codec_params.codec;

    mime_type_for_codec(codec).or_else(|| {
        // Uncompressed PCM; the container decides
        if bytes.starts_with(b"RIFF") {
            Some("audio/wav")
        } else if bytes.starts_with(b"FORM") {
            Some("audio/aiff")
        } else {
            None
        }
    })
}

/// Detect a clip's media type, preferring the extension over a content probe
pub fn detect_mime_type(path: &Path, bytes: &[u8]) -> &'static str {
    mime_type_for_path(path)
        .or_else(|| probe_mime_type(bytes))
        .unwrap_or(FALLBACK_MIME_TYPE)
}

fn mime_type_for_codec(codec: CodecType) -> Option<&'static str> {
    if codec == CODEC_TYPE_MP3 {
        Some("audio/mp3")
    } else if codec == CODEC_TYPE_FLAC {
        Some("audio/flac")
    } else if codec == CODEC_TYPE_VORBIS || codec == CODEC_TYPE_OPUS {
        Some("audio/ogg")
    } else if codec == CODEC_TYPE_AAC {
        Some("audio/aac")
    } else if codec == CODEC_TYPE_ALAC {
        Some("audio/mp4")
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(mime_type_for_path(Path::new("clip.MP3")), Some("audio/mp3"));
        assert_eq!(mime_type_for_path(Path::new("a/b/voice.flac")), Some("audio/flac"));
        assert_eq!(mime_type_for_path(Path::new("noext")), None);
        assert_eq!(mime_type_for_path(Path::new("notes.txt")), None);
    }

    #[test]
    fn webm_is_recognised_by_magic() {
        let bytes = [0x1A, 0x45, 0xDF, 0xA3, 0x00, 0x00];
        assert_eq!(probe_mime_type(&bytes), Some("audio/webm"));
    }

    #[test]
    fn garbage_falls_back() {
        let bytes = b"definitely not audio";
        assert_eq!(detect_mime_type(Path::new("upload"), bytes), FALLBACK_MIME_TYPE);
    }
}
