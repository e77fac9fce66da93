/// Accepted source formats
use crate::error::{RemixError, Result};
use serde::{Deserialize, Serialize};

/// Encodings a user may upload
///
/// The allow-list is checked against the lower-cased extension before any
/// decode is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// MPEG-1/2 Layer III
    Mp3,
    /// Ogg container (Vorbis)
    Ogg,
    /// RIFF WAVE
    Wav,
}

impl SourceFormat {
    /// Every accepted format, in display order
    pub const ALL: [SourceFormat; 3] = [SourceFormat::Mp3, SourceFormat::Ogg, SourceFormat::Wav];

    /// Resolve a file extension (with or without the leading dot)
    ///
    /// # Errors
    /// Returns `UnsupportedFormat` for anything outside mp3/ogg/wav.
    pub fn from_extension(extension: &str) -> Result<Self> {
        let normalized = extension.trim().trim_start_matches('.').to_lowercase();
        match normalized.as_str() {
            "mp3" => Ok(Self::Mp3),
            "ogg" => Ok(Self::Ogg),
            "wav" => Ok(Self::Wav),
            _ => Err(RemixError::unsupported_format(if normalized.is_empty() {
                "missing file extension".to_string()
            } else {
                normalized
            })),
        }
    }

    /// Resolve the format from a file name such as `song.MP3`
    ///
    /// # Errors
    /// Returns `UnsupportedFormat` if the name has no accepted extension.
    pub fn from_file_name(file_name: &str) -> Result<Self> {
        let extension = std::path::Path::new(file_name)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        Self::from_extension(extension)
    }

    /// Canonical lower-case extension
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp3 => "mp3",
            Self::Ogg => "ogg",
            Self::Wav => "wav",
        }
    }

    /// MIME type used when serving or sniffing the format
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Mp3 => "audio/mpeg",
            Self::Ogg => "audio/ogg",
            Self::Wav => "audio/wav",
        }
    }
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_allow_listed_extensions_case_insensitively() {
        assert_eq!(SourceFormat::from_extension("mp3").unwrap(), SourceFormat::Mp3);
        assert_eq!(SourceFormat::from_extension("OGG").unwrap(), SourceFormat::Ogg);
        assert_eq!(SourceFormat::from_extension(".Wav").unwrap(), SourceFormat::Wav);
    }

    #[test]
    fn rejects_everything_else() {
        for ext in ["flac", "m4a", "aac", "opus", "txt", ""] {
            let result = SourceFormat::from_extension(ext);
            assert!(
                matches!(result, Err(RemixError::UnsupportedFormat(_))),
                "{ext:?} should be rejected"
            );
        }
    }

    #[test]
    fn file_names_use_last_extension() {
        assert_eq!(
            SourceFormat::from_file_name("mix.final.MP3").unwrap(),
            SourceFormat::Mp3
        );
        assert!(SourceFormat::from_file_name("no_extension").is_err());
        assert!(SourceFormat::from_file_name("track.flac").is_err());
    }

    #[test]
    fn mime_types() {
        assert_eq!(SourceFormat::Mp3.mime_type(), "audio/mpeg");
        assert_eq!(SourceFormat::Wav.to_string(), "wav");
    }
}
