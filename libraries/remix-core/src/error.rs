/// Core error types for Remix
use thiserror::Error;

/// Result type alias using `RemixError`
pub type Result<T> = std::result::Result<T, RemixError>;

/// Core error type for the re-synthesis pipeline
///
/// Every stage fails fast: no variant carries a partial buffer or container.
#[derive(Error, Debug)]
pub enum RemixError {
    /// Extension is not one of the accepted source formats
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Source audio or impulse response could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),

    /// A parameter or buffer shape is out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The reverb impulse response is missing or unusable
    #[error("Reverb asset error: {0}")]
    ReverbAsset(String),

    /// The offline render failed
    #[error("Render failure: {0}")]
    RenderFailure(String),

    /// The output container could not be framed
    #[error("Encode error: {0}")]
    Encode(String),

    /// Another export is still running in this session
    #[error("An export is already in progress")]
    ExportInProgress,

    /// I/O errors
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl RemixError {
    /// Create an unsupported format error
    pub fn unsupported_format(msg: impl Into<String>) -> Self {
        Self::UnsupportedFormat(msg.into())
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an invalid parameter error
    pub fn invalid_parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Create a reverb asset error
    pub fn reverb_asset(msg: impl Into<String>) -> Self {
        Self::ReverbAsset(msg.into())
    }

    /// Create a render failure
    pub fn render(msg: impl Into<String>) -> Self {
        Self::RenderFailure(msg.into())
    }

    /// Create an encode error
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Short user-facing message, without diagnostic detail
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat(_) => {
                "Unsupported file format. Please upload an MP3, OGG, or WAV file."
            }
            Self::Decode(_) => "The audio file could not be decoded.",
            Self::InvalidParameter(_) => "One of the effect settings is out of range.",
            Self::ReverbAsset(_) => "The reverb impulse response could not be loaded.",
            Self::RenderFailure(_) => "Rendering the edited audio failed.",
            Self::Encode(_) => "The edited audio is too long to export as WAV.",
            Self::ExportInProgress => "An export is already running. Please wait for it to finish.",
            Self::Io(_) => "An I/O error occurred.",
        }
    }
}
