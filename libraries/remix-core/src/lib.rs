//! Remix Core
//!
//! Platform-agnostic core types, traits, and error handling for the Remix
//! offline re-synthesis pipeline.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `PcmBuffer`, `EffectParameters`, `MixGains`, `SourceFormat`
//! - **Core Traits**: `AudioDecoder`, plus the collaborator seams `Transport`,
//!   `SpectrumSink` and `TagEditor`
//! - **Error Handling**: Unified `RemixError` and `Result` types
//!
//! # Example
//!
//! ```rust
//! use remix_core::{EffectParameters, MixGains, PcmBuffer, SampleRate, SourceFormat};
//!
//! // Only mp3, ogg and wav are accepted
//! let format = SourceFormat::from_extension("WAV").unwrap();
//! assert_eq!(format, SourceFormat::Wav);
//! assert!(SourceFormat::from_extension("flac").is_err());
//!
//! // One second of stereo silence
//! let buffer = PcmBuffer::silent(2, 44_100, SampleRate::CD_QUALITY);
//! assert_eq!(buffer.frame_count(), 44_100);
//!
//! // Dry and wet gains always sum to one
//! let params = EffectParameters { reverb_mix: 0.25, ..EffectParameters::default() };
//! let gains = MixGains::from_mix(params.reverb_mix);
//! assert_eq!(gains.dry + gains.wet, 1.0);
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{RemixError, Result};
pub use traits::{AudioDecoder, SpectrumSink, TagEditor, Transport, TransportEvent};

pub use types::{
    // Audio types
    PcmBuffer, SampleRate,
    // Effect parameters
    EffectParameters, MixGains,
    // Formats
    SourceFormat,
    // Tags
    TagFields,
};
