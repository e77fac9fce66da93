//! Offline sample-rate conversion
//!
//! Converts whole `PcmBuffer`s between sample rates. Used when the caller asks
//! for an output rate different from the source rate, and to bring the reverb
//! impulse response to the render rate.
//!
//! ## Example
//!
//! ```rust
//! use remix_audio::resampling::{resample_buffer, ResamplingQuality};
//! use remix_core::{PcmBuffer, SampleRate};
//!
//! let source = PcmBuffer::silent(2, 44_100, SampleRate::CD_QUALITY);
//! let converted =
//!     resample_buffer(&source, SampleRate::DVD_QUALITY, ResamplingQuality::Balanced).unwrap();
//!
//! assert_eq!(converted.frame_count(), 48_000);
//! assert_eq!(converted.sample_rate(), SampleRate::DVD_QUALITY);
//! ```

mod rubato_backend;

use remix_core::{PcmBuffer, RemixError, SampleRate};
use thiserror::Error;

pub use rubato_backend::RubatoResampler;

/// Resampling errors
#[derive(Error, Debug)]
pub enum ResamplingError {
    #[error("Invalid sample rate: {0} Hz (must be > 0 and < 1MHz)")]
    InvalidSampleRate(u32),

    #[error("Invalid channel count: {0} (must be 1-8)")]
    InvalidChannelCount(usize),

    #[error("Resampler initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Processing failed: {0}")]
    ProcessingFailed(String),
}

impl From<ResamplingError> for RemixError {
    fn from(err: ResamplingError) -> Self {
        RemixError::render(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ResamplingError>;

/// Resampling quality presets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResamplingQuality {
    /// Fast - Low CPU
    /// - Passband: 90% of Nyquist
    Fast,

    /// Balanced - Moderate CPU, good quality
    /// - Passband: 95% of Nyquist
    Balanced,

    /// High - Higher CPU, excellent quality
    /// - Passband: 99% of Nyquist
    #[default]
    High,
}

impl ResamplingQuality {
    /// Get transition band width (0.0 - 1.0, normalized to Nyquist)
    pub fn transition_band(&self) -> f64 {
        match self {
            Self::Fast => 0.10,
            Self::Balanced => 0.05,
            Self::High => 0.01,
        }
    }
}

/// Frames a converted buffer must have: `ceil(frames * output / input)`
pub fn converted_length(frames: usize, input_rate: u32, output_rate: u32) -> usize {
    (frames as u128 * u128::from(output_rate)).div_ceil(u128::from(input_rate)) as usize
}

/// Convert a whole buffer to `target_rate`
///
/// The result has exactly `converted_length` frames, the resampler's delay
/// removed, and the same channel count. Equal rates return a copy.
///
/// # Errors
/// Returns `ResamplingError` if the rates or channel count are out of range or
/// the resampler fails.
pub fn resample_buffer(
    source: &PcmBuffer,
    target_rate: SampleRate,
    quality: ResamplingQuality,
) -> Result<PcmBuffer> {
    let input_rate = source.sample_rate().as_hz();
    let output_rate = target_rate.as_hz();

    if input_rate == output_rate {
        return Ok(source.clone());
    }

    let mut resampler =
        RubatoResampler::new(input_rate, output_rate, source.channel_count(), quality)?;
    let channels = resampler.process_all(source.channels())?;

    tracing::debug!(
        "Resampled {} frames {} Hz -> {} frames {} Hz",
        source.frame_count(),
        input_rate,
        channels.first().map_or(0, Vec::len),
        output_rate
    );

    PcmBuffer::new(channels, target_rate)
        .map_err(|e| ResamplingError::ProcessingFailed(e.to_string()))
}
