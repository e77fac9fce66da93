//! Offline effect stages
//!
//! The stages the effect graph is assembled from. All operate on planar f32
//! channels nominally in [-1.0, 1.0].
//!
//! Available stages:
//! - **PlaybackRate**: tempo change by linear-interpolation resampling
//! - **LowPassFilter**: Butterworth biquad low-pass
//! - **ConvolutionReverb**: FFT convolution with a normalized impulse response
//! - **DryWetMixer**: dry/wet gains and summing junction

mod convolution;
mod lowpass;
mod mixer;
mod playback_rate;

pub use convolution::{ConvolutionError, ConvolutionReverb};
pub use lowpass::{LowPassFilter, BUTTERWORTH_Q};
pub use mixer::DryWetMixer;
pub use playback_rate::PlaybackRate;

/// Effect that processes complete planar channels in place
///
/// Implementations keep the channel count and length unchanged.
pub trait AudioEffect: Send {
    /// Process every channel in place
    fn process(&mut self, channels: &mut [Vec<f32>]);

    /// Reset effect state before processing an unrelated signal
    fn reset(&mut self);

    /// Get effect name (for debugging)
    fn name(&self) -> &str;
}
