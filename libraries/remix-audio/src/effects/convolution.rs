//! Convolution reverb
//!
//! Offline linear convolution of every channel with an impulse response, using
//! FFT overlap-add. The impulse response is normalized the way a Web Audio
//! `ConvolverNode` normalizes its buffer, so a given IR file produces the same
//! wet level as it does in a browser.
//!
//! # Example
//!
//! ```rust
//! use remix_audio::effects::{AudioEffect, ConvolutionReverb};
//! use remix_core::{PcmBuffer, SampleRate};
//!
//! let ir = PcmBuffer::new(vec![vec![1.0, 0.5, 0.25]], SampleRate::CD_QUALITY).unwrap();
//! let mut reverb = ConvolutionReverb::new(&ir).unwrap();
//!
//! let mut channels = vec![vec![1.0, 0.0, 0.0, 0.0]];
//! reverb.process(&mut channels);
//! assert_eq!(channels[0].len(), 4);
//! ```

use super::AudioEffect;
use remix_core::{PcmBuffer, RemixError};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;
use thiserror::Error;

/// Threshold below which direct time-domain convolution is used
const TIME_DOMAIN_THRESHOLD: usize = 64;

/// Minimum FFT size for block processing
const MIN_FFT_SIZE: usize = 256;

/// Smallest RMS power used for normalization (silent IRs are not amplified
/// without bound)
const MIN_POWER: f32 = 0.000_125;

/// Overall gain calibration of normalized impulse responses
const GAIN_CALIBRATION: f32 = 0.001_25;

/// Rate the gain calibration is referenced to
const GAIN_CALIBRATION_SAMPLE_RATE: f32 = 44_100.0;

/// Errors raised while preparing an impulse response
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConvolutionError {
    /// The impulse response has no frames
    #[error("Impulse response is empty")]
    EmptyImpulseResponse,
}

impl From<ConvolutionError> for RemixError {
    fn from(err: ConvolutionError) -> Self {
        RemixError::reverb_asset(err.to_string())
    }
}

/// Pre-transformed impulse response channel
struct FftKernel {
    spectrum: Vec<Complex<f32>>,
}

/// FFT plans shared by every kernel of one reverb
struct FftState {
    fft_size: usize,
    block_size: usize,
    forward: Arc<dyn Fft<f32>>,
    inverse: Arc<dyn Fft<f32>>,
    kernels: Vec<FftKernel>,
}

/// Convolution reverb over complete planar channels
///
/// `process` replaces every channel with its convolution, truncated to the
/// channel's original length. Channel `c` is convolved with impulse-response
/// channel `min(c, ir_channels - 1)`, so a mono IR feeds every channel and a
/// stereo IR maps left to left and right to right.
pub struct ConvolutionReverb {
    /// Normalized impulse response, one vector per IR channel
    impulse: Vec<Vec<f32>>,
    /// Sample rate of the IR
    ir_sample_rate: u32,
    /// Scale applied during normalization
    scale: f32,
    /// FFT state (None if using time-domain)
    fft_state: Option<FftState>,
}

impl ConvolutionReverb {
    /// Prepare an impulse response for convolution
    ///
    /// The IR should already be at the rate of the audio it will process.
    ///
    /// # Errors
    /// Returns `EmptyImpulseResponse` if the IR has no frames.
    pub fn new(impulse: &PcmBuffer) -> Result<Self, ConvolutionError> {
        if impulse.is_empty() {
            return Err(ConvolutionError::EmptyImpulseResponse);
        }

        let ir_sample_rate = impulse.sample_rate().as_hz();
        let scale = Self::normalization_scale(impulse);
        let normalized: Vec<Vec<f32>> = impulse
            .channels()
            .iter()
            .map(|channel| channel.iter().map(|&s| s * scale).collect())
            .collect();

        let fft_state = if impulse.frame_count() > TIME_DOMAIN_THRESHOLD {
            Some(Self::prepare_fft(&normalized))
        } else {
            None
        };

        tracing::debug!(
            "Prepared impulse response: {} channels, {} frames at {} Hz, scale {:.6}",
            impulse.channel_count(),
            impulse.frame_count(),
            ir_sample_rate,
            scale
        );

        Ok(Self {
            impulse: normalized,
            ir_sample_rate,
            scale,
            fft_state,
        })
    }

    /// Web Audio normalization scale for an impulse response
    ///
    /// `1 / rms` (floored at `MIN_POWER`), times the gain calibration, times
    /// `44100 / rate`, halved for 4-channel (true stereo) responses.
    pub fn normalization_scale(impulse: &PcmBuffer) -> f32 {
        let channel_count = impulse.channel_count();
        let length = impulse.frame_count();
        if length == 0 {
            return 1.0;
        }

        let sum_of_squares: f64 = impulse
            .channels()
            .iter()
            .flat_map(|channel| channel.iter())
            .map(|&s| f64::from(s) * f64::from(s))
            .sum();
        let mut power = (sum_of_squares / (channel_count * length) as f64).sqrt() as f32;
        if !power.is_finite() || power < MIN_POWER {
            power = MIN_POWER;
        }

        let mut scale = 1.0 / power;
        scale *= GAIN_CALIBRATION;
        scale *= GAIN_CALIBRATION_SAMPLE_RATE / impulse.sample_rate().as_hz() as f32;
        if channel_count == 4 {
            scale *= 0.5;
        }
        scale
    }

    /// Scale applied to the IR during normalization
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Length of the impulse response in frames
    pub fn ir_length(&self) -> usize {
        self.impulse.first().map_or(0, Vec::len)
    }

    /// Number of impulse-response channels
    pub fn ir_channels(&self) -> usize {
        self.impulse.len()
    }

    /// Sample rate of the impulse response
    pub fn ir_sample_rate(&self) -> u32 {
        self.ir_sample_rate
    }

    /// Get the length of the impulse response in seconds
    pub fn ir_duration_seconds(&self) -> f32 {
        self.ir_length() as f32 / self.ir_sample_rate as f32
    }

    fn prepare_fft(impulse: &[Vec<f32>]) -> FftState {
        let ir_frames = impulse.first().map_or(0, Vec::len);

        // Blocks at least as long as the IR keep the number of transforms low
        let block_size = ir_frames.next_power_of_two().max(MIN_FFT_SIZE);
        let fft_size = (block_size + ir_frames - 1).next_power_of_two();

        let mut planner = FftPlanner::new();
        let forward = planner.plan_fft_forward(fft_size);
        let inverse = planner.plan_fft_inverse(fft_size);

        let kernels = impulse
            .iter()
            .map(|channel| {
                let mut spectrum = vec![Complex::new(0.0, 0.0); fft_size];
                for (bin, &sample) in spectrum.iter_mut().zip(channel) {
                    *bin = Complex::new(sample, 0.0);
                }
                forward.process(&mut spectrum);
                FftKernel { spectrum }
            })
            .collect();

        FftState {
            fft_size,
            block_size,
            forward,
            inverse,
            kernels,
        }
    }

    fn ir_channel_for(&self, channel: usize) -> usize {
        channel.min(self.impulse.len() - 1)
    }

    /// Overlap-add convolution of one channel
    ///
    /// Input blocks are zero-padded, multiplied with the IR spectrum and added
    /// into the output at their block offset.
    fn convolve_fft(
        state: &FftState,
        kernel: &FftKernel,
        ir_frames: usize,
        input: &[f32],
    ) -> Vec<f32> {
        let frames = input.len();
        let fft_size = state.fft_size;
        let scale = 1.0 / fft_size as f32;

        let mut output = vec![0.0f32; frames + ir_frames];
        let mut scratch = vec![Complex::new(0.0, 0.0); fft_size];

        let mut position = 0;
        while position < frames {
            let chunk_size = (frames - position).min(state.block_size);

            for (i, bin) in scratch.iter_mut().enumerate() {
                *bin = if i < chunk_size {
                    Complex::new(input[position + i], 0.0)
                } else {
                    Complex::new(0.0, 0.0)
                };
            }

            state.forward.process(&mut scratch);
            for (bin, ir_bin) in scratch.iter_mut().zip(&kernel.spectrum) {
                *bin *= *ir_bin;
            }
            state.inverse.process(&mut scratch);

            let conv_len = (chunk_size + ir_frames - 1).min(fft_size);
            for (out, bin) in output[position..position + conv_len]
                .iter_mut()
                .zip(&scratch)
            {
                *out += bin.re * scale;
            }

            position += chunk_size;
        }

        output.truncate(frames);
        output
    }

    /// Direct time-domain convolution for short IRs
    fn convolve_time_domain(impulse: &[f32], input: &[f32]) -> Vec<f32> {
        (0..input.len())
            .map(|i| {
                let taps = impulse.len().min(i + 1);
                (0..taps).map(|j| input[i - j] * impulse[j]).sum()
            })
            .collect()
    }
}

impl AudioEffect for ConvolutionReverb {
    fn process(&mut self, channels: &mut [Vec<f32>]) {
        let ir_frames = self.ir_length();

        for (index, channel) in channels.iter_mut().enumerate() {
            if channel.is_empty() {
                continue;
            }

            let ir_channel = self.ir_channel_for(index);
            let wet = match &self.fft_state {
                Some(state) => Self::convolve_fft(
                    state,
                    &state.kernels[ir_channel],
                    ir_frames,
                    channel,
                ),
                None => Self::convolve_time_domain(&self.impulse[ir_channel], channel),
            };
            *channel = wet;
        }
    }

    fn reset(&mut self) {
        // Every call convolves a complete signal; no state carries over
    }

    fn name(&self) -> &str {
        "Convolution"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use remix_core::SampleRate;

    fn buffer(channels: Vec<Vec<f32>>) -> PcmBuffer {
        PcmBuffer::new(channels, SampleRate::CD_QUALITY).unwrap()
    }

    #[test]
    fn empty_ir_is_rejected() {
        let ir = buffer(vec![Vec::new()]);
        assert!(matches!(
            ConvolutionReverb::new(&ir),
            Err(ConvolutionError::EmptyImpulseResponse)
        ));

        let err: RemixError = ConvolutionError::EmptyImpulseResponse.into();
        assert!(matches!(err, RemixError::ReverbAsset(_)));
    }

    #[test]
    fn unit_impulse_scale_matches_calibration() {
        let ir = buffer(vec![vec![1.0]]);
        let reverb = ConvolutionReverb::new(&ir).unwrap();
        assert!((reverb.scale() - GAIN_CALIBRATION).abs() < 1e-9);

        // Same IR at half the rate is scaled twice as hard
        let ir = PcmBuffer::new(vec![vec![1.0]], SampleRate::new(22_050)).unwrap();
        let scale = ConvolutionReverb::normalization_scale(&ir);
        assert!((scale - 2.0 * GAIN_CALIBRATION).abs() < 1e-9);
    }

    #[test]
    fn silent_ir_uses_power_floor() {
        let ir = buffer(vec![vec![0.0; 16]]);
        let scale = ConvolutionReverb::normalization_scale(&ir);
        assert!((scale - GAIN_CALIBRATION / MIN_POWER).abs() < 1e-3);
    }

    #[test]
    fn true_stereo_ir_is_halved() {
        let two = buffer(vec![vec![1.0]; 2]);
        let four = buffer(vec![vec![1.0]; 4]);
        let ratio = ConvolutionReverb::normalization_scale(&four)
            / ConvolutionReverb::normalization_scale(&two);
        assert!((ratio - 0.5).abs() < 1e-6);
    }

    #[test]
    fn dirac_scales_input() {
        let ir = buffer(vec![vec![1.0]]);
        let mut reverb = ConvolutionReverb::new(&ir).unwrap();

        let mut channels = vec![vec![0.5, -0.25, 1.0]];
        reverb.process(&mut channels);

        let scale = reverb.scale();
        assert_eq!(channels[0], vec![0.5 * scale, -0.25 * scale, scale]);
    }

    #[test]
    fn output_is_truncated_to_input_length() {
        let ir = buffer(vec![vec![0.5; 1000]]);
        let mut reverb = ConvolutionReverb::new(&ir).unwrap();

        let mut channels = vec![vec![1.0; 300], vec![1.0; 300]];
        reverb.process(&mut channels);
        assert_eq!(channels[0].len(), 300);
        assert_eq!(channels[1].len(), 300);
    }

    #[test]
    fn fft_path_matches_time_domain() {
        let ir_samples: Vec<f32> = (0..500).map(|i| (-(i as f32) / 80.0).exp()).collect();
        let ir = buffer(vec![ir_samples.clone()]);
        let mut reverb = ConvolutionReverb::new(&ir).unwrap();
        assert!(reverb.fft_state.is_some());

        let input: Vec<f32> = (0..3000).map(|i| ((i * 7919) % 200) as f32 / 100.0 - 1.0).collect();
        let scaled: Vec<f32> = ir_samples.iter().map(|s| s * reverb.scale()).collect();
        let expected = ConvolutionReverb::convolve_time_domain(&scaled, &input);

        let mut channels = vec![input];
        reverb.process(&mut channels);

        for (i, (got, want)) in channels[0].iter().zip(&expected).enumerate() {
            assert!((got - want).abs() < 1e-4, "frame {i}: {got} vs {want}");
        }
    }

    #[test]
    fn stereo_ir_maps_channels() {
        let ir = buffer(vec![vec![1.0, 0.0], vec![0.0, 1.0]]);
        let mut reverb = ConvolutionReverb::new(&ir).unwrap();
        let scale = reverb.scale();

        let mut channels = vec![vec![1.0, 0.0, 0.0], vec![1.0, 0.0, 0.0]];
        reverb.process(&mut channels);

        // Left passes straight through, right is delayed by one frame
        assert_eq!(channels[0], vec![scale, 0.0, 0.0]);
        assert_eq!(channels[1], vec![0.0, scale, 0.0]);
    }

    #[test]
    fn mono_ir_feeds_every_channel() {
        let ir = buffer(vec![vec![1.0]]);
        let mut reverb = ConvolutionReverb::new(&ir).unwrap();
        let mut channels = vec![vec![1.0], vec![1.0], vec![1.0]];
        reverb.process(&mut channels);
        assert!(channels.iter().all(|c| c[0] == reverb.scale()));
    }

    #[test]
    fn silence_stays_silent() {
        let ir = buffer(vec![vec![0.3; 200]]);
        let mut reverb = ConvolutionReverb::new(&ir).unwrap();
        let mut channels = vec![vec![0.0; 1024]];
        reverb.process(&mut channels);
        assert!(channels[0].iter().all(|&s| s == 0.0));
    }
}
