//! Rubato resampler backend
//!
//! Sinc resampling using the rubato crate, driven over a complete buffer.

use super::{converted_length, ResamplingError, ResamplingQuality, Result};
use rubato::{
    Resampler as RubatoResamplerTrait, SincFixedIn, SincInterpolationParameters,
    SincInterpolationType, WindowFunction,
};

/// Input frames handed to rubato per call
const CHUNK_SIZE: usize = 1024;

/// Rubato-based offline resampler
pub struct RubatoResampler {
    resampler: SincFixedIn<f32>,
    input_rate: u32,
    output_rate: u32,
    channels: usize,
}

impl RubatoResampler {
    /// Create a new rubato resampler
    pub fn new(
        input_rate: u32,
        output_rate: u32,
        channels: usize,
        quality: ResamplingQuality,
    ) -> Result<Self> {
        if input_rate == 0 || input_rate > 1_000_000 {
            return Err(ResamplingError::InvalidSampleRate(input_rate));
        }
        if output_rate == 0 || output_rate > 1_000_000 {
            return Err(ResamplingError::InvalidSampleRate(output_rate));
        }
        if channels == 0 || channels > 8 {
            return Err(ResamplingError::InvalidChannelCount(channels));
        }

        let ratio = f64::from(output_rate) / f64::from(input_rate);
        let resampler = SincFixedIn::<f32>::new(
            ratio,
            1.0, // fixed ratio, no runtime adjustment
            Self::quality_to_params(quality),
            CHUNK_SIZE,
            channels,
        )
        .map_err(|e| {
            ResamplingError::InitializationFailed(format!("SincFixedIn creation failed: {}", e))
        })?;

        Ok(Self {
            resampler,
            input_rate,
            output_rate,
            channels,
        })
    }

    /// Convert quality preset to rubato parameters
    fn quality_to_params(quality: ResamplingQuality) -> SincInterpolationParameters {
        match quality {
            ResamplingQuality::Fast => SincInterpolationParameters {
                sinc_len: 64,
                f_cutoff: 0.9,
                interpolation: SincInterpolationType::Linear,
                oversampling_factor: 128,
                window: WindowFunction::Blackman,
            },
            ResamplingQuality::Balanced => SincInterpolationParameters {
                sinc_len: 128,
                f_cutoff: 0.95,
                interpolation: SincInterpolationType::Cubic,
                oversampling_factor: 256,
                window: WindowFunction::BlackmanHarris,
            },
            ResamplingQuality::High => SincInterpolationParameters {
                sinc_len: 256,
                f_cutoff: 0.99,
                interpolation: SincInterpolationType::Cubic,
                oversampling_factor: 512,
                window: WindowFunction::BlackmanHarris,
            },
        }
    }

    /// Input sample rate
    pub fn input_rate(&self) -> u32 {
        self.input_rate
    }

    /// Output sample rate
    pub fn output_rate(&self) -> u32 {
        self.output_rate
    }

    /// Channel count
    pub fn channels(&self) -> usize {
        self.channels
    }

    /// Latency of the resampler in output frames
    pub fn latency(&self) -> usize {
        self.resampler.output_delay()
    }

    /// Resample complete planar channels
    ///
    /// Feeds full chunks, then the remainder as a partial chunk, then flushes
    /// until the delayed tail is out. The leading delay is dropped and the
    /// result is cut or zero-padded to exactly `converted_length` frames.
    pub fn process_all(&mut self, input: &[Vec<f32>]) -> Result<Vec<Vec<f32>>> {
        if input.len() != self.channels {
            return Err(ResamplingError::InvalidChannelCount(input.len()));
        }

        let frames = input.first().map_or(0, Vec::len);
        let target = converted_length(frames, self.input_rate, self.output_rate);
        let delay = self.latency();
        let mut output: Vec<Vec<f32>> = vec![Vec::with_capacity(target + delay); self.channels];

        self.resampler.reset();

        let mut position = 0;
        loop {
            let needed = self.resampler.input_frames_next();
            if position + needed > frames {
                break;
            }
            let chunk: Vec<&[f32]> = input
                .iter()
                .map(|channel| &channel[position..position + needed])
                .collect();
            let processed = self.resampler.process(&chunk, None).map_err(|e| {
                ResamplingError::ProcessingFailed(format!("SincIn resampling failed: {}", e))
            })?;
            Self::append(&mut output, processed);
            position += needed;
        }

        if position < frames {
            let remainder: Vec<&[f32]> = input.iter().map(|channel| &channel[position..]).collect();
            let processed = self
                .resampler
                .process_partial(Some(&remainder), None)
                .map_err(|e| {
                    ResamplingError::ProcessingFailed(format!("SincIn flush failed: {}", e))
                })?;
            Self::append(&mut output, processed);
        }

        // Push silence through until the delayed tail has been emitted
        while output[0].len() < target + delay {
            let processed = self
                .resampler
                .process_partial::<&[f32]>(None, None)
                .map_err(|e| {
                    ResamplingError::ProcessingFailed(format!("SincIn flush failed: {}", e))
                })?;
            if processed.first().map_or(true, Vec::is_empty) {
                break;
            }
            Self::append(&mut output, processed);
        }

        for channel in &mut output {
            let start = delay.min(channel.len());
            channel.drain(..start);
            channel.resize(target, 0.0);
        }

        Ok(output)
    }

    fn append(output: &mut [Vec<f32>], processed: Vec<Vec<f32>>) {
        for (channel, samples) in output.iter_mut().zip(processed) {
            channel.extend(samples);
        }
    }
}
