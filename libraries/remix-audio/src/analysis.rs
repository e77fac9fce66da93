//! Spectrum analysis for visualizers
//!
//! Produces per-frame frequency magnitudes from a buffer, matching the
//! behavior of a Web Audio `AnalyserNode`: Blackman window, magnitude
//! normalized by the FFT size, exponential smoothing over time, and decibel
//! output. Frames are handed to a [`SpectrumSink`].
//!
//! # Example
//!
//! ```rust
//! use remix_audio::analysis::SpectrumAnalyser;
//! use remix_core::{PcmBuffer, SampleRate};
//!
//! let buffer = PcmBuffer::silent(2, 8_192, SampleRate::CD_QUALITY);
//! let mut analyser = SpectrumAnalyser::new(2048).unwrap();
//!
//! let mut frames: Vec<Vec<f32>> = Vec::new();
//! analyser.analyse(&buffer, &mut frames);
//! assert_eq!(frames.len(), 4);
//! assert_eq!(frames[0].len(), 1024);
//! ```

use remix_core::{PcmBuffer, RemixError, Result, SpectrumSink};
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Default FFT size
pub const DEFAULT_FFT_SIZE: usize = 2048;

/// Default time smoothing constant
pub const DEFAULT_SMOOTHING: f32 = 0.8;

/// Default lower bound of the byte-scaled range, in dB
pub const DEFAULT_MIN_DECIBELS: f32 = -100.0;

/// Default upper bound of the byte-scaled range, in dB
pub const DEFAULT_MAX_DECIBELS: f32 = -30.0;

const MIN_FFT_SIZE: usize = 32;
const MAX_FFT_SIZE: usize = 32_768;

/// Frequency analyser over complete buffers
pub struct SpectrumAnalyser {
    fft_size: usize,
    smoothing: f32,
    min_decibels: f32,
    max_decibels: f32,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// Smoothed linear magnitudes carried between frames
    smoothed: Vec<f32>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyser {
    /// Create an analyser with the given FFT size and default settings
    ///
    /// # Errors
    /// Returns `InvalidParameter` unless `fft_size` is a power of two between
    /// 32 and 32768.
    pub fn new(fft_size: usize) -> Result<Self> {
        if !fft_size.is_power_of_two() || !(MIN_FFT_SIZE..=MAX_FFT_SIZE).contains(&fft_size) {
            return Err(RemixError::invalid_parameter(format!(
                "FFT size must be a power of two in {}..={}, got {}",
                MIN_FFT_SIZE, MAX_FFT_SIZE, fft_size
            )));
        }

        let fft = FftPlanner::new().plan_fft_forward(fft_size);

        Ok(Self {
            fft_size,
            smoothing: DEFAULT_SMOOTHING,
            min_decibels: DEFAULT_MIN_DECIBELS,
            max_decibels: DEFAULT_MAX_DECIBELS,
            fft,
            window: blackman_window(fft_size),
            smoothed: vec![0.0; fft_size / 2],
            scratch: vec![Complex::new(0.0, 0.0); fft_size],
        })
    }

    /// Set the time smoothing constant (0.0 = none, clamped below 1.0)
    pub fn set_smoothing(&mut self, smoothing: f32) {
        self.smoothing = smoothing.clamp(0.0, 0.999);
    }

    /// Set the decibel range used by [`byte_frequency_data`](Self::byte_frequency_data)
    ///
    /// # Errors
    /// Returns `InvalidParameter` if `min` is not below `max`.
    pub fn set_decibel_range(&mut self, min: f32, max: f32) -> Result<()> {
        if min.is_nan() || max.is_nan() || min >= max {
            return Err(RemixError::invalid_parameter(format!(
                "minimum decibels ({}) must be below maximum ({})",
                min, max
            )));
        }
        self.min_decibels = min;
        self.max_decibels = max;
        Ok(())
    }

    /// FFT size in frames
    pub fn fft_size(&self) -> usize {
        self.fft_size
    }

    /// Number of frequency bins per frame (`fft_size / 2`)
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Clear the smoothing history
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }

    /// Analyse a buffer frame by frame
    ///
    /// Channels are mixed to mono; the buffer is walked in hops of `fft_size`
    /// frames (a trailing partial hop is zero-padded). Each frame's dB
    /// magnitudes go to `sink`. Returns the number of frames produced.
    pub fn analyse(&mut self, buffer: &PcmBuffer, sink: &mut dyn SpectrumSink) -> usize {
        let mono = mix_to_mono(buffer);
        let mut decibels = vec![0.0f32; self.bin_count()];
        let mut count = 0;

        for block in mono.chunks(self.fft_size) {
            self.process_block(block, &mut decibels);
            sink.on_frame(&decibels);
            count += 1;
        }

        count
    }

    /// Scale one frame of dB values into 0..=255
    pub fn byte_frequency_data(&self, decibels: &[f32]) -> Vec<u8> {
        let range = self.max_decibels - self.min_decibels;
        decibels
            .iter()
            .map(|&db| {
                let scaled = 255.0 * (db - self.min_decibels) / range;
                scaled.clamp(0.0, 255.0) as u8
            })
            .collect()
    }

    fn process_block(&mut self, block: &[f32], decibels: &mut [f32]) {
        for (i, bin) in self.scratch.iter_mut().enumerate() {
            let sample = block.get(i).copied().unwrap_or(0.0);
            *bin = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.scratch);

        let norm = 1.0 / self.fft_size as f32;
        for ((smoothed, db), bin) in self
            .smoothed
            .iter_mut()
            .zip(decibels.iter_mut())
            .zip(&self.scratch)
        {
            let magnitude = bin.norm() * norm;
            let mut value = self.smoothing * *smoothed + (1.0 - self.smoothing) * magnitude;
            if !value.is_finite() {
                value = 0.0;
            }
            *smoothed = value;
            *db = 20.0 * value.log10();
        }
    }
}

/// Blackman window (alpha = 0.16)
fn blackman_window(size: usize) -> Vec<f32> {
    let alpha = 0.16f64;
    let a0 = 0.5 * (1.0 - alpha);
    let a1 = 0.5;
    let a2 = 0.5 * alpha;
    (0..size)
        .map(|i| {
            let x = i as f64 / size as f64;
            let w = a0 - a1 * (2.0 * std::f64::consts::PI * x).cos()
                + a2 * (4.0 * std::f64::consts::PI * x).cos();
            w as f32
        })
        .collect()
}

fn mix_to_mono(buffer: &PcmBuffer) -> Vec<f32> {
    let channels = buffer.channels();
    let gain = 1.0 / channels.len() as f32;
    (0..buffer.frame_count())
        .map(|frame| channels.iter().map(|c| c[frame]).sum::<f32>() * gain)
        .collect()
}
