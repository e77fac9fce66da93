/// Audio-related types
use crate::error::{RemixError, Result};
use serde::{Deserialize, Serialize};

/// Sample rate in Hz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SampleRate(pub u32);

impl SampleRate {
    /// 8 kHz telephone band
    pub const TELEPHONE: Self = Self(8_000);
    /// 44.1 kHz CD audio
    pub const CD_QUALITY: Self = Self(44_100);
    /// 48 kHz video/DVD audio
    pub const DVD_QUALITY: Self = Self(48_000);
    /// 96 kHz high resolution
    pub const HIGH_RES_96: Self = Self(96_000);

    /// Create a new sample rate
    #[must_use]
    pub fn new(hz: u32) -> Self {
        Self(hz)
    }

    /// Get the sample rate as Hz
    pub fn as_hz(&self) -> u32 {
        self.0
    }

    /// Half the sample rate, the highest representable frequency
    pub fn nyquist(&self) -> f64 {
        f64::from(self.0) / 2.0
    }
}

impl std::fmt::Display for SampleRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} Hz", self.0)
    }
}

/// Decoded or rendered audio
///
/// Samples are stored planar as f32, nominally in [-1.0, 1.0] but not clamped.
/// Every channel holds exactly `frame_count()` samples; the constructors
/// refuse anything else, so the invariant holds for the buffer's lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    channels: Vec<Vec<f32>>,
    sample_rate: SampleRate,
}

impl PcmBuffer {
    /// Create a buffer from planar channel data
    ///
    /// # Errors
    /// Returns `InvalidParameter` if there are no channels, the sample rate is
    /// zero, or the channels differ in length.
    pub fn new(channels: Vec<Vec<f32>>, sample_rate: SampleRate) -> Result<Self> {
        if channels.is_empty() {
            return Err(RemixError::invalid_parameter(
                "PCM buffer needs at least one channel",
            ));
        }
        if sample_rate.as_hz() == 0 {
            return Err(RemixError::invalid_parameter("sample rate must be positive"));
        }
        let frames = channels[0].len();
        if let Some((index, channel)) = channels
            .iter()
            .enumerate()
            .find(|(_, c)| c.len() != frames)
        {
            return Err(RemixError::invalid_parameter(format!(
                "channel {} has {} frames, expected {}",
                index,
                channel.len(),
                frames
            )));
        }

        Ok(Self {
            channels,
            sample_rate,
        })
    }

    /// Create a silent buffer
    ///
    /// A zero channel count is raised to one so the result is always valid.
    pub fn silent(channel_count: usize, frame_count: usize, sample_rate: SampleRate) -> Self {
        Self {
            channels: vec![vec![0.0; frame_count]; channel_count.max(1)],
            sample_rate: SampleRate(sample_rate.as_hz().max(1)),
        }
    }

    /// Create a buffer from interleaved samples ([L, R, L, R, ...])
    ///
    /// # Errors
    /// Returns `InvalidParameter` if `channel_count` is zero or the sample
    /// count is not a multiple of it.
    pub fn from_interleaved(
        samples: &[f32],
        channel_count: usize,
        sample_rate: SampleRate,
    ) -> Result<Self> {
        if channel_count == 0 {
            return Err(RemixError::invalid_parameter(
                "PCM buffer needs at least one channel",
            ));
        }
        if samples.len() % channel_count != 0 {
            return Err(RemixError::invalid_parameter(format!(
                "{} interleaved samples is not a multiple of {} channels",
                samples.len(),
                channel_count
            )));
        }

        let frames = samples.len() / channel_count;
        let mut channels = vec![Vec::with_capacity(frames); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }

        Self::new(channels, sample_rate)
    }

    /// Interleave all channels frame by frame
    pub fn to_interleaved(&self) -> Vec<f32> {
        let mut interleaved = Vec::with_capacity(self.frame_count() * self.channel_count());
        for frame in 0..self.frame_count() {
            for channel in &self.channels {
                interleaved.push(channel[frame]);
            }
        }
        interleaved
    }

    /// Number of channels (1 = mono, 2 = stereo, ...)
    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    /// Number of frames (samples per channel)
    pub fn frame_count(&self) -> usize {
        self.channels[0].len()
    }

    /// Sample rate of the buffer
    pub fn sample_rate(&self) -> SampleRate {
        self.sample_rate
    }

    /// Get the duration in seconds
    pub fn duration_secs(&self) -> f64 {
        self.frame_count() as f64 / f64::from(self.sample_rate.as_hz())
    }

    /// Check if the buffer holds no frames
    pub fn is_empty(&self) -> bool {
        self.frame_count() == 0
    }

    /// Samples of one channel
    pub fn channel(&self, index: usize) -> Option<&[f32]> {
        self.channels.get(index).map(Vec::as_slice)
    }

    /// All channels, planar
    pub fn channels(&self) -> &[Vec<f32>] {
        &self.channels
    }

    /// Consume the buffer and return its planar channel data
    pub fn into_channels(self) -> Vec<Vec<f32>> {
        self.channels
    }

    /// Largest absolute sample value across all channels
    pub fn peak(&self) -> f32 {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }
}
