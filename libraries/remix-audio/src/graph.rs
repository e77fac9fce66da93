//! Effect graph builder
//!
//! Describes the fixed processing topology for one export:
//!
//! ```text
//! source -> tempo/resample -> lowpass -> dry gain ----------------------> sum -> output
//!                                     \-> convolution(IR) -> wet gain -/
//! ```
//!
//! Building validates everything up front and does no DSP work; the
//! [`OfflineRenderer`](crate::OfflineRenderer) executes the graph.

use crate::effects::{DryWetMixer, LowPassFilter, PlaybackRate};
use remix_core::{EffectParameters, MixGains, PcmBuffer, RemixError, Result, SampleRate};

/// Largest data section a 16-bit WAV can describe
const MAX_DATA_BYTES: u64 = u32::MAX as u64 - 36;

/// One node of the graph, in processing order
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Node {
    /// The decoded source
    Source {
        /// Source sample rate
        sample_rate: SampleRate,
        /// Source frame count
        frames: usize,
    },
    /// Sample-rate conversion to the render rate
    Resample {
        /// Render rate
        to: SampleRate,
    },
    /// Playback-rate change
    Tempo {
        /// Playback-rate multiplier
        ratio: f64,
    },
    /// Butterworth low-pass (absent when the cutoff is at or above Nyquist)
    LowPass {
        /// Cutoff frequency in Hz
        cutoff_hz: f64,
    },
    /// Gain on the dry path
    DryGain(f32),
    /// Convolution with the impulse response
    Convolver {
        /// IR channel count
        ir_channels: usize,
        /// IR frame count at its own rate
        ir_frames: usize,
    },
    /// Gain on the wet path
    WetGain(f32),
    /// Summing junction feeding the output
    Sum,
}

/// Validated, ready-to-render description of one export
#[derive(Debug, Clone)]
pub struct EffectGraph<'a> {
    source: &'a PcmBuffer,
    impulse: Option<&'a PcmBuffer>,
    render_rate: SampleRate,
    output_frames: usize,
    tempo: PlaybackRate,
    low_pass_cutoff_hz: Option<f64>,
    gains: MixGains,
}

impl<'a> EffectGraph<'a> {
    /// Build the graph for `source` rendered with `params`
    ///
    /// `impulse` is only required when the wet gain is above zero; with a
    /// fully dry mix the reverb branch is omitted and any IR is ignored.
    ///
    /// # Errors
    /// - `InvalidParameter` if a parameter is out of range
    /// - `ReverbAsset` if the mix needs an impulse response and none (or an
    ///   empty one) was supplied
    /// - `RenderFailure` if the rendered output could not be framed as WAV
    pub fn build(
        source: &'a PcmBuffer,
        params: &EffectParameters,
        impulse: Option<&'a PcmBuffer>,
    ) -> Result<Self> {
        params.validate()?;

        let gains = params.gains();
        let impulse = if gains.has_wet() {
            match impulse {
                Some(ir) if ir.is_empty() => {
                    return Err(RemixError::reverb_asset("impulse response has no frames"));
                }
                Some(ir) => Some(ir),
                None => {
                    return Err(RemixError::reverb_asset(
                        "reverb mix is above zero but no impulse response was supplied",
                    ));
                }
            }
        } else {
            None
        };

        let render_rate = params.output_sample_rate.unwrap_or(source.sample_rate());
        let output_frames = Self::output_frames_for(
            source.frame_count(),
            source.sample_rate(),
            render_rate,
            params.tempo_ratio,
        )?;

        let data_bytes = u64::try_from(output_frames)
            .ok()
            .and_then(|frames| frames.checked_mul(source.channel_count() as u64))
            .and_then(|samples| samples.checked_mul(2))
            .filter(|&bytes| bytes <= MAX_DATA_BYTES);
        if data_bytes.is_none() {
            return Err(RemixError::render(format!(
                "{} output frames of {} channels exceed the WAV size limit",
                output_frames,
                source.channel_count()
            )));
        }

        let low_pass = LowPassFilter::new(params.low_pass_cutoff_hz, render_rate.as_hz());
        let low_pass_cutoff_hz = (!low_pass.is_bypassed()).then_some(params.low_pass_cutoff_hz);

        let graph = Self {
            source,
            impulse,
            render_rate,
            output_frames,
            tempo: PlaybackRate::new(params.tempo_ratio),
            low_pass_cutoff_hz,
            gains,
        };

        tracing::debug!("Built effect graph: {:?}", graph.nodes());
        Ok(graph)
    }

    /// Output length: `ceil(frames * output_rate / (input_rate * tempo))`
    ///
    /// With equal rates this is exactly `ceil(frames / tempo)`.
    ///
    /// # Errors
    /// Returns `RenderFailure` when the length does not fit in a `usize`,
    /// which happens for vanishingly small tempo ratios.
    pub fn output_frames_for(
        frames: usize,
        input_rate: SampleRate,
        output_rate: SampleRate,
        tempo_ratio: f64,
    ) -> Result<usize> {
        let scaled = if input_rate == output_rate {
            frames as f64 / tempo_ratio
        } else {
            frames as f64 * f64::from(output_rate.as_hz())
                / (f64::from(input_rate.as_hz()) * tempo_ratio)
        };
        let frames = scaled.ceil();
        // usize::MAX as f64 rounds up to 2^64, itself out of range
        if !frames.is_finite() || frames >= usize::MAX as f64 {
            return Err(RemixError::render(format!(
                "output length {scaled} frames is out of range"
            )));
        }
        Ok(frames as usize)
    }

    /// The decoded source
    pub fn source(&self) -> &PcmBuffer {
        self.source
    }

    /// Impulse response, present only when the reverb branch is active
    pub fn impulse(&self) -> Option<&PcmBuffer> {
        self.impulse
    }

    /// Sample rate of the rendered output
    pub fn render_rate(&self) -> SampleRate {
        self.render_rate
    }

    /// Frame count of the rendered output
    pub fn output_frames(&self) -> usize {
        self.output_frames
    }

    /// Channel count of the rendered output (always the source's)
    pub fn channel_count(&self) -> usize {
        self.source.channel_count()
    }

    /// Tempo stage
    pub fn tempo(&self) -> PlaybackRate {
        self.tempo
    }

    /// Whether the source must be converted to the render rate first
    pub fn needs_resample(&self) -> bool {
        self.render_rate != self.source.sample_rate()
    }

    /// Low-pass stage, or `None` when the cutoff bypasses it
    pub fn low_pass(&self) -> Option<LowPassFilter> {
        self.low_pass_cutoff_hz
            .map(|cutoff| LowPassFilter::new(cutoff, self.render_rate.as_hz()))
    }

    /// Gains of both paths
    pub fn gains(&self) -> MixGains {
        self.gains
    }

    /// Mixer for the summing junction
    pub fn mixer(&self) -> DryWetMixer {
        DryWetMixer::new(self.gains)
    }

    /// Whether the reverb branch is part of the graph
    pub fn has_reverb(&self) -> bool {
        self.impulse.is_some()
    }

    /// Nodes in processing order (dry path before wet path)
    pub fn nodes(&self) -> Vec<Node> {
        let mut nodes = vec![Node::Source {
            sample_rate: self.source.sample_rate(),
            frames: self.source.frame_count(),
        }];
        if self.needs_resample() {
            nodes.push(Node::Resample {
                to: self.render_rate,
            });
        }
        nodes.push(Node::Tempo {
            ratio: self.tempo.ratio(),
        });
        if let Some(cutoff_hz) = self.low_pass_cutoff_hz {
            nodes.push(Node::LowPass { cutoff_hz });
        }
        nodes.push(Node::DryGain(self.gains.dry));
        if let Some(ir) = self.impulse {
            nodes.push(Node::Convolver {
                ir_channels: ir.channel_count(),
                ir_frames: ir.frame_count(),
            });
            nodes.push(Node::WetGain(self.gains.wet));
        }
        nodes.push(Node::Sum);
        nodes
    }
}
