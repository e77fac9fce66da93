//! Offline renderer
//!
//! Executes an [`EffectGraph`] over its whole output duration in one pass and
//! returns a new buffer. The source is never modified.

use crate::effects::{AudioEffect, ConvolutionReverb};
use crate::graph::EffectGraph;
use crate::resampling::{resample_buffer, ResamplingQuality};
use remix_core::{PcmBuffer, RemixError, Result};
use std::borrow::Cow;
use std::time::Instant;

/// Renders effect graphs offline
///
/// Rendering is deterministic: the same graph always produces bit-identical
/// output. It either returns the complete buffer or fails with
/// `RenderFailure`, never a partial result.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineRenderer {
    quality: ResamplingQuality,
}

impl OfflineRenderer {
    /// Create a renderer using high-quality sample-rate conversion
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a renderer with a specific sample-rate conversion quality
    pub fn with_quality(quality: ResamplingQuality) -> Self {
        Self { quality }
    }

    /// Quality used when the source or IR must change rate
    pub fn quality(&self) -> ResamplingQuality {
        self.quality
    }

    /// Render `graph` to a new buffer
    ///
    /// The result has exactly `graph.output_frames()` frames at
    /// `graph.render_rate()` with the source's channel count.
    ///
    /// # Errors
    /// Returns `RenderFailure` if rate conversion fails, the impulse response
    /// cannot be prepared, or the graph produces a non-finite sample.
    pub fn render(&self, graph: &EffectGraph<'_>) -> Result<PcmBuffer> {
        let started = Instant::now();
        let render_rate = graph.render_rate();
        let output_frames = graph.output_frames();

        // Source at the render rate
        let source: Cow<'_, PcmBuffer> = if graph.needs_resample() {
            Cow::Owned(resample_buffer(graph.source(), render_rate, self.quality)?)
        } else {
            Cow::Borrowed(graph.source())
        };

        // Tempo
        let tempo = graph.tempo();
        let mut channels: Vec<Vec<f32>> = source
            .channels()
            .iter()
            .map(|channel| tempo.apply(channel, output_frames))
            .collect();
        drop(source);

        // Low-pass
        if let Some(mut low_pass) = graph.low_pass() {
            low_pass.process(&mut channels);
        }

        // Reverb branch, fed from the filtered signal
        let wet = match graph.impulse() {
            Some(impulse) => {
                let impulse = if impulse.sample_rate() == render_rate {
                    Cow::Borrowed(impulse)
                } else {
                    Cow::Owned(resample_buffer(impulse, render_rate, self.quality)?)
                };
                let mut reverb = ConvolutionReverb::new(&impulse)
                    .map_err(|e| RemixError::render(format!("reverb stage: {}", e)))?;

                let mut wet = channels.clone();
                reverb.process(&mut wet);
                Some(wet)
            }
            None => None,
        };

        // Gains and sum
        let output = graph.mixer().mix(channels, wet.as_deref());

        if let Some((channel, frame)) = Self::first_non_finite(&output) {
            return Err(RemixError::render(format!(
                "non-finite sample at channel {} frame {}",
                channel, frame
            )));
        }

        let rendered = PcmBuffer::new(output, render_rate)
            .map_err(|e| RemixError::render(e.to_string()))?;

        tracing::debug!(
            "Rendered {} channels x {} frames at {} in {:?}",
            rendered.channel_count(),
            rendered.frame_count(),
            render_rate,
            started.elapsed()
        );

        Ok(rendered)
    }

    fn first_non_finite(channels: &[Vec<f32>]) -> Option<(usize, usize)> {
        channels.iter().enumerate().find_map(|(index, channel)| {
            channel
                .iter()
                .position(|s| !s.is_finite())
                .map(|frame| (index, frame))
        })
    }
}
