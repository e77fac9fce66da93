/// Playback-rate (tempo) stage
///
/// Reads the input at `ratio` input frames per output frame with linear
/// interpolation, like a buffer source with a playback rate. Speed and pitch
/// change together.

/// Linear-interpolation playback-rate transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackRate {
    ratio: f64,
}

impl PlaybackRate {
    /// Create a stage reading `ratio` input frames per output frame
    ///
    /// The ratio must be finite and positive; the graph builder validates it.
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }

    /// Playback-rate multiplier
    pub fn ratio(&self) -> f64 {
        self.ratio
    }

    /// Whether the stage is an exact pass-through
    pub fn is_identity(&self) -> bool {
        self.ratio == 1.0
    }

    /// Frames produced from `input_frames` frames
    pub fn output_frames(&self, input_frames: usize) -> usize {
        (input_frames as f64 / self.ratio).ceil() as usize
    }

    /// Render exactly `output_frames` frames of one channel
    ///
    /// The read position of output frame `i` is `i * ratio`, computed from the
    /// index rather than accumulated, so rendering is deterministic and a
    /// ratio of 1.0 reproduces the input bit for bit. Past the last input
    /// frame the interpolation holds the final sample; positions beyond the
    /// end of the input produce silence.
    pub fn apply(&self, input: &[f32], output_frames: usize) -> Vec<f32> {
        let mut output = Vec::with_capacity(output_frames);

        if self.is_identity() {
            output.extend(input.iter().take(output_frames));
            output.resize(output_frames, 0.0);
            return output;
        }

        for i in 0..output_frames {
            let position = i as f64 * self.ratio;
            let index = position.floor() as usize;
            if index >= input.len() {
                output.push(0.0);
                continue;
            }

            let current = input[index];
            let next = input.get(index + 1).copied().unwrap_or(current);
            let frac = (position - index as f64) as f32;
            output.push(current + (next - current) * frac);
        }

        output
    }
}
