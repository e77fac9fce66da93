/// Low-pass biquad filter
///
/// Second-order Butterworth low-pass using the RBJ Audio EQ Cookbook
/// coefficients. Coefficients and state are kept in f64 so long renders do not
/// drift; samples are converted back to f32 on output.
use super::AudioEffect;

/// Butterworth quality factor (1/sqrt(2)): maximally flat passband
pub const BUTTERWORTH_Q: f64 = std::f64::consts::FRAC_1_SQRT_2;

/// Normalized biquad coefficients (a0 divided out)
#[derive(Debug, Clone, Copy, PartialEq)]
struct Coefficients {
    b0: f64,
    b1: f64,
    b2: f64,
    a1: f64,
    a2: f64,
}

impl Coefficients {
    fn low_pass(cutoff_hz: f64, sample_rate: f64, q: f64) -> Self {
        let omega = 2.0 * std::f64::consts::PI * cutoff_hz / sample_rate;
        let sin_omega = omega.sin();
        let cos_omega = omega.cos();
        let alpha = sin_omega / (2.0 * q);

        let b0 = (1.0 - cos_omega) / 2.0;
        let b1 = 1.0 - cos_omega;
        let b2 = (1.0 - cos_omega) / 2.0;
        let a0 = 1.0 + alpha;
        let a1 = -2.0 * cos_omega;
        let a2 = 1.0 - alpha;

        Self {
            b0: b0 / a0,
            b1: b1 / a0,
            b2: b2 / a0,
            a1: a1 / a0,
            a2: a2 / a0,
        }
    }
}

/// Direct Form I history for one channel
#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    x1: f64,
    x2: f64,
    y1: f64,
    y2: f64,
}

/// Low-pass filter applied to every channel independently
///
/// A cutoff at or above the Nyquist frequency leaves the signal untouched.
#[derive(Debug, Clone)]
pub struct LowPassFilter {
    cutoff_hz: f64,
    sample_rate: u32,
    coefficients: Option<Coefficients>,
    state: Vec<ChannelState>,
}

impl LowPassFilter {
    /// Create a Butterworth low-pass at `cutoff_hz` for audio at `sample_rate`
    pub fn new(cutoff_hz: f64, sample_rate: u32) -> Self {
        let rate = f64::from(sample_rate);
        let coefficients = if cutoff_hz >= rate / 2.0 {
            None
        } else {
            Some(Coefficients::low_pass(cutoff_hz, rate, BUTTERWORTH_Q))
        };

        Self {
            cutoff_hz,
            sample_rate,
            coefficients,
            state: Vec::new(),
        }
    }

    /// Cutoff frequency in Hz
    pub fn cutoff_hz(&self) -> f64 {
        self.cutoff_hz
    }

    /// Sample rate the coefficients were computed for
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Whether the cutoff is at or above Nyquist and the filter passes through
    pub fn is_bypassed(&self) -> bool {
        self.coefficients.is_none()
    }
}

impl AudioEffect for LowPassFilter {
    fn process(&mut self, channels: &mut [Vec<f32>]) {
        let Some(c) = self.coefficients else {
            return;
        };

        if self.state.len() < channels.len() {
            self.state.resize(channels.len(), ChannelState::default());
        }

        for (channel, state) in channels.iter_mut().zip(self.state.iter_mut()) {
            for sample in channel.iter_mut() {
                let x0 = f64::from(*sample);
                let y0 = c.b0 * x0 + c.b1 * state.x1 + c.b2 * state.x2
                    - c.a1 * state.y1
                    - c.a2 * state.y2;

                state.x2 = state.x1;
                state.x1 = x0;
                state.y2 = state.y1;
                state.y1 = y0;

                *sample = y0 as f32;
            }
        }
    }

    fn reset(&mut self) {
        self.state.clear();
    }

    fn name(&self) -> &str {
        "Low-pass"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f64, sample_rate: u32, frames: usize) -> Vec<f32> {
        (0..frames)
            .map(|i| {
                let t = i as f64 / f64::from(sample_rate);
                (2.0 * std::f64::consts::PI * freq * t).sin() as f32
            })
            .collect()
    }

    fn rms(samples: &[f32]) -> f32 {
        (samples.iter().map(|s| s * s).sum::<f32>() / samples.len() as f32).sqrt()
    }

    #[test]
    fn cutoff_at_nyquist_is_bypassed() {
        let mut filter = LowPassFilter::new(22_050.0, 44_100);
        assert!(filter.is_bypassed());

        let input = sine(15_000.0, 44_100, 512);
        let mut channels = vec![input.clone()];
        filter.process(&mut channels);
        assert_eq!(channels[0], input);
    }

    #[test]
    fn passes_tone_below_cutoff() {
        let mut filter = LowPassFilter::new(2_000.0, 44_100);
        let mut channels = vec![sine(200.0, 44_100, 44_100)];
        filter.process(&mut channels);

        // Skip the transient
        let level = rms(&channels[0][4_410..]);
        assert!((level - std::f32::consts::FRAC_1_SQRT_2).abs() < 0.02, "rms {level}");
    }

    #[test]
    fn attenuates_tone_above_cutoff() {
        let mut filter = LowPassFilter::new(500.0, 44_100);
        let mut channels = vec![sine(8_000.0, 44_100, 44_100)];
        filter.process(&mut channels);

        // 4 octaves above a 12 dB/oct slope: well over 40 dB down
        let level = rms(&channels[0][4_410..]);
        assert!(level < 0.01, "rms {level}");
    }

    #[test]
    fn channels_are_filtered_independently() {
        let mut filter = LowPassFilter::new(1_000.0, 8_000);
        let mut channels = vec![vec![1.0, 0.0, 0.0, 0.0], vec![0.0; 4]];
        filter.process(&mut channels);

        assert!(channels[0][0] > 0.0);
        assert!(channels[1].iter().all(|&s| s == 0.0));
    }

    #[test]
    fn dc_gain_is_unity() {
        let mut filter = LowPassFilter::new(1_000.0, 44_100);
        let mut channels = vec![vec![0.5; 8_820]];
        filter.process(&mut channels);
        assert!((channels[0][8_819] - 0.5).abs() < 1e-4);
    }
}
