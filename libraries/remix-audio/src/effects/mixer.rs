/// Dry/wet gain stage and summing junction
use remix_core::MixGains;

/// Sums the dry path and the optional wet path with their gains
///
/// Without a wet path the output is `dry * gains.dry`, so a fully dry mix
/// returns the dry signal unchanged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DryWetMixer {
    gains: MixGains,
}

impl DryWetMixer {
    /// Create a mixer with the given gains
    pub fn new(gains: MixGains) -> Self {
        Self { gains }
    }

    /// Gains applied to each path
    pub fn gains(&self) -> MixGains {
        self.gains
    }

    /// Mix both paths channel by channel, consuming the dry path
    ///
    /// A wet channel shorter than its dry channel contributes silence past its
    /// end; extra wet channels are ignored.
    pub fn mix(&self, dry: Vec<Vec<f32>>, wet: Option<&[Vec<f32>]>) -> Vec<Vec<f32>> {
        let MixGains {
            dry: dry_gain,
            wet: wet_gain,
        } = self.gains;

        let mut output = dry;
        for (index, channel) in output.iter_mut().enumerate() {
            if dry_gain != 1.0 {
                for sample in channel.iter_mut() {
                    *sample *= dry_gain;
                }
            }

            if let Some(wet_channel) = wet.and_then(|w| w.get(index)) {
                for (sample, &wet_sample) in channel.iter_mut().zip(wet_channel) {
                    *sample += wet_sample * wet_gain;
                }
            }
        }
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fully_dry_is_unchanged() {
        let dry = vec![vec![0.1, -0.7, 0.33]];
        let mixer = DryWetMixer::new(MixGains::DRY);
        assert_eq!(mixer.mix(dry.clone(), None), dry);
    }

    #[test]
    fn fully_wet_drops_dry_path() {
        let mixer = DryWetMixer::new(MixGains::from_mix(1.0));
        let wet = vec![vec![0.25, 0.5]];
        let output = mixer.mix(vec![vec![1.0, 1.0]], Some(&wet));
        assert_eq!(output, vec![vec![0.25, 0.5]]);
    }

    #[test]
    fn half_mix_averages() {
        let mixer = DryWetMixer::new(MixGains::from_mix(0.5));
        let wet = vec![vec![0.0, 1.0], vec![1.0, 0.0]];
        let output = mixer.mix(vec![vec![1.0, 1.0], vec![0.0, 0.0]], Some(&wet));
        assert_eq!(output, vec![vec![0.5, 1.0], vec![0.5, 0.0]]);
    }

    #[test]
    fn zero_in_zero_out() {
        for mix in [0.0, 0.3, 0.5, 1.0] {
            let mixer = DryWetMixer::new(MixGains::from_mix(mix));
            let wet = vec![vec![0.0; 4]];
            let output = mixer.mix(vec![vec![0.0; 4]], Some(&wet));
            assert!(output[0].iter().all(|&s| s == 0.0));
        }
    }
}
