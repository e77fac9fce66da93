/// Effect parameter snapshot and dry/wet gains
use super::audio::SampleRate;
use crate::error::{RemixError, Result};
use serde::{Deserialize, Serialize};

/// Snapshot of the user controls at the moment an export is requested
///
/// Built fresh for every export and never persisted. The reverb impulse
/// response travels separately because it is loaded per export.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectParameters {
    /// Playback-rate multiplier (1.0 = unchanged, 2.0 = twice as fast)
    #[serde(default = "default_tempo_ratio")]
    pub tempo_ratio: f64,

    /// Low-pass cutoff in Hz; at or above Nyquist the filter is bypassed
    #[serde(default = "default_cutoff")]
    pub low_pass_cutoff_hz: f64,

    /// Fraction of the output taken from the reverb path (0.0 - 1.0)
    #[serde(default)]
    pub reverb_mix: f32,

    /// Sample rate of the rendered output; `None` keeps the source rate
    #[serde(default)]
    pub output_sample_rate: Option<SampleRate>,
}

fn default_tempo_ratio() -> f64 {
    1.0
}

fn default_cutoff() -> f64 {
    22_050.0
}

impl Default for EffectParameters {
    fn default() -> Self {
        Self {
            tempo_ratio: default_tempo_ratio(),
            low_pass_cutoff_hz: default_cutoff(),
            reverb_mix: 0.0,
            output_sample_rate: None,
        }
    }
}

impl EffectParameters {
    /// Check every field against its documented range
    ///
    /// # Errors
    /// Returns `InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<()> {
        if !self.tempo_ratio.is_finite() || self.tempo_ratio <= 0.0 {
            return Err(RemixError::invalid_parameter(format!(
                "tempo ratio must be a positive number, got {}",
                self.tempo_ratio
            )));
        }
        if !self.low_pass_cutoff_hz.is_finite() || self.low_pass_cutoff_hz <= 0.0 {
            return Err(RemixError::invalid_parameter(format!(
                "low-pass cutoff must be a positive frequency, got {}",
                self.low_pass_cutoff_hz
            )));
        }
        if !self.reverb_mix.is_finite() || !(0.0..=1.0).contains(&self.reverb_mix) {
            return Err(RemixError::invalid_parameter(format!(
                "reverb mix must be within [0, 1], got {}",
                self.reverb_mix
            )));
        }
        if let Some(rate) = self.output_sample_rate {
            if rate.as_hz() == 0 {
                return Err(RemixError::invalid_parameter(
                    "output sample rate must be positive",
                ));
            }
        }
        Ok(())
    }

    /// Dry/wet gains derived from `reverb_mix`
    pub fn gains(&self) -> MixGains {
        MixGains::from_mix(self.reverb_mix)
    }
}

/// Gains of the dry and wet paths
///
/// `dry + wet == 1.0` holds exactly for every mix in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MixGains {
    /// Gain applied to the filtered (unreverberated) signal
    pub dry: f32,
    /// Gain applied to the convolved signal
    pub wet: f32,
}

impl MixGains {
    /// Fully dry mix
    pub const DRY: Self = Self { dry: 1.0, wet: 0.0 };

    /// Derive gains from a reverb mix, clamping it into [0, 1]
    ///
    /// NaN is treated as fully dry.
    pub fn from_mix(reverb_mix: f32) -> Self {
        let wet = if reverb_mix.is_nan() {
            0.0
        } else {
            reverb_mix.clamp(0.0, 1.0)
        };
        Self {
            dry: 1.0 - wet,
            wet,
        }
    }

    /// Whether the wet path contributes anything to the output
    pub fn has_wet(&self) -> bool {
        self.wet > 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn defaults_are_valid_and_neutral() {
        let params = EffectParameters::default();
        params.validate().unwrap();
        assert_eq!(params.tempo_ratio, 1.0);
        assert_eq!(params.reverb_mix, 0.0);
        assert_eq!(params.gains(), MixGains::DRY);
    }

    #[test]
    fn rejects_non_positive_tempo() {
        for tempo in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let params = EffectParameters {
                tempo_ratio: tempo,
                ..EffectParameters::default()
            };
            assert!(
                matches!(params.validate(), Err(RemixError::InvalidParameter(_))),
                "tempo {tempo} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_mix_outside_unit_range() {
        for mix in [-0.01, 1.01, f32::NAN] {
            let params = EffectParameters {
                reverb_mix: mix,
                ..EffectParameters::default()
            };
            assert!(matches!(
                params.validate(),
                Err(RemixError::InvalidParameter(_))
            ));
        }
    }

    #[test]
    fn rejects_bad_cutoff_and_rate() {
        let params = EffectParameters {
            low_pass_cutoff_hz: 0.0,
            ..EffectParameters::default()
        };
        assert!(params.validate().is_err());

        let params = EffectParameters {
            output_sample_rate: Some(SampleRate(0)),
            ..EffectParameters::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn mix_endpoints() {
        assert_eq!(MixGains::from_mix(0.0), MixGains { dry: 1.0, wet: 0.0 });
        assert_eq!(MixGains::from_mix(1.0), MixGains { dry: 0.0, wet: 1.0 });
        assert!(!MixGains::from_mix(0.0).has_wet());
        assert!(MixGains::from_mix(0.5).has_wet());
    }

    #[test]
    fn deserializes_with_defaults() {
        let params: EffectParameters =
            serde_json::from_str(r#"{"tempo_ratio": 1.5, "output_sample_rate": 48000}"#).unwrap();
        assert_eq!(params.tempo_ratio, 1.5);
        assert_eq!(params.low_pass_cutoff_hz, 22_050.0);
        assert_eq!(params.output_sample_rate, Some(SampleRate::DVD_QUALITY));
    }

    proptest! {
        #[test]
        fn dry_plus_wet_is_exactly_one(mix in 0.0f32..=1.0) {
            let gains = MixGains::from_mix(mix);
            prop_assert_eq!(gains.dry + gains.wet, 1.0);
            prop_assert_eq!(gains.wet, mix);
        }
    }
}
