//! Live control values behind the editor's sliders
//!
//! Tempo and pitch are two views of one playback rate: there is no
//! independent pitch shifter, so moving either slider sets the rate that both
//! report. An export takes a [`ControlState::snapshot`] of whatever the
//! sliders hold at that moment.

use remix_core::{EffectParameters, RemixError, Result, SampleRate, Transport};

/// Current slider values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlState {
    playback_rate: f64,
    low_pass_cutoff_hz: f64,
    reverb_mix: f32,
    output_sample_rate: Option<SampleRate>,
}

impl Default for ControlState {
    fn default() -> Self {
        let neutral = EffectParameters::default();
        Self {
            playback_rate: neutral.tempo_ratio,
            low_pass_cutoff_hz: neutral.low_pass_cutoff_hz,
            reverb_mix: neutral.reverb_mix,
            output_sample_rate: neutral.output_sample_rate,
        }
    }
}

impl ControlState {
    /// Neutral controls
    pub fn new() -> Self {
        Self::default()
    }

    /// Tempo slider value
    pub fn tempo(&self) -> f64 {
        self.playback_rate
    }

    /// Pitch slider value (same as tempo)
    pub fn pitch(&self) -> f64 {
        self.playback_rate
    }

    /// Low-pass cutoff in Hz
    pub fn low_pass_cutoff_hz(&self) -> f64 {
        self.low_pass_cutoff_hz
    }

    /// Reverb mix in [0, 1]
    pub fn reverb_mix(&self) -> f32 {
        self.reverb_mix
    }

    /// Set the shared playback rate from the tempo slider
    ///
    /// # Errors
    /// Returns `InvalidParameter` unless `ratio` is positive and finite.
    pub fn set_tempo(&mut self, ratio: f64) -> Result<()> {
        self.set_playback_rate(ratio)
    }

    /// Set the shared playback rate from the pitch slider
    ///
    /// # Errors
    /// Returns `InvalidParameter` unless `ratio` is positive and finite.
    pub fn set_pitch(&mut self, ratio: f64) -> Result<()> {
        self.set_playback_rate(ratio)
    }

    fn set_playback_rate(&mut self, ratio: f64) -> Result<()> {
        self.checked(|state| state.playback_rate = ratio)
    }

    /// Set the low-pass cutoff in Hz
    ///
    /// # Errors
    /// Returns `InvalidParameter` unless `hz` is positive and finite.
    pub fn set_low_pass_cutoff(&mut self, hz: f64) -> Result<()> {
        self.checked(|state| state.low_pass_cutoff_hz = hz)
    }

    /// Set the reverb wet/dry balance
    ///
    /// # Errors
    /// Returns `InvalidParameter` unless `mix` is within [0, 1].
    pub fn set_reverb_mix(&mut self, mix: f32) -> Result<()> {
        self.checked(|state| state.reverb_mix = mix)
    }

    /// Render at `rate` instead of the source rate
    ///
    /// # Errors
    /// Returns `InvalidParameter` for a zero rate.
    pub fn set_output_sample_rate(&mut self, rate: Option<SampleRate>) -> Result<()> {
        self.checked(|state| state.output_sample_rate = rate)
    }

    /// Apply `change` only if the result still validates
    fn checked(&mut self, change: impl FnOnce(&mut Self)) -> Result<()> {
        let mut next = *self;
        change(&mut next);
        next.snapshot().validate()?;
        *self = next;
        Ok(())
    }

    /// Parameters for one export request
    pub fn snapshot(&self) -> EffectParameters {
        EffectParameters {
            tempo_ratio: self.playback_rate,
            low_pass_cutoff_hz: self.low_pass_cutoff_hz,
            reverb_mix: self.reverb_mix,
            output_sample_rate: self.output_sample_rate,
        }
    }

    /// Push the playback rate to a live preview
    ///
    /// # Errors
    /// Propagates the transport's error.
    pub fn apply_to(&self, transport: &mut dyn Transport) -> Result<()> {
        transport.set_playback_rate(self.playback_rate)
    }

    /// Rebuild controls from a parameter snapshot
    ///
    /// # Errors
    /// Returns `InvalidParameter` if `params` do not validate.
    pub fn from_parameters(params: &EffectParameters) -> Result<Self> {
        params.validate().map_err(|e| match e {
            RemixError::InvalidParameter(msg) => {
                RemixError::invalid_parameter(format!("cannot restore controls: {msg}"))
            }
            other => other,
        })?;
        Ok(Self {
            playback_rate: params.tempo_ratio,
            low_pass_cutoff_hz: params.low_pass_cutoff_hz,
            reverb_mix: params.reverb_mix,
            output_sample_rate: params.output_sample_rate,
        })
    }
}
