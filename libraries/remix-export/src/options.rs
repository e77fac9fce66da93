//! Export behaviour knobs
use serde::{Deserialize, Serialize};

/// What to do when the reverb impulse response cannot be used
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReverbFallback {
    /// Abort the export with a `ReverbAsset` error
    #[default]
    Fail,
    /// Render without the reverb branch and report it as bypassed
    DryOnly,
}

/// Options fixed for the lifetime of an export session
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExportOptions {
    /// Behaviour when the impulse response is missing or undecodable
    #[serde(default)]
    pub reverb_fallback: ReverbFallback,

    /// Longest output an export may produce, in seconds
    ///
    /// Checked before rendering so a tiny tempo cannot make a short upload
    /// allocate gigabytes. `None` leaves only the WAV size limit.
    #[serde(default)]
    pub max_output_secs: Option<f64>,
}
