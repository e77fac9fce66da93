//! Remix Export
//!
//! Turns an uploaded file plus a snapshot of the editor controls into a
//! downloadable 16-bit WAV.
//!
//! # Example
//!
//! ```rust,no_run
//! use remix_export::{ExportSession, FileImpulseResponse};
//! use remix_core::EffectParameters;
//! use std::sync::Arc;
//!
//! # async fn example(upload: Vec<u8>) -> remix_core::Result<()> {
//! let session = ExportSession::with_impulse_source(Arc::new(
//!     FileImpulseResponse::new("assets/impulse.wav"),
//! ));
//!
//! let params = EffectParameters {
//!     tempo_ratio: 0.85,
//!     reverb_mix: 0.3,
//!     ..EffectParameters::default()
//! };
//! let output = session.export_edited(upload, "mp3", params).await?;
//! std::fs::write("edited.wav", &output.container)?;
//! # Ok(())
//! # }
//! ```

mod asset;
mod controls;
mod options;
mod session;

pub use asset::{
    FileImpulseResponse, ImpulseAsset, ImpulseResponseSource, MissingImpulseResponse,
    StaticImpulseResponse,
};
pub use controls::ControlState;
pub use options::{ExportOptions, ReverbFallback};
pub use session::{ExportOutput, ExportSession, SourceSummary};
