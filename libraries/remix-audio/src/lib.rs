//! Remix Audio
//!
//! Decoding, offline effect rendering, and WAV encoding for Remix.
//!
//! This crate provides:
//! - Audio decoding via Symphonia (MP3, OGG Vorbis, WAV)
//! - The fixed effect graph (tempo, low-pass, convolution reverb, dry/wet mix)
//! - A deterministic offline renderer for that graph
//! - A byte-exact 16-bit WAV encoder
//! - Spectrum analysis frames for visualizers
//!
//! # Example: Rendering an edit
//!
//! ```rust
//! use remix_audio::{wav, EffectGraph, OfflineRenderer};
//! use remix_core::{EffectParameters, PcmBuffer, SampleRate};
//!
//! # fn example() -> remix_core::Result<()> {
//! let source = PcmBuffer::silent(2, 44_100, SampleRate::CD_QUALITY);
//! let params = EffectParameters {
//!     tempo_ratio: 2.0,
//!     low_pass_cutoff_hz: 5_000.0,
//!     ..EffectParameters::default()
//! };
//!
//! let graph = EffectGraph::build(&source, &params, None)?;
//! let rendered = OfflineRenderer::new().render(&graph)?;
//! assert_eq!(rendered.frame_count(), 22_050);
//!
//! let container = wav::encode(&rendered)?;
//! assert_eq!(container.len(), 44 + 22_050 * 2 * 2);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

pub mod analysis;
mod decoder;
pub mod effects;
mod graph;
mod renderer;
pub mod resampling;
pub mod wav;

pub use decoder::SymphoniaDecoder;
pub use graph::{EffectGraph, Node};
pub use renderer::OfflineRenderer;
