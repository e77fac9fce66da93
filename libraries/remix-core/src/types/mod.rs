//! Core domain types for Remix

pub mod audio;
pub mod format;
pub mod params;
pub mod tags;

pub use audio::{PcmBuffer, SampleRate};
pub use format::SourceFormat;
pub use params::{EffectParameters, MixGains};
pub use tags::TagFields;
