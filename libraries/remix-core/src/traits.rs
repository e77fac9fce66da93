/// Core traits for Remix
use crate::error::Result;
use crate::types::{PcmBuffer, SourceFormat, TagFields};
use std::time::Duration;

/// Audio decoder trait
///
/// Implementers turn raw encoded bytes into a `PcmBuffer`. The caller has
/// already resolved `format` through the allow-list, so implementers only
/// deal with corrupt or truncated data.
pub trait AudioDecoder: Send + Sync {
    /// Decode a complete in-memory file
    ///
    /// # Errors
    /// Returns `Decode` if the bytes are not a valid stream of `format`
    fn decode(&self, bytes: &[u8], format: SourceFormat) -> Result<PcmBuffer>;
}

/// Lifecycle notifications from a realtime transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    /// The loaded source is ready to play
    Loaded,
    /// Playback reached the end of the source
    Ended,
}

/// Realtime playback transport used for the live preview
///
/// The offline export never goes through the transport; it only shares the
/// playback-rate semantics (`set_playback_rate` changes speed and pitch
/// together, exactly like the export's tempo stage).
pub trait Transport: Send {
    /// Load a source from encoded bytes
    ///
    /// # Errors
    /// Returns an error if the source cannot be loaded
    fn load(&mut self, bytes: &[u8], format: SourceFormat) -> Result<()>;

    /// Start or resume playback
    fn play(&mut self) -> Result<()>;

    /// Pause playback, keeping the position
    fn pause(&mut self) -> Result<()>;

    /// Move the play head
    fn seek(&mut self, position: Duration) -> Result<()>;

    /// Change the playback rate (1.0 = normal)
    fn set_playback_rate(&mut self, ratio: f64) -> Result<()>;

    /// Whether audio is currently playing
    fn is_playing(&self) -> bool;

    /// Next pending lifecycle event, if any
    fn poll_event(&mut self) -> Option<TransportEvent>;
}

/// Consumer of per-frame frequency magnitudes (e.g. a spectrum visualizer)
pub trait SpectrumSink {
    /// Receive one analysis frame; `magnitudes` is only valid for the call
    fn on_frame(&mut self, magnitudes: &[f32]);
}

impl SpectrumSink for Vec<Vec<f32>> {
    fn on_frame(&mut self, magnitudes: &[f32]) {
        self.push(magnitudes.to_vec());
    }
}

/// Tag reader/writer
pub trait TagEditor: Send + Sync {
    /// Read the tags embedded in an encoded file
    ///
    /// # Errors
    /// Returns an error if the tags cannot be parsed
    fn read_tags(&self, bytes: &[u8]) -> Result<TagFields>;

    /// Return a copy of `bytes` with `fields` written into its tags
    ///
    /// # Errors
    /// Returns an error if the file cannot be re-tagged
    fn write_tags(&self, bytes: &[u8], fields: &TagFields) -> Result<Vec<u8>>;
}
