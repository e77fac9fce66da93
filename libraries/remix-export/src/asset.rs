//! Impulse-response sourcing
//!
//! The reverb impulse response is an external asset fetched once per export.
//! Sources only deliver encoded bytes; decoding happens in the session so the
//! same decoder handles user uploads and the IR.

use async_trait::async_trait;
use remix_core::{RemixError, Result, SourceFormat};
use std::path::{Path, PathBuf};

/// Encoded impulse response as fetched from its source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImpulseAsset {
    /// Encoded file contents
    pub bytes: Vec<u8>,
    /// Encoding of `bytes`
    pub format: SourceFormat,
}

/// Where the reverb impulse response comes from
#[async_trait]
pub trait ImpulseResponseSource: Send + Sync {
    /// Fetch the encoded impulse response
    ///
    /// # Errors
    /// Returns `ReverbAsset` (or `Io`) if the asset is unavailable.
    async fn fetch(&self) -> Result<ImpulseAsset>;

    /// Human-readable location, for logs
    fn describe(&self) -> String;
}

/// Impulse response read from a fixed path on every fetch
#[derive(Debug, Clone)]
pub struct FileImpulseResponse {
    path: PathBuf,
}

impl FileImpulseResponse {
    /// Read the IR from `path`; its format comes from the file extension
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Configured path
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ImpulseResponseSource for FileImpulseResponse {
    async fn fetch(&self) -> Result<ImpulseAsset> {
        let format = self
            .path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                RemixError::reverb_asset(format!("invalid impulse path {}", self.path.display()))
            })
            .and_then(|name| {
                SourceFormat::from_file_name(name).map_err(|e| {
                    RemixError::reverb_asset(format!("{}: {}", self.path.display(), e))
                })
            })?;

        let bytes = tokio::fs::read(&self.path).await.map_err(|e| {
            RemixError::reverb_asset(format!("failed to read {}: {}", self.path.display(), e))
        })?;

        tracing::debug!(
            "Read impulse response {} ({} bytes)",
            self.path.display(),
            bytes.len()
        );

        Ok(ImpulseAsset { bytes, format })
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Impulse response held in memory
#[derive(Debug, Clone)]
pub struct StaticImpulseResponse {
    asset: ImpulseAsset,
}

impl StaticImpulseResponse {
    /// Serve `bytes` of the given format on every fetch
    pub fn new(bytes: Vec<u8>, format: SourceFormat) -> Self {
        Self {
            asset: ImpulseAsset { bytes, format },
        }
    }
}

#[async_trait]
impl ImpulseResponseSource for StaticImpulseResponse {
    async fn fetch(&self) -> Result<ImpulseAsset> {
        Ok(self.asset.clone())
    }

    fn describe(&self) -> String {
        format!(
            "in-memory {} ({} bytes)",
            self.asset.format,
            self.asset.bytes.len()
        )
    }
}

/// Source with no impulse response; every fetch fails
#[derive(Debug, Clone, Copy, Default)]
pub struct MissingImpulseResponse;

#[async_trait]
impl ImpulseResponseSource for MissingImpulseResponse {
    async fn fetch(&self) -> Result<ImpulseAsset> {
        Err(RemixError::reverb_asset("no impulse response configured"))
    }

    fn describe(&self) -> String {
        "none".to_string()
    }
}
