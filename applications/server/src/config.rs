/// Server configuration
use crate::error::{Result, ServerError};
use remix_export::{ExportOptions, ReverbFallback};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default)]
    pub server: ServerSettings,

    #[serde(default)]
    pub export: ExportSettings,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Largest accepted upload, in bytes
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ExportSettings {
    /// Impulse response used by the reverb branch
    #[serde(default = "default_impulse_response_path")]
    pub impulse_response_path: PathBuf,

    #[serde(default)]
    pub reverb_fallback: ReverbFallback,

    /// Longest rendered output accepted, in seconds
    #[serde(default = "default_max_output_secs")]
    pub max_output_secs: f64,
}

impl ExportSettings {
    pub fn options(&self) -> ExportOptions {
        ExportOptions {
            reverb_fallback: self.reverb_fallback,
            max_output_secs: Some(self.max_output_secs),
        }
    }
}

impl ServerConfig {
    /// Load configuration from file and environment
    ///
    /// `path` defaults to `config.toml` in the working directory; a missing
    /// default file is not an error. Environment variables prefixed with
    /// `REMIX_` override the file, with `__` between nested keys
    /// (`REMIX_EXPORT__REVERB_FALLBACK=dry_only`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path.to_path_buf()));
            }
            None => {
                let config_path = PathBuf::from("config.toml");
                if config_path.exists() {
                    settings = settings.add_source(config::File::from(config_path));
                }
            }
        }

        settings = settings.add_source(
            config::Environment::with_prefix("REMIX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = settings
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        config
            .try_deserialize()
            .map_err(|e| ServerError::Config(e.to_string()))
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ServerError::Config("port must be non-zero".to_string()));
        }

        if self.server.max_upload_bytes == 0 {
            return Err(ServerError::Config(
                "max_upload_bytes must be non-zero".to_string(),
            ));
        }

        if !(self.export.max_output_secs.is_finite() && self.export.max_output_secs > 0.0) {
            return Err(ServerError::Config(
                "max_output_secs must be positive".to_string(),
            ));
        }

        // Dry exports still work without the asset
        if !self.export.impulse_response_path.exists() {
            tracing::warn!(
                "Impulse response not found at {:?}; exports with reverb will {}",
                self.export.impulse_response_path,
                match self.export.reverb_fallback {
                    ReverbFallback::Fail => "fail",
                    ReverbFallback::DryOnly => "render dry",
                }
            );
        }

        Ok(())
    }
}

// Default values
fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_max_upload_bytes() -> usize {
    64 * 1024 * 1024
}

fn default_max_output_secs() -> f64 {
    3_600.0
}

fn default_impulse_response_path() -> PathBuf {
    PathBuf::from("./assets/impulse.wav")
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            impulse_response_path: default_impulse_response_path(),
            reverb_fallback: ReverbFallback::default(),
            max_output_secs: default_max_output_secs(),
        }
    }
}
