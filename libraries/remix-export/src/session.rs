//! Export session: decode, render and encode one edit at a time
use crate::asset::ImpulseResponseSource;
use crate::options::{ExportOptions, ReverbFallback};
use remix_audio::{wav, EffectGraph, OfflineRenderer, SymphoniaDecoder};
use remix_core::{
    AudioDecoder, EffectParameters, PcmBuffer, RemixError, Result, SampleRate, SourceFormat,
};
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};

/// Result of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    /// Complete 16-bit PCM WAV file
    pub container: Vec<u8>,
    /// Frames in the rendered output
    pub frames: usize,
    /// Channels in the rendered output
    pub channels: usize,
    /// Sample rate of the rendered output
    pub sample_rate: SampleRate,
    /// The reverb branch was dropped because the impulse response failed
    pub reverb_bypassed: bool,
}

/// Shape of a source held by [`ExportSession::load_source`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    /// File name the source was loaded from
    pub name: String,
    /// Source encoding
    pub format: SourceFormat,
    /// Decoded channel count
    pub channels: usize,
    /// Decoded frame count
    pub frames: usize,
    /// Decoded sample rate in Hz
    pub sample_rate: u32,
    /// Duration in seconds
    pub duration_secs: f64,
}

struct LoadedSource {
    summary: SourceSummary,
    buffer: Arc<PcmBuffer>,
}

/// Collaborators of one export, cloned into the task that runs it
#[derive(Clone)]
struct Pipeline {
    decoder: Arc<dyn AudioDecoder>,
    impulse_source: Arc<dyn ImpulseResponseSource>,
    options: ExportOptions,
    renderer: OfflineRenderer,
}

/// Export context shared by every request of one editor
///
/// At most one export runs per session; a second request while one is
/// pending fails with `ExportInProgress` instead of queueing. The guard
/// lives in the task doing the work, so dropping the caller's future does
/// not release it while decoding or rendering continues.
pub struct ExportSession {
    pipeline: Pipeline,
    in_flight: Arc<Mutex<()>>,
    loaded: RwLock<Option<LoadedSource>>,
}

impl std::fmt::Debug for ExportSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportSession")
            .field("impulse_source", &self.pipeline.impulse_source.describe())
            .field("options", &self.pipeline.options)
            .field("renderer", &self.pipeline.renderer)
            .finish_non_exhaustive()
    }
}

impl ExportSession {
    /// Session with default options and renderer
    pub fn new(
        decoder: Arc<dyn AudioDecoder>,
        impulse_source: Arc<dyn ImpulseResponseSource>,
    ) -> Self {
        Self {
            pipeline: Pipeline {
                decoder,
                impulse_source,
                options: ExportOptions::default(),
                renderer: OfflineRenderer::new(),
            },
            in_flight: Arc::new(Mutex::new(())),
            loaded: RwLock::new(None),
        }
    }

    /// Session using the Symphonia decoder
    pub fn with_impulse_source(impulse_source: Arc<dyn ImpulseResponseSource>) -> Self {
        Self::new(Arc::new(SymphoniaDecoder::new()), impulse_source)
    }

    /// Replace the export options
    #[must_use]
    pub fn with_options(mut self, options: ExportOptions) -> Self {
        self.pipeline.options = options;
        self
    }

    /// Replace the offline renderer
    #[must_use]
    pub fn with_renderer(mut self, renderer: OfflineRenderer) -> Self {
        self.pipeline.renderer = renderer;
        self
    }

    /// Options this session was built with
    pub fn options(&self) -> ExportOptions {
        self.pipeline.options
    }

    /// Whether an export is currently running
    pub fn is_exporting(&self) -> bool {
        self.in_flight.try_lock().is_err()
    }

    /// Decode `source_bytes`, apply `params` and encode the result as WAV
    ///
    /// The extension is checked before anything is decoded. The impulse
    /// response is only fetched when the mix has a wet component.
    ///
    /// # Errors
    /// - `UnsupportedFormat` if `extension` is not mp3, ogg or wav
    /// - `InvalidParameter` if `params` do not validate
    /// - `ExportInProgress` if another export of this session is running
    /// - `Decode` if the source cannot be decoded
    /// - `ReverbAsset` if the impulse response is unusable and the session
    ///   does not fall back to a dry render
    /// - `RenderFailure` / `Encode` if rendering or framing fails
    pub async fn export_edited(
        &self,
        source_bytes: Vec<u8>,
        extension: &str,
        params: EffectParameters,
    ) -> Result<ExportOutput> {
        let format = SourceFormat::from_extension(extension)?;
        params.validate()?;
        let guard = self.claim()?;

        let pipeline = self.pipeline.clone();
        run_guarded(guard, async move {
            let source = pipeline.decode(source_bytes, format).await?;
            pipeline.render(Arc::new(source), params).await
        })
        .await
    }

    /// Decode and keep a source for later [`export_loaded`](Self::export_loaded) calls
    ///
    /// Replaces any previously loaded source.
    ///
    /// # Errors
    /// `UnsupportedFormat` for a file name outside the allow-list, `Decode`
    /// if the bytes cannot be decoded.
    pub async fn load_source(&self, bytes: Vec<u8>, file_name: &str) -> Result<SourceSummary> {
        let format = SourceFormat::from_file_name(file_name)?;
        let buffer = self.pipeline.decode(bytes, format).await?;

        let summary = SourceSummary {
            name: file_name.to_string(),
            format,
            channels: buffer.channel_count(),
            frames: buffer.frame_count(),
            sample_rate: buffer.sample_rate().as_hz(),
            duration_secs: buffer.duration_secs(),
        };
        tracing::info!(
            "Loaded {} ({} ch, {} Hz, {:.2}s)",
            summary.name,
            summary.channels,
            summary.sample_rate,
            summary.duration_secs
        );

        *self.loaded.write().await = Some(LoadedSource {
            summary: summary.clone(),
            buffer: Arc::new(buffer),
        });
        Ok(summary)
    }

    /// Summary of the loaded source, if any
    pub async fn loaded_source(&self) -> Option<SourceSummary> {
        self.loaded
            .read()
            .await
            .as_ref()
            .map(|loaded| loaded.summary.clone())
    }

    /// Forget the loaded source
    pub async fn unload_source(&self) {
        *self.loaded.write().await = None;
    }

    /// Render the loaded source with `params`
    ///
    /// # Errors
    /// `InvalidParameter` when nothing is loaded, otherwise as
    /// [`export_edited`](Self::export_edited) minus the decode step.
    pub async fn export_loaded(&self, params: EffectParameters) -> Result<ExportOutput> {
        params.validate()?;
        let guard = self.claim()?;

        let source = self
            .loaded
            .read()
            .await
            .as_ref()
            .map(|loaded| Arc::clone(&loaded.buffer))
            .ok_or_else(|| RemixError::invalid_parameter("no source loaded"))?;

        let pipeline = self.pipeline.clone();
        run_guarded(guard, async move { pipeline.render(source, params).await }).await
    }

    fn claim(&self) -> Result<OwnedMutexGuard<()>> {
        Arc::clone(&self.in_flight)
            .try_lock_owned()
            .map_err(|_| RemixError::ExportInProgress)
    }
}

/// Run `job` on its own task, holding `guard` until the job finishes
async fn run_guarded<F>(guard: OwnedMutexGuard<()>, job: F) -> Result<ExportOutput>
where
    F: Future<Output = Result<ExportOutput>> + Send + 'static,
{
    tokio::spawn(async move {
        let output = job.await;
        drop(guard);
        output
    })
    .await
    .map_err(|e| RemixError::render(format!("export task failed: {e}")))?
}

impl Pipeline {
    async fn decode(&self, bytes: Vec<u8>, format: SourceFormat) -> Result<PcmBuffer> {
        let decoder = Arc::clone(&self.decoder);
        tokio::task::spawn_blocking(move || decoder.decode(&bytes, format))
            .await
            .map_err(|e| RemixError::decode(format!("decode task failed: {e}")))?
    }

    async fn render(
        &self,
        source: Arc<PcmBuffer>,
        mut params: EffectParameters,
    ) -> Result<ExportOutput> {
        let started = Instant::now();
        self.check_output_length(&source, &params)?;

        let mut reverb_bypassed = false;
        let impulse = if params.gains().has_wet() {
            match self.load_impulse().await {
                Ok(impulse) => Some(impulse),
                Err(e) if self.options.reverb_fallback == ReverbFallback::DryOnly => {
                    tracing::warn!("Reverb bypassed, rendering dry only: {}", e);
                    params.reverb_mix = 0.0;
                    reverb_bypassed = true;
                    None
                }
                Err(e) => return Err(e),
            }
        } else {
            None
        };

        let renderer = self.renderer;
        let output = tokio::task::spawn_blocking(move || -> Result<ExportOutput> {
            let graph = EffectGraph::build(&source, &params, impulse.as_ref())?;
            let rendered = renderer.render(&graph)?;
            let container = wav::encode(&rendered)?;
            Ok(ExportOutput {
                container,
                frames: rendered.frame_count(),
                channels: rendered.channel_count(),
                sample_rate: rendered.sample_rate(),
                reverb_bypassed,
            })
        })
        .await
        .map_err(|e| RemixError::render(format!("render task failed: {e}")))??;

        tracing::info!(
            "Exported {} frames x {} ch at {} Hz ({} bytes) in {:?}{}",
            output.frames,
            output.channels,
            output.sample_rate.as_hz(),
            output.container.len(),
            started.elapsed(),
            if reverb_bypassed { ", reverb bypassed" } else { "" }
        );
        Ok(output)
    }

    fn check_output_length(&self, source: &PcmBuffer, params: &EffectParameters) -> Result<()> {
        let Some(limit) = self.options.max_output_secs else {
            return Ok(());
        };
        let render_rate = params.output_sample_rate.unwrap_or(source.sample_rate());
        let frames = EffectGraph::output_frames_for(
            source.frame_count(),
            source.sample_rate(),
            render_rate,
            params.tempo_ratio,
        )?;
        let secs = frames as f64 / f64::from(render_rate.as_hz());
        if secs > limit {
            return Err(RemixError::invalid_parameter(format!(
                "output would last {secs:.1}s, longer than the {limit}s limit"
            )));
        }
        Ok(())
    }

    /// Fetch and decode the impulse response; every failure is a `ReverbAsset`
    async fn load_impulse(&self) -> Result<PcmBuffer> {
        let asset = self.impulse_source.fetch().await.map_err(|e| match e {
            RemixError::ReverbAsset(_) => e,
            other => RemixError::reverb_asset(other.to_string()),
        })?;

        let described = self.impulse_source.describe();
        let impulse = self.decode(asset.bytes, asset.format).await.map_err(|e| {
            RemixError::reverb_asset(format!("impulse response {described}: {e}"))
        })?;

        if impulse.is_empty() {
            return Err(RemixError::reverb_asset(format!(
                "impulse response {described} has no frames"
            )));
        }

        tracing::debug!(
            "Impulse response {}: {} ch, {} frames at {} Hz",
            described,
            impulse.channel_count(),
            impulse.frame_count(),
            impulse.sample_rate()
        );
        Ok(impulse)
    }
}
