/// Remix Server - offline tempo / filter / reverb export
use clap::{Parser, Subcommand};
use remix_core::SampleRate;
use remix_export::{ControlState, ExportSession, FileImpulseResponse, ReverbFallback};
use remix_server::{api, config::ServerConfig, state::AppState};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "remix-server")]
#[command(about = "Re-synthesize audio with tempo, low-pass and reverb", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Configuration file path
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Export one file from the command line
    Export {
        /// Source file (mp3, ogg or wav)
        input: PathBuf,
        /// Destination WAV file
        output: PathBuf,
        /// Playback-rate multiplier
        #[arg(long, default_value_t = 1.0)]
        tempo: f64,
        /// Low-pass cutoff in Hz
        #[arg(long, default_value_t = 22_050.0)]
        cutoff: f64,
        /// Reverb mix from 0 (dry) to 1 (wet)
        #[arg(long, default_value_t = 0.0)]
        mix: f32,
        /// Output sample rate (defaults to the source rate)
        #[arg(long)]
        sample_rate: Option<u32>,
        /// Impulse response for the reverb
        #[arg(long, env = "REMIX_EXPORT__IMPULSE_RESPONSE_PATH")]
        impulse: Option<PathBuf>,
        /// Render dry instead of failing when the impulse response is unusable
        #[arg(long)]
        dry_only_fallback: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "remix_server=info,remix_export=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => {
            serve(config.as_deref()).await?;
        }
        Commands::Export {
            input,
            output,
            tempo,
            cutoff,
            mix,
            sample_rate,
            impulse,
            dry_only_fallback,
        } => {
            let mut controls = ControlState::new();
            controls.set_tempo(tempo)?;
            controls.set_low_pass_cutoff(cutoff)?;
            controls.set_reverb_mix(mix)?;
            controls.set_output_sample_rate(sample_rate.map(SampleRate::new))?;

            let mut config = ServerConfig::default();
            if let Some(impulse) = impulse {
                config.export.impulse_response_path = impulse;
            }
            if dry_only_fallback {
                config.export.reverb_fallback = ReverbFallback::DryOnly;
            }

            export_file(&input, &output, &controls, &config).await?;
        }
    }

    Ok(())
}

fn create_session(config: &ServerConfig) -> Arc<ExportSession> {
    let impulse = FileImpulseResponse::new(config.export.impulse_response_path.clone());
    Arc::new(
        ExportSession::with_impulse_source(Arc::new(impulse))
            .with_options(config.export.options()),
    )
}

async fn serve(config_path: Option<&Path>) -> anyhow::Result<()> {
    // Load configuration
    let config = ServerConfig::load(config_path)?;
    config.validate()?;

    tracing::info!("Starting Remix Server");
    tracing::info!("Host: {}", config.server.host);
    tracing::info!("Port: {}", config.server.port);
    tracing::info!(
        "Impulse response: {:?} (fallback: {:?})",
        config.export.impulse_response_path,
        config.export.reverb_fallback
    );
    tracing::info!("Max output: {}s", config.export.max_output_secs);

    // Build application state
    let app_state = AppState::new(create_session(&config), config.server.max_upload_bytes);

    // Build router
    let app = api::router(app_state);

    // Create server address
    let addr = SocketAddr::from((
        config.server.host.parse::<std::net::IpAddr>()?,
        config.server.port,
    ));

    tracing::info!("Server listening on {}", addr);

    // Start server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn export_file(
    input: &Path,
    output: &Path,
    controls: &ControlState,
    config: &ServerConfig,
) -> anyhow::Result<()> {
    let extension = input
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_string();
    let bytes = tokio::fs::read(input).await?;

    let session = create_session(config);
    let result = session
        .export_edited(bytes, &extension, controls.snapshot())
        .await?;

    tokio::fs::write(output, &result.container).await?;

    println!(
        "Wrote {} ({} frames, {} ch, {} Hz{})",
        output.display(),
        result.frames,
        result.channels,
        result.sample_rate.as_hz(),
        if result.reverb_bypassed {
            ", reverb bypassed"
        } else {
            ""
        }
    );

    Ok(())
}
