//! Multi-modal analyzer (mmfd-an) - Main entry point
//!
//! Scores text, audio and video artifacts for manipulation indicators and
//! fuses the per-modality results into one credibility verdict.

use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use mmfd_an::{build_router, fusion::FusionEngine, store::AnalysisStore, AppState, ScorerSet};
use mmfd_common::config::AnalyzerConfig;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Command-line arguments for mmfd-an
#[derive(Parser, Debug)]
#[command(name = "mmfd-an")]
#[command(about = "Multi-modal fake news analyzer")]
#[command(version)]
struct Args {
    /// Config file (TOML)
    #[arg(short, long, env = "MMFD_CONFIG")]
    config: Option<PathBuf>,

    /// Bind address (overrides config)
    #[arg(long, env = "MMFD_HOST")]
    host: Option<String>,

    /// Port to listen on (overrides config)
    #[arg(short, long, env = "MMFD_PORT")]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is read before tracing starts because it names the log level
    let (mut config, source) =
        AnalyzerConfig::resolve(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    init_tracing(&config)?;

    info!("Starting mmfd-an v{}", env!("CARGO_PKG_VERSION"));
    source.log();
    info!(
        "Fusion: strategy={}, weights text={} audio={} video={}",
        config.fusion.strategy,
        config.fusion.weights.text,
        config.fusion.weights.audio,
        config.fusion.weights.video
    );

    let engine = FusionEngine::new(config.fusion.clone()).context("Invalid fusion configuration")?;
    info!("Analysis store keeps at most {} records", config.store.max_records);
    let state = AppState::new(engine, ScorerSet::default())
        .with_store(AnalysisStore::with_capacity(config.store.max_records));
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("Invalid bind address {}:{}", config.host, config.port))?;

    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Install the tracing subscriber
///
/// RUST_LOG takes precedence over the configured level. With a log file
/// configured, output goes to the file instead of stderr.
fn init_tracing(config: &AnalyzerConfig) -> Result<()> {
    let level = &config.logging.level;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("mmfd_an={level},mmfd_common={level},tower_http={level}")));

    let (stderr_layer, file_layer) = match &config.logging.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            (
                None,
                Some(fmt::layer().with_ansi(false).with_writer(Mutex::new(file))),
            )
        }
        None => (Some(fmt::layer().with_writer(std::io::stderr)), None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
