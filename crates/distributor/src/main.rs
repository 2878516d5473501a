//! iPXE Distributor - Main Application Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use config::{ConfigLoader, ServiceSettings};
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod app;

use app::Application;

/// Serve iPXE boot scripts by MAC address, serial number or group
#[derive(Debug, Parser)]
#[command(name = "ipxe-distributor", version, about)]
struct Cli {
    /// Configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Only test configuration file for syntax errors
    #[arg(short, long)]
    test: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Log format (json, pretty)
    #[arg(long)]
    log_format: Option<String>,
}

impl Cli {
    /// Command line flags take precedence over environment and defaults
    fn apply(&self, settings: &mut ServiceSettings) {
        if let Some(ref config) = self.config {
            settings.config_file = config.clone();
        }
        if let Some(ref level) = self.log_level {
            settings.log_level = level.clone();
        }
        if let Some(ref format) = self.log_format {
            settings.log_format = format.clone();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let dotenv_result = dotenv::dotenv();
    let cli = Cli::parse();

    let mut settings = ServiceSettings::load().context("Failed to load service settings")?;
    cli.apply(&mut settings);
    settings.validate().context("Invalid command line settings")?;

    // Initialize logging
    init_logging(&settings)?;

    match dotenv_result {
        Ok(path) => info!(path = %path.display(), "Loaded environment variables from .env file"),
        Err(e) if e.not_found() => {}
        Err(e) => warn!("Could not load .env file: {}", e),
    }

    info!("Starting iPXE distributor v{}", env!("CARGO_PKG_VERSION"));

    let config_file = settings.config_file.display().to_string();
    let (configuration, report) = ConfigLoader::load_with_report(&settings.config_file)
        .with_context(|| format!("Can't parse provided configuration file {}", config_file))?;

    info!(
        config_file = %config_file,
        images = configuration.images.len(),
        nodes = configuration.nodes.len(),
        "Configuration loaded. {}",
        report.summary()
    );

    if cli.test {
        info!(config_file = %config_file, "Configuration file contains no syntax errors");
        return Ok(());
    }

    let mut app = Application::new(configuration).context("Failed to create application")?;

    if let Err(e) = app.run(shutdown_signal()).await {
        error!("Application error: {:#}", e);
        return Err(e);
    }

    info!("iPXE distributor shutdown complete");
    Ok(())
}

/// Initialize logging from the service settings
fn init_logging(settings: &ServiceSettings) -> Result<()> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&settings.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match settings.log_format.as_str() {
        "pretty" => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty())
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().json())
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
    }

    if settings.log_level == "trace" || settings.log_level == "debug" {
        warn!("Debug/trace logging enabled, every lookup will be logged");
    }

    Ok(())
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl-C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
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
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Shutdown signal received");
}
