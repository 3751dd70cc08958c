//! Launchpad Daemon - deployment API server

use anyhow::{Context, Result};
use clap::Parser;
use launchpad_deploy::Deployer;
use std::sync::Arc;
use tracing::{error, info};

mod cli;
mod logging;

use cli::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine
    let dotenv = dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let cwd = std::env::current_dir().context("Failed to read working directory")?;
    let (config, config_path) = cli
        .resolve_config(&cwd, |key| std::env::var(key).ok())
        .context("Failed to load configuration")?;

    let _log_guard = logging::init(cli.verbose, config.log_dir.as_deref());

    info!("Launchpad Daemon starting...");
    if let Some(path) = dotenv {
        info!("Loaded environment from {}", path.display());
    }
    match &config_path {
        Some(path) => info!("Using config {}", path.display()),
        None => info!("No config file found, using defaults"),
    }

    let deployer = Arc::new(
        Deployer::open(config.clone())
            .await
            .context("Failed to open deployment stores")?,
    );

    let result = launchpad_web::start_server(&config.bind, deployer.clone(), shutdown_signal()).await;

    deployer.shutdown().await;
    if let Err(e) = result {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Daemon shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to install signal handlers: {}", e);
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
        _ = sigint.recv() => info!("Received SIGINT, shutting down..."),
    }
}
