//! Lineage composer (lineage-ui) - Main entry point
//!
//! Terminal front end for composing a seven-slot breeding lineage against
//! a remote affinity scoring service.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use lineage_common::config::{
    default_config_path, write_toml_config, ConfigResolver, LineageConfig, LoggingConfig,
    TomlConfig,
};
use lineage_common::{EventBus, HttpScoringClient, LineageSession};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;
mod repl;

/// Command-line arguments for lineage-ui
#[derive(Parser, Debug)]
#[command(name = "lineage-ui")]
#[command(about = "Compose breeding lineages against an affinity scoring service")]
#[command(version)]
struct Args {
    /// Scoring service base URL
    #[arg(long)]
    server_url: Option<String>,

    /// Path prefix for character sprites
    #[arg(long)]
    sprite_base: Option<String>,

    /// TOML config file (defaults to the platform config directory)
    #[arg(short, long, env = "LINEAGE_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Interactive lineage editor (default)
    Repl,

    /// Write a config file populated with the resolved settings
    InitConfig {
        /// Destination (defaults to the platform config location)
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = ConfigResolver::new()
        .with_server_url(args.server_url.clone())
        .with_sprite_base(args.sprite_base.clone())
        .with_config_file(args.config.clone())
        .resolve()
        .context("Failed to resolve configuration")?;

    // Logs go to stderr so the REPL owns stdout
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!(
                    "lineage_ui={level},lineage_common={level}",
                    level = config.log_level
                )
                .into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!(
        "Starting lineage-ui v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE"),
    );

    match args.command.unwrap_or(Mode::Repl) {
        Mode::Repl => run_repl(config).await,
        Mode::InitConfig { path, force } => init_config(&config, path, force),
    }
}

async fn run_repl(config: LineageConfig) -> Result<()> {
    info!("Scoring service: {}", config.server_url);
    info!("Sprite base: {}", config.sprite_base);

    let client = HttpScoringClient::from_config(&config)
        .context("Failed to build scoring service client")?;

    let events = EventBus::default();
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => debug!(event = event.event_type(), "{:?}", event),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event logger lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let session = LineageSession::new(Arc::new(client), events, config.sprite_base.clone());
    repl::run(session).await
}

fn init_config(config: &LineageConfig, path: Option<PathBuf>, force: bool) -> Result<()> {
    let path = match path.or_else(default_config_path) {
        Some(path) => path,
        None => bail!("No config directory on this platform; pass a path"),
    };
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    let toml = TomlConfig {
        server_url: Some(config.server_url.clone()),
        sprite_base: Some(config.sprite_base.clone()),
        request_timeout_secs: Some(config.request_timeout.as_secs()),
        logging: LoggingConfig {
            level: config.log_level.clone(),
        },
    };
    write_toml_config(&toml, &path)
        .with_context(|| format!("Failed to write {}", path.display()))?;

    info!("Wrote config to {}", path.display());
    println!("{}", path.display());
    Ok(())
}
