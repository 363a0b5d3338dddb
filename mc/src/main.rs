//! ModelChat - chat with a served model from the command line
//!
//! Entry point: parse arguments, apply startup configuration, start the
//! interactive session.

use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use modelchat::cli::Cli;
use modelchat::config::{ChatConfig, LauncherConfig};
use modelchat::launch::Launcher;
use modelchat::session::{ChatShell, HttpBackend, SessionRunner};

fn setup_logging(debug_enabled: bool) {
    // Default level: INFO, raised to DEBUG by --debug; RUST_LOG wins
    let level = if debug_enabled {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    debug!("Logging initialized (level: {:?})", level);
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.debug);

    // Launcher config file: custom template, resolver override, endpoint
    let launcher_config = LauncherConfig::load(cli.config.as_ref()).context("Failed to load configuration")?;

    // Validate the CLI surface into the runner's config object
    let chat = ChatConfig::from_cli(&cli).context("Invalid configuration")?;

    // Registration strictly before override installation; both strictly
    // before the session makes its first resolution call
    let mut launcher = Launcher::new();
    launcher
        .apply(&launcher_config)
        .context("Failed to apply startup configuration")?;

    info!(
        model_path = %chat.model_path,
        device = %chat.device,
        endpoint = %launcher_config.serving.endpoint,
        "Starting chat session"
    );

    let backend = HttpBackend::new(&launcher_config.serving.endpoint, launcher_config.serving.timeout_ms)
        .context("Failed to create completion backend")?;

    let mut runner = ChatShell::new(Arc::new(backend));
    runner.run(&chat, &launcher).await
}
