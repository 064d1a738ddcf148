// SPDX-License-Identifier: GPL-3.0-only
mod archive;
mod cli;
mod config;
mod controller;
mod gallery;
mod host;
mod logging;
mod remote;
mod utils;

#[cfg(test)]
mod test_helpers;

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, info};

use cli::Cli;
use config::Config;
use logging::setup_logging;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_deref())?;

    // Initialize logging
    setup_logging(&config.log_level, cli.verbose)?;

    info!("Starting gallery v{}", env!("CARGO_PKG_VERSION"));
    debug!(
        api_base_url = %config.api_base_url,
        download_dir = %config.download_dir.display(),
        authenticated = config.api_key.is_some(),
        "Configuration loaded"
    );

    cli::run(cli, &config).await
}
