// SPDX-License-Identifier: GPL-3.0-only
use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Level implied by repeated `-v` flags, if any
fn verbosity_level(verbosity: u8) -> Option<&'static str> {
    match verbosity {
        0 => None,
        1 => Some("debug"),
        _ => Some("trace"),
    }
}

/// Initialize tracing subscriber with configuration
///
/// Precedence: `-v` flags, then `RUST_LOG`, then the configured level. Output
/// goes to stderr; stdout carries command results.
pub fn setup_logging(log_level: &str, verbosity: u8) -> anyhow::Result<()> {
    let filter = match verbosity_level(verbosity) {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(log_level))
            .unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true)
                .with_target(verbosity > 0)
                .with_file(verbosity > 1)
                .with_line_number(verbosity > 1)
        )
        .try_init()?;

    Ok(())
}
