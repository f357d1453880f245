//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Load process settings and initialize logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and dispatches to
//! [`crate::service`] operations; all state changes flow through the
//! service, never through the CLI directly.

pub mod args;
pub mod commands;

pub use args::{Cli, Command};

use anyhow::Result;

use crate::core::settings::Settings;

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();
    let settings = Settings::load(cli.config.as_deref())?;
    init_tracing(cli.debug, &settings.log_level);
    commands::dispatch(cli.command, settings)
}

/// Initialize the tracing subscriber.
///
/// `RUST_LOG` wins when set; otherwise `--debug` forces `debug`, else
/// the settings' log level applies.
fn init_tracing(debug: bool, log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let fallback = if debug { "debug" } else { log_level };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    // try_init: tests may initialize more than once.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
