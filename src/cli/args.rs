//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--config <path>`: Use this settings file
//! - `--debug`: Enable debug logging

use clap::{Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;

/// Confcast - namespaced configuration distribution
#[derive(Parser, Debug)]
#[command(name = "confcast")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Use this settings file instead of the default search locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all registered namespaces
    Namespaces,

    /// Show config entries for a namespace
    Configs {
        /// Namespace to inspect
        namespace: String,
        /// Narrow to one key
        key: Option<String>,
        /// Print only the value of the selected key
        #[arg(long, requires = "key")]
        value_only: bool,
    },

    /// Update one config entry's value
    SetConfig {
        namespace: String,
        key: String,
        /// Raw value; template expressions are rendered before storing
        value: String,
    },

    /// Show template entries for a namespace
    Templates {
        namespace: String,
        /// Narrow to one template
        name: Option<String>,
    },

    /// Update a template's destination metadata
    SetTemplate {
        namespace: String,
        name: String,
        /// Destination address as host:port
        #[arg(long)]
        address: String,
        /// Destination file path
        #[arg(long)]
        path: String,
        /// Destination user
        #[arg(long)]
        user: String,
        /// Destination secret
        #[arg(long)]
        secret: String,
    },

    /// Generate the wizard form for a namespace
    Wizard {
        namespace: String,
    },

    /// Register a namespace from its resource bundle
    Register {
        namespace: String,
        /// KV file with wizard-filled values
        #[arg(long, value_name = "PATH")]
        wizard_file: Option<PathBuf>,
    },

    /// Render one template and push it to its destination
    Deploy {
        namespace: String,
        template: String,
    },

    /// Register the root namespace from its own bundle
    Bootstrap,

    /// Generate shell completions
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}
