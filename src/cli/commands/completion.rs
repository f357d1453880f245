//! cli::commands::completion
//!
//! Generate shell completion scripts.

use std::io;

use anyhow::Result;
use clap::CommandFactory;
use clap_complete::{generate, Shell};

use crate::cli::args::Cli;

pub fn run(shell: Shell) -> Result<()> {
    let mut command = Cli::command();
    generate(shell, &mut command, "confcast", &mut io::stdout());
    Ok(())
}
