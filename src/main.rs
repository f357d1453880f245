//! Confcast binary entry point.

use anyhow::Result;

fn main() -> Result<()> {
    confcast::cli::run()
}
