//! cli::commands::register
//!
//! Run the registration pipeline for a namespace.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::service::Service;

pub async fn run(service: &Service, namespace: &str, wizard_file: Option<&Path>) -> Result<()> {
    let wizard_text = match wizard_file {
        Some(path) => Some(
            fs::read_to_string(path)
                .with_context(|| format!("cannot read wizard file '{}'", path.display()))?,
        ),
        None => None,
    };
    let outcome = service.register(namespace, wizard_text.as_deref()).await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
