//! cli::commands::bootstrap
//!
//! Register the root namespace from its own bundle.

use anyhow::Result;

use crate::service::Service;

pub async fn run(service: &Service) -> Result<()> {
    let outcome = service.bootstrap_root().await?;
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}
