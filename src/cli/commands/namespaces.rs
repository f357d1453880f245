//! cli::commands::namespaces
//!
//! List registered namespaces.

use anyhow::Result;

use crate::service::Service;

pub async fn run(service: &Service) -> Result<()> {
    let namespaces = service.list_namespaces().await?;
    println!("{}", serde_json::to_string_pretty(&namespaces)?);
    Ok(())
}
