//! cli::commands::deploy_cmd
//!
//! Render one template and push it to its destination.

use anyhow::Result;

use crate::service::Service;

pub async fn run(service: &Service, namespace: &str, template: &str) -> Result<()> {
    let report = service.deploy(namespace, template).await?;
    match &report.backup_path {
        Some(backup) => println!(
            "deployed {template} ({} bytes), previous file backed up to {backup}",
            report.bytes_written
        ),
        None => println!(
            "deployed {template} ({} bytes), no previous file to back up",
            report.bytes_written
        ),
    }
    Ok(())
}
