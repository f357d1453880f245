//! cli::commands::configs
//!
//! Read and update config entries.

use anyhow::Result;

use crate::service::Service;

pub async fn run(
    service: &Service,
    namespace: &str,
    key: Option<&str>,
    value_only: bool,
) -> Result<()> {
    match key {
        Some(key) => {
            let entry = service.config(namespace, key).await?;
            if value_only {
                println!("{}", entry.value.unwrap_or_default());
            } else {
                println!("{}", serde_json::to_string_pretty(&entry)?);
            }
        }
        None => {
            let entries = service.configs(namespace).await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}

pub async fn set(service: &Service, namespace: &str, key: &str, value: &str) -> Result<()> {
    let entry = service
        .update_config_value(namespace, key, Some(value))
        .await?;
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}
