//! cli::commands::templates
//!
//! Read and update template entries.

use anyhow::Result;

use crate::core::types::Destination;
use crate::service::Service;

pub async fn run(service: &Service, namespace: &str, name: Option<&str>) -> Result<()> {
    match name {
        Some(name) => {
            let entry = service.template(namespace, name).await?;
            println!("{}", serde_json::to_string_pretty(&entry)?);
        }
        None => {
            let entries = service.templates(namespace).await?;
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn set(
    service: &Service,
    namespace: &str,
    name: &str,
    address: String,
    path: String,
    user: String,
    secret: String,
) -> Result<()> {
    let entry = service
        .update_template_destination(
            namespace,
            name,
            Destination {
                address,
                path,
                user,
                secret,
            },
        )
        .await?;
    println!("{}", serde_json::to_string_pretty(&entry)?);
    Ok(())
}
