//! cli::commands::wizard_cmd
//!
//! Print the wizard form for a namespace.

use anyhow::Result;

use crate::service::Service;

pub async fn run(service: &Service, namespace: &str) -> Result<()> {
    let form = service.wizard(namespace).await?;
    if form.is_empty() {
        eprintln!("nothing to fill in for namespace '{namespace}'");
    } else {
        print!("{form}");
    }
    Ok(())
}
