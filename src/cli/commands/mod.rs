//! cli::commands
//!
//! Command handlers. Each handler is a thin wrapper over one
//! [`crate::service::Service`] operation: wire the collaborators, call
//! the operation, print the result. Nothing here mutates state directly.

mod bootstrap;
mod completion;
mod configs;
mod deploy_cmd;
mod namespaces;
mod register;
mod templates;
mod wizard_cmd;

use std::sync::Arc;

use anyhow::Result;

use crate::cli::args::Command;
use crate::core::settings::Settings;
use crate::deploy::SshConnector;
use crate::service::Service;
use crate::store::FileStore;

/// Dispatch a parsed command.
pub fn dispatch(command: Command, settings: Settings) -> Result<()> {
    // Completions need no service, store, or runtime.
    if let Command::Completion { shell } = &command {
        return completion::run(*shell);
    }

    let store = Arc::new(FileStore::new(settings.store_path.clone()));
    let connector = Arc::new(SshConnector::new(settings.deploy_timeout_secs));
    let service = Service::new(settings, store, connector);

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        match command {
            Command::Namespaces => namespaces::run(&service).await,
            Command::Configs {
                namespace,
                key,
                value_only,
            } => configs::run(&service, &namespace, key.as_deref(), value_only).await,
            Command::SetConfig {
                namespace,
                key,
                value,
            } => configs::set(&service, &namespace, &key, &value).await,
            Command::Templates { namespace, name } => {
                templates::run(&service, &namespace, name.as_deref()).await
            }
            Command::SetTemplate {
                namespace,
                name,
                address,
                path,
                user,
                secret,
            } => templates::set(&service, &namespace, &name, address, path, user, secret).await,
            Command::Wizard { namespace } => wizard_cmd::run(&service, &namespace).await,
            Command::Register {
                namespace,
                wizard_file,
            } => register::run(&service, &namespace, wizard_file.as_deref()).await,
            Command::Deploy {
                namespace,
                template,
            } => deploy_cmd::run(&service, &namespace, &template).await,
            Command::Bootstrap => bootstrap::run(&service).await,
            Command::Completion { .. } => unreachable!("handled above"),
        }
    })
}
