//! deploy
//!
//! The secure remote-deployment executor.
//!
//! # Protocol
//!
//! For one rendered artifact and one destination:
//!
//! 1. open an authenticated channel to `host:port`
//! 2. probe the destination file; when it exists, copy it to a
//!    timestamped sibling backup (`.<basename>.<YYYYmmddHHMMSS>.bak`)
//! 3. overwrite the destination with the artifact, verbatim
//! 4. close the channel, on success and failure alike
//!
//! A missing destination skips the backup (there is nothing to save);
//! any other backup failure aborts. A failed overwrite is fatal and NOT
//! rolled back: the backup from step 2 is the operator's recovery
//! mechanism and is deliberately left in place.
//!
//! # Safety
//!
//! Every command passes the high-risk filter
//! ([`RemoteCommand::check_risk`]) before it reaches the channel, and
//! every executed command's exit status is enforced (the existence probe
//! is the one status that is interpreted instead).

pub mod command;
pub mod mock;
pub mod ssh;
pub mod transport;

pub use command::RemoteCommand;
pub use ssh::SshConnector;
pub use transport::{CommandOutput, RemoteTransport, TransportConnector};

use std::sync::Arc;

use chrono::Local;
use thiserror::Error;

use crate::core::types::Destination;

/// Errors from deployment operations.
#[derive(Debug, Clone, Error)]
pub enum DeployError {
    /// The channel could not be opened or authenticated.
    #[error("cannot connect to '{address}': {message}")]
    Connection { address: String, message: String },

    /// The destination address is not `host:port`.
    #[error("invalid destination address: {address}")]
    BadDestination { address: String },

    /// The command matched the high-risk filter and was never sent.
    #[error("high-risk command rejected: {command}")]
    HighRiskCommand { command: String },

    /// A remote command ran and exited non-zero.
    #[error("remote command failed ({command}, exit {exit_status})\nstdout: {stdout}\nstderr: {stderr}")]
    CommandFailed {
        command: String,
        exit_status: i32,
        stdout: String,
        stderr: String,
    },

    /// The channel broke mid-operation.
    #[error("transport error: {message}")]
    Transport { message: String },
}

/// What a successful deployment did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    /// Backup file path, when the destination pre-existed.
    pub backup_path: Option<String>,
    /// Size of the written artifact in bytes.
    pub bytes_written: usize,
}

/// Executes the backup-then-write protocol over a connector's channels.
///
/// Holds no shared state across calls: each deployment owns its channel
/// exclusively for the call's lifetime.
pub struct Deployer {
    connector: Arc<dyn TransportConnector>,
}

impl Deployer {
    pub fn new(connector: Arc<dyn TransportConnector>) -> Self {
        Self { connector }
    }

    /// Deploy one artifact.
    ///
    /// # Errors
    ///
    /// See [`DeployError`]. On failure after the backup step the backup
    /// file remains on the host — intentional, not corruption; operators
    /// restore from it.
    pub async fn deploy(
        &self,
        artifact: &str,
        destination: &Destination,
    ) -> Result<DeployReport, DeployError> {
        tracing::info!(
            address = %destination.address,
            path = %destination.path,
            "deploying artifact"
        );
        let transport = self.connector.connect(destination).await?;
        let result = self.run_protocol(transport.as_ref(), artifact, destination).await;
        if let Err(e) = transport.close().await {
            tracing::warn!(error = %e, "failed to close remote channel");
        }
        result
    }

    async fn run_protocol(
        &self,
        transport: &dyn RemoteTransport,
        artifact: &str,
        destination: &Destination,
    ) -> Result<DeployReport, DeployError> {
        let path = destination.path.as_str();

        let backup_path = if self.probe(transport, path).await? {
            let backup = backup_path(path, &Local::now().format("%Y%m%d%H%M%S").to_string());
            self.checked(
                transport,
                RemoteCommand::CopyFile {
                    src: path.to_string(),
                    dst: backup.clone(),
                },
            )
            .await?;
            tracing::debug!(backup = %backup, "backed up existing file");
            Some(backup)
        } else {
            tracing::debug!(path = %path, "destination absent, skipping backup");
            None
        };

        self.checked(
            transport,
            RemoteCommand::WriteFile {
                path: path.to_string(),
                content: artifact.to_string(),
                append: false,
            },
        )
        .await?;

        tracing::info!(path = %path, bytes = artifact.len(), "artifact written");
        Ok(DeployReport {
            backup_path,
            bytes_written: artifact.len(),
        })
    }

    /// Execute a command, enforcing the risk filter and the exit status.
    async fn checked(
        &self,
        transport: &dyn RemoteTransport,
        command: RemoteCommand,
    ) -> Result<CommandOutput, DeployError> {
        command.check_risk()?;
        let output = transport.exec(&command).await?;
        if !output.success() {
            return Err(DeployError::CommandFailed {
                command: command.describe(),
                exit_status: output.exit_status,
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }
        Ok(output)
    }

    /// Existence probe: the exit status is the answer, not an error.
    async fn probe(
        &self,
        transport: &dyn RemoteTransport,
        path: &str,
    ) -> Result<bool, DeployError> {
        let command = RemoteCommand::FileExists {
            path: path.to_string(),
        };
        command.check_risk()?;
        Ok(transport.exec(&command).await?.success())
    }
}

/// Timestamped hidden sibling of the destination file.
fn backup_path(path: &str, timestamp: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, base)) => format!("{dir}/.{base}.{timestamp}.bak"),
        None => format!(".{path}.{timestamp}.bak"),
    }
}
