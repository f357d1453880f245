//! deploy::transport
//!
//! Remote command-channel abstraction for the deployment executor.
//!
//! # Design
//!
//! The traits are async because every operation involves network I/O.
//! A [`TransportConnector`] opens one channel per deployment; the
//! channel is owned exclusively by that call and closed on every exit
//! path. No pooling, no shared state across calls.
//!
//! The transport executes structured [`RemoteCommand`]s and reports the
//! raw exit status; enforcing statuses (and the high-risk filter) is the
//! executor's job, so the existence probe can interpret a non-zero
//! status instead of failing on it.

use async_trait::async_trait;

use super::command::RemoteCommand;
use super::DeployError;
use crate::core::types::Destination;

/// Captured result of one remote command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the command exited cleanly.
    pub fn success(&self) -> bool {
        self.exit_status == 0
    }
}

/// An open remote command channel.
#[async_trait]
pub trait RemoteTransport: Send + Sync {
    /// Execute one command and capture its output and exit status.
    ///
    /// A transport-level failure (broken channel, I/O error) is an
    /// `Err`; a command that ran and exited non-zero is an `Ok` with
    /// that status.
    async fn exec(&self, command: &RemoteCommand) -> Result<CommandOutput, DeployError>;

    /// Close the channel. Idempotent; called on every exit path.
    async fn close(&self) -> Result<(), DeployError>;
}

/// Opens remote channels to destinations.
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Open an authenticated channel to `destination.address`.
    ///
    /// # Errors
    ///
    /// `DeployError::Connection` for unreachable hosts and rejected
    /// credentials alike — connection failure is fatal for the deploy
    /// call and never retried here.
    async fn connect(
        &self,
        destination: &Destination,
    ) -> Result<Box<dyn RemoteTransport>, DeployError>;
}
