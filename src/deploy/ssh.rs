//! deploy::ssh
//!
//! SSH-backed transport over libssh2.
//!
//! # Design
//!
//! libssh2 calls are blocking, so all session work runs on the tokio
//! blocking pool. One [`SshTransport`] wraps one authenticated session;
//! each command executes on a fresh exec channel within that session,
//! mirroring one-command-per-channel SSH semantics. The session carries
//! a timeout so a dead host cannot hang a deployment forever.

use std::io::Read;
use std::net::TcpStream;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ssh2::Session;

use super::command::RemoteCommand;
use super::transport::{CommandOutput, RemoteTransport, TransportConnector};
use super::DeployError;
use crate::core::types::Destination;

/// Connector producing password-authenticated SSH transports.
#[derive(Debug, Clone)]
pub struct SshConnector {
    timeout_secs: u64,
}

impl SshConnector {
    /// `timeout_secs` bounds every blocking libssh2 call on the session.
    pub fn new(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

#[async_trait]
impl TransportConnector for SshConnector {
    async fn connect(
        &self,
        destination: &Destination,
    ) -> Result<Box<dyn RemoteTransport>, DeployError> {
        let (host, port) = destination
            .host_port()
            .map_err(|_| DeployError::BadDestination {
                address: destination.address.clone(),
            })?;
        let host = host.to_string();
        let address = destination.address.clone();
        let user = destination.user.clone();
        let secret = destination.secret.clone();
        let timeout_ms = self.timeout_secs.saturating_mul(1000).min(u32::MAX as u64) as u32;

        let session = tokio::task::spawn_blocking(move || -> Result<Session, DeployError> {
            let connection_error = |message: String| DeployError::Connection {
                address: address.clone(),
                message,
            };
            let stream = TcpStream::connect((host.as_str(), port))
                .map_err(|e| connection_error(e.to_string()))?;
            let mut session = Session::new().map_err(|e| connection_error(e.to_string()))?;
            session.set_timeout(timeout_ms);
            session.set_tcp_stream(stream);
            session
                .handshake()
                .map_err(|e| connection_error(e.to_string()))?;
            session
                .userauth_password(&user, &secret)
                .map_err(|e| connection_error(e.to_string()))?;
            Ok(session)
        })
        .await
        .map_err(join_error)??;

        tracing::debug!(address = %destination.address, "ssh channel established");
        Ok(Box::new(SshTransport {
            session: Arc::new(Mutex::new(session)),
        }))
    }
}

/// One authenticated SSH session.
pub struct SshTransport {
    session: Arc<Mutex<Session>>,
}

#[async_trait]
impl RemoteTransport for SshTransport {
    async fn exec(&self, command: &RemoteCommand) -> Result<CommandOutput, DeployError> {
        let session = Arc::clone(&self.session);
        let shell = command.to_shell();
        tracing::debug!(command = %command.describe(), "executing remote command");

        tokio::task::spawn_blocking(move || -> Result<CommandOutput, DeployError> {
            let session = session
                .lock()
                .map_err(|_| transport_error("ssh session lock poisoned"))?;
            let mut channel = session
                .channel_session()
                .map_err(|e| transport_error(e.to_string()))?;
            channel
                .exec(&shell)
                .map_err(|e| transport_error(e.to_string()))?;

            let mut stdout = String::new();
            channel
                .read_to_string(&mut stdout)
                .map_err(|e| transport_error(e.to_string()))?;
            let mut stderr = String::new();
            channel
                .stderr()
                .read_to_string(&mut stderr)
                .map_err(|e| transport_error(e.to_string()))?;

            channel
                .wait_close()
                .map_err(|e| transport_error(e.to_string()))?;
            let exit_status = channel
                .exit_status()
                .map_err(|e| transport_error(e.to_string()))?;

            Ok(CommandOutput {
                exit_status,
                stdout,
                stderr,
            })
        })
        .await
        .map_err(join_error)?
    }

    async fn close(&self) -> Result<(), DeployError> {
        let session = Arc::clone(&self.session);
        tokio::task::spawn_blocking(move || -> Result<(), DeployError> {
            let session = session
                .lock()
                .map_err(|_| transport_error("ssh session lock poisoned"))?;
            session
                .disconnect(None, "deployment finished", None)
                .map_err(|e| transport_error(e.to_string()))
        })
        .await
        .map_err(join_error)?
    }
}

fn transport_error(message: impl Into<String>) -> DeployError {
    DeployError::Transport {
        message: message.into(),
    }
}

fn join_error(e: tokio::task::JoinError) -> DeployError {
    transport_error(format!("blocking ssh task failed: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn malformed_address_fails_before_any_network_io() {
        let connector = SshConnector::new(5);
        let destination = Destination {
            address: "no-port-here".into(),
            path: "/etc/app.conf".into(),
            user: "deploy".into(),
            secret: "s".into(),
        };
        let err = match connector.connect(&destination).await {
            Ok(_) => panic!("expected connect to fail"),
            Err(e) => e,
        };
        assert!(matches!(err, DeployError::BadDestination { .. }));
    }
}
