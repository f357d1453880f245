//! deploy::mock
//!
//! Mock transport for deterministic deployment testing.
//!
//! # Design
//!
//! The mock keeps a remote "filesystem" in memory, records every
//! executed command, and allows configuring failure scenarios per
//! command kind — either a transport-level error or an overridden exit
//! status, which is how tests drive the executor's status-enforcement
//! path.
//!
//! # Example
//!
//! ```
//! use confcast::deploy::mock::MockConnector;
//! use confcast::deploy::Deployer;
//! use confcast::core::types::Destination;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let connector = MockConnector::new();
//! let deployer = Deployer::new(Arc::new(connector.clone()));
//! let destination = Destination {
//!     address: "10.0.0.1:22".into(),
//!     path: "/etc/app.conf".into(),
//!     user: "deploy".into(),
//!     secret: "s".into(),
//! };
//! deployer.deploy("port=8080\n", &destination).await.unwrap();
//! assert_eq!(
//!     connector.transport().file("/etc/app.conf").as_deref(),
//!     Some("port=8080\n")
//! );
//! # });
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::command::RemoteCommand;
use super::transport::{CommandOutput, RemoteTransport, TransportConnector};
use super::DeployError;
use crate::core::types::Destination;

/// Command classification for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Read,
    Write,
    Copy,
    Delete,
    Probe,
}

impl CommandKind {
    fn of(command: &RemoteCommand) -> Self {
        match command {
            RemoteCommand::ReadFile { .. } => CommandKind::Read,
            RemoteCommand::WriteFile { .. } => CommandKind::Write,
            RemoteCommand::CopyFile { .. } => CommandKind::Copy,
            RemoteCommand::DeleteFile { .. } => CommandKind::Delete,
            RemoteCommand::FileExists { .. } => CommandKind::Probe,
        }
    }
}

#[derive(Debug, Default)]
struct MockTransportInner {
    files: HashMap<String, String>,
    executed: Vec<RemoteCommand>,
    closed: bool,
    transport_failures: HashMap<CommandKind, DeployError>,
    status_overrides: HashMap<CommandKind, CommandOutput>,
}

/// Mock remote channel; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn inner(&self) -> MutexGuard<'_, MockTransportInner> {
        self.inner.lock().expect("mock transport mutex poisoned")
    }

    /// Seed the remote filesystem.
    pub fn set_file(&self, path: &str, content: &str) {
        self.inner()
            .files
            .insert(path.to_string(), content.to_string());
    }

    /// Content of one remote file, if present.
    pub fn file(&self, path: &str) -> Option<String> {
        self.inner().files.get(path).cloned()
    }

    /// All remote file paths, sorted.
    pub fn paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self.inner().files.keys().cloned().collect();
        paths.sort();
        paths
    }

    /// Every command that reached the channel, in order.
    pub fn executed(&self) -> Vec<RemoteCommand> {
        self.inner().executed.clone()
    }

    pub fn closed(&self) -> bool {
        self.inner().closed
    }

    /// Make commands of `kind` fail at the transport level.
    pub fn fail_command(&self, kind: CommandKind, error: DeployError) {
        self.inner().transport_failures.insert(kind, error);
    }

    /// Make commands of `kind` return this output instead of executing.
    pub fn override_status(&self, kind: CommandKind, output: CommandOutput) {
        self.inner().status_overrides.insert(kind, output);
    }

    fn default_output(inner: &mut MockTransportInner, command: &RemoteCommand) -> CommandOutput {
        let ok = CommandOutput {
            exit_status: 0,
            stdout: String::new(),
            stderr: String::new(),
        };
        let missing = |path: &str| CommandOutput {
            exit_status: 1,
            stdout: String::new(),
            stderr: format!("{path}: No such file or directory"),
        };
        match command {
            RemoteCommand::ReadFile { path } => match inner.files.get(path) {
                Some(content) => CommandOutput {
                    stdout: content.clone(),
                    ..ok
                },
                None => missing(path),
            },
            RemoteCommand::WriteFile {
                path,
                content,
                append,
            } => {
                if *append {
                    inner
                        .files
                        .entry(path.clone())
                        .or_default()
                        .push_str(content);
                } else {
                    inner.files.insert(path.clone(), content.clone());
                }
                ok
            }
            RemoteCommand::CopyFile { src, dst } => match inner.files.get(src).cloned() {
                Some(content) => {
                    inner.files.insert(dst.clone(), content);
                    ok
                }
                None => missing(src),
            },
            RemoteCommand::DeleteFile { path, .. } => {
                inner.files.remove(path);
                ok
            }
            RemoteCommand::FileExists { path } => {
                if inner.files.contains_key(path) {
                    ok
                } else {
                    CommandOutput {
                        exit_status: 1,
                        stdout: String::new(),
                        stderr: String::new(),
                    }
                }
            }
        }
    }
}

#[async_trait]
impl RemoteTransport for MockTransport {
    async fn exec(&self, command: &RemoteCommand) -> Result<CommandOutput, DeployError> {
        let mut inner = self.inner();
        let kind = CommandKind::of(command);
        if let Some(error) = inner.transport_failures.get(&kind) {
            return Err(error.clone());
        }
        inner.executed.push(command.clone());
        if let Some(output) = inner.status_overrides.get(&kind) {
            return Ok(output.clone());
        }
        Ok(Self::default_output(&mut inner, command))
    }

    async fn close(&self) -> Result<(), DeployError> {
        self.inner().closed = true;
        Ok(())
    }
}

/// Connector handing out channels that all share one mock state.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    transport: MockTransport,
    connects: Arc<Mutex<Vec<Destination>>>,
    fail_connect: Arc<Mutex<Option<DeployError>>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared transport, for seeding and inspection.
    pub fn transport(&self) -> MockTransport {
        self.transport.clone()
    }

    /// Destinations passed to `connect`, in order.
    pub fn connects(&self) -> Vec<Destination> {
        self.connects.lock().expect("mock connector mutex poisoned").clone()
    }

    /// Make the next connect fail.
    pub fn fail_connect(&self, error: DeployError) {
        *self.fail_connect.lock().expect("mock connector mutex poisoned") = Some(error);
    }
}

#[async_trait]
impl TransportConnector for MockConnector {
    async fn connect(
        &self,
        destination: &Destination,
    ) -> Result<Box<dyn RemoteTransport>, DeployError> {
        if let Some(error) = self
            .fail_connect
            .lock()
            .expect("mock connector mutex poisoned")
            .take()
        {
            return Err(error);
        }
        self.connects
            .lock()
            .expect("mock connector mutex poisoned")
            .push(destination.clone());
        Ok(Box::new(self.transport.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_then_read_round_trips() {
        let transport = MockTransport::new();
        transport
            .exec(&RemoteCommand::WriteFile {
                path: "/etc/a".into(),
                content: "x=1\n".into(),
                append: false,
            })
            .await
            .unwrap();
        let out = transport
            .exec(&RemoteCommand::ReadFile { path: "/etc/a".into() })
            .await
            .unwrap();
        assert!(out.success());
        assert_eq!(out.stdout, "x=1\n");
    }

    #[tokio::test]
    async fn probe_reports_via_exit_status() {
        let transport = MockTransport::new();
        let absent = transport
            .exec(&RemoteCommand::FileExists { path: "/nope".into() })
            .await
            .unwrap();
        assert!(!absent.success());

        transport.set_file("/yep", "");
        let present = transport
            .exec(&RemoteCommand::FileExists { path: "/yep".into() })
            .await
            .unwrap();
        assert!(present.success());
    }

    #[tokio::test]
    async fn copy_of_missing_source_fails_with_stderr() {
        let transport = MockTransport::new();
        let out = transport
            .exec(&RemoteCommand::CopyFile {
                src: "/absent".into(),
                dst: "/backup".into(),
            })
            .await
            .unwrap();
        assert_eq!(out.exit_status, 1);
        assert!(out.stderr.contains("No such file"));
    }

    #[tokio::test]
    async fn injected_transport_failure_surfaces() {
        let transport = MockTransport::new();
        transport.fail_command(
            CommandKind::Write,
            DeployError::Transport {
                message: "broken pipe".into(),
            },
        );
        let err = transport
            .exec(&RemoteCommand::WriteFile {
                path: "/etc/a".into(),
                content: "x".into(),
                append: false,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DeployError::Transport { .. }));
    }
}
