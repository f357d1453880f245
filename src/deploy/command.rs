//! deploy::command
//!
//! Structured remote file operations and the high-risk filter.
//!
//! # Design
//!
//! The executor never assembles free-form shell text. It issues
//! [`RemoteCommand`] values; the safety filter inspects the structured
//! command, and only the transport edge renders it to shell with every
//! operand single-quoted. Checking before rendering keeps the filter's
//! intent (no recursive deletes of root or wildcard-root paths) while
//! closing the string-interpolation injection surface.

use once_cell::sync::Lazy;
use regex::Regex;

use super::DeployError;

/// Wildcard one level below root, e.g. `/etc/*`.
static FIRST_LEVEL_WILDCARD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/[^/]*/\*$").expect("wildcard pattern is valid")
});

/// A file operation issued over the remote channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// Read a file's content (captured on stdout).
    ReadFile { path: String },
    /// Overwrite (or append to) a file with literal content.
    WriteFile {
        path: String,
        content: String,
        append: bool,
    },
    /// Copy a file to a sibling or other path.
    CopyFile { src: String, dst: String },
    /// Delete a file, optionally recursively.
    DeleteFile { path: String, recursive: bool },
    /// Probe whether a regular file exists (exit status carries the answer).
    FileExists { path: String },
}

impl RemoteCommand {
    /// Reject high-risk commands before anything reaches the channel.
    ///
    /// A recursive delete targeting `/`, `*`, `/*`, or a first-level
    /// wildcard like `/etc/*` is rejected. Reads and writes pass
    /// regardless of path: the filter guards against destruction, not
    /// access.
    pub fn check_risk(&self) -> Result<(), DeployError> {
        if let RemoteCommand::DeleteFile {
            path,
            recursive: true,
        } = self
        {
            let path = path.trim();
            if path == "/" || path == "*" || path == "/*" || FIRST_LEVEL_WILDCARD.is_match(path) {
                return Err(DeployError::HighRiskCommand {
                    command: self.describe(),
                });
            }
        }
        Ok(())
    }

    /// Render to a shell command line with quoted operands.
    pub fn to_shell(&self) -> String {
        match self {
            RemoteCommand::ReadFile { path } => format!("cat {}", shell_quote(path)),
            RemoteCommand::WriteFile {
                path,
                content,
                append,
            } => {
                let redirect = if *append { ">>" } else { ">" };
                format!(
                    "printf '%s' {} {} {}",
                    shell_quote(content),
                    redirect,
                    shell_quote(path)
                )
            }
            RemoteCommand::CopyFile { src, dst } => {
                format!("cp -f {} {}", shell_quote(src), shell_quote(dst))
            }
            RemoteCommand::DeleteFile { path, recursive } => {
                let flags = if *recursive { "-rf" } else { "-f" };
                format!("rm {} {}", flags, shell_quote(path))
            }
            RemoteCommand::FileExists { path } => format!("test -f {}", shell_quote(path)),
        }
    }

    /// Short human-readable form for errors and logs; never includes
    /// file content.
    pub fn describe(&self) -> String {
        match self {
            RemoteCommand::ReadFile { path } => format!("read {path}"),
            RemoteCommand::WriteFile { path, append, .. } => {
                if *append {
                    format!("append {path}")
                } else {
                    format!("write {path}")
                }
            }
            RemoteCommand::CopyFile { src, dst } => format!("copy {src} -> {dst}"),
            RemoteCommand::DeleteFile { path, recursive } => {
                if *recursive {
                    format!("delete -r {path}")
                } else {
                    format!("delete {path}")
                }
            }
            RemoteCommand::FileExists { path } => format!("probe {path}"),
        }
    }
}

/// Single-quote a shell operand; embedded quotes become `'\''`.
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risky_recursive_deletes_are_rejected() {
        for path in ["/", "*", "/*", "/etc/*", "/opt/*", " /* "] {
            let cmd = RemoteCommand::DeleteFile {
                path: path.to_string(),
                recursive: true,
            };
            assert!(
                matches!(cmd.check_risk(), Err(DeployError::HighRiskCommand { .. })),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn scoped_recursive_delete_passes() {
        let cmd = RemoteCommand::DeleteFile {
            path: "/opt/app/cache".to_string(),
            recursive: true,
        };
        assert!(cmd.check_risk().is_ok());
    }

    #[test]
    fn non_recursive_delete_of_root_passes_the_filter() {
        let cmd = RemoteCommand::DeleteFile {
            path: "/".to_string(),
            recursive: false,
        };
        assert!(cmd.check_risk().is_ok());
    }

    #[test]
    fn benign_commands_pass_for_risky_looking_paths() {
        for cmd in [
            RemoteCommand::ReadFile { path: "/".into() },
            RemoteCommand::WriteFile {
                path: "*".into(),
                content: "data".into(),
                append: false,
            },
            RemoteCommand::FileExists { path: "/*".into() },
        ] {
            assert!(cmd.check_risk().is_ok(), "{} should pass", cmd.describe());
        }
    }

    #[test]
    fn write_preserves_content_verbatim() {
        let cmd = RemoteCommand::WriteFile {
            path: "/etc/app.conf".into(),
            content: "line1\nline2\n".into(),
            append: false,
        };
        assert_eq!(
            cmd.to_shell(),
            "printf '%s' 'line1\nline2\n' > '/etc/app.conf'"
        );
    }

    #[test]
    fn quoting_neutralizes_embedded_quotes() {
        let cmd = RemoteCommand::ReadFile {
            path: "/tmp/it's".into(),
        };
        assert_eq!(cmd.to_shell(), r"cat '/tmp/it'\''s'");
    }

    #[test]
    fn append_uses_double_redirect() {
        let cmd = RemoteCommand::WriteFile {
            path: "/tmp/log".into(),
            content: "x".into(),
            append: true,
        };
        assert!(cmd.to_shell().contains(">>"));
    }
}
