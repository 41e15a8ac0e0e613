//! Remote execution transport
//!
//! Abstracts the SSH layer the deployment executor talks through, so the
//! executor can be exercised against in-memory fakes in tests. The real
//! implementation shells out to `ssh` with single-quoted arguments and
//! wraps privileged commands in `sudo`.

use std::process::{Command, Output, Stdio};

use thiserror::Error;
use tracing::debug;

use crate::escaping::shell_quote;

/// Error during remote execution
#[derive(Error, Debug, Clone)]
pub enum TransportError {
    /// The connection itself failed (ssh missing, host unreachable)
    #[error("connection to {host} failed: {message}")]
    Connection { host: String, message: String },

    /// The remote command exited non-zero
    #[error("command failed on {host}: {message}")]
    CommandFailed { host: String, message: String },
}

/// Remote execution primitives consumed by the deployment executor.
///
/// Implementations must not retry: failures propagate so the multi-host
/// driver can decide whether to abort the run or continue with remaining
/// hosts. Callers must keep at most one deployment in flight per host;
/// the identity-preserving rewrite of `node.properties` is not safe
/// against a concurrent deployment to the same host.
pub trait RemoteExecutor {
    /// Host identifier, for logging and error messages.
    fn host(&self) -> &str;

    /// Run a command with root privileges and return its stdout.
    fn run_privileged(&self, command: &str) -> Result<String, TransportError>;

    /// Read a remote file. A missing file reads as empty.
    fn read(&self, path: &str) -> Result<String, TransportError> {
        self.run_privileged(&format!("cat {} 2>/dev/null || true", path))
    }

    /// Append `content` to a remote file, skipping lines already present.
    ///
    /// Reads the current remote content first so a repeated append never
    /// duplicates lines.
    fn append(&self, path: &str, content: &str) -> Result<(), TransportError> {
        let existing = self.read(path)?;
        let existing_lines: Vec<&str> = existing.lines().collect();
        let missing: Vec<&str> = content
            .lines()
            .filter(|line| !existing_lines.contains(line))
            .collect();
        if missing.is_empty() {
            return Ok(());
        }
        self.run_privileged(&format!(
            "echo {} >> {}",
            shell_quote(&missing.join("\n")),
            path
        ))?;
        Ok(())
    }
}

/// Executes commands on one host over `ssh`, privileged via `sudo`.
pub struct SshExecutor {
    host: String,
}

impl SshExecutor {
    pub fn new(host: impl Into<String>) -> Self {
        Self { host: host.into() }
    }

    /// The full command line run on the remote side.
    fn privileged_command(command: &str) -> String {
        format!("sudo sh -c {}", shell_quote(command))
    }

    fn ssh(&self, command: &str) -> Result<Output, TransportError> {
        Command::new("ssh")
            .arg(&self.host)
            .arg(command)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| TransportError::Connection {
                host: self.host.clone(),
                message: e.to_string(),
            })
    }
}

impl RemoteExecutor for SshExecutor {
    fn host(&self) -> &str {
        &self.host
    }

    fn run_privileged(&self, command: &str) -> Result<String, TransportError> {
        debug!(host = %self.host, command, "running privileged command");
        let output = self.ssh(&Self::privileged_command(command))?;

        if !output.status.success() {
            return Err(TransportError::CommandFailed {
                host: self.host.clone(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
