//! Shell command execution utilities for NAT manager daemons.
//!
//! This module provides safe shell command execution with proper quoting
//! to prevent command injection attacks. Stdout and stderr are captured
//! separately so diagnostics can be attached to errors verbatim.
//!
//! # Example
//!
//! ```ignore
//! use natmgr_common::shell::{self, NETSH_CMD, shellquote};
//!
//! let adapter = "LAN1";
//! let cmd = format!("{} routing ip nat show interface {}",
//!     NETSH_CMD, shellquote(adapter));
//! let result = shell::exec(&cmd).await?;
//! ```

use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

use crate::error::{NatError, NatResult};

/// Name of the `netsh` routing utility used to manage the NAT rule table.
pub const NETSH_CMD: &str = "netsh";

/// Regex for characters that need escaping in shell double-quotes.
/// Matches: $, `, ", \, and newline
static SHELL_ESCAPE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"([$`"\\\n])"#).expect("Invalid regex pattern"));

/// Quotes a string for safe use in shell commands.
///
/// This function wraps the string in double quotes and escapes any
/// characters that have special meaning inside double quotes:
/// - `$` (variable expansion)
/// - `` ` `` (command substitution)
/// - `"` (quote termination)
/// - `\` (escape character)
/// - newline (command termination)
///
/// # Example
///
/// ```
/// use natmgr_common::shell::shellquote;
///
/// assert_eq!(shellquote("LAN1"), "\"LAN1\"");
/// assert_eq!(shellquote("with$var"), "\"with\\$var\"");
/// ```
pub fn shellquote(s: &str) -> String {
    let escaped = SHELL_ESCAPE_RE.replace_all(s, r"\$1");
    format!("\"{}\"", escaped)
}

/// Result of a shell command execution.
#[derive(Debug, Clone)]
pub struct ExecResult {
    /// The exit code of the command (0 = success).
    pub exit_code: i32,
    /// The captured stdout output.
    pub stdout: String,
    /// The captured stderr output.
    pub stderr: String,
}

impl ExecResult {
    /// Returns true if the command succeeded (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Returns the combined output (stdout + stderr) for error messages.
    pub fn combined_output(&self) -> String {
        if self.stderr.is_empty() {
            self.stdout.clone()
        } else if self.stdout.is_empty() {
            self.stderr.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Executes a shell command asynchronously.
///
/// The command runs through `/bin/sh -c` to support shell features.
/// A non-zero exit code is not an error at this layer; callers inspect
/// [`ExecResult::success`] and classify the failure themselves.
///
/// # Returns
///
/// * `Ok(ExecResult)` - The command execution result
/// * `Err(NatError::Process)` - If the command could not be spawned
pub async fn exec(cmd: &str) -> NatResult<ExecResult> {
    tracing::debug!(command = %cmd, "Executing shell command");

    let output = Command::new("/bin/sh")
        .arg("-c")
        .arg(cmd)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| NatError::Process {
            command: cmd.to_string(),
            source: e,
        })?;

    let exit_code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

    let result = ExecResult {
        exit_code,
        stdout,
        stderr,
    };

    if result.success() {
        tracing::trace!(command = %cmd, exit_code = exit_code, "Command succeeded");
    } else {
        tracing::warn!(
            command = %cmd,
            exit_code = exit_code,
            stderr = %result.stderr,
            "Command failed"
        );
    }

    Ok(result)
}

/// Executes a shell command with a bounded timeout.
///
/// An external process wedge would otherwise hang the calling task
/// indefinitely; elapse of the timeout yields [`NatError::Timeout`].
/// The child process is killed on timeout by dropping the future.
pub async fn exec_with_timeout(cmd: &str, timeout: Duration) -> NatResult<ExecResult> {
    match tokio::time::timeout(timeout, exec(cmd)).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(command = %cmd, timeout = ?timeout, "Command timed out");
            Err(NatError::timeout(cmd, timeout))
        }
    }
}

/// Executes a shell command and throws an error on non-zero exit.
///
/// # Returns
///
/// * `Ok(String)` - The stdout output on success
/// * `Err(NatError)` - If the command fails to spawn or returns non-zero
pub async fn exec_or_throw(cmd: &str) -> NatResult<String> {
    let result = exec(cmd).await?;
    if result.success() {
        Ok(result.stdout)
    } else {
        Err(NatError::CommandFailed {
            command: cmd.to_string(),
            exit_code: result.exit_code,
            output: result.combined_output(),
        })
    }
}
