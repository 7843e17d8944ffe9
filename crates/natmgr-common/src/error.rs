//! Error types for NAT manager operations.
//!
//! This module defines the error taxonomy used throughout the natmgr
//! crates. All errors implement `std::error::Error` via `thiserror`.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias for NAT manager operations.
pub type NatResult<T> = Result<T, NatError>;

/// Errors that can occur during NAT manager operations.
#[derive(Debug, Error)]
pub enum NatError {
    /// Required configuration missing or invalid. Fatal to init.
    #[error("Invalid configuration for {field}: {message}")]
    Config {
        /// The configuration field that failed validation.
        field: String,
        /// Error message.
        message: String,
    },

    /// The named adapter does not exist on the host. Fatal to init.
    #[error("Network adapter '{adapter}' not found on this host")]
    InterfaceNotFound {
        /// The adapter name.
        adapter: String,
    },

    /// The adapter is not registered as a NAT interface.
    /// Recoverable by re-running init.
    #[error("'{adapter}' is not a NAT interface")]
    NotNatInterface {
        /// The adapter name.
        adapter: String,
    },

    /// The external endpoint (IP, port, protocol) is already claimed by
    /// a different rule on the adapter.
    #[error("Port mapping conflict on '{adapter}': external endpoint of {mapping} already in use")]
    MappingConflict {
        /// The adapter name.
        adapter: String,
        /// The rejected mapping, rendered for display.
        mapping: String,
    },

    /// The external tool rejected a mapping creation.
    #[error("Failed to create port mapping {mapping}: {diagnostics}")]
    MappingCreate {
        /// The attempted mapping, rendered for display.
        mapping: String,
        /// Captured diagnostic output from the external tool.
        diagnostics: String,
    },

    /// The external tool rejected a mapping deletion.
    #[error("Failed to delete port mapping {mapping}: {diagnostics}")]
    MappingDelete {
        /// The targeted mapping, rendered for display.
        mapping: String,
        /// Captured diagnostic output from the external tool.
        diagnostics: String,
    },

    /// The external tool's output did not match any recognized shape.
    #[error("Unrecognized external tool output: {message}")]
    Parse {
        /// Description of the mismatch.
        message: String,
    },

    /// The external executable could not be started at all.
    #[error("Failed to execute '{command}': {source}")]
    Process {
        /// The command that failed to spawn.
        command: String,
        /// The underlying IO error.
        #[source]
        source: io::Error,
    },

    /// A command returned a non-zero exit code with no more specific
    /// classification.
    #[error("Command failed: '{command}' (exit code {exit_code}): {output}")]
    CommandFailed {
        /// The command that failed.
        command: String,
        /// The exit code.
        exit_code: i32,
        /// Combined stdout/stderr output.
        output: String,
    },

    /// A command did not complete within the bounded timeout.
    #[error("Command '{command}' timed out after {timeout:?}")]
    Timeout {
        /// The command that timed out.
        command: String,
        /// The timeout that elapsed.
        timeout: Duration,
    },
}

impl NatError {
    /// Creates a configuration error.
    pub fn config(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Config {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Creates an interface-not-found error.
    pub fn interface_not_found(adapter: impl Into<String>) -> Self {
        Self::InterfaceNotFound {
            adapter: adapter.into(),
        }
    }

    /// Creates a not-a-NAT-interface error.
    pub fn not_nat_interface(adapter: impl Into<String>) -> Self {
        Self::NotNatInterface {
            adapter: adapter.into(),
        }
    }

    /// Creates a mapping conflict error.
    pub fn mapping_conflict(adapter: impl Into<String>, mapping: impl Into<String>) -> Self {
        Self::MappingConflict {
            adapter: adapter.into(),
            mapping: mapping.into(),
        }
    }

    /// Creates a mapping creation error.
    pub fn mapping_create(mapping: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::MappingCreate {
            mapping: mapping.into(),
            diagnostics: diagnostics.into(),
        }
    }

    /// Creates a mapping deletion error.
    pub fn mapping_delete(mapping: impl Into<String>, diagnostics: impl Into<String>) -> Self {
        Self::MappingDelete {
            mapping: mapping.into(),
            diagnostics: diagnostics.into(),
        }
    }

    /// Creates a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse {
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(command: impl Into<String>, timeout: Duration) -> Self {
        Self::Timeout {
            command: command.into(),
            timeout,
        }
    }

    /// Returns true if this error indicates a transient condition
    /// that may succeed on retry.
    ///
    /// Retries are never performed internally; this only classifies
    /// the error for callers that choose to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            NatError::MappingCreate { .. }
                | NatError::MappingDelete { .. }
                | NatError::CommandFailed { .. }
                | NatError::Timeout { .. }
        )
    }
}
