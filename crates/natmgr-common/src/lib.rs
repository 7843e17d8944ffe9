//! Common infrastructure for NAT port-mapping manager daemons.
//!
//! This crate provides shared functionality for the natmgr crates:
//!
//! - [`shell`]: Safe shell command execution with proper quoting,
//!   separate stdout/stderr capture, and bounded timeouts
//! - [`error`]: Error types for NAT manager operations
//!
//! # Architecture
//!
//! NAT manager daemons follow this pattern:
//!
//! 1. Bind to a named network adapter at init time
//! 2. Execute external routing-utility commands to mutate the rule table
//! 3. Parse the utility's textual output to enumerate live rules
//! 4. Surface every failure to the caller with captured diagnostics
//!
//! Stdout is kept verbatim (the output parser needs the raw text);
//! stderr is trimmed and attached to errors.

pub mod error;
pub mod shell;

// Re-export commonly used items at crate root
pub use error::{NatError, NatResult};
pub use shell::{ExecResult, NETSH_CMD};
