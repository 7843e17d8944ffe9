//! natmgrd - NAT port-mapping configuration manager
//!
//! Manages a host's NAT port-forwarding rule table by driving the OS
//! routing utility (`netsh routing ip nat`) and parsing its textual
//! output. The [`NatDriver`] trait insulates callers from the mechanism;
//! [`NetshDriver`] is the concrete implementation.

mod commands;
mod config;
mod driver;
mod netsh;
mod parser;
mod types;

pub use commands::*;
pub use config::{NatConfig, ADAPTER_NAME_KEY};
pub use driver::NatDriver;
pub use netsh::{NetshDriver, DEFAULT_COMMAND_TIMEOUT, NETSH_DRIVER_NAME};
pub use parser::{parse_show_interface_output, BANNER_LINE};
pub use types::{PortMapping, Protocol};
