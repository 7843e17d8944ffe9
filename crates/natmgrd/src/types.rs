//! Type definitions for natmgrd

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;

use natmgr_common::NatError;

/// Transport protocol of a port-mapping rule.
///
/// The set is closed: the external tool only accepts TCP and UDP.
/// Parsing is case-insensitive; unknown tokens are an error rather
/// than a default (a silently-defaulted protocol would mutate the
/// wrong rule on delete).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Protocol {
    /// Transmission Control Protocol
    Tcp,
    /// User Datagram Protocol
    Udp,
}

impl FromStr for Protocol {
    type Err = NatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "TCP" => Ok(Protocol::Tcp),
            "UDP" => Ok(Protocol::Udp),
            other => Err(NatError::parse(format!(
                "unknown protocol '{}', expected TCP or UDP",
                other
            ))),
        }
    }
}

impl Protocol {
    /// Canonical uppercase form, as passed to the external tool.
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Tcp => "TCP",
            Protocol::Udp => "UDP",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One NAT port-forwarding rule.
///
/// A value object: it carries no identity beyond the external tool's
/// own rule table. The (external_ip, external_port, protocol) triple is
/// unique among active mappings on an adapter and is the key used for
/// deletion — the internal endpoint is not part of the deletion key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortMapping {
    /// IP address visible on the outside of the adapter.
    pub external_ip: IpAddr,
    /// External port number.
    pub external_port: u16,
    /// IP address of the internal target.
    pub internal_ip: IpAddr,
    /// Internal port number.
    pub internal_port: u16,
    /// Transport protocol.
    pub protocol: Protocol,
}

impl PortMapping {
    /// Creates a new port mapping.
    pub fn new(
        external_ip: IpAddr,
        external_port: u16,
        internal_ip: IpAddr,
        internal_port: u16,
        protocol: Protocol,
    ) -> Self {
        Self {
            external_ip,
            external_port,
            internal_ip,
            internal_port,
            protocol,
        }
    }

    /// Returns true if `other` claims the same external endpoint,
    /// i.e. the same (external_ip, external_port, protocol) key.
    pub fn same_external_endpoint(&self, other: &PortMapping) -> bool {
        self.external_ip == other.external_ip
            && self.external_port == other.external_port
            && self.protocol == other.protocol
    }
}

impl fmt::Display for PortMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}:{} -> {}:{}",
            self.protocol, self.external_ip, self.external_port, self.internal_ip, self.internal_port
        )
    }
}
