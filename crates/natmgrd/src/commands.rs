//! Shell command builders for NAT rule-table operations.
//!
//! Every driver operation maps to exactly one of these fixed argument
//! templates. Adapter names are operator-supplied and get shellquoted;
//! the remaining operands are rendered from typed values.

use natmgr_common::shell::{self, NETSH_CMD};

use crate::types::PortMapping;

/// Translation mode used when binding an adapter to the NAT subsystem.
pub const NAT_FULL_MODE: &str = "full";

/// Build NAT subsystem uninstall command
pub fn build_nat_uninstall_cmd() -> String {
    format!("{} routing ip nat uninstall", NETSH_CMD)
}

/// Build NAT subsystem install command
pub fn build_nat_install_cmd() -> String {
    format!("{} routing ip nat install", NETSH_CMD)
}

/// Build command binding an adapter to NAT with full translation mode
pub fn build_add_nat_interface_cmd(adapter: &str) -> String {
    format!(
        "{} routing ip nat add interface {} {}",
        NETSH_CMD,
        shell::shellquote(adapter),
        NAT_FULL_MODE
    )
}

/// Build command probing whether an adapter exists on the host
///
/// Exit status is the signal: the utility reports failure for an
/// unknown adapter name.
pub fn build_check_adapter_exists_cmd(adapter: &str) -> String {
    format!(
        "{} interface show interface name={}",
        NETSH_CMD,
        shell::shellquote(adapter)
    )
}

/// Build add port mapping command
///
/// Operand order is fixed by the external tool: adapter, protocol,
/// external IP, external port, internal IP, internal port.
pub fn build_add_portmapping_cmd(adapter: &str, mapping: &PortMapping) -> String {
    format!(
        "{} routing ip nat add portmapping {} {} {} {} {} {}",
        NETSH_CMD,
        shell::shellquote(adapter),
        mapping.protocol.as_str(),
        mapping.external_ip,
        mapping.external_port,
        mapping.internal_ip,
        mapping.internal_port
    )
}

/// Build delete port mapping command
///
/// The deletion key is (adapter, protocol, external IP, external port);
/// the internal endpoint is not supplied, matching the tool's semantics.
pub fn build_delete_portmapping_cmd(adapter: &str, mapping: &PortMapping) -> String {
    format!(
        "{} routing ip nat delete portmapping {} {} {} {}",
        NETSH_CMD,
        shell::shellquote(adapter),
        mapping.protocol.as_str(),
        mapping.external_ip,
        mapping.external_port
    )
}

/// Build show NAT interface command
///
/// Output is the banner-delimited text handled by [`crate::parser`].
pub fn build_show_nat_interface_cmd(adapter: &str) -> String {
    format!(
        "{} routing ip nat show interface {}",
        NETSH_CMD,
        shell::shellquote(adapter)
    )
}
