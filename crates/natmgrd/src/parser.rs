//! Parser for the routing utility's `show interface` output.
//!
//! The external tool emits free-form text sections separated by a fixed
//! banner line. The section count is the only reliable signal for the
//! adapter's NAT state:
//!
//! - 1 section: the adapter is not registered as a NAT interface
//! - 2 sections: the adapter is valid but holds no port-mapping rules
//! - 3 sections: the third section carries the rule records
//!
//! Any other count means the tool's output format drifted and the parse
//! fails outright — truncated or guessed results are never returned.
//!
//! Rule records are blank-line separated runs of `key : value` lines.
//! The key labels vary by locale and tool version, so fields are
//! assigned by position only: protocol, external IP, external port,
//! internal IP, internal port. Every value is validated; a non-numeric
//! port or unparseable address is a parse error, not a zeroed field.

use std::net::IpAddr;

use natmgr_common::{NatError, NatResult};

use crate::types::{PortMapping, Protocol};

/// Banner line separating output sections, including its newline.
pub const BANNER_LINE: &str = "---------------------------\n";

/// Number of `key : value` lines in one rule record.
const RECORD_FIELDS: usize = 5;

/// Parses the full `show interface` output for `adapter`.
///
/// Returns the active port mappings in document order, an empty vector
/// for a NAT-bound adapter with no rules, [`NatError::NotNatInterface`]
/// when the adapter is not registered for NAT, and [`NatError::Parse`]
/// for any output shape outside the recognized three.
pub fn parse_show_interface_output(adapter: &str, output: &str) -> NatResult<Vec<PortMapping>> {
    // Normalize CRLF line endings before splitting on the banner.
    let normalized = output.replace('\r', "");
    let blocks: Vec<&str> = normalized.split(BANNER_LINE).collect();

    match blocks.len() {
        1 => Err(NatError::not_nat_interface(adapter)),
        2 => Ok(Vec::new()),
        3 => parse_rules_block(blocks[2]),
        count => Err(NatError::parse(format!(
            "expected 1 to 3 banner-delimited sections, got {}",
            count
        ))),
    }
}

/// Parses the rules section into port-mapping records.
fn parse_rules_block(block: &str) -> NatResult<Vec<PortMapping>> {
    let mut mappings = Vec::new();
    let mut values: Vec<String> = Vec::new();

    for line in block.lines() {
        if line.trim().is_empty() {
            if !values.is_empty() {
                mappings.push(build_record(&values)?);
                values.clear();
            }
            continue;
        }

        if values.len() == RECORD_FIELDS {
            return Err(NatError::parse(format!(
                "rule record has more than {} fields (unterminated record?)",
                RECORD_FIELDS
            )));
        }

        // Only the `key : value` shape is enforced, never the key text:
        // labels drift across locales and tool versions. Values may
        // themselves contain ':' (IPv6), so split at the first one only.
        let value = match line.split_once(':') {
            Some((_, value)) => value.trim(),
            None => {
                return Err(NatError::parse(format!(
                    "expected 'key : value' line in rules section, got '{}'",
                    line.trim()
                )))
            }
        };
        values.push(value.to_string());
    }

    // A complete final record is valid even without a trailing blank line.
    if !values.is_empty() {
        mappings.push(build_record(&values)?);
    }

    Ok(mappings)
}

/// Converts one accumulated record into a typed mapping.
///
/// Field order is positional: protocol, external IP, external port,
/// internal IP, internal port.
fn build_record(values: &[String]) -> NatResult<PortMapping> {
    if values.len() != RECORD_FIELDS {
        return Err(NatError::parse(format!(
            "rule record has {} fields, expected {}",
            values.len(),
            RECORD_FIELDS
        )));
    }

    Ok(PortMapping {
        protocol: values[0].parse::<Protocol>()?,
        external_ip: parse_ip("external IP", &values[1])?,
        external_port: parse_port("external port", &values[2])?,
        internal_ip: parse_ip("internal IP", &values[3])?,
        internal_port: parse_port("internal port", &values[4])?,
    })
}

fn parse_ip(field: &str, value: &str) -> NatResult<IpAddr> {
    value
        .parse()
        .map_err(|_| NatError::parse(format!("{} '{}' is not a valid IP address", field, value)))
}

fn parse_port(field: &str, value: &str) -> NatResult<u16> {
    value
        .parse()
        .map_err(|_| NatError::parse(format!("{} '{}' is not a valid port number", field, value)))
}
