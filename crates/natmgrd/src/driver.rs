//! Driver trait for NAT port-mapping management.
//!
//! The trait insulates callers from the underlying rule-table mechanism
//! (today a shell-out to the OS routing utility; potentially a structured
//! query interface later) while keeping the operation contract stable.
//!
//! # Concurrency
//!
//! The external NAT table is process-wide shared mutable state, so all
//! operations take `&mut self`: a single driver instance is serialized
//! by exclusive borrow. Callers that share a driver across tasks must
//! wrap it (e.g. `Arc<tokio::sync::Mutex<_>>`), and multiple driver
//! instances bound to the *same* adapter must coordinate externally.
//! Drivers bound to different adapters are independent.

use std::net::IpAddr;

use async_trait::async_trait;

use natmgr_common::NatResult;

use crate::config::NatConfig;
use crate::types::{PortMapping, Protocol};

/// A driver managing the NAT port-forwarding rule table of one adapter.
///
/// The driver holds no authoritative cache: the external tool's live
/// state is the source of truth, and every operation round-trips
/// through it.
#[async_trait]
pub trait NatDriver {
    /// Returns the driver name (e.g., "Netsh").
    fn name(&self) -> &str;

    /// Binds the driver to the configured adapter and resets the
    /// external NAT subsystem to a known state.
    ///
    /// The reset is intentionally destructive: any pre-existing mapping
    /// state on the host is cleared. Callers relying on persistence
    /// across restarts must re-create their mappings afterwards.
    ///
    /// Fails with [`natmgr_common::NatError::InterfaceNotFound`] if the
    /// adapter does not exist on the host.
    async fn init(&mut self, config: &NatConfig) -> NatResult<()>;

    /// Requests creation of one port-forwarding rule.
    ///
    /// Returns the constructed mapping only if the external operation
    /// reported success; after an error the caller must not assume the
    /// rule exists.
    async fn create_port_mapping(
        &mut self,
        external_ip: IpAddr,
        external_port: u16,
        internal_ip: IpAddr,
        internal_port: u16,
        protocol: Protocol,
    ) -> NatResult<PortMapping>;

    /// Enumerates all rules currently active on the bound adapter.
    ///
    /// A NAT-bound adapter with no rules yields an empty vector; an
    /// adapter not registered for NAT yields
    /// [`natmgr_common::NatError::NotNatInterface`].
    async fn list_port_mappings(&mut self) -> NatResult<Vec<PortMapping>>;

    /// Requests removal of the rule identified by the mapping's
    /// (protocol, external IP, external port) key.
    ///
    /// Deletion is idempotent: the call succeeds if the rule no longer
    /// exists afterwards, whether or not this call removed it.
    async fn delete_port_mapping(&mut self, mapping: &PortMapping) -> NatResult<()>;

    /// Releases driver-held resources.
    async fn teardown(&mut self) -> NatResult<()>;
}
