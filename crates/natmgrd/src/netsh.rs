//! NetshDriver - NAT rule-table management through the `netsh` utility.

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use natmgr_common::{shell, ExecResult, NatError, NatResult};

use crate::commands::{
    build_add_nat_interface_cmd, build_add_portmapping_cmd, build_check_adapter_exists_cmd,
    build_delete_portmapping_cmd, build_nat_install_cmd, build_nat_uninstall_cmd,
    build_show_nat_interface_cmd,
};
use crate::config::NatConfig;
use crate::driver::NatDriver;
use crate::parser;
use crate::types::{PortMapping, Protocol};

/// Driver name reported through [`NatDriver::name`].
pub const NETSH_DRIVER_NAME: &str = "Netsh";

/// Default bound on each external invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(60);

/// NAT port-mapping driver backed by `netsh routing ip nat`.
///
/// Owns the adapter-name binding for its lifetime and holds no other
/// mutable state; the external tool's rule table is the source of truth.
///
/// Reconciliation policy:
/// - create: an identical live rule is returned as-is (idempotent); a
///   live rule claiming the same external endpoint with a different
///   target is a conflict, reported before any mutation is attempted.
/// - delete: a rejected deletion is re-checked against a fresh list;
///   if the rule is gone the deletion counts as an idempotent success.
pub struct NetshDriver {
    /// Adapter bound at init time; `None` until init succeeds.
    adapter_name: Option<String>,

    /// Bound on each external invocation.
    command_timeout: Duration,

    /// Mock mode for testing (don't execute shell commands).
    #[cfg(test)]
    mock_mode: bool,

    /// Captured shell commands in mock mode.
    #[cfg(test)]
    captured_commands: Vec<String>,

    /// Queued results returned by mock executions, in order.
    #[cfg(test)]
    mock_results: std::collections::VecDeque<ExecResult>,
}

impl NetshDriver {
    /// Creates a new, unbound driver.
    pub fn new() -> Self {
        Self {
            adapter_name: None,
            command_timeout: DEFAULT_COMMAND_TIMEOUT,
            #[cfg(test)]
            mock_mode: false,
            #[cfg(test)]
            captured_commands: Vec::new(),
            #[cfg(test)]
            mock_results: std::collections::VecDeque::new(),
        }
    }

    /// Overrides the per-command timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = timeout;
        self
    }

    /// Enables mock mode for testing.
    #[cfg(test)]
    pub fn with_mock_mode(mut self) -> Self {
        self.mock_mode = true;
        self
    }

    /// Queues a result for the next mock execution.
    #[cfg(test)]
    pub fn push_mock_result(&mut self, result: ExecResult) {
        self.mock_results.push_back(result);
    }

    /// Gets captured commands (for testing).
    #[cfg(test)]
    pub fn captured_commands(&self) -> &[String] {
        &self.captured_commands
    }

    /// Returns the bound adapter name, or an error before init.
    fn adapter(&self) -> NatResult<&str> {
        self.adapter_name
            .as_deref()
            .ok_or_else(|| NatError::config("adapter_name", "driver not initialized"))
    }

    /// Execute a shell command (with mock mode support).
    async fn run(&mut self, cmd: &str) -> NatResult<ExecResult> {
        #[cfg(test)]
        if self.mock_mode {
            self.captured_commands.push(cmd.to_string());
            return Ok(self.mock_results.pop_front().unwrap_or(ExecResult {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            }));
        }

        shell::exec_with_timeout(cmd, self.command_timeout).await
    }

    /// Execute a command whose non-zero exit has no finer classification.
    async fn run_checked(&mut self, cmd: &str) -> NatResult<()> {
        let result = self.run(cmd).await?;
        if result.success() {
            Ok(())
        } else {
            Err(NatError::CommandFailed {
                command: cmd.to_string(),
                exit_code: result.exit_code,
                output: result.combined_output(),
            })
        }
    }

    /// Lists live rules on the bound adapter.
    async fn list_live(&mut self) -> NatResult<Vec<PortMapping>> {
        let adapter = self.adapter()?.to_string();
        let cmd = build_show_nat_interface_cmd(&adapter);
        let result = self.run(&cmd).await?;
        if !result.success() {
            return Err(NatError::CommandFailed {
                command: cmd,
                exit_code: result.exit_code,
                output: result.combined_output(),
            });
        }
        parser::parse_show_interface_output(&adapter, &result.stdout)
    }
}

impl Default for NetshDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NatDriver for NetshDriver {
    fn name(&self) -> &str {
        NETSH_DRIVER_NAME
    }

    #[instrument(skip(self, config), fields(adapter = %config.adapter_name))]
    async fn init(&mut self, config: &NatConfig) -> NatResult<()> {
        let adapter = config.adapter_name.clone();

        // The routing utility reports unknown adapters only at mutation
        // time; probe explicitly so init fails with the right error.
        let probe = build_check_adapter_exists_cmd(&adapter);
        let result = self.run(&probe).await?;
        if !result.success() {
            warn!(adapter = %adapter, "Adapter not found: {}", result.combined_output());
            return Err(NatError::interface_not_found(adapter));
        }

        // Uninstall-then-reinstall resets the NAT subsystem to a known
        // state; any pre-existing mapping state on the host is cleared.
        self.run_checked(&build_nat_uninstall_cmd()).await?;
        self.run_checked(&build_nat_install_cmd()).await?;
        self.run_checked(&build_add_nat_interface_cmd(&adapter)).await?;

        info!(adapter = %adapter, "NAT subsystem reset, adapter bound with full translation");
        self.adapter_name = Some(adapter);
        Ok(())
    }

    #[instrument(skip(self), fields(ext = %external_port, int = %internal_port, proto = %protocol))]
    async fn create_port_mapping(
        &mut self,
        external_ip: IpAddr,
        external_port: u16,
        internal_ip: IpAddr,
        internal_port: u16,
        protocol: Protocol,
    ) -> NatResult<PortMapping> {
        let adapter = self.adapter()?.to_string();
        let mapping = PortMapping::new(
            external_ip,
            external_port,
            internal_ip,
            internal_port,
            protocol,
        );

        // Reconcile against the live table before mutating: an identical
        // rule is an idempotent success, a different rule on the same
        // external endpoint is a conflict the tool would reject anyway.
        let live = self.list_live().await?;
        if live.contains(&mapping) {
            debug!(mapping = %mapping, "Mapping already present, nothing to do");
            return Ok(mapping);
        }
        if live.iter().any(|m| m.same_external_endpoint(&mapping)) {
            return Err(NatError::mapping_conflict(adapter, mapping.to_string()));
        }

        let cmd = build_add_portmapping_cmd(&adapter, &mapping);
        let result = self.run(&cmd).await?;
        if !result.success() {
            return Err(NatError::mapping_create(
                mapping.to_string(),
                result.combined_output(),
            ));
        }

        info!(mapping = %mapping, "Created port mapping");
        Ok(mapping)
    }

    #[instrument(skip(self))]
    async fn list_port_mappings(&mut self) -> NatResult<Vec<PortMapping>> {
        let mappings = self.list_live().await?;
        debug!(count = mappings.len(), "Listed port mappings");
        Ok(mappings)
    }

    #[instrument(skip(self, mapping), fields(mapping = %mapping))]
    async fn delete_port_mapping(&mut self, mapping: &PortMapping) -> NatResult<()> {
        let adapter = self.adapter()?.to_string();
        let cmd = build_delete_portmapping_cmd(&adapter, mapping);
        let result = self.run(&cmd).await?;
        if result.success() {
            info!(mapping = %mapping, "Deleted port mapping");
            return Ok(());
        }

        let diagnostics = result.combined_output();

        // The tool rejects deletion of an absent rule; re-list to tell
        // "already gone" apart from a genuine failure.
        let live = self.list_live().await?;
        if live.iter().any(|m| m.same_external_endpoint(mapping)) {
            Err(NatError::mapping_delete(mapping.to_string(), diagnostics))
        } else {
            debug!(mapping = %mapping, "Mapping already absent, treating delete as success");
            Ok(())
        }
    }

    /// No-op: the adapter stays NAT-bound until the next init resets
    /// the subsystem. Restoring the pre-init state would require
    /// snapshotting configuration this driver never owns.
    async fn teardown(&mut self) -> NatResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const BANNER: &str = parser::BANNER_LINE;

    fn ok(stdout: &str) -> ExecResult {
        ExecResult {
            exit_code: 0,
            stdout: stdout.to_string(),
            stderr: String::new(),
        }
    }

    fn fail(exit_code: i32, stderr: &str) -> ExecResult {
        ExecResult {
            exit_code,
            stdout: String::new(),
            stderr: stderr.to_string(),
        }
    }

    fn record(mapping: &PortMapping) -> String {
        format!(
            "protocol    : {}\npublicip    : {}\npublicport  : {}\nprivateip   : {}\nprivateport : {}\n",
            mapping.protocol, mapping.external_ip, mapping.external_port,
            mapping.internal_ip, mapping.internal_port
        )
    }

    fn show_empty() -> String {
        format!("header\n{}mode : full\n", BANNER)
    }

    fn show_with(mappings: &[PortMapping]) -> String {
        let mut output = format!("header\n{}mode : full\n{}", BANNER, BANNER);
        for m in mappings {
            output.push('\n');
            output.push_str(&record(m));
        }
        output.push('\n');
        output
    }

    fn lan1_mapping() -> PortMapping {
        PortMapping::new(
            "0.0.0.0".parse().unwrap(),
            8080,
            "10.0.0.5".parse().unwrap(),
            80,
            Protocol::Tcp,
        )
    }

    async fn initialized_driver() -> NetshDriver {
        let mut driver = NetshDriver::new().with_mock_mode();
        let config = NatConfig::new("LAN1").unwrap();
        // probe + uninstall + install + add interface, all successful
        driver.init(&config).await.unwrap();
        driver
    }

    #[tokio::test]
    async fn test_init_runs_reset_sequence() {
        let driver = initialized_driver().await;
        assert_eq!(driver.name(), "Netsh");
        assert_eq!(
            driver.captured_commands(),
            &[
                "netsh interface show interface name=\"LAN1\"".to_string(),
                "netsh routing ip nat uninstall".to_string(),
                "netsh routing ip nat install".to_string(),
                "netsh routing ip nat add interface \"LAN1\" full".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_init_unknown_adapter() {
        let mut driver = NetshDriver::new().with_mock_mode();
        driver.push_mock_result(fail(1, "The interface name is not registered"));
        let config = NatConfig::new("NoSuchAdapter").unwrap();

        let err = driver.init(&config).await.unwrap_err();
        match err {
            NatError::InterfaceNotFound { adapter } => assert_eq!(adapter, "NoSuchAdapter"),
            other => panic!("Expected InterfaceNotFound, got {other}"),
        }
        // No reset command may run against a missing adapter.
        assert_eq!(driver.captured_commands().len(), 1);
    }

    #[tokio::test]
    async fn test_init_reset_failure_leaves_driver_unbound() {
        let mut driver = NetshDriver::new().with_mock_mode();
        driver.push_mock_result(ok(""));
        driver.push_mock_result(fail(1, "The RRAS service is not running"));
        let config = NatConfig::new("LAN1").unwrap();

        assert!(driver.init(&config).await.is_err());

        let err = driver.list_port_mappings().await.unwrap_err();
        match err {
            NatError::Config { message, .. } => assert_eq!(message, "driver not initialized"),
            other => panic!("Expected Config, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_operations_before_init_fail() {
        let mut driver = NetshDriver::new().with_mock_mode();
        assert!(driver.list_port_mappings().await.is_err());
        assert!(driver.delete_port_mapping(&lan1_mapping()).await.is_err());
        assert!(driver.captured_commands().is_empty());
    }

    #[tokio::test]
    async fn test_fresh_reset_lists_empty() {
        let mut driver = initialized_driver().await;
        driver.push_mock_result(ok(&show_empty()));

        let mappings = driver.list_port_mappings().await.unwrap();
        assert!(mappings.is_empty());
    }

    #[tokio::test]
    async fn test_create_then_list() {
        let mut driver = initialized_driver().await;
        let expected = lan1_mapping();

        driver.push_mock_result(ok(&show_empty())); // reconcile list
        driver.push_mock_result(ok("")); // add portmapping
        let created = driver
            .create_port_mapping(
                expected.external_ip,
                expected.external_port,
                expected.internal_ip,
                expected.internal_port,
                expected.protocol,
            )
            .await
            .unwrap();
        assert_eq!(created, expected);
        assert_eq!(
            driver.captured_commands().last().unwrap(),
            "netsh routing ip nat add portmapping \"LAN1\" TCP 0.0.0.0 8080 10.0.0.5 80"
        );

        driver.push_mock_result(ok(&show_with(&[expected])));
        let mappings = driver.list_port_mappings().await.unwrap();
        assert_eq!(mappings, vec![expected]);
    }

    #[tokio::test]
    async fn test_create_identical_mapping_is_idempotent() {
        let mut driver = initialized_driver().await;
        let existing = lan1_mapping();
        driver.push_mock_result(ok(&show_with(&[existing])));

        let commands_before = driver.captured_commands().len();
        let created = driver
            .create_port_mapping(
                existing.external_ip,
                existing.external_port,
                existing.internal_ip,
                existing.internal_port,
                existing.protocol,
            )
            .await
            .unwrap();
        assert_eq!(created, existing);
        // Only the reconcile list ran; no mutation was issued.
        assert_eq!(driver.captured_commands().len(), commands_before + 1);
    }

    #[tokio::test]
    async fn test_create_conflicting_endpoint() {
        let mut driver = initialized_driver().await;
        let existing = lan1_mapping();
        driver.push_mock_result(ok(&show_with(&[existing])));

        let err = driver
            .create_port_mapping(
                existing.external_ip,
                existing.external_port,
                "10.0.0.9".parse().unwrap(),
                existing.internal_port,
                existing.protocol,
            )
            .await
            .unwrap_err();
        match err {
            NatError::MappingConflict { adapter, .. } => assert_eq!(adapter, "LAN1"),
            other => panic!("Expected MappingConflict, got {other}"),
        }
        assert!(!driver
            .captured_commands()
            .last()
            .unwrap()
            .contains("add portmapping"));
    }

    #[tokio::test]
    async fn test_create_failure_keeps_diagnostics() {
        let mut driver = initialized_driver().await;
        driver.push_mock_result(ok(&show_empty()));
        driver.push_mock_result(fail(1, "The port is already in use"));

        let err = driver
            .create_port_mapping(
                "0.0.0.0".parse().unwrap(),
                8080,
                "10.0.0.5".parse().unwrap(),
                80,
                Protocol::Tcp,
            )
            .await
            .unwrap_err();
        match err {
            NatError::MappingCreate { diagnostics, .. } => {
                assert_eq!(diagnostics, "The port is already in use")
            }
            other => panic!("Expected MappingCreate, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_delete_success() {
        let mut driver = initialized_driver().await;
        driver.push_mock_result(ok(""));

        driver.delete_port_mapping(&lan1_mapping()).await.unwrap();
        assert_eq!(
            driver.captured_commands().last().unwrap(),
            "netsh routing ip nat delete portmapping \"LAN1\" TCP 0.0.0.0 8080"
        );
    }

    #[tokio::test]
    async fn test_delete_missing_rule_is_idempotent() {
        let mut driver = initialized_driver().await;
        driver.push_mock_result(fail(1, "The element was not found"));
        driver.push_mock_result(ok(&show_empty()));

        driver.delete_port_mapping(&lan1_mapping()).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_still_present_is_an_error() {
        let mut driver = initialized_driver().await;
        let mapping = lan1_mapping();
        driver.push_mock_result(fail(1, "Access is denied"));
        driver.push_mock_result(ok(&show_with(&[mapping])));

        let err = driver.delete_port_mapping(&mapping).await.unwrap_err();
        match err {
            NatError::MappingDelete { diagnostics, .. } => {
                assert_eq!(diagnostics, "Access is denied")
            }
            other => panic!("Expected MappingDelete, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_create_delete_list_roundtrip() {
        let mut driver = initialized_driver().await;
        let mapping = lan1_mapping();

        driver.push_mock_result(ok(&show_empty()));
        driver.push_mock_result(ok(""));
        driver
            .create_port_mapping(
                mapping.external_ip,
                mapping.external_port,
                mapping.internal_ip,
                mapping.internal_port,
                mapping.protocol,
            )
            .await
            .unwrap();

        driver.push_mock_result(ok(""));
        driver.delete_port_mapping(&mapping).await.unwrap();

        driver.push_mock_result(ok(&show_empty()));
        let mappings = driver.list_port_mappings().await.unwrap();
        assert!(!mappings.contains(&mapping));
    }

    #[tokio::test]
    async fn test_list_not_nat_interface() {
        let mut driver = initialized_driver().await;
        driver.push_mock_result(ok("LAN1 has no NAT configuration\n"));

        let err = driver.list_port_mappings().await.unwrap_err();
        match err {
            NatError::NotNatInterface { adapter } => assert_eq!(adapter, "LAN1"),
            other => panic!("Expected NotNatInterface, got {other}"),
        }
    }

    #[tokio::test]
    async fn test_list_malformed_output() {
        let mut driver = initialized_driver().await;
        let output = format!("a\n{}b\n{}c\n{}d\n", BANNER, BANNER, BANNER);
        driver.push_mock_result(ok(&output));

        let err = driver.list_port_mappings().await.unwrap_err();
        assert!(matches!(err, NatError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_list_command_failure() {
        let mut driver = initialized_driver().await;
        driver.push_mock_result(fail(1, "The RRAS service is not running"));

        let err = driver.list_port_mappings().await.unwrap_err();
        assert!(matches!(err, NatError::CommandFailed { .. }));
    }

    #[tokio::test]
    async fn test_teardown_is_noop() {
        let mut driver = initialized_driver().await;
        let commands_before = driver.captured_commands().len();
        driver.teardown().await.unwrap();
        assert_eq!(driver.captured_commands().len(), commands_before);
    }
}
