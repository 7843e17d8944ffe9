//! Typed driver configuration.
//!
//! The driver historically took a loose string key-value map; here the
//! map is validated into an explicit struct at construction time.
//! Missing required keys and unrecognized keys are both rejected
//! outright instead of surfacing later as runtime lookups.

use std::collections::HashMap;

use natmgr_common::{NatError, NatResult};

/// Configuration key naming the adapter to manage.
pub const ADAPTER_NAME_KEY: &str = "adapter_name";

/// Validated configuration for a NAT driver instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NatConfig {
    /// Name of the network adapter the driver binds to.
    pub adapter_name: String,
}

impl NatConfig {
    /// Creates a configuration for the given adapter.
    pub fn new(adapter_name: impl Into<String>) -> NatResult<Self> {
        let adapter_name = adapter_name.into();
        if adapter_name.is_empty() {
            return Err(NatError::config(ADAPTER_NAME_KEY, "must not be empty"));
        }
        Ok(Self { adapter_name })
    }

    /// Builds a configuration from a loose key-value map.
    ///
    /// The only recognized key is [`ADAPTER_NAME_KEY`]. A missing or
    /// empty adapter name and any unrecognized key are configuration
    /// errors.
    pub fn from_map(config: &HashMap<String, String>) -> NatResult<Self> {
        for key in config.keys() {
            if key != ADAPTER_NAME_KEY {
                return Err(NatError::config(key.clone(), "unrecognized configuration key"));
            }
        }

        let adapter_name = config
            .get(ADAPTER_NAME_KEY)
            .ok_or_else(|| NatError::config(ADAPTER_NAME_KEY, "missing required key"))?;

        Self::new(adapter_name.clone())
    }
}
