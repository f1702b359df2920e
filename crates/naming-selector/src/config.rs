//! Plugin configuration.
//!
//! The hosting framework parses its own YAML tree and hands this plugin
//! the subtree it owns; [`NamingConfig::from_yaml_str`] deserializes that
//! subtree. Every field has a default so a missing subtree degrades to a
//! usable configuration.

use std::time::Duration;

use naming_core::codes::framework;
use naming_core::NamingError;
use serde::Deserialize;

/// Configuration of the selection and feedback paths.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// Environment name injected as the `env` source label.
    pub env_name: String,
    /// Process-wide namespace override; empty means none. Takes precedence
    /// over every per-request namespace source.
    pub namespace_override: String,
    /// Resolution timeout forwarded into each mesh query, in milliseconds.
    pub timeout_ms: u64,
    /// Default load-balancer plugin name; empty defers to the
    /// server-configured default.
    pub default_load_balancer: String,
    /// Lift `selector-meta-`-prefixed transparent fields into source
    /// routing metadata.
    pub enable_trans_meta: bool,
    /// Enable per-set circuit breaking in the mesh SDK.
    pub enable_set_circuit_breaker: bool,
    /// Seed of the circuit-break whitelist: framework codes that must not
    /// count against the callee.
    pub circuit_break_whitelist: Vec<i32>,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            env_name: String::new(),
            namespace_override: String::new(),
            timeout_ms: 1000,
            default_load_balancer: String::new(),
            enable_trans_meta: false,
            enable_set_circuit_breaker: false,
            circuit_break_whitelist: vec![framework::SERVER_OVERLOAD, framework::SERVER_LIMITED],
        }
    }
}

impl SelectorConfig {
    /// Resolution timeout as a [`Duration`].
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Configuration of the rate-limit dispatch.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimiterConfig {
    /// Quota-check timeout, in milliseconds.
    pub timeout_ms: u64,
    /// Report finished calls back for adaptive threshold tuning.
    pub update_call_result: bool,
    /// Limiter mode (`local` or `global`).
    pub mode: String,
    /// Cluster serving global quota decisions.
    pub cluster: String,
}

impl Default for RateLimiterConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            update_call_result: false,
            mode: "global".to_string(),
            cluster: String::new(),
        }
    }
}

impl RateLimiterConfig {
    /// Quota-check timeout as a [`Duration`].
    #[inline]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Top-level plugin configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Selection/feedback settings.
    pub selector: SelectorConfig,
    /// Rate-limit settings.
    pub limiter: RateLimiterConfig,
}

impl NamingConfig {
    /// Deserialize the plugin's YAML subtree.
    pub fn from_yaml_str(yaml: &str) -> naming_core::Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| NamingError::Configuration(e.to_string()))
    }
}
