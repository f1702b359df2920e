//! Service registration over the mesh's provider API.
//!
//! The interesting part is [`RegistrationInfo::from_attachments`]: the
//! framework hands registration options as one flat metadata map, and the
//! reserved keys are lifted into typed fields while everything else passes
//! through as instance metadata. Heartbeat *scheduling* belongs to the
//! hosting framework; this module only issues one-shot calls.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use naming_core::{NamingError, Result};
use tracing::{debug, error, warn};

const COMPONENT: &str = "registry";

/// Registration option keys lifted out of the attachment map.
const RESERVED_KEYS: [&str; 10] = [
    "token",
    "instance_id",
    "protocol",
    "weight",
    "priority",
    "version",
    "enable_health_check",
    "health_check_type",
    "ttl",
    "namespace",
];

/// One instance's registration record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationInfo {
    /// Service name.
    pub name: String,
    /// Namespace the service registers under.
    pub namespace: String,
    /// Listening host; IPv6 supported.
    pub host: String,
    /// Listening port.
    pub port: u16,
    /// Service access token.
    pub token: String,
    /// Pre-assigned instance id, if any.
    pub instance_id: String,
    /// Serving protocol.
    pub protocol: String,
    /// Instance weight, 0-1000.
    pub weight: u32,
    /// Instance priority; lower is preferred.
    pub priority: i32,
    /// Served version.
    pub version: String,
    /// Whether the mesh should health-check this instance.
    pub enable_health_check: bool,
    /// Health-check type; 0 is heartbeat.
    pub health_check_type: i32,
    /// Heartbeat TTL in seconds.
    pub ttl: i32,
    /// Custom instance metadata (reserved keys excluded).
    pub metadata: HashMap<String, String>,
}

impl RegistrationInfo {
    /// Build a registration record from a framework-level attachment map.
    ///
    /// Reserved keys become typed fields and are excluded from the
    /// passthrough metadata. Numeric fields that fail to parse fall back
    /// to their defaults (weight 100, everything else zero).
    pub fn from_attachments(
        name: impl Into<String>,
        namespace: impl Into<String>,
        host: impl Into<String>,
        port: u16,
        attachments: &HashMap<String, String>,
    ) -> Self {
        let get = |key: &str| attachments.get(key).cloned().unwrap_or_default();
        let get_int = |key: &str, default: i64| {
            attachments
                .get(key)
                .and_then(|raw| raw.parse::<i64>().ok())
                .unwrap_or(default)
        };

        let metadata = attachments
            .iter()
            .filter(|(key, _)| !RESERVED_KEYS.contains(&key.as_str()))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        Self {
            name: name.into(),
            namespace: namespace.into(),
            host: host.into(),
            port,
            token: get("token"),
            instance_id: get("instance_id"),
            protocol: get("protocol"),
            weight: get_int("weight", 100).clamp(0, 1000) as u32,
            priority: get_int("priority", 0) as i32,
            version: get("version"),
            enable_health_check: get_int("enable_health_check", 0) != 0,
            health_check_type: get_int("health_check_type", 0) as i32,
            ttl: get_int("ttl", 0) as i32,
            metadata,
        }
    }
}

/// Provider-side mesh SDK surface: one-shot registration calls.
pub trait ProviderClient: Send + Sync {
    /// Register an instance; returns the mesh-assigned instance id.
    fn register(&self, info: &RegistrationInfo) -> Result<String>;

    /// Remove an instance's registration.
    fn deregister(&self, info: &RegistrationInfo) -> Result<()>;

    /// Report one heartbeat for an instance.
    fn heartbeat(&self, info: &RegistrationInfo) -> Result<()>;
}

/// Registration dispatch over the mesh's provider API.
pub struct Registry {
    provider: Arc<dyn ProviderClient>,
    ready: AtomicBool,
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

impl Registry {
    /// Create a registry over a provider handle.
    pub fn new(provider: Arc<dyn ProviderClient>) -> Self {
        Self {
            provider,
            ready: AtomicBool::new(false),
        }
    }

    /// Arm the registry. Idempotent.
    pub fn init(&self) -> Result<()> {
        if self.ready.swap(true, Ordering::AcqRel) {
            debug!("registry already initialized");
        }
        Ok(())
    }

    /// Disarm the registry.
    pub fn shutdown(&self) {
        self.ready.store(false, Ordering::Release);
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.ready.load(Ordering::Acquire) {
            Ok(())
        } else {
            error!("registry used before init");
            Err(NamingError::not_initialized(COMPONENT))
        }
    }

    fn ensure_identity(info: &RegistrationInfo) -> Result<()> {
        if info.name.is_empty() || info.namespace.is_empty() {
            return Err(NamingError::invalid_argument(
                "registration requires service and namespace",
            ));
        }
        Ok(())
    }

    /// Register an instance; returns the mesh-assigned instance id.
    pub fn register(&self, info: &RegistrationInfo) -> Result<String> {
        self.ensure_ready()?;
        Self::ensure_identity(info)?;
        let instance_id = self.provider.register(info).map_err(|err| {
            error!(service = %info.name, namespace = %info.namespace, %err, "register failed");
            err
        })?;
        debug!(
            service = %info.name,
            namespace = %info.namespace,
            instance_id = %instance_id,
            "instance registered"
        );
        Ok(instance_id)
    }

    /// Remove an instance's registration.
    pub fn deregister(&self, info: &RegistrationInfo) -> Result<()> {
        self.ensure_ready()?;
        Self::ensure_identity(info)?;
        self.provider.deregister(info).map_err(|err| {
            error!(service = %info.name, namespace = %info.namespace, %err, "deregister failed");
            err
        })
    }

    /// Report one heartbeat; the caller owns the reporting cadence.
    pub fn heartbeat(&self, info: &RegistrationInfo) -> Result<()> {
        self.ensure_ready()?;
        Self::ensure_identity(info)?;
        self.provider.heartbeat(info).map_err(|err| {
            warn!(service = %info.name, namespace = %info.namespace, %err, "heartbeat failed");
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_keys_lift_into_fields() {
        let mut attachments = HashMap::new();
        attachments.insert("token".to_string(), "secret".to_string());
        attachments.insert("weight".to_string(), "300".to_string());
        attachments.insert("version".to_string(), "v2".to_string());
        attachments.insert("enable_health_check".to_string(), "1".to_string());
        attachments.insert("ttl".to_string(), "5".to_string());
        attachments.insert("zone".to_string(), "sz".to_string());

        let info =
            RegistrationInfo::from_attachments("echo.svc", "production", "10.0.0.7", 8080, &attachments);

        assert_eq!(info.token, "secret");
        assert_eq!(info.weight, 300);
        assert_eq!(info.version, "v2");
        assert!(info.enable_health_check);
        assert_eq!(info.ttl, 5);
        // Passthrough metadata keeps only the unreserved keys.
        assert_eq!(info.metadata.len(), 1);
        assert_eq!(info.metadata.get("zone").map(String::as_str), Some("sz"));
    }

    #[test]
    fn defaults_when_attachments_are_sparse() {
        let info = RegistrationInfo::from_attachments(
            "echo.svc",
            "production",
            "10.0.0.7",
            8080,
            &HashMap::new(),
        );
        assert_eq!(info.weight, 100);
        assert_eq!(info.priority, 0);
        assert!(!info.enable_health_check);
        assert!(info.metadata.is_empty());
    }

    #[test]
    fn malformed_numbers_fall_back() {
        let mut attachments = HashMap::new();
        attachments.insert("weight".to_string(), "not-a-number".to_string());
        attachments.insert("weight_hint".to_string(), "kept".to_string());
        let info =
            RegistrationInfo::from_attachments("echo.svc", "production", "10.0.0.7", 8080, &attachments);
        assert_eq!(info.weight, 100);
        assert!(info.metadata.contains_key("weight_hint"));
    }
}
