//! Resolved endpoint representation.

use std::collections::HashMap;
use std::fmt;

/// Reserved metadata key carrying the mesh-side instance id.
pub const METADATA_INSTANCE_ID: &str = "instance_id";

/// A resolved service instance as the RPC framework consumes it.
///
/// Produced by the conversion layer from mesh-SDK instance records. When
/// metadata is included, the instance id is mirrored under the reserved
/// [`METADATA_INSTANCE_ID`] key so callers that only look at metadata still
/// see it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Endpoint {
    /// Instance host (IPv4, IPv6, or name).
    pub host: String,
    /// Instance port.
    pub port: u16,
    /// Whether `host` is an IPv6 address.
    pub is_ipv6: bool,
    /// Health flag as reported by the mesh.
    pub healthy: bool,
    /// Load-balancing weight.
    pub weight: u32,
    /// Opaque mesh-side instance id.
    pub id: String,
    /// Instance metadata; empty when the caller asked for a metadata-free
    /// conversion.
    pub metadata: HashMap<String, String>,
}

impl Endpoint {
    /// The instance id recorded under the reserved metadata key, if any.
    #[must_use]
    pub fn instance_id(&self) -> Option<&str> {
        self.metadata.get(METADATA_INSTANCE_ID).map(String::as_str)
    }

    /// `host:port` form used when reporting call results by address.
    #[must_use]
    pub fn address(&self) -> String {
        if self.is_ipv6 {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address())
    }
}
