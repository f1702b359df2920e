//! Mesh-SDK boundary: query/report traits and their value types.
//!
//! The selection subsystem never talks to the control plane itself; it
//! builds requests, hands them to these traits, and interprets the
//! responses. Production code implements them over the real mesh SDK;
//! tests substitute in-process fakes. Handles are dependency-injected
//! (`Arc<dyn ...>`) - there is no global plugin registry.
//!
//! The traits are synchronous by design: the SDK blocks on the first
//! resolution of a key and serves from its local cache afterwards, so the
//! async selection variants resolve to an already-completed outcome.

use std::collections::HashMap;
use std::time::Duration;

use naming_core::{CallStatus, LimitDecision, Result, ServiceKey};

/// Metadata keys the mesh's routing plugins recognize on instances and
/// source-service descriptors.
pub mod meta_keys {
    /// Environment label injected from global configuration.
    pub const ENV: &str = "env";
    /// Instance-side marker that set-division routing applies.
    pub const SET_ENABLED: &str = "internal-enable-set";
    /// Set name, on instances and on the source-service descriptor.
    pub const SET_NAME: &str = "internal-set-name";
    /// Source-side flag forcing set-division routing; always sent
    /// explicitly, "false" when the caller expressed no preference.
    pub const SET_FORCE: &str = "internal-set-force";
    /// Instance-side canary tag.
    pub const CANARY: &str = "canary";
}

/// One service instance as the mesh SDK reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MeshInstance {
    /// Mesh-side instance id.
    pub id: String,
    /// Instance host.
    pub host: String,
    /// Instance port.
    pub port: u16,
    /// Whether `host` is an IPv6 address.
    pub is_ipv6: bool,
    /// Health flag.
    pub healthy: bool,
    /// Administrative isolation flag.
    pub isolated: bool,
    /// Load-balancing weight.
    pub weight: u32,
    /// Instance metadata.
    pub metadata: HashMap<String, String>,
}

/// The caller's identity and routing labels, matched against rule-route
/// and set-division conditions.
#[derive(Debug, Clone, Default)]
pub struct SourceService {
    /// Caller service key.
    pub key: ServiceKey,
    /// Source-side routing metadata.
    pub metadata: HashMap<String, String>,
}

/// Request for a single-instance pick (optionally with backups).
#[derive(Debug, Clone)]
pub struct OneInstanceRequest {
    /// Callee service key.
    pub service: ServiceKey,
    /// Load-balancer plugin name; `None` defers to the server default.
    pub load_balancer: Option<String>,
    /// Hash key for hash-based balancers.
    pub hash_key: Option<String>,
    /// Replica index on the hash ring; meaningful only with a hash key.
    pub replicate_index: u32,
    /// Canary label to prefer.
    pub canary: Option<String>,
    /// Caller identity and routing labels.
    pub source: Option<SourceService>,
    /// Destination metadata filter.
    pub metadata_filter: Option<HashMap<String, String>>,
    /// Number of backup instances on top of the primary pick.
    pub backup_count: u32,
    /// Skip the mesh's service-router chain.
    pub disable_service_router: bool,
    /// Per-call resolution timeout.
    pub timeout: Duration,
}

/// Request for service membership.
#[derive(Debug, Clone)]
pub struct InstancesRequest {
    /// Callee service key.
    pub service: ServiceKey,
    /// Caller identity and routing labels.
    pub source: Option<SourceService>,
    /// Canary label to prefer.
    pub canary: Option<String>,
    /// Destination metadata filter.
    pub metadata_filter: Option<HashMap<String, String>>,
    /// Include unhealthy instances.
    pub include_unhealthy: bool,
    /// Include circuit-broken instances.
    pub include_circuit_broken: bool,
    /// Per-call resolution timeout.
    pub timeout: Duration,
}

/// A completed call's outcome, addressed to one instance by host:port.
#[derive(Debug, Clone)]
pub struct CallResultRequest {
    /// Callee service key.
    pub service: ServiceKey,
    /// Caller service key.
    pub source: ServiceKey,
    /// Host of the instance the call hit.
    pub host: String,
    /// Port of the instance the call hit.
    pub port: u16,
    /// Classified outcome.
    pub status: CallStatus,
    /// Business-level return code, for statistics.
    pub interface_code: i32,
    /// Elapsed call time.
    pub elapsed: Duration,
    /// Circuit-break labels captured earlier in the request lifecycle.
    pub labels: Option<HashMap<String, String>>,
    /// Set-division labels, attached when per-set circuit breaking is
    /// enabled.
    pub subset: Option<HashMap<String, String>>,
    /// Locality-aware balancer hint, when one was set on the context.
    pub locality_aware_hint: Option<u64>,
}

/// Quota check inputs.
#[derive(Debug, Clone)]
pub struct QuotaRequest {
    /// Service the quota is keyed on.
    pub service: ServiceKey,
    /// Additional quota labels (method, caller, ...).
    pub labels: HashMap<String, String>,
    /// Per-call quota timeout.
    pub timeout: Duration,
}

/// Classification of a finished rate-limited call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitCallKind {
    /// The call ran and succeeded.
    Ok,
    /// The call was rejected by the limiter.
    Limited,
    /// The call ran and failed.
    Failed,
}

/// Feedback for adaptive limit-threshold tuning.
#[derive(Debug, Clone)]
pub struct LimitCallResult {
    /// Service the quota is keyed on.
    pub service: ServiceKey,
    /// Labels the quota was keyed on.
    pub labels: HashMap<String, String>,
    /// What happened to the call.
    pub kind: LimitCallKind,
    /// Elapsed call time; zero for rejected calls.
    pub elapsed: Duration,
}

/// Consumer-side mesh SDK surface: resolution queries and call-result
/// feedback.
pub trait DiscoveryClient: Send + Sync {
    /// Resolve one instance (plus backups when requested).
    fn get_one_instance(&self, request: &OneInstanceRequest) -> Result<Vec<MeshInstance>>;

    /// Resolve routed membership.
    fn get_instances(&self, request: &InstancesRequest) -> Result<Vec<MeshInstance>>;

    /// Resolve raw membership, bypassing routing. The SDK does not filter
    /// administratively disabled instances here; the conversion layer does.
    fn get_all_instances(&self, request: &InstancesRequest) -> Result<Vec<MeshInstance>>;

    /// Feed a call outcome into the SDK's adaptive statistics.
    fn update_call_result(&self, request: &CallResultRequest) -> Result<()>;

    /// Current routing-rule revision for a service, if the SDK has one
    /// cached locally.
    fn route_rule_revision(&self, service: &ServiceKey) -> Option<String>;
}

/// Limit-side mesh SDK surface.
pub trait QuotaClient: Send + Sync {
    /// Ask whether a call keyed by (service, labels) is within quota.
    fn get_quota(&self, request: &QuotaRequest) -> Result<LimitDecision>;

    /// Report a finished rate-limited call for adaptive tuning.
    fn update_call_result(&self, result: &LimitCallResult) -> Result<()>;
}
