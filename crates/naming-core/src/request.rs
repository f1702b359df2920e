//! Selection request types and the typed side-channel.
//!
//! [`SelectionRequest`] carries everything a single resolution needs beyond
//! the ambient call context. Routing intent that used to travel as a
//! type-erased attachment is expressed as the fixed-field
//! [`ExtendSelectInfo`] struct, so every recognized option is enumerable at
//! compile time.

use std::collections::HashMap;
use std::time::Duration;

/// Selection policy for a resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionPolicy {
    /// Resolve exactly one endpoint.
    #[default]
    Single,
    /// Resolve a primary plus backup endpoints for client-side failover.
    Multiple,
    /// Full membership, excluding administratively disabled instances.
    All,
    /// Membership restricted by locality routing.
    Idc,
    /// Membership restricted to the caller's set division.
    Set,
    /// Membership with canary preference.
    Canary,
}

/// Metadata bucket kinds carried alongside a request.
///
/// Each kind occupies one logical slot in the context store and in
/// [`ExtendSelectInfo::metadata`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataKind {
    /// Labels matched against rule-route conditions on the source side.
    RuleRoute,
    /// Destination metadata filter.
    DstMeta,
    /// Labels attached to circuit-break feedback.
    CircuitBreak,
    /// Set-division labels.
    SetDivision,
}

impl MetadataKind {
    /// Number of metadata kinds.
    pub const COUNT: usize = 4;

    /// All kinds, in slot order.
    pub const ALL: [MetadataKind; Self::COUNT] = [
        MetadataKind::RuleRoute,
        MetadataKind::DstMeta,
        MetadataKind::CircuitBreak,
        MetadataKind::SetDivision,
    ];

    /// Slot index of this kind.
    #[inline]
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            MetadataKind::RuleRoute => 0,
            MetadataKind::DstMeta => 1,
            MetadataKind::CircuitBreak => 2,
            MetadataKind::SetDivision => 3,
        }
    }
}

/// Typed per-request routing overrides.
///
/// All fields are optional preferences; an unset field means "no preference
/// expressed" and defers to the context store or configuration. Values set
/// here rank below values already present on the call context.
#[derive(Debug, Clone, Default)]
pub struct ExtendSelectInfo {
    /// Namespace override for this request.
    pub namespace: Option<String>,
    /// Target set name for set-division routing.
    pub callee_set_name: Option<String>,
    /// Canary label to prefer.
    pub canary_label: Option<String>,
    /// Force set-division routing even when the callee has no matching set.
    pub enable_set_force: Option<bool>,
    /// Skip the mesh's service-router chain.
    pub disable_servicerouter: Option<bool>,
    /// Locality-aware load-balancer hint, forwarded on report when nonzero.
    pub locality_aware_info: Option<u64>,
    /// Replica index for hash-ring lookups.
    pub replicate_index: Option<u32>,
    /// Include unhealthy/circuit-broken instances in membership queries.
    pub include_unhealthy: Option<bool>,
    /// Per-kind metadata maps, indexed by [`MetadataKind::index`].
    pub metadata: [Option<HashMap<String, String>>; MetadataKind::COUNT],
}

impl ExtendSelectInfo {
    /// Metadata map for a kind, if set.
    #[must_use]
    pub fn metadata_of(&self, kind: MetadataKind) -> Option<&HashMap<String, String>> {
        self.metadata[kind.index()].as_ref()
    }

    /// Set the metadata map for a kind.
    pub fn set_metadata(&mut self, kind: MetadataKind, map: HashMap<String, String>) {
        self.metadata[kind.index()] = Some(map);
    }

    /// String view of a scalar field, mirroring the context-store encoding.
    ///
    /// Used by the precedence chain, where "context value, else side-channel
    /// value" compares like with like.
    #[must_use]
    pub fn field(&self, key: &str) -> Option<String> {
        match key {
            "namespace" => self.namespace.clone(),
            "callee_set_name" => self.callee_set_name.clone(),
            "canary_label" => self.canary_label.clone(),
            "enable_set_force" => self.enable_set_force.map(|v| v.to_string()),
            "disable_servicerouter" => self.disable_servicerouter.map(|v| v.to_string()),
            "locality_aware_info" => self.locality_aware_info.map(|v| v.to_string()),
            "replicate_index" => self.replicate_index.map(|v| v.to_string()),
            "include_unhealthy" => self.include_unhealthy.map(|v| v.to_string()),
            _ => None,
        }
    }
}

/// Inputs to one selection.
#[derive(Debug, Clone)]
pub struct SelectionRequest {
    /// Logical name of the callee service.
    pub name: String,
    /// Selection policy.
    pub policy: SelectionPolicy,
    /// Requested replica count; only meaningful for
    /// [`SelectionPolicy::Multiple`].
    pub replicas: u32,
    /// Load-balancer plugin name; `None` defers to the server-configured
    /// default.
    pub load_balancer: Option<String>,
    /// Whether the call originates from the framework's internal workflow
    /// path, which wants metadata-free endpoints.
    pub is_from_workflow: bool,
    /// Typed routing overrides for this request.
    pub extend: Option<ExtendSelectInfo>,
}

impl SelectionRequest {
    /// Create a single-pick request for a logical service name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            policy: SelectionPolicy::Single,
            replicas: 1,
            load_balancer: None,
            is_from_workflow: false,
            extend: None,
        }
    }

    /// Set the selection policy.
    #[must_use]
    pub fn policy(mut self, policy: SelectionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the requested replica count.
    #[must_use]
    pub fn replicas(mut self, replicas: u32) -> Self {
        self.replicas = replicas;
        self
    }

    /// Set the load-balancer plugin name.
    #[must_use]
    pub fn load_balancer(mut self, name: impl Into<String>) -> Self {
        self.load_balancer = Some(name.into());
        self
    }

    /// Mark the request as coming from the internal workflow path.
    #[must_use]
    pub fn from_workflow(mut self) -> Self {
        self.is_from_workflow = true;
        self
    }

    /// Attach typed routing overrides.
    #[must_use]
    pub fn extend(mut self, extend: ExtendSelectInfo) -> Self {
        self.extend = Some(extend);
        self
    }
}

/// Outcome of a completed call, fed back for adaptive statistics.
#[derive(Debug, Clone)]
pub struct InvokeResult {
    /// Callee service name.
    pub name: String,
    /// Framework-level return code.
    pub framework_code: i32,
    /// Business-level return code.
    pub interface_code: i32,
    /// Elapsed call time.
    pub elapsed: Duration,
}
