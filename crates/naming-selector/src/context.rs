//! Call context and the context-scoped extended-info store.
//!
//! [`CallContext`] is the adapter the pre/post-invoke hooks build over the
//! RPC framework's own request context: caller identity, the selected peer
//! address, the hash key, the proxy-option namespace, transparently-passed
//! fields, and the attachment point for routing intent. A context belongs
//! to one in-flight call and is not shared across threads for that call;
//! its interior mutability is limited to brief critical sections.
//!
//! [`ExtendedInfoStore`] carries routing intent that is orthogonal to the
//! RPC payload, so intent can flow through layers without changing call
//! signatures. String entries merge key-wise; whole metadata maps occupy
//! one JSON-encoded slot per [`MetadataKind`].

use std::collections::HashMap;
use std::sync::Mutex;

use naming_core::MetadataKind;
use tracing::warn;

/// Well-known keys of the extended-info store.
pub mod keys {
    /// Namespace the callee is resolved under.
    pub const NAMESPACE: &str = "namespace";
    /// Target set name for set-division routing.
    pub const CALLEE_SET_NAME: &str = "callee_set_name";
    /// Canary label to prefer.
    pub const CANARY_LABEL: &str = "canary_label";
    /// Force set-division routing ("true"/"false").
    pub const ENABLE_SET_FORCE: &str = "enable_set_force";
    /// Skip the mesh's service-router chain ("true"/"false").
    pub const DISABLE_SERVICE_ROUTER: &str = "disable_servicerouter";
    /// Locality-aware balancer hint (decimal u64).
    pub const LOCALITY_AWARE_INFO: &str = "locality_aware_info";
    /// Replica index for hash-ring lookups (decimal u32).
    pub const REPLICATE_INDEX: &str = "replicate_index";
    /// Include unhealthy instances in membership queries ("true"/"false").
    pub const INCLUDE_UNHEALTHY: &str = "include_unhealthy";
}

/// Prefix marking transparently-passed fields that should be lifted into
/// source-service routing metadata (with the prefix stripped).
pub const TRANS_META_PREFIX: &str = "selector-meta-";

fn metadata_slot_key(kind: MetadataKind) -> String {
    format!("metadata_{}", kind.index())
}

/// Context-scoped key/value bag for routing intent.
///
/// A miss is not an error; it is a legitimate "no preference expressed"
/// state. Purely in-memory, no I/O.
#[derive(Debug, Default)]
pub struct ExtendedInfoStore {
    entries: Mutex<HashMap<String, String>>,
}

impl ExtendedInfoStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge one key/value pair into the store; a later write to the same
    /// key overrides the earlier value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .lock()
            .expect("store lock poisoned")
            .insert(key.into(), value.into());
    }

    /// Merge several key/value pairs.
    pub fn set_many<K, V>(&self, pairs: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut entries = self.entries.lock().expect("store lock poisoned");
        for (key, value) in pairs {
            entries.insert(key.into(), value.into());
        }
    }

    /// Value for a key, if present.
    pub fn get(&self, key: &str) -> Option<String> {
        self.entries
            .lock()
            .expect("store lock poisoned")
            .get(key)
            .cloned()
    }

    /// Store a whole metadata map under a kind's slot.
    ///
    /// The map is JSON-encoded so it occupies one logical slot; a later
    /// write to the same kind replaces the slot.
    pub fn set_metadata(&self, kind: MetadataKind, map: &HashMap<String, String>) {
        match serde_json::to_string(map) {
            Ok(encoded) => self.set(metadata_slot_key(kind), encoded),
            Err(error) => {
                // String maps always encode; this arm only fires on a
                // serializer regression.
                warn!(kind = ?kind, %error, "failed to encode metadata slot");
            }
        }
    }

    /// Metadata map stored under a kind's slot.
    ///
    /// Returns `None` when the slot was never written, decodes to an empty
    /// map, or does not parse - absence and empty-map are equivalent on
    /// read.
    pub fn get_metadata(&self, kind: MetadataKind) -> Option<HashMap<String, String>> {
        let encoded = self.get(&metadata_slot_key(kind))?;
        match serde_json::from_str::<HashMap<String, String>>(&encoded) {
            Ok(map) if !map.is_empty() => Some(map),
            Ok(_) => None,
            Err(error) => {
                warn!(kind = ?kind, %error, "failed to decode metadata slot");
                None
            }
        }
    }

    /// Drop every entry, including metadata slots.
    pub fn clear(&self) {
        self.entries.lock().expect("store lock poisoned").clear();
    }
}

/// Per-call adapter over the RPC framework's request context.
#[derive(Debug, Default)]
pub struct CallContext {
    caller: String,
    proxy_namespace: String,
    trans_info: HashMap<String, String>,
    store: ExtendedInfoStore,
    hash_key: Mutex<Option<String>>,
    peer: Mutex<Option<(String, u16)>>,
}

impl CallContext {
    /// Create a context for a caller service.
    pub fn new(caller: impl Into<String>) -> Self {
        Self {
            caller: caller.into(),
            ..Self::default()
        }
    }

    /// Set the namespace configured on the service proxy option.
    #[must_use]
    pub fn with_proxy_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.proxy_namespace = namespace.into();
        self
    }

    /// Attach transparently-passed request fields.
    #[must_use]
    pub fn with_trans_info(mut self, trans_info: HashMap<String, String>) -> Self {
        self.trans_info = trans_info;
        self
    }

    /// Caller service name.
    #[inline]
    pub fn caller(&self) -> &str {
        &self.caller
    }

    /// Namespace from the service proxy option; may be empty.
    #[inline]
    pub fn proxy_namespace(&self) -> &str {
        &self.proxy_namespace
    }

    /// Transparently-passed request fields.
    #[inline]
    pub fn trans_info(&self) -> &HashMap<String, String> {
        &self.trans_info
    }

    /// The context's extended-info store.
    #[inline]
    pub fn store(&self) -> &ExtendedInfoStore {
        &self.store
    }

    /// Set the hash key used by hash-based balancers.
    pub fn set_hash_key(&self, key: impl Into<String>) {
        *self.hash_key.lock().expect("context lock poisoned") = Some(key.into());
    }

    /// The hash key, if set.
    pub fn hash_key(&self) -> Option<String> {
        self.hash_key.lock().expect("context lock poisoned").clone()
    }

    /// Record the peer the call was dispatched to; the feedback path
    /// reports by this address.
    pub fn set_peer(&self, host: impl Into<String>, port: u16) {
        *self.peer.lock().expect("context lock poisoned") = Some((host.into(), port));
    }

    /// The recorded peer address, if any.
    pub fn peer(&self) -> Option<(String, u16)> {
        self.peer.lock().expect("context lock poisoned").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_merges_and_overrides() {
        let store = ExtendedInfoStore::new();
        assert!(store.get(keys::NAMESPACE).is_none());

        store.set(keys::NAMESPACE, "production");
        store.set_many([
            (keys::CALLEE_SET_NAME, "app.sz.1"),
            (keys::ENABLE_SET_FORCE, "true"),
        ]);
        assert_eq!(store.get(keys::NAMESPACE).as_deref(), Some("production"));
        assert_eq!(store.get(keys::CALLEE_SET_NAME).as_deref(), Some("app.sz.1"));

        // Later writers override individual keys, not the whole map.
        store.set(keys::NAMESPACE, "staging");
        assert_eq!(store.get(keys::NAMESPACE).as_deref(), Some("staging"));
        assert_eq!(store.get(keys::ENABLE_SET_FORCE).as_deref(), Some("true"));
    }

    #[test]
    fn metadata_slots_round_trip() {
        let store = ExtendedInfoStore::new();
        let mut map = HashMap::new();
        map.insert("label".to_string(), "test".to_string());
        store.set_metadata(MetadataKind::DstMeta, &map);

        let got = store.get_metadata(MetadataKind::DstMeta).unwrap();
        assert_eq!(got, map);
        assert!(store.get_metadata(MetadataKind::RuleRoute).is_none());
    }

    #[test]
    fn empty_metadata_reads_as_absent() {
        let store = ExtendedInfoStore::new();
        store.set_metadata(MetadataKind::CircuitBreak, &HashMap::new());
        assert!(store.get_metadata(MetadataKind::CircuitBreak).is_none());
    }

    #[test]
    fn clear_empties_everything() {
        let store = ExtendedInfoStore::new();
        store.set(keys::CANARY_LABEL, "1");
        let mut map = HashMap::new();
        map.insert("k".to_string(), "v".to_string());
        store.set_metadata(MetadataKind::RuleRoute, &map);

        store.clear();
        assert!(store.get(keys::CANARY_LABEL).is_none());
        assert!(store.get_metadata(MetadataKind::RuleRoute).is_none());
    }

    #[test]
    fn context_mutable_fields() {
        let ctx = CallContext::new("caller.svc").with_proxy_namespace("development");
        assert_eq!(ctx.caller(), "caller.svc");
        assert_eq!(ctx.proxy_namespace(), "development");
        assert!(ctx.hash_key().is_none());
        assert!(ctx.peer().is_none());

        ctx.set_hash_key("abc");
        ctx.set_peer("10.0.0.7", 8080);
        assert_eq!(ctx.hash_key().as_deref(), Some("abc"));
        assert_eq!(ctx.peer(), Some(("10.0.0.7".to_string(), 8080)));
    }
}
