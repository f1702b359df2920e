//! The selection policy engine.
//!
//! Per call, the [`Selector`] walks BUILD_REQUEST -> ISSUE_QUERY ->
//! CONVERT_RESULT -> CACHE_ROUTE_DATA: it reads ambient routing intent
//! from the call context's extended-info store (falling back to the typed
//! side-channel on the request), assembles exactly one mesh-SDK query,
//! converts the response, and records the callee's route revision for
//! burst reuse. The feedback half classifies finished calls through the
//! circuit-break whitelist and forwards them to the SDK's adaptive
//! statistics.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use naming_cache::{ReadersWriterCache, RouteCache, RouteSnapshot};
use naming_core::{
    Endpoint, ExtendSelectInfo, InvokeResult, NamingError, Result, SelectionPolicy,
    SelectionRequest, ServiceKey,
};
use naming_core::MetadataKind;
use tracing::{debug, error};

use crate::context::{keys, CallContext, TRANS_META_PREFIX};
use crate::convert::{convert_instance, convert_instances, convert_instances_skip_unusable};
use crate::mesh::{
    meta_keys, CallResultRequest, DiscoveryClient, InstancesRequest, MeshInstance,
    OneInstanceRequest, SourceService,
};
use crate::metrics::NamingMetrics;
use crate::report::map_call_status;
use crate::SelectorConfig;

const COMPONENT: &str = "selector";

/// Policy engine resolving logical names to endpoints and feeding call
/// outcomes back to the mesh.
///
/// Construction wires in the configuration and the mesh consumer handle;
/// [`init`](Selector::init) seeds the circuit-break whitelist and arms the
/// instance. Every public operation on an un-initialized selector returns
/// [`NamingError::NotInitialized`].
pub struct Selector {
    config: SelectorConfig,
    discovery: Arc<dyn DiscoveryClient>,
    whitelist: ReadersWriterCache<HashSet<i32>>,
    routes: RouteCache,
    metrics: NamingMetrics,
    ready: AtomicBool,
}

impl std::fmt::Debug for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Selector")
            .field("config", &self.config)
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

impl Selector {
    /// Create a selector over a mesh consumer handle.
    pub fn new(config: SelectorConfig, discovery: Arc<dyn DiscoveryClient>) -> Self {
        Self {
            config,
            discovery,
            whitelist: ReadersWriterCache::new(),
            routes: RouteCache::new(),
            metrics: NamingMetrics::new(),
            ready: AtomicBool::new(false),
        }
    }

    /// Seed the whitelist from configuration and arm the selector.
    ///
    /// Idempotent; a second call is a no-op.
    pub fn init(&self) -> Result<()> {
        if self.ready.load(Ordering::Acquire) {
            debug!("selector already initialized");
            return Ok(());
        }
        {
            let mut staging = self.whitelist.writer();
            staging.clear();
            staging.extend(self.config.circuit_break_whitelist.iter().copied());
        }
        self.whitelist.swap();
        self.ready.store(true, Ordering::Release);
        debug!(
            whitelist = ?self.config.circuit_break_whitelist,
            "selector initialized"
        );
        Ok(())
    }

    /// Disarm the selector and drop cached route state.
    pub fn shutdown(&self) {
        if !self.ready.swap(false, Ordering::AcqRel) {
            debug!("selector not initialized");
            return;
        }
        self.routes.invalidate_all();
    }

    /// Whether [`init`](Selector::init) has completed.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    fn ensure_ready(&self) -> Result<()> {
        if self.is_ready() {
            Ok(())
        } else {
            error!("selector used before init");
            Err(NamingError::not_initialized(COMPONENT))
        }
    }

    /// Resolve a single endpoint.
    pub fn select(&self, ctx: &CallContext, request: &SelectionRequest) -> Result<Endpoint> {
        self.ensure_ready()?;

        let instances = match self.select_impl(ctx, request) {
            Ok(instances) => instances,
            Err(err) => {
                self.metrics.record_select("select", false);
                return Err(err);
            }
        };

        // A single-pick query that yields anything but one instance means
        // the SDK broke its contract, not that routing found nothing.
        if instances.len() != 1 {
            self.metrics.record_select("select", false);
            return Err(NamingError::contract_violation(format!(
                "single pick for {} returned {} instances",
                request.name,
                instances.len()
            )));
        }

        // The internal workflow path wants the lean, metadata-free form.
        let endpoint = convert_instance(&instances[0], !request.is_from_workflow);
        self.metrics.record_select("select", true);
        debug!(
            endpoint = %endpoint,
            id = %endpoint.id,
            service = %request.name,
            "selected instance"
        );
        Ok(endpoint)
    }

    /// Resolve endpoints according to the request's policy.
    pub fn select_batch(
        &self,
        ctx: &CallContext,
        request: &SelectionRequest,
    ) -> Result<Vec<Endpoint>> {
        self.ensure_ready()?;

        let outcome = match request.policy {
            // Backup strategy rides the single-query-with-backups path.
            SelectionPolicy::Multiple => self
                .select_impl(ctx, request)
                .map(|instances| convert_instances(&instances)),
            SelectionPolicy::All => self.select_all(ctx, request),
            _ => self.select_routed(ctx, request),
        };

        self.metrics.record_select("select_batch", outcome.is_ok());
        outcome
    }

    /// Async form of [`select`](Selector::select).
    ///
    /// Resolves to the synchronous outcome; once the SDK has the service
    /// cached locally this completes without blocking.
    pub async fn select_async(
        &self,
        ctx: &CallContext,
        request: &SelectionRequest,
    ) -> Result<Endpoint> {
        self.select(ctx, request)
    }

    /// Async form of [`select_batch`](Selector::select_batch).
    pub async fn select_batch_async(
        &self,
        ctx: &CallContext,
        request: &SelectionRequest,
    ) -> Result<Vec<Endpoint>> {
        self.select_batch(ctx, request)
    }

    /// Feed a finished call back to the mesh's adaptive statistics.
    ///
    /// The instance is addressed by the peer recorded on the context; the
    /// framework code is classified through the whitelist so framework-
    /// local pressure does not fault the callee.
    pub fn report_invoke_result(&self, ctx: &CallContext, result: &InvokeResult) -> Result<()> {
        self.ensure_ready()?;

        let (host, port) = ctx.peer().ok_or_else(|| {
            NamingError::invalid_argument("no peer address recorded on the context")
        })?;

        let source = self.source_service_key(ctx, None);
        let status = map_call_status(&self.whitelist.reader(), result.framework_code);
        let labels = ctx.store().get_metadata(MetadataKind::CircuitBreak);
        let subset = if self.config.enable_set_circuit_breaker {
            ctx.store().get_metadata(MetadataKind::SetDivision)
        } else {
            None
        };
        let locality_aware_hint = ctx
            .store()
            .get(keys::LOCALITY_AWARE_INFO)
            .and_then(|raw| raw.parse::<u64>().ok())
            .filter(|hint| *hint != 0);

        let request = CallResultRequest {
            service: ServiceKey::new(source.namespace.clone(), result.name.clone()),
            source,
            host,
            port,
            status,
            interface_code: result.interface_code,
            elapsed: result.elapsed,
            labels,
            subset,
            locality_aware_hint,
        };

        self.discovery.update_call_result(&request).map_err(|err| {
            error!(
                service = %request.service,
                %err,
                "update_call_result failed"
            );
            err
        })?;
        self.metrics
            .record_report(status, result.elapsed.as_millis() as u64);
        Ok(())
    }

    /// Atomically replace the circuit-break whitelist.
    ///
    /// Reports issued after this call observe the new set; in-flight
    /// reports finish against the generation they already read.
    pub fn set_circuit_break_whitelist(&self, codes: &[i32]) {
        {
            let mut staging = self.whitelist.writer();
            staging.clear();
            staging.extend(codes.iter().copied());
        }
        self.whitelist.swap();
        debug!(?codes, "circuit-break whitelist replaced");
    }

    /// The published whitelist generation.
    pub fn circuit_break_whitelist(&self) -> Arc<HashSet<i32>> {
        self.whitelist.reader()
    }

    /// Cached route snapshot for a callee, if current.
    pub fn cached_route(&self, service: &ServiceKey) -> Option<Arc<RouteSnapshot>> {
        self.routes.get(service)
    }

    /// Invalidate every cached route snapshot.
    ///
    /// Called by the background refresh path; in-flight readers keep their
    /// snapshots alive through their `Arc`s.
    pub fn invalidate_route_snapshots(&self) {
        self.routes.invalidate_all();
    }

    // Resolve the namespace for this call: value already cached on the
    // context, else the typed side-channel, else the proxy-option
    // namespace. A fall-through hit is written back to the context so the
    // same request never re-resolves. This precedence chain must not be
    // reordered.
    fn resolve_namespace(&self, ctx: &CallContext, extend: Option<&ExtendSelectInfo>) -> String {
        if let Some(cached) = ctx.store().get(keys::NAMESPACE).filter(|v| !v.is_empty()) {
            return cached;
        }
        let mut value = extend
            .and_then(|e| e.namespace.clone())
            .unwrap_or_default();
        if value.is_empty() {
            value = ctx.proxy_namespace().to_string();
        }
        if !value.is_empty() {
            ctx.store().set(keys::NAMESPACE, value.clone());
        }
        value
    }

    // Caller identity. The process-wide namespace override outranks every
    // per-request source.
    fn source_service_key(
        &self,
        ctx: &CallContext,
        extend: Option<&ExtendSelectInfo>,
    ) -> ServiceKey {
        let namespace = if !self.config.namespace_override.is_empty() {
            self.config.namespace_override.clone()
        } else {
            self.resolve_namespace(ctx, extend)
        };
        ServiceKey::new(namespace, ctx.caller())
    }

    // Context value first, typed side-channel second, both treated as the
    // same string encoding.
    fn context_or_extend(
        &self,
        ctx: &CallContext,
        extend: Option<&ExtendSelectInfo>,
        key: &str,
    ) -> Option<String> {
        ctx.store()
            .get(key)
            .filter(|v| !v.is_empty())
            .or_else(|| extend.and_then(|e| e.field(key)).filter(|v| !v.is_empty()))
    }

    // Assemble the source-service routing labels: rule-route metadata
    // (side-channel under context), the env label, lifted trans fields,
    // and the set-division pair.
    fn source_metadata(
        &self,
        ctx: &CallContext,
        extend: Option<&ExtendSelectInfo>,
        callee_name: &str,
    ) -> HashMap<String, String> {
        let mut metadata = extend
            .and_then(|e| e.metadata_of(MetadataKind::RuleRoute).cloned())
            .unwrap_or_default();
        if let Some(from_context) = ctx.store().get_metadata(MetadataKind::RuleRoute) {
            metadata.extend(from_context);
        }

        metadata.insert(meta_keys::ENV.to_string(), self.config.env_name.clone());

        // Transparent fields carrying the reserved prefix become routing
        // labels, prefix stripped.
        if self.config.enable_trans_meta {
            for (key, value) in ctx.trans_info() {
                if let Some(stripped) = key.strip_prefix(TRANS_META_PREFIX) {
                    debug!(key = stripped, value = %value, "lifted trans selector metadata");
                    metadata.insert(stripped.to_string(), value.clone());
                }
            }
        }

        // The mesh must always see an explicit value here, so "unset"
        // becomes the string "false" rather than an absent key.
        let set_force = self
            .context_or_extend(ctx, extend, keys::ENABLE_SET_FORCE)
            .unwrap_or_else(|| "false".to_string());
        metadata.insert(meta_keys::SET_FORCE.to_string(), set_force);

        if let Some(set_name) = self.context_or_extend(ctx, extend, keys::CALLEE_SET_NAME) {
            debug!(set_name = %set_name, service = %callee_name, "source set name added");
            metadata.insert(meta_keys::SET_NAME.to_string(), set_name);
        }

        metadata
    }

    fn destination_filter(
        &self,
        ctx: &CallContext,
        extend: Option<&ExtendSelectInfo>,
    ) -> Option<HashMap<String, String>> {
        ctx.store()
            .get_metadata(MetadataKind::DstMeta)
            .or_else(|| extend.and_then(|e| e.metadata_of(MetadataKind::DstMeta).cloned()))
    }

    // Single-pick (and backup) query: BUILD_REQUEST -> ISSUE_QUERY, plus
    // CACHE_ROUTE_DATA on success.
    fn select_impl(
        &self,
        ctx: &CallContext,
        request: &SelectionRequest,
    ) -> Result<Vec<MeshInstance>> {
        let extend = request.extend.as_ref();
        let source_key = self.source_service_key(ctx, extend);
        let callee = ServiceKey::new(self.resolve_namespace(ctx, extend), request.name.clone());

        let load_balancer = request
            .load_balancer
            .clone()
            .filter(|name| !name.is_empty())
            .or_else(|| {
                Some(self.config.default_load_balancer.clone())
                    .filter(|name| !name.is_empty())
            });

        let hash_key = ctx.hash_key();
        let replicate_index = if hash_key.is_some() {
            self.context_or_extend(ctx, extend, keys::REPLICATE_INDEX)
                .and_then(|raw| raw.parse::<u32>().ok())
                .unwrap_or(0)
        } else {
            0
        };

        // The SDK's backup budget does not count the primary pick.
        let backup_count = if request.policy == SelectionPolicy::Multiple && request.replicas > 1 {
            request.replicas - 1
        } else {
            0
        };

        let disable_service_router = self
            .context_or_extend(ctx, extend, keys::DISABLE_SERVICE_ROUTER)
            .map(|raw| raw == "true")
            .unwrap_or(false);

        let query = OneInstanceRequest {
            load_balancer,
            hash_key,
            replicate_index,
            canary: self.context_or_extend(ctx, extend, keys::CANARY_LABEL),
            source: Some(SourceService {
                key: source_key,
                metadata: self.source_metadata(ctx, extend, &request.name),
            }),
            metadata_filter: self.destination_filter(ctx, extend),
            backup_count,
            disable_service_router,
            timeout: self.config.timeout(),
            service: callee.clone(),
        };

        let instances = self.discovery.get_one_instance(&query).map_err(|err| {
            error!(service = %callee, %err, "get_one_instance failed");
            err
        })?;

        self.cache_route_data(&callee);
        Ok(instances)
    }

    // Membership with routing applied.
    fn select_routed(
        &self,
        ctx: &CallContext,
        request: &SelectionRequest,
    ) -> Result<Vec<Endpoint>> {
        let extend = request.extend.as_ref();
        let source_key = self.source_service_key(ctx, extend);
        let callee = ServiceKey::new(source_key.namespace.clone(), request.name.clone());

        let include_unhealthy = self
            .context_or_extend(ctx, extend, keys::INCLUDE_UNHEALTHY)
            .map(|raw| raw == "true")
            .unwrap_or(false);

        let query = InstancesRequest {
            source: Some(SourceService {
                key: source_key,
                metadata: self.source_metadata(ctx, extend, &request.name),
            }),
            canary: self.context_or_extend(ctx, extend, keys::CANARY_LABEL),
            metadata_filter: self.destination_filter(ctx, extend),
            include_unhealthy,
            include_circuit_broken: include_unhealthy,
            timeout: self.config.timeout(),
            service: callee.clone(),
        };

        let instances = self.discovery.get_instances(&query).map_err(|err| {
            error!(service = %callee, %err, "get_instances failed");
            err
        })?;

        self.cache_route_data(&callee);
        Ok(convert_instances(&instances))
    }

    // Raw membership; the conversion layer drops isolated and zero-weight
    // instances the SDK leaves in.
    fn select_all(&self, ctx: &CallContext, request: &SelectionRequest) -> Result<Vec<Endpoint>> {
        let extend = request.extend.as_ref();
        let callee = ServiceKey::new(self.resolve_namespace(ctx, extend), request.name.clone());

        let query = InstancesRequest {
            source: None,
            canary: None,
            metadata_filter: None,
            include_unhealthy: false,
            include_circuit_broken: false,
            timeout: self.config.timeout(),
            service: callee.clone(),
        };

        let instances = self.discovery.get_all_instances(&query).map_err(|err| {
            error!(service = %callee, %err, "get_all_instances failed");
            err
        })?;

        Ok(convert_instances_skip_unusable(&instances))
    }

    // Record the callee's route revision for burst reuse on this thread.
    fn cache_route_data(&self, callee: &ServiceKey) {
        if self.routes.get(callee).is_some() {
            return;
        }
        if let Some(revision) = self.discovery.route_rule_revision(callee) {
            self.routes.record(callee.clone(), revision);
        }
    }
}
