//! In-process fakes for the mesh SDK boundary.
//!
//! `FakeDiscovery` emulates just enough of the mesh's routing chain
//! (health, set-division, canary, destination metadata, hash picking) to
//! drive the end-to-end scenarios deterministically; `FakeQuota` grants a
//! fixed number of permits per second per label set. Both capture the
//! requests they receive so tests can assert on request assembly.

// Each test binary uses its own slice of this module.
#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use naming_core::{LimitDecision, NamingError, Result, ServiceKey};
use naming_selector::mesh::{
    meta_keys, CallResultRequest, DiscoveryClient, InstancesRequest, LimitCallResult,
    MeshInstance, OneInstanceRequest, QuotaClient, QuotaRequest,
};
use naming_selector::{ProviderClient, RegistrationInfo};

/// Build a healthy, weight-100 instance.
pub fn instance(index: u32) -> MeshInstance {
    MeshInstance {
        id: format!("instance_{index}"),
        host: format!("host{index}"),
        port: 8080 + index as u16,
        is_ipv6: false,
        healthy: true,
        isolated: false,
        weight: 100,
        metadata: HashMap::new(),
    }
}

/// Add one metadata pair to an instance.
pub fn with_meta(mut instance: MeshInstance, key: &str, value: &str) -> MeshInstance {
    instance.metadata.insert(key.to_string(), value.to_string());
    instance
}

#[derive(Default)]
pub struct FakeDiscovery {
    pub instances: Vec<MeshInstance>,
    pub route_revision: Option<String>,
    pub fail_queries: AtomicBool,
    pub duplicate_single_pick: AtomicBool,
    pub one_instance_requests: Mutex<Vec<OneInstanceRequest>>,
    pub instances_requests: Mutex<Vec<InstancesRequest>>,
    pub call_results: Mutex<Vec<CallResultRequest>>,
    pub revision_lookups: AtomicUsize,
}

impl FakeDiscovery {
    pub fn with_instances(instances: Vec<MeshInstance>) -> Self {
        Self {
            instances,
            route_revision: Some("rev-1".to_string()),
            ..Self::default()
        }
    }

    pub fn last_one_instance_request(&self) -> OneInstanceRequest {
        self.one_instance_requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no one-instance request captured")
    }

    pub fn last_call_result(&self) -> CallResultRequest {
        self.call_results
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no call result captured")
    }

    fn fail(&self, operation: &'static str, service: &ServiceKey) -> NamingError {
        NamingError::upstream(
            operation,
            service.name.clone(),
            service.namespace.clone(),
            "injected failure",
        )
    }

    // The routing chain the real SDK applies before load balancing.
    fn routed(
        &self,
        source_metadata: Option<&HashMap<String, String>>,
        canary: Option<&str>,
        metadata_filter: Option<&HashMap<String, String>>,
        include_unhealthy: bool,
    ) -> Vec<MeshInstance> {
        let mut candidates: Vec<MeshInstance> = self
            .instances
            .iter()
            .filter(|i| !i.isolated && i.weight != 0)
            .filter(|i| include_unhealthy || i.healthy)
            .cloned()
            .collect();

        if let Some(filter) = metadata_filter {
            candidates.retain(|i| {
                filter
                    .iter()
                    .all(|(k, v)| i.metadata.get(k).map(String::as_str) == Some(v))
            });
        }

        let set_requested = source_metadata.and_then(|m| {
            (m.get(meta_keys::SET_FORCE).map(String::as_str) == Some("true"))
                .then(|| m.get(meta_keys::SET_NAME).cloned())
                .flatten()
        });
        if let Some(set_name) = set_requested {
            candidates.retain(|i| {
                i.metadata.get(meta_keys::SET_ENABLED).map(String::as_str) == Some("Y")
                    && i.metadata.get(meta_keys::SET_NAME) == Some(&set_name)
            });
        }

        match canary {
            Some(label) => {
                let tagged: Vec<MeshInstance> = candidates
                    .iter()
                    .filter(|i| i.metadata.get(meta_keys::CANARY).map(String::as_str) == Some(label))
                    .cloned()
                    .collect();
                if !tagged.is_empty() {
                    candidates = tagged;
                }
            }
            None => {
                let untagged: Vec<MeshInstance> = candidates
                    .iter()
                    .filter(|i| !i.metadata.contains_key(meta_keys::CANARY))
                    .cloned()
                    .collect();
                if !untagged.is_empty() {
                    candidates = untagged;
                }
            }
        }

        candidates
    }
}

impl DiscoveryClient for FakeDiscovery {
    fn get_one_instance(&self, request: &OneInstanceRequest) -> Result<Vec<MeshInstance>> {
        self.one_instance_requests
            .lock()
            .unwrap()
            .push(request.clone());
        if self.fail_queries.load(Ordering::Relaxed) {
            return Err(self.fail("get_one_instance", &request.service));
        }

        let candidates = self.routed(
            request.source.as_ref().map(|s| &s.metadata),
            request.canary.as_deref(),
            request.metadata_filter.as_ref(),
            false,
        );
        if candidates.is_empty() {
            return Err(self.fail("get_one_instance", &request.service));
        }

        // Numeric hash keys index the candidate list the way a simple-hash
        // balancer would; everything else picks the head.
        let start = request
            .hash_key
            .as_deref()
            .and_then(|k| k.parse::<usize>().ok())
            .map(|k| k % candidates.len())
            .unwrap_or(0);

        if self.duplicate_single_pick.load(Ordering::Relaxed) {
            return Ok(vec![candidates[start].clone(), candidates[start].clone()]);
        }

        let picks = (request.backup_count as usize + 1).min(candidates.len());
        Ok((0..picks)
            .map(|offset| candidates[(start + offset) % candidates.len()].clone())
            .collect())
    }

    fn get_instances(&self, request: &InstancesRequest) -> Result<Vec<MeshInstance>> {
        self.instances_requests.lock().unwrap().push(request.clone());
        if self.fail_queries.load(Ordering::Relaxed) {
            return Err(self.fail("get_instances", &request.service));
        }
        Ok(self.routed(
            request.source.as_ref().map(|s| &s.metadata),
            request.canary.as_deref(),
            request.metadata_filter.as_ref(),
            request.include_unhealthy,
        ))
    }

    fn get_all_instances(&self, request: &InstancesRequest) -> Result<Vec<MeshInstance>> {
        self.instances_requests.lock().unwrap().push(request.clone());
        if self.fail_queries.load(Ordering::Relaxed) {
            return Err(self.fail("get_all_instances", &request.service));
        }
        // The control plane's full view: no filtering whatsoever.
        Ok(self.instances.clone())
    }

    fn update_call_result(&self, request: &CallResultRequest) -> Result<()> {
        if self.fail_queries.load(Ordering::Relaxed) {
            return Err(self.fail("update_call_result", &request.service));
        }
        self.call_results.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn route_rule_revision(&self, _service: &ServiceKey) -> Option<String> {
        self.revision_lookups.fetch_add(1, Ordering::Relaxed);
        self.route_revision.clone()
    }
}

/// Grants `permits` calls per second per (service, labels) key.
pub struct FakeQuota {
    permits: u32,
    windows: Mutex<HashMap<String, (Instant, u32)>>,
    pub fail_queries: AtomicBool,
    pub reported: Mutex<Vec<LimitCallResult>>,
}

impl FakeQuota {
    pub fn per_second(permits: u32) -> Self {
        Self {
            permits,
            windows: Mutex::new(HashMap::new()),
            fail_queries: AtomicBool::new(false),
            reported: Mutex::new(Vec::new()),
        }
    }

    fn bucket_key(request: &QuotaRequest) -> String {
        let mut labels: Vec<_> = request
            .labels
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        labels.sort();
        format!("{}|{}", request.service, labels.join(","))
    }
}

impl QuotaClient for FakeQuota {
    fn get_quota(&self, request: &QuotaRequest) -> Result<LimitDecision> {
        if self.fail_queries.load(Ordering::Relaxed) {
            return Err(NamingError::upstream(
                "get_quota",
                request.service.name.clone(),
                request.service.namespace.clone(),
                "injected failure",
            ));
        }

        let key = Self::bucket_key(request);
        let mut windows = self.windows.lock().unwrap();
        let now = Instant::now();
        let entry = windows.entry(key).or_insert((now, 0));
        if now.duration_since(entry.0) >= Duration::from_secs(1) {
            *entry = (now, 0);
        }
        if entry.1 < self.permits {
            entry.1 += 1;
            Ok(LimitDecision::Allow)
        } else {
            Ok(LimitDecision::Reject)
        }
    }

    fn update_call_result(&self, result: &LimitCallResult) -> Result<()> {
        self.reported.lock().unwrap().push(result.clone());
        Ok(())
    }
}

/// Records registration traffic.
#[derive(Default)]
pub struct FakeProvider {
    pub registered: Mutex<Vec<RegistrationInfo>>,
    pub heartbeats: AtomicUsize,
}

impl ProviderClient for FakeProvider {
    fn register(&self, info: &RegistrationInfo) -> Result<String> {
        self.registered.lock().unwrap().push(info.clone());
        Ok(format!("{}-{}-{}", info.name, info.host, info.port))
    }

    fn deregister(&self, info: &RegistrationInfo) -> Result<()> {
        self.registered
            .lock()
            .unwrap()
            .retain(|r| r.host != info.host || r.port != info.port);
        Ok(())
    }

    fn heartbeat(&self, _info: &RegistrationInfo) -> Result<()> {
        self.heartbeats.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
