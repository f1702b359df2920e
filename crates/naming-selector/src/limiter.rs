//! Rate-limit dispatch.
//!
//! [`Limiter::should_limit`] answers "may this call proceed" from a quota
//! decision keyed by (service, namespace, labels);
//! [`Limiter::finish_limit`] optionally reports the outcome back so the
//! control plane can tune thresholds adaptively.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use naming_core::codes::framework;
use naming_core::{LimitDecision, NamingError, Result, ServiceKey};
use tracing::{debug, error};

use crate::mesh::{LimitCallKind, LimitCallResult, QuotaClient, QuotaRequest};
use crate::metrics::NamingMetrics;
use crate::RateLimiterConfig;

const COMPONENT: &str = "limiter";

/// Outcome of a rate-limited call, handed to
/// [`finish_limit`](Limiter::finish_limit) at the post-invoke point.
#[derive(Debug, Clone)]
pub struct LimitOutcome {
    /// Service the quota was keyed on.
    pub service: String,
    /// Namespace the quota was keyed on.
    pub namespace: String,
    /// Labels the quota was keyed on.
    pub labels: HashMap<String, String>,
    /// The prior [`should_limit`](Limiter::should_limit) decision; `None`
    /// when the check itself failed.
    pub decision: Option<LimitDecision>,
    /// Framework return code of the call; ignored for rejected calls.
    pub framework_code: i32,
    /// Elapsed call time; zero for rejected calls.
    pub elapsed: Duration,
}

/// Quota dispatch over the mesh's limit API.
pub struct Limiter {
    config: RateLimiterConfig,
    quota: Arc<dyn QuotaClient>,
    metrics: NamingMetrics,
    ready: AtomicBool,
}

impl std::fmt::Debug for Limiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Limiter")
            .field("config", &self.config)
            .field("ready", &self.ready)
            .finish_non_exhaustive()
    }
}

impl Limiter {
    /// Create a limiter over a quota handle.
    pub fn new(config: RateLimiterConfig, quota: Arc<dyn QuotaClient>) -> Self {
        Self {
            config,
            quota,
            metrics: NamingMetrics::new(),
            ready: AtomicBool::new(false),
        }
    }

    /// Arm the limiter. Idempotent.
    pub fn init(&self) -> Result<()> {
        if self.ready.swap(true, Ordering::AcqRel) {
            debug!("limiter already initialized");
        }
        Ok(())
    }

    /// Disarm the limiter.
    pub fn shutdown(&self) {
        self.ready.store(false, Ordering::Release);
    }

    /// Whether [`init`](Limiter::init) has completed.
    #[inline]
    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Ask whether a call keyed by (service, namespace, labels) may
    /// proceed.
    ///
    /// Empty identity fields are rejected before any SDK call; SDK
    /// failures surface as [`NamingError::UpstreamQuery`] and the hook
    /// layer decides what a failed check means for the RPC.
    pub fn should_limit(
        &self,
        service: &str,
        namespace: &str,
        labels: HashMap<String, String>,
    ) -> Result<LimitDecision> {
        if !self.is_ready() {
            error!("limiter used before init");
            return Err(NamingError::not_initialized(COMPONENT));
        }
        if service.is_empty() || namespace.is_empty() {
            error!("limit check without service identity");
            return Err(NamingError::invalid_argument(
                "limit check requires service and namespace",
            ));
        }

        let request = QuotaRequest {
            service: ServiceKey::new(namespace, service),
            labels,
            timeout: self.config.timeout(),
        };

        let decision = self.quota.get_quota(&request).map_err(|err| {
            error!(service = %request.service, %err, "get_quota failed");
            err
        })?;
        self.metrics.record_limit(decision);
        debug!(service = %request.service, ?decision, "quota decision");
        Ok(decision)
    }

    /// Report a finished rate-limited call for adaptive threshold tuning.
    ///
    /// No-op unless `update_call_result` is enabled in configuration, and
    /// no-op when the prior decision was itself an error - there is
    /// nothing meaningful to report then.
    pub fn finish_limit(&self, outcome: &LimitOutcome) -> Result<()> {
        if !self.config.update_call_result {
            return Ok(());
        }
        let Some(decision) = outcome.decision else {
            return Ok(());
        };

        let result = LimitCallResult {
            service: ServiceKey::new(outcome.namespace.clone(), outcome.service.clone()),
            labels: outcome.labels.clone(),
            kind: call_kind(decision, outcome.framework_code),
            elapsed: outcome.elapsed,
        };
        self.quota.update_call_result(&result).map_err(|err| {
            error!(service = %result.service, %err, "limit update_call_result failed");
            err
        })
    }
}

// Rejections report as limited regardless of what the framework did with
// the call afterwards.
fn call_kind(decision: LimitDecision, framework_code: i32) -> LimitCallKind {
    if decision == LimitDecision::Reject {
        LimitCallKind::Limited
    } else if framework_code == framework::SUCCESS {
        LimitCallKind::Ok
    } else {
        LimitCallKind::Failed
    }
}
