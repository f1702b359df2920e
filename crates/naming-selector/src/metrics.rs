//! Metrics for the selection and feedback paths.
//!
//! Emitted through the `metrics` facade; whatever recorder the host
//! installs receives them. Purely informational - a missing or failing
//! recorder never affects selection or reporting outcomes.

use metrics::{counter, histogram};
use naming_core::{CallStatus, LimitDecision};

/// Recorder handle for naming-plane events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NamingMetrics;

impl NamingMetrics {
    /// Create a metrics handle.
    pub fn new() -> Self {
        Self
    }

    /// Record a selection attempt.
    pub fn record_select(&self, operation: &'static str, ok: bool) {
        let outcome = if ok { "ok" } else { "error" };
        counter!("naming_select_total", "operation" => operation, "outcome" => outcome)
            .increment(1);
    }

    /// Record a call-result report and the call's delay.
    pub fn record_report(&self, status: CallStatus, delay_ms: u64) {
        let status = match status {
            CallStatus::Ok => "ok",
            CallStatus::Timeout => "timeout",
            CallStatus::Error => "error",
        };
        counter!("naming_report_total", "status" => status).increment(1);
        histogram!("naming_call_delay_ms").record(delay_ms as f64);
    }

    /// Record a quota decision.
    pub fn record_limit(&self, decision: LimitDecision) {
        let decision = match decision {
            LimitDecision::Allow => "allow",
            LimitDecision::Reject => "reject",
        };
        counter!("naming_limit_total", "decision" => decision).increment(1);
    }
}
