//! Feedback mapping: framework result codes to the mesh call vocabulary.

use std::collections::HashSet;

use naming_core::codes::framework;
use naming_core::CallStatus;

/// Classify a framework return code for circuit-break feedback.
///
/// Success and whitelisted codes map to [`CallStatus::Ok`] - whitelisted
/// framework-local errors (overload, throttling) indicate pressure on the
/// caller, not a fault of the callee, and must not count against it.
/// Connect errors and the timeout family map to [`CallStatus::Timeout`].
/// Everything else, including codes introduced after this mapping was
/// written, falls through to [`CallStatus::Error`].
pub fn map_call_status(whitelist: &HashSet<i32>, framework_code: i32) -> CallStatus {
    if framework_code == framework::SUCCESS || whitelist.contains(&framework_code) {
        CallStatus::Ok
    } else if framework_code == framework::CLIENT_CONNECT_ERROR
        || framework_code == framework::CLIENT_INVOKE_TIMEOUT
        || framework_code == framework::CLIENT_FULL_LINK_TIMEOUT
    {
        CallStatus::Timeout
    } else {
        CallStatus::Error
    }
}
