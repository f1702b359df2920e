//! Error types for naming operations.
//!
//! This module provides [`NamingError`], the error type shared by the
//! selection, reporting, limiting, and registration paths. All failures are
//! returned as ordinary `Result` values; the library never uses panics as
//! control flow.

/// Error type for naming-plane operations.
///
/// The variants follow the subsystem's error taxonomy:
///
/// - [`NamingError::NotInitialized`] - an operation ran before setup completed
/// - [`NamingError::InvalidArgument`] - required identity fields were missing
/// - [`NamingError::UpstreamQuery`] - the mesh SDK call itself failed
/// - [`NamingError::ContractViolation`] - the SDK returned a result shape
///   inconsistent with the requested policy
#[derive(Debug, thiserror::Error)]
pub enum NamingError {
    /// An operation was invoked before the owning component finished `init`.
    #[error("{component} not initialized")]
    NotInitialized {
        /// Component that rejected the call.
        component: &'static str,
    },

    /// A required identity field (service name, namespace, peer address) was
    /// empty or missing. Reported immediately; no SDK call is attempted.
    #[error("invalid argument: {reason}")]
    InvalidArgument {
        /// What was missing or malformed.
        reason: String,
    },

    /// The mesh SDK query failed (network, config, or control-plane error).
    ///
    /// Surfaced to the caller as a negative result; the hook layer decides
    /// whether to fail the RPC or fall back.
    #[error("{operation} failed for {namespace}/{service}: {message}")]
    UpstreamQuery {
        /// SDK operation that failed.
        operation: &'static str,
        /// Target service name.
        service: String,
        /// Target namespace.
        namespace: String,
        /// Error detail from the SDK layer.
        message: String,
        /// Optional underlying error.
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The SDK returned a result shape inconsistent with the requested
    /// policy (e.g. more than one instance for a single-pick query).
    ///
    /// Indicates an SDK/framework version mismatch rather than a recoverable
    /// runtime condition.
    #[error("SDK contract violation: {reason}")]
    ContractViolation {
        /// Description of the mismatch.
        reason: String,
    },

    /// Configuration could not be loaded or was internally inconsistent.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl NamingError {
    /// Create a [`NamingError::NotInitialized`] for a component.
    pub fn not_initialized(component: &'static str) -> Self {
        Self::NotInitialized { component }
    }

    /// Create an [`NamingError::InvalidArgument`] with a reason.
    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }

    /// Create an [`NamingError::UpstreamQuery`] without an underlying source.
    pub fn upstream(
        operation: &'static str,
        service: impl Into<String>,
        namespace: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::UpstreamQuery {
            operation,
            service: service.into(),
            namespace: namespace.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Create an [`NamingError::UpstreamQuery`] wrapping an underlying error.
    pub fn upstream_with_source<E>(
        operation: &'static str,
        service: impl Into<String>,
        namespace: impl Into<String>,
        source: E,
    ) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self::UpstreamQuery {
            operation,
            service: service.into(),
            namespace: namespace.into(),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a [`NamingError::ContractViolation`] with a reason.
    pub fn contract_violation(reason: impl Into<String>) -> Self {
        Self::ContractViolation {
            reason: reason.into(),
        }
    }
}
