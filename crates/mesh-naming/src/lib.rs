//! # mesh-naming
//!
//! Client-side naming plane for RPC frameworks backed by a service-mesh
//! control plane. It resolves logical service names to concrete endpoints,
//! propagates routing intent (set/canary/metadata/nearby preferences)
//! from the caller's request context through to the resolution call, and
//! feeds call outcomes back so the control plane can adapt load-balancing
//! and circuit-breaking decisions. It also answers "may this call
//! proceed" for rate limiting.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mesh_naming::prelude::*;
//! use std::sync::Arc;
//!
//! let selector = Selector::new(SelectorConfig::default(), Arc::new(sdk_consumer));
//! selector.init()?;
//!
//! let ctx = CallContext::new("caller.svc").with_proxy_namespace("production");
//! ctx.store().set(context::keys::CALLEE_SET_NAME, "app.sz.1");
//! ctx.store().set(context::keys::ENABLE_SET_FORCE, "true");
//!
//! let endpoint = selector.select(&ctx, &SelectionRequest::new("echo.svc"))?;
//! ```
//!
//! ## Architecture
//!
//! This library is organized into several crates:
//!
//! - `naming-core` - identity, endpoint, request, and error types
//! - `naming-cache` - double-buffered readers/writer container and the
//!   route snapshot cache
//! - `naming-selector` - the policy engine, feedback mapping, limiter,
//!   and registry over the dependency-injected mesh SDK boundary
//!
//! This crate (`mesh-naming`) re-exports the public APIs for convenience.
//!
//! ## Design Principles
//!
//! 1. **No panics in library code** - all errors are returned as `Result`
//! 2. **Readers never block** - shared state is published through
//!    swap-on-write containers and `Arc` snapshots
//! 3. **Explicit dependencies** - the engine owns its SDK handles and its
//!    context attachments; no global registries

#![deny(unsafe_code)]
#![warn(missing_docs)]

// Re-export all sub-crates
pub use naming_cache as cache;
pub use naming_core as core;
pub use naming_selector as selector;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use mesh_naming::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use naming_core::{
        CallStatus, Endpoint, ExtendSelectInfo, InvokeResult, LimitDecision, MetadataKind,
        NamingError, Result, SelectionPolicy, SelectionRequest, ServiceKey, ServiceKeyHash,
    };

    // Cache types
    pub use naming_cache::{ReadersWriterCache, RouteCache, RouteSnapshot};

    // Engine types
    pub use naming_selector::{
        context, CallContext, DiscoveryClient, ExtendedInfoStore, Limiter, LimitOutcome,
        NamingConfig, ProviderClient, QuotaClient, RateLimiterConfig, RegistrationInfo, Registry,
        Selector, SelectorConfig,
    };
}

/// Version information for this crate.
pub mod version {
    /// Crate version.
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");

    /// Minimum supported Rust version.
    pub const MSRV: &str = "1.75";

    /// Get version info as a string.
    pub fn version_string() -> String {
        format!("mesh-naming {} (MSRV {})", VERSION, MSRV)
    }
}
