//! # naming-selector
//!
//! Policy engine, feedback mapping, and rate-limit dispatch for the
//! mesh-naming subsystem.
//!
//! This crate mediates between an RPC framework's call path and the mesh
//! control plane's SDK:
//!
//! - [`Selector`] - resolves a logical name plus ambient routing intent
//!   into one or more endpoints (single pick, backups, full membership,
//!   set-divided, canary-aware, metadata-filtered) and feeds call outcomes
//!   back for adaptive load balancing and circuit breaking
//! - [`CallContext`] / [`ExtendedInfoStore`] - the per-call attachment
//!   point routing intent flows through without changing call signatures
//! - [`Limiter`] - answers "may this call proceed" from mesh quota
//!   decisions
//! - [`Registry`] - one-shot registration calls plus the attachment-map
//!   conversion
//! - [`DiscoveryClient`] / [`QuotaClient`] / [`ProviderClient`] - the
//!   dependency-injected mesh SDK boundary
//!
//! ## Example
//!
//! ```rust,ignore
//! use naming_selector::{CallContext, Selector, SelectorConfig};
//! use naming_core::SelectionRequest;
//! use std::sync::Arc;
//!
//! let selector = Selector::new(SelectorConfig::default(), Arc::new(sdk_consumer));
//! selector.init()?;
//!
//! let ctx = CallContext::new("caller.svc").with_proxy_namespace("production");
//! let endpoint = selector.select(&ctx, &SelectionRequest::new("echo.svc"))?;
//! ctx.set_peer(endpoint.host.clone(), endpoint.port);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
pub mod context;
pub mod convert;
mod limiter;
pub mod mesh;
pub mod metrics;
mod register;
pub mod report;
mod selector;

pub use config::{NamingConfig, RateLimiterConfig, SelectorConfig};
pub use context::{CallContext, ExtendedInfoStore, TRANS_META_PREFIX};
pub use limiter::{Limiter, LimitOutcome};
pub use mesh::{DiscoveryClient, MeshInstance, QuotaClient};
pub use register::{ProviderClient, RegistrationInfo, Registry};
pub use selector::Selector;
