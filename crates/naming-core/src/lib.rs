//! # naming-core
//!
//! Core types, identifiers, and error handling for the mesh-naming
//! selection subsystem.
//!
//! This crate provides the foundational types used across the other
//! mesh-naming crates:
//!
//! - [`NamingError`] - error taxonomy shared by selection, reporting, and
//!   limiting
//! - [`ServiceKey`] / [`ServiceKeyHash`] - logical service identity and its
//!   FNV-1a digest
//! - [`Endpoint`] - the resolved instance handed back to the RPC framework
//! - [`SelectionRequest`] / [`ExtendSelectInfo`] - per-call inputs and the
//!   typed routing side-channel
//! - [`CallStatus`] / [`LimitDecision`] - the feedback vocabulary
//!
//! ## Example
//!
//! ```rust
//! use naming_core::{SelectionPolicy, SelectionRequest, ServiceKey};
//!
//! let key = ServiceKey::new("production", "echo.svc");
//! let request = SelectionRequest::new(key.name.clone()).policy(SelectionPolicy::Multiple);
//! assert_eq!(request.replicas, 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod codes;
mod endpoint;
mod error;
mod key;
mod request;

pub use codes::{CallStatus, LimitDecision};
pub use endpoint::{Endpoint, METADATA_INSTANCE_ID};
pub use error::NamingError;
pub use key::{ServiceKey, ServiceKeyHash};
pub use request::{
    ExtendSelectInfo, InvokeResult, MetadataKind, SelectionPolicy, SelectionRequest,
};

/// Result type alias using [`NamingError`].
pub type Result<T> = std::result::Result<T, NamingError>;
