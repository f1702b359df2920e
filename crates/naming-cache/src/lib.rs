//! # naming-cache
//!
//! Concurrent publish/read containers for the mesh-naming selection
//! subsystem:
//!
//! - [`ReadersWriterCache`] - double-buffered container: lock-free reads of
//!   the published generation, a staged generation for the single logical
//!   writer, and an explicit swap as the only synchronization point
//! - [`RouteCache`] / [`RouteSnapshot`] - epoch-invalidated, two-level
//!   (thread-local over process-wide) cache of immutable route-rule
//!   snapshots
//!
//! Both structures share one design rule: readers take `Arc` snapshots and
//! never block, writers prepare the next generation off to the side, and
//! publication is a pointer-sized atomic operation.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod readers_writer;
mod route;
mod stats;

pub use readers_writer::ReadersWriterCache;
pub use route::{RouteCache, RouteSnapshot};
pub use stats::RouteCacheStats;
