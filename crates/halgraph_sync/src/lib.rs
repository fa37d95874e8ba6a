//! # halgraph Sync
//!
//! Synchronization engines between a resource [`halgraph_core::Context`]
//! and the server.
//!
//! This crate provides:
//! - [`Transport`] and [`Reachability`] collaborator traits, with
//!   [`MockTransport`] and [`NetworkStatus`] implementations
//! - [`Syncer`], the per-resource operation strategy (GET/PUT/DELETE/POST)
//! - [`SyncEngine`], the online engine
//! - [`OfflineSyncEngine`], a decorator adding a durable cache, a request
//!   queue for writes made while offline, and queue [`replay`]
//!
//! ## Architecture
//!
//! Engines are thin orchestration: build the request through the entity's
//! request builders, send it through the transport, merge any HAL response
//! body into the context, and stamp the touched entities via
//! [`Syncer::mark_synced`]. The offline decorator overrides `mark_synced`
//! to write touched entities through to its cache, so every successful
//! online read keeps the offline copy fresh.
//!
//! ## Key Invariants
//!
//! - Reachability is sampled once at the start of every operation
//! - Failures surface to the caller; no retry, no backoff, nothing swallowed
//! - A failed merge leaves previously extracted state intact
//! - Queued requests replay in FIFO order; a PUT or DELETE is skipped when a
//!   later queued request targets the same URL with the same method
//!
//! [`replay`]: OfflineSyncEngine::replay

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod engine;
mod error;
mod offline;
mod reachability;
mod transport;

pub use engine::{RequestShaper, SyncEngine, Syncer};
pub use error::{SyncError, SyncResult};
pub use offline::OfflineSyncEngine;
pub use reachability::{NetworkStatus, Reachability};
pub use transport::{MockTransport, Transport, TransportError};
