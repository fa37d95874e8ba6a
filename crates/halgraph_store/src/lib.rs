//! # halgraph Store
//!
//! Durable cache and request queue for offline-capable HAL clients.
//!
//! A store holds two tables: resource snapshots keyed by URI, and a FIFO
//! queue of serialized requests awaiting replay. Stores are **opaque value
//! stores** - they persist `serde_json::Value` payloads and never interpret
//! HAL structure. The sync layer owns all document interpretation.
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral sessions
//! - [`FileStore`] - For persistent storage using a JSON snapshot file
//!
//! ## Example
//!
//! ```rust
//! use halgraph_store::{CacheStore, MemoryStore};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! store.put_resource("http://x/1", json!({"name": "John"})).unwrap();
//! assert!(store.get_resource("http://x/1").unwrap().is_some());
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod cache;
mod error;
mod file;
mod memory;

pub use cache::{CacheStore, QueuedRequest, StoreOp};
pub use error::{StoreError, StoreResult};
pub use file::{FileStore, StoreEvent};
pub use memory::MemoryStore;
