//! Cache store trait definition.

use crate::error::StoreResult;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A request persisted in the replay queue.
///
/// The id is assigned by the store, strictly increasing in enqueue order,
/// and stable across process restarts. The request payload is the
/// serialized wire request; the store never inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueuedRequest {
    /// Store-assigned queue position.
    pub id: u64,
    /// The serialized request.
    pub request: Value,
}

/// One mutation in an atomic batch. See [`CacheStore::apply`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreOp {
    /// Insert or replace the snapshot for a URI.
    PutResource {
        /// The resource URI.
        uri: String,
        /// The snapshot value.
        value: Value,
    },
    /// Remove the snapshot for a URI. Removing an absent URI is a no-op.
    DeleteResource {
        /// The resource URI.
        uri: String,
    },
    /// Append a request to the replay queue.
    EnqueueRequest {
        /// The serialized request.
        request: Value,
    },
}

/// A durable cache of resource snapshots plus a FIFO request queue.
///
/// # Invariants
///
/// - `get_resource` returns exactly the value last put for that URI
/// - `queued_requests` returns requests in enqueue order
/// - `apply` is atomic: either every op in the batch is persisted or none
/// - Stores must be `Send + Sync` for concurrent access
///
/// # Implementors
///
/// - [`crate::MemoryStore`] - For testing
/// - [`crate::FileStore`] - For persistent storage
pub trait CacheStore: Send + Sync {
    /// Reads the cached snapshot for a URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails.
    fn get_resource(&self, uri: &str) -> StoreResult<Option<Value>>;

    /// Inserts or replaces the snapshot for a URI.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be persisted.
    fn put_resource(&self, uri: &str, value: Value) -> StoreResult<()>;

    /// Removes the snapshot for a URI. Removing an absent URI is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be persisted.
    fn delete_resource(&self, uri: &str) -> StoreResult<()>;

    /// Appends a request to the replay queue, returning its assigned id.
    ///
    /// # Errors
    ///
    /// Returns an error if the write cannot be persisted.
    fn enqueue_request(&self, request: Value) -> StoreResult<u64>;

    /// Returns all queued requests in enqueue order.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage fails.
    fn queued_requests(&self) -> StoreResult<Vec<QueuedRequest>>;

    /// Removes a queued request by id.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StoreError::UnknownRequest`] when the id is not
    /// queued, or an error if the write cannot be persisted.
    fn remove_request(&self, id: u64) -> StoreResult<()>;

    /// Applies a batch of mutations atomically.
    ///
    /// Used when a cache update and a queue append must land together,
    /// such as an offline write that records both the speculative snapshot
    /// and the request to replay.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch cannot be persisted; on error no op
    /// from the batch is visible.
    fn apply(&self, ops: Vec<StoreOp>) -> StoreResult<()>;
}
