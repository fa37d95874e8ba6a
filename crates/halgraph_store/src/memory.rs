//! In-memory store for testing and ephemeral sessions.

use crate::cache::{CacheStore, QueuedRequest, StoreOp};
use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, VecDeque};

#[derive(Debug, Default)]
pub(crate) struct Tables {
    pub(crate) resources: BTreeMap<String, Value>,
    pub(crate) requests: VecDeque<QueuedRequest>,
    pub(crate) next_id: u64,
}

impl Tables {
    pub(crate) fn apply_op(&mut self, op: StoreOp) {
        match op {
            StoreOp::PutResource { uri, value } => {
                self.resources.insert(uri, value);
            }
            StoreOp::DeleteResource { uri } => {
                self.resources.remove(&uri);
            }
            StoreOp::EnqueueRequest { request } => {
                self.enqueue(request);
            }
        }
    }

    pub(crate) fn enqueue(&mut self, request: Value) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.requests.push_back(QueuedRequest { id, request });
        id
    }

    pub(crate) fn remove(&mut self, id: u64) -> StoreResult<()> {
        let position = self
            .requests
            .iter()
            .position(|queued| queued.id == id)
            .ok_or(StoreError::UnknownRequest(id))?;
        self.requests.remove(position);
        Ok(())
    }
}

/// An in-memory cache store.
///
/// All data lives in process memory and is lost on drop. Suitable for unit
/// tests and for sessions that do not need to survive a restart.
///
/// # Thread Safety
///
/// The store is thread-safe; a single lock covers both tables so batches
/// applied through [`CacheStore::apply`] are observed atomically.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of cached resource snapshots.
    pub fn resource_count(&self) -> usize {
        self.tables.lock().resources.len()
    }

    /// Returns the number of queued requests.
    pub fn queue_len(&self) -> usize {
        self.tables.lock().requests.len()
    }
}

impl CacheStore for MemoryStore {
    fn get_resource(&self, uri: &str) -> StoreResult<Option<Value>> {
        Ok(self.tables.lock().resources.get(uri).cloned())
    }

    fn put_resource(&self, uri: &str, value: Value) -> StoreResult<()> {
        self.tables.lock().resources.insert(uri.to_string(), value);
        Ok(())
    }

    fn delete_resource(&self, uri: &str) -> StoreResult<()> {
        self.tables.lock().resources.remove(uri);
        Ok(())
    }

    fn enqueue_request(&self, request: Value) -> StoreResult<u64> {
        Ok(self.tables.lock().enqueue(request))
    }

    fn queued_requests(&self) -> StoreResult<Vec<QueuedRequest>> {
        Ok(self.tables.lock().requests.iter().cloned().collect())
    }

    fn remove_request(&self, id: u64) -> StoreResult<()> {
        self.tables.lock().remove(id)
    }

    fn apply(&self, ops: Vec<StoreOp>) -> StoreResult<()> {
        let mut tables = self.tables.lock();
        for op in ops {
            tables.apply_op(op);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn put_then_get_round_trips() {
        let store = MemoryStore::new();
        assert_eq!(store.get_resource("http://x/1").unwrap(), None);

        store.put_resource("http://x/1", json!({"a": 1})).unwrap();
        assert_eq!(
            store.get_resource("http://x/1").unwrap(),
            Some(json!({"a": 1}))
        );

        store.put_resource("http://x/1", json!({"a": 2})).unwrap();
        assert_eq!(
            store.get_resource("http://x/1").unwrap(),
            Some(json!({"a": 2}))
        );
    }

    #[test]
    fn delete_absent_is_noop() {
        let store = MemoryStore::new();
        store.delete_resource("http://x/1").unwrap();

        store.put_resource("http://x/1", json!(1)).unwrap();
        store.delete_resource("http://x/1").unwrap();
        assert_eq!(store.get_resource("http://x/1").unwrap(), None);
    }

    #[test]
    fn queue_is_fifo_with_increasing_ids() {
        let store = MemoryStore::new();
        let first = store.enqueue_request(json!("a")).unwrap();
        let second = store.enqueue_request(json!("b")).unwrap();
        assert!(second > first);

        let queued = store.queued_requests().unwrap();
        assert_eq!(queued.len(), 2);
        assert_eq!(queued[0].request, json!("a"));
        assert_eq!(queued[1].request, json!("b"));
    }

    #[test]
    fn remove_request_by_id() {
        let store = MemoryStore::new();
        let first = store.enqueue_request(json!("a")).unwrap();
        let second = store.enqueue_request(json!("b")).unwrap();

        store.remove_request(first).unwrap();
        let queued = store.queued_requests().unwrap();
        assert_eq!(queued.len(), 1);
        assert_eq!(queued[0].id, second);

        let err = store.remove_request(first).unwrap_err();
        assert!(matches!(err, StoreError::UnknownRequest(id) if id == first));
    }

    #[test]
    fn ids_are_not_reused_after_removal() {
        let store = MemoryStore::new();
        let first = store.enqueue_request(json!("a")).unwrap();
        store.remove_request(first).unwrap();
        let second = store.enqueue_request(json!("b")).unwrap();
        assert!(second > first);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn queue_order_survives_interleaved_removals(
                removals in proptest::collection::vec(any::<bool>(), 1..30),
            ) {
                let store = MemoryStore::new();
                let mut expected = Vec::new();
                for (n, remove) in removals.iter().enumerate() {
                    let id = store.enqueue_request(json!(n)).unwrap();
                    if *remove {
                        store.remove_request(id).unwrap();
                    } else {
                        expected.push(id);
                    }
                }

                let queued = store.queued_requests().unwrap();
                let ids: Vec<_> = queued.iter().map(|q| q.id).collect();
                prop_assert_eq!(ids, expected);
            }
        }
    }

    #[test]
    fn apply_batches_cache_and_queue() {
        let store = MemoryStore::new();
        store
            .apply(vec![
                StoreOp::PutResource {
                    uri: "http://x/1".to_string(),
                    value: json!({"a": 1}),
                },
                StoreOp::EnqueueRequest {
                    request: json!({"method": "put"}),
                },
            ])
            .unwrap();

        assert_eq!(
            store.get_resource("http://x/1").unwrap(),
            Some(json!({"a": 1}))
        );
        assert_eq!(store.queue_len(), 1);
    }
}
