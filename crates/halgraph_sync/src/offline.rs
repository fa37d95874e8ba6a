//! The offline-capable synchronization engine.

use crate::engine::{RequestShaper, SyncEngine, Syncer};
use crate::error::{SyncError, SyncResult};
use crate::reachability::Reachability;
use crate::transport::Transport;
use chrono::{DateTime, Utc};
use halgraph_core::{Context, ResourceEntity, WriteMode};
use halgraph_hal::{Document, Method, Request, Response};
use halgraph_store::{CacheStore, StoreOp};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Decorates [`SyncEngine`] with a durable cache and a request queue.
///
/// While online every operation delegates to the inner engine, and
/// [`Syncer::mark_synced`] writes touched entities through to the cache so
/// successful reads keep the offline copy fresh. While offline, GETs answer
/// from the cache and writes are queued for [`OfflineSyncEngine::replay`].
pub struct OfflineSyncEngine<T: Transport> {
    inner: SyncEngine<T>,
    store: Arc<dyn CacheStore>,
    reachability: Arc<dyn Reachability>,
}

impl<T: Transport> OfflineSyncEngine<T> {
    /// Creates an offline-capable engine.
    pub fn new(
        transport: Arc<T>,
        store: Arc<dyn CacheStore>,
        reachability: Arc<dyn Reachability>,
    ) -> Self {
        Self {
            inner: SyncEngine::new(transport),
            store,
            reachability,
        }
    }

    /// Returns the cache store.
    pub fn store(&self) -> &Arc<dyn CacheStore> {
        &self.store
    }

    /// Replays the queued requests through the transport.
    ///
    /// Requests are sent in enqueue order, each removed from the queue on
    /// success; the first transport failure stops the replay with the
    /// failed entry still queued. A PUT or DELETE entry is skipped when a
    /// later entry targets the same URL with the same method, since the
    /// later write supersedes it. POSTs are never skipped. Responses are
    /// not merged; a subsequent GET refreshes affected resources.
    ///
    /// Returns the number of requests sent.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Offline`] when the network is unreachable.
    pub fn replay(&self) -> SyncResult<usize> {
        if self.reachability.is_offline() {
            return Err(SyncError::Offline);
        }

        let queued = self.store.queued_requests()?;
        let mut entries = Vec::with_capacity(queued.len());
        for entry in queued {
            let request: Request = serde_json::from_value(entry.request)?;
            entries.push((entry.id, request));
        }

        let mut sent = 0;
        for index in 0..entries.len() {
            let (id, request) = &entries[index];
            let superseded = matches!(request.method, Method::Put | Method::Delete)
                && entries[index + 1..]
                    .iter()
                    .any(|(_, later)| later.url == request.url && later.method == request.method);
            if superseded {
                tracing::debug!(
                    url = %request.url,
                    method = %request.method,
                    "skipping superseded request"
                );
                self.store.remove_request(*id)?;
                continue;
            }

            self.inner.transport().request(request)?;
            self.store.remove_request(*id)?;
            sent += 1;
        }

        tracing::debug!(sent, "replayed request queue");
        Ok(sent)
    }

    fn enqueue(&self, request: &Request, local_effect: Option<StoreOp>) -> SyncResult<()> {
        let mut ops = vec![StoreOp::EnqueueRequest {
            request: serde_json::to_value(request)?,
        }];
        ops.extend(local_effect);
        self.store.apply(ops)?;
        Ok(())
    }
}

impl<T: Transport> Syncer for OfflineSyncEngine<T> {
    fn load(
        &self,
        context: &Context,
        entity: &Arc<ResourceEntity>,
    ) -> SyncResult<Arc<ResourceEntity>> {
        if entity.is_synced() {
            return Ok(Arc::clone(entity));
        }
        self.get(context, entity)
    }

    fn get(
        &self,
        context: &Context,
        entity: &Arc<ResourceEntity>,
    ) -> SyncResult<Arc<ResourceEntity>> {
        if self.reachability.is_offline() {
            // A cache hit is merged and stamped in memory only; the
            // snapshot came from the store, so no write-back. A miss
            // resolves with the unpopulated entity.
            if let Some(value) = self.store.get_resource(entity.uri())? {
                let document = Document::from_value(value)?;
                let touched = context.extract(&document, Some(entity.uri()))?;
                self.inner.mark_synced(&touched, Some(Utc::now()))?;
            }
            return Ok(Arc::clone(entity));
        }

        let (touched, time) = self.inner.fetch(context, entity)?;
        self.mark_synced(&touched, Some(time))?;
        Ok(Arc::clone(entity))
    }

    fn put(
        &self,
        context: &Context,
        entity: &Arc<ResourceEntity>,
        mode: WriteMode,
    ) -> SyncResult<Arc<ResourceEntity>> {
        if self.reachability.is_offline() {
            self.enqueue(
                &entity.put_request(mode),
                Some(StoreOp::PutResource {
                    uri: entity.uri().to_string(),
                    value: entity.to_document().to_value(),
                }),
            )?;
            return Ok(Arc::clone(entity));
        }

        let (touched, time) = self.inner.write(context, entity, mode)?;
        self.mark_synced(&touched, Some(time))?;
        Ok(Arc::clone(entity))
    }

    fn delete(&self, entity: &Arc<ResourceEntity>) -> SyncResult<Arc<ResourceEntity>> {
        if self.reachability.is_offline() {
            self.enqueue(
                &entity.delete_request(),
                Some(StoreOp::DeleteResource {
                    uri: entity.uri().to_string(),
                }),
            )?;
            return Ok(Arc::clone(entity));
        }

        self.inner.remove(entity)?;
        self.mark_synced(std::slice::from_ref(entity), None)?;
        Ok(Arc::clone(entity))
    }

    fn post(
        &self,
        entity: &Arc<ResourceEntity>,
        body: Option<Value>,
        headers: BTreeMap<String, String>,
        shaper: Option<&RequestShaper>,
    ) -> SyncResult<Option<Response>> {
        if self.reachability.is_offline() {
            let mut request = entity.post_request(body, headers);
            if let Some(shaper) = shaper {
                request = shaper(request);
            }
            self.enqueue(&request, None)?;
            return Ok(None);
        }

        self.inner.send_post(entity, body, headers, shaper).map(Some)
    }

    fn mark_synced(
        &self,
        entities: &[Arc<ResourceEntity>],
        time: Option<DateTime<Utc>>,
    ) -> SyncResult<()> {
        let ops = entities
            .iter()
            .map(|entity| match time {
                Some(_) => StoreOp::PutResource {
                    uri: entity.uri().to_string(),
                    value: entity.to_document().to_value(),
                },
                None => StoreOp::DeleteResource {
                    uri: entity.uri().to_string(),
                },
            })
            .collect();
        self.store.apply(ops)?;
        self.inner.mark_synced(entities, time)
    }
}
