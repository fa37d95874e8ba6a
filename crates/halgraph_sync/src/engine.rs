//! The online synchronization engine.

use crate::error::{SyncError, SyncResult};
use crate::transport::Transport;
use chrono::{DateTime, Utc};
use halgraph_core::{Context, ResourceEntity, WriteMode};
use halgraph_hal::{Document, Request, Response, HAL_MEDIA_TYPE};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Shapes an outgoing request just before it is sent, for callers that need
/// to add authentication headers or rewrite URLs.
pub type RequestShaper = dyn Fn(Request) -> Request + Send + Sync;

/// The per-resource synchronization strategy.
///
/// Implementations decide how each operation reaches the server; callers
/// program against this trait so an online engine and an offline-capable
/// engine are interchangeable.
pub trait Syncer: Send + Sync {
    /// Resolves the entity, fetching it only when it was never synchronized.
    ///
    /// A synchronized entity resolves immediately with zero transport calls.
    fn load(
        &self,
        context: &Context,
        entity: &Arc<ResourceEntity>,
    ) -> SyncResult<Arc<ResourceEntity>>;

    /// GETs the resource and merges the response into the context.
    ///
    /// Every entity touched by the merge is marked synchronized with the
    /// response arrival time. On failure the previously held state is left
    /// intact.
    fn get(
        &self,
        context: &Context,
        entity: &Arc<ResourceEntity>,
    ) -> SyncResult<Arc<ResourceEntity>>;

    /// PUTs the resource in the given write mode.
    ///
    /// A response body is merged like a GET response; a 204 or bodyless
    /// response marks only this entity synchronized.
    fn put(
        &self,
        context: &Context,
        entity: &Arc<ResourceEntity>,
        mode: WriteMode,
    ) -> SyncResult<Arc<ResourceEntity>>;

    /// DELETEs the resource and marks it unsynchronized.
    ///
    /// The entity stays in the context's map, so held references observe a
    /// deleted entity rather than dangling.
    fn delete(&self, entity: &Arc<ResourceEntity>) -> SyncResult<Arc<ResourceEntity>>;

    /// POSTs to the resource URI and returns the raw response.
    ///
    /// The body and headers are the caller's; `shaper` may rewrite the
    /// request before it is sent. Never touches synchronization state.
    /// Returns `None` when the request was queued instead of sent.
    fn post(
        &self,
        entity: &Arc<ResourceEntity>,
        body: Option<Value>,
        headers: BTreeMap<String, String>,
        shaper: Option<&RequestShaper>,
    ) -> SyncResult<Option<Response>>;

    /// Marks entities synchronized at `time`, or unsynchronized for `None`.
    fn mark_synced(
        &self,
        entities: &[Arc<ResourceEntity>],
        time: Option<DateTime<Utc>>,
    ) -> SyncResult<()>;
}

/// The online engine: thin orchestration over a [`Transport`].
///
/// Overlapping operations on one entity are not deduplicated; each response
/// is merged on arrival and the last merge wins.
#[derive(Debug)]
pub struct SyncEngine<T: Transport> {
    transport: Arc<T>,
}

impl<T: Transport> SyncEngine<T> {
    /// Creates an engine over the given transport.
    pub fn new(transport: Arc<T>) -> Self {
        Self { transport }
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends the GET and merges the response. Returns the touched entities
    /// and the arrival time; stamping is the caller's.
    pub(crate) fn fetch(
        &self,
        context: &Context,
        entity: &Arc<ResourceEntity>,
    ) -> SyncResult<(Vec<Arc<ResourceEntity>>, DateTime<Utc>)> {
        tracing::debug!(uri = entity.uri(), "get");
        let response = self.transport.request(&entity.get_request())?;
        let time = Utc::now();
        let touched = merge_response(context, entity, &response)?;
        Ok((touched, time))
    }

    /// Sends the PUT and merges any response body. A 204 or bodyless
    /// response touches only the written entity.
    pub(crate) fn write(
        &self,
        context: &Context,
        entity: &Arc<ResourceEntity>,
        mode: WriteMode,
    ) -> SyncResult<(Vec<Arc<ResourceEntity>>, DateTime<Utc>)> {
        tracing::debug!(uri = entity.uri(), ?mode, "put");
        let response = self.transport.request(&entity.put_request(mode))?;
        let time = Utc::now();
        let body_present = response
            .body
            .as_deref()
            .is_some_and(|body| !body.trim().is_empty());
        let touched = if response.is_no_content() || !body_present {
            vec![Arc::clone(entity)]
        } else {
            merge_response(context, entity, &response)?
        };
        Ok((touched, time))
    }

    /// Sends the DELETE.
    pub(crate) fn remove(&self, entity: &Arc<ResourceEntity>) -> SyncResult<()> {
        tracing::debug!(uri = entity.uri(), "delete");
        self.transport.request(&entity.delete_request())?;
        Ok(())
    }

    /// Builds, shapes and sends the POST.
    pub(crate) fn send_post(
        &self,
        entity: &Arc<ResourceEntity>,
        body: Option<Value>,
        headers: BTreeMap<String, String>,
        shaper: Option<&RequestShaper>,
    ) -> SyncResult<Response> {
        tracing::debug!(uri = entity.uri(), "post");
        let mut request = entity.post_request(body, headers);
        if let Some(shaper) = shaper {
            request = shaper(request);
        }
        Ok(self.transport.request(&request)?)
    }
}

impl<T: Transport> Syncer for SyncEngine<T> {
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
        let (touched, time) = self.fetch(context, entity)?;
        self.mark_synced(&touched, Some(time))?;
        Ok(Arc::clone(entity))
    }

    fn put(
        &self,
        context: &Context,
        entity: &Arc<ResourceEntity>,
        mode: WriteMode,
    ) -> SyncResult<Arc<ResourceEntity>> {
        let (touched, time) = self.write(context, entity, mode)?;
        self.mark_synced(&touched, Some(time))?;
        Ok(Arc::clone(entity))
    }

    fn delete(&self, entity: &Arc<ResourceEntity>) -> SyncResult<Arc<ResourceEntity>> {
        self.remove(entity)?;
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
        self.send_post(entity, body, headers, shaper).map(Some)
    }

    fn mark_synced(
        &self,
        entities: &[Arc<ResourceEntity>],
        time: Option<DateTime<Utc>>,
    ) -> SyncResult<()> {
        for entity in entities {
            entity.set_sync_time(time);
        }
        Ok(())
    }
}

/// Merges a response into the context, per the HAL merge rules.
///
/// - 204: nothing to merge
/// - media type must be `application/hal+json` (parameters ignored)
/// - a non-empty body is required
/// - the body's self link must match the requested entity
pub(crate) fn merge_response(
    context: &Context,
    entity: &ResourceEntity,
    response: &Response,
) -> SyncResult<Vec<Arc<ResourceEntity>>> {
    if response.is_no_content() {
        return Ok(Vec::new());
    }
    match response.content_type() {
        Some(HAL_MEDIA_TYPE) => {}
        found => {
            return Err(SyncError::ContentType {
                found: found.unwrap_or_default().to_string(),
            })
        }
    }
    let body = response
        .body
        .as_deref()
        .filter(|body| !body.trim().is_empty())
        .ok_or(SyncError::EmptyBody)?;
    let document = Document::parse(body)?;
    Ok(context.extract(&document, Some(entity.uri()))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{MockTransport, TransportError};
    use halgraph_core::{CoreError, ProfileRegistry};
    use halgraph_hal::{Method, CONTENT_TYPE};
    use serde_json::json;

    fn setup() -> (Arc<MockTransport>, SyncEngine<MockTransport>, Context) {
        let transport = Arc::new(MockTransport::new());
        let engine = SyncEngine::new(Arc::clone(&transport));
        let context = Context::new(Arc::new(ProfileRegistry::new()));
        (transport, engine, context)
    }

    #[test]
    fn get_merges_and_stamps_whole_tree() {
        let (transport, engine, context) = setup();
        transport.respond(Response::hal(
            200,
            &json!({
                "name": "John",
                "_links": {"self": {"href": "http://x/john"}},
                "_embedded": {
                    "hat": {"style": "Fedora", "_links": {"self": {"href": "http://x/hat"}}}
                }
            }),
        ));

        let entity = context.get("http://x/john");
        let resolved = engine.get(&context, &entity).unwrap();

        assert!(Arc::ptr_eq(&resolved, &entity));
        assert_eq!(entity.property("name"), Some(json!("John")));
        assert!(entity.is_synced());

        let hat = context.get("http://x/hat");
        assert_eq!(hat.property("style"), Some(json!("Fedora")));
        assert!(hat.is_synced());
        assert_eq!(hat.sync_time(), entity.sync_time());

        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, Method::Get);
        assert_eq!(requests[0].url, "http://x/john");
    }

    #[test]
    fn get_rejects_wrong_content_type() {
        let (transport, engine, context) = setup();
        transport.respond(
            Response::new(200)
                .with_header(CONTENT_TYPE, "application/json")
                .with_body("{}"),
        );

        let entity = context.get("http://x/1");
        let err = engine.get(&context, &entity).unwrap_err();
        assert!(matches!(err, SyncError::ContentType { found } if found == "application/json"));
        assert!(!entity.is_synced());
    }

    #[test]
    fn get_rejects_empty_body() {
        let (transport, engine, context) = setup();
        transport.respond(Response::new(200).with_header(CONTENT_TYPE, HAL_MEDIA_TYPE));

        let entity = context.get("http://x/1");
        assert!(matches!(
            engine.get(&context, &entity),
            Err(SyncError::EmptyBody)
        ));
    }

    #[test]
    fn get_with_no_content_merges_nothing() {
        let (transport, engine, context) = setup();
        transport.respond(Response::new(204));

        let entity = context.get("http://x/1");
        engine.get(&context, &entity).unwrap();
        // Nothing was touched, so nothing was stamped.
        assert!(!entity.is_synced());
    }

    #[test]
    fn get_surfaces_self_link_mismatch() {
        let (transport, engine, context) = setup();
        transport.respond(Response::hal(
            200,
            &json!({"_links": {"self": {"href": "http://x/other"}}}),
        ));

        let entity = context.get("http://x/1");
        let err = engine.get(&context, &entity).unwrap_err();
        assert!(matches!(
            err,
            SyncError::Consistency(CoreError::Consistency { .. })
        ));
        assert!(!context.contains("http://x/other"));
    }

    #[test]
    fn load_skips_transport_when_synced() {
        let (transport, engine, context) = setup();
        let entity = context.get("http://x/1");
        entity.set_sync_time(Some(Utc::now()));

        let resolved = engine.load(&context, &entity).unwrap();
        assert!(Arc::ptr_eq(&resolved, &entity));
        assert_eq!(transport.request_count(), 0);
    }

    #[test]
    fn load_fetches_unsynced_entity() {
        let (transport, engine, context) = setup();
        transport.respond(Response::hal(
            200,
            &json!({"n": 1, "_links": {"self": {"href": "http://x/1"}}}),
        ));

        let entity = context.get("http://x/1");
        engine.load(&context, &entity).unwrap();
        assert_eq!(transport.request_count(), 1);
        assert_eq!(entity.property("n"), Some(json!(1)));
    }

    #[test]
    fn put_no_content_marks_entity_synced() {
        let (transport, engine, context) = setup();
        transport.respond(Response::new(204));

        let entity = context.get("http://x/1");
        entity.set_property("name", json!("John"));
        engine.put(&context, &entity, WriteMode::State).unwrap();

        assert!(entity.is_synced());
        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Put);
        assert_eq!(requests[0].body, Some(json!({"name": "John"})));
        assert_eq!(
            requests[0].headers.get(CONTENT_TYPE).map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn put_merges_response_body() {
        let (transport, engine, context) = setup();
        transport.respond(Response::hal(
            200,
            &json!({"version": 2, "_links": {"self": {"href": "http://x/1"}}}),
        ));

        let entity = context.get("http://x/1");
        entity.set_property("version", json!(1));
        engine
            .put(&context, &entity, WriteMode::Representation)
            .unwrap();

        assert_eq!(entity.property("version"), Some(json!(2)));
        assert!(entity.is_synced());
    }

    #[test]
    fn delete_marks_entity_unsynced_but_keeps_it() {
        let (transport, engine, context) = setup();
        transport.respond(Response::new(204));

        let entity = context.get("http://x/1");
        entity.set_sync_time(Some(Utc::now()));
        let resolved = engine.delete(&entity).unwrap();

        assert!(Arc::ptr_eq(&resolved, &entity));
        assert!(!entity.is_synced());
        assert!(context.contains("http://x/1"));
        assert_eq!(transport.requests()[0].method, Method::Delete);
    }

    #[test]
    fn post_forwards_and_returns_raw_response() {
        let (transport, engine, context) = setup();
        transport.respond(Response::new(201).with_header("Location", "http://x/2"));

        let entity = context.get("http://x/1");
        let mut headers = BTreeMap::new();
        headers.insert(CONTENT_TYPE.to_string(), "text/plain".to_string());

        let response = engine
            .post(&entity, Some(json!("Test")), headers, None)
            .unwrap()
            .unwrap();

        assert_eq!(response.status, 201);
        assert_eq!(response.header("location"), Some("http://x/2"));
        assert!(!entity.is_synced());

        let requests = transport.requests();
        assert_eq!(requests[0].method, Method::Post);
        assert_eq!(requests[0].body, Some(json!("Test")));
    }

    #[test]
    fn post_applies_request_shaper() {
        let (transport, engine, context) = setup();
        transport.respond(Response::new(200));

        let entity = context.get("http://x/1");
        engine
            .post(
                &entity,
                None,
                BTreeMap::new(),
                Some(&|request: Request| request.with_header("Authorization", "Bearer t")),
            )
            .unwrap();

        assert_eq!(
            transport.requests()[0]
                .headers
                .get("Authorization")
                .map(String::as_str),
            Some("Bearer t")
        );
    }

    #[test]
    fn transport_failure_leaves_state_intact() {
        let (transport, engine, context) = setup();
        transport.fail(TransportError::Status {
            status: 500,
            url: "http://x/1".to_string(),
        });

        let entity = context.get("http://x/1");
        entity.set_property("name", json!("John"));
        let err = engine.get(&context, &entity).unwrap_err();

        assert!(matches!(err, SyncError::Transport(_)));
        assert_eq!(entity.property("name"), Some(json!("John")));
        assert!(!entity.is_synced());
    }

    #[test]
    fn malformed_body_is_reported() {
        let (transport, engine, context) = setup();
        transport.respond(
            Response::new(200)
                .with_header(CONTENT_TYPE, HAL_MEDIA_TYPE)
                .with_body("{not json"),
        );

        let entity = context.get("http://x/1");
        assert!(matches!(
            engine.get(&context, &entity),
            Err(SyncError::Malformed(_))
        ));
    }
}
