//! The mutable resource node.

use crate::error::{CoreError, CoreResult};
use crate::profile::{ProfileRegistry, PropertySpec};
use chrono::{DateTime, Utc};
use halgraph_hal::{
    Document, Link, Method, OneOrMany, Request, ACCEPT, CONTENT_TYPE, HAL_MEDIA_TYPE,
    JSON_MEDIA_TYPE,
};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Selects the body shape of a PUT request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Send the full HAL representation (`_links` + state) as
    /// `application/hal+json`.
    Representation,
    /// Send the state properties only, as `application/json`.
    State,
}

#[derive(Debug, Clone, Default)]
struct EntityState {
    links: BTreeMap<String, OneOrMany<Link>>,
    /// Embedded relations, normalized to the self-hrefs of the embedded
    /// resources. The resources themselves live in the context.
    embedded: BTreeMap<String, OneOrMany<String>>,
    properties: Map<String, Value>,
    /// Profile URIs currently applied, in application order.
    profile: Vec<String>,
    /// Installed computed-property definitions, name to shared spec.
    extension: BTreeMap<String, Arc<PropertySpec>>,
    sync_time: Option<DateTime<Utc>>,
}

/// One HAL resource inside a context.
///
/// The URI is fixed at creation; everything else is the last-received
/// representation plus any local edits. An entity starts unpopulated with
/// only its self link and `sync_time = None`, and is never removed from its
/// context: a successful DELETE resets `sync_time` instead, so held
/// references observe a "deleted" entity rather than dangling.
#[derive(Debug)]
pub struct ResourceEntity {
    uri: String,
    state: RwLock<EntityState>,
}

impl ResourceEntity {
    /// Creates an unpopulated entity for `uri`.
    pub fn new(uri: impl Into<String>) -> Self {
        let uri = uri.into();
        let mut links = BTreeMap::new();
        links.insert("self".to_string(), OneOrMany::One(Link::new(uri.clone())));
        Self {
            uri,
            state: RwLock::new(EntityState {
                links,
                ..EntityState::default()
            }),
        }
    }

    /// Returns the canonical URI. Never changes after creation.
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Returns the time of the last successful GET or PUT, or `None` when
    /// the entity was never fetched or has been deleted.
    pub fn sync_time(&self) -> Option<DateTime<Utc>> {
        self.state.read().sync_time
    }

    /// Sets the sync timestamp. `None` marks the entity unsynchronized.
    pub fn set_sync_time(&self, time: Option<DateTime<Utc>>) {
        self.state.write().sync_time = time;
    }

    /// Returns true if the entity is synchronized with server state.
    pub fn is_synced(&self) -> bool {
        self.sync_time().is_some()
    }

    /// Returns the links for a relation.
    pub fn link(&self, rel: &str) -> Option<OneOrMany<Link>> {
        self.state.read().links.get(rel).cloned()
    }

    /// Sets the links for a relation (local edit before a PUT).
    pub fn set_link(&self, rel: impl Into<String>, links: impl Into<OneOrMany<Link>>) {
        self.state.write().links.insert(rel.into(), links.into());
    }

    /// Returns the self-hrefs of the resources embedded under a relation.
    pub fn embedded_hrefs(&self, rel: &str) -> Option<OneOrMany<String>> {
        self.state.read().embedded.get(rel).cloned()
    }

    /// Sets the embedded hrefs for a relation.
    pub fn set_embedded(&self, rel: impl Into<String>, hrefs: impl Into<OneOrMany<String>>) {
        self.state.write().embedded.insert(rel.into(), hrefs.into());
    }

    /// Returns the profile URIs currently applied.
    pub fn profile(&self) -> Vec<String> {
        self.state.read().profile.clone()
    }

    /// Returns a copy of the property bag.
    pub fn properties(&self) -> Map<String, Value> {
        self.state.read().properties.clone()
    }

    /// Reads a property, consulting profile-computed definitions first.
    pub fn property(&self, name: &str) -> Option<Value> {
        let state = self.state.read();
        match state.extension.get(name) {
            Some(spec) => spec.get(&state.properties),
            None => state.properties.get(name).cloned(),
        }
    }

    /// Writes a property, through the profile setter when one is installed.
    ///
    /// A computed property without a setter is read-only; the write is
    /// dropped and false is returned.
    pub fn set_property(&self, name: &str, value: Value) -> bool {
        let mut state = self.state.write();
        let state = &mut *state;
        match state.extension.get(name).cloned() {
            Some(spec) => spec.set(&mut state.properties, value),
            None => {
                state.properties.insert(name.to_string(), value);
                true
            }
        }
    }

    /// Removes a property from the bag.
    pub fn remove_property(&self, name: &str) -> Option<Value> {
        self.state.write().properties.remove(name)
    }

    /// Returns a shallow copy of the state properties only: no `_links`, no
    /// `_embedded`, no computed properties.
    pub fn to_state(&self) -> Map<String, Value> {
        self.state.read().properties.clone()
    }

    /// Builds the full HAL representation: `_links` plus state properties.
    ///
    /// Embedded relations are not re-materialized; embedded resources are
    /// separate entities with their own write lifecycle.
    pub fn to_document(&self) -> Document {
        let state = self.state.read();
        Document {
            links: state.links.clone(),
            embedded: BTreeMap::new(),
            properties: state.properties.clone(),
        }
    }

    /// Applies a profile: removes the currently-installed computed property
    /// definitions, then installs the registry's definitions for `profiles`
    /// in list order, later profiles shadowing earlier ones.
    ///
    /// `None` derives the profile list from `_links.profile`; an empty list
    /// removes all definitions. No-op when nothing is installed and nothing
    /// is requested.
    pub fn apply_profile(&self, registry: &ProfileRegistry, profiles: Option<&[String]>) {
        let mut state = self.state.write();
        let requested: Vec<String> = match profiles {
            Some(list) => list.to_vec(),
            None => state
                .links
                .get("profile")
                .map(|links| links.iter().map(|link| link.href.clone()).collect())
                .unwrap_or_default(),
        };

        if state.extension.is_empty() && requested.is_empty() {
            return;
        }

        state.extension.clear();
        for uri in &requested {
            if let Some(profile) = registry.lookup(uri) {
                for spec in profile.specs() {
                    state
                        .extension
                        .insert(spec.name().to_string(), Arc::clone(spec));
                }
            }
        }
        state.profile = requested;
    }

    /// Replaces this entity's representation from `document`.
    ///
    /// The document's self link must match this entity's URI. When the
    /// document declares `_links.profile`, that profile is applied first.
    /// Links, embedded hrefs and properties are then replaced wholesale:
    /// every key absent from the new representation disappears.
    pub fn update_from(&self, document: &Document, registry: &ProfileRegistry) -> CoreResult<()> {
        let self_href = document.self_href().ok_or(CoreError::MissingSelfLink)?;
        if self_href != self.uri {
            return Err(CoreError::Consistency {
                expected: self.uri.clone(),
                was: self_href.to_string(),
            });
        }

        let profiles = document.profile_hrefs();
        if !profiles.is_empty() {
            self.apply_profile(registry, Some(&profiles));
        }

        let mut embedded = BTreeMap::new();
        for (rel, docs) in &document.embedded {
            let mut hrefs = Vec::with_capacity(docs.len());
            for doc in docs.iter() {
                hrefs.push(doc.self_href().ok_or(CoreError::MissingSelfLink)?.to_string());
            }
            let value = if docs.is_many() {
                OneOrMany::Many(hrefs)
            } else {
                match hrefs.pop() {
                    Some(href) => OneOrMany::One(href),
                    None => continue,
                }
            };
            embedded.insert(rel.clone(), value);
        }

        let mut state = self.state.write();
        state.links = document.links.clone();
        state.embedded = embedded;
        state.properties = document.properties.clone();
        Ok(())
    }

    /// Copies another entity's representation into this one. Used by
    /// [`crate::Context::copy_from`]; no-op when `other` is this entity.
    pub(crate) fn clone_state_from(&self, other: &ResourceEntity) {
        if std::ptr::eq(self, other) {
            return;
        }
        let snapshot = other.state.read().clone();
        *self.state.write() = snapshot;
    }

    /// Builds the GET request for this resource.
    pub fn get_request(&self) -> Request {
        Request::new(Method::Get, &self.uri).with_header(ACCEPT, HAL_MEDIA_TYPE)
    }

    /// Builds the PUT request for this resource in the given write mode.
    pub fn put_request(&self, mode: WriteMode) -> Request {
        match mode {
            WriteMode::Representation => Request::new(Method::Put, &self.uri)
                .with_header(ACCEPT, HAL_MEDIA_TYPE)
                .with_header(CONTENT_TYPE, HAL_MEDIA_TYPE)
                .with_body(self.to_document().to_value()),
            WriteMode::State => Request::new(Method::Put, &self.uri)
                .with_header(ACCEPT, HAL_MEDIA_TYPE)
                .with_header(CONTENT_TYPE, JSON_MEDIA_TYPE)
                .with_body(Value::Object(self.to_state())),
        }
    }

    /// Builds the DELETE request for this resource.
    pub fn delete_request(&self) -> Request {
        Request::new(Method::Delete, &self.uri)
    }

    /// Builds a POST request to this resource's URI.
    pub fn post_request(
        &self,
        body: Option<Value>,
        headers: BTreeMap<String, String>,
    ) -> Request {
        Request {
            method: Method::Post,
            url: self.uri.clone(),
            headers,
            body,
        }
    }
}
