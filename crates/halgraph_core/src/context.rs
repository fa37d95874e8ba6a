//! The identity map.

use crate::collaborators::{
    DiagnosticsSink, SimpleExpander, TemplateExpander, TemplateVars, TracingSink,
};
use crate::error::{CoreError, CoreResult};
use crate::links;
use crate::profile::ProfileRegistry;
use crate::resource::ResourceEntity;
use halgraph_hal::{Document, OneOrMany};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Context for linked HAL resources: the per-session identity map.
///
/// The context owns every entity it has created and guarantees at most one
/// live entity per URI for its lifetime. It grows monotonically; entities
/// are never evicted. All resource creation funnels through [`Context::get`]
/// so the one-entity-per-URI invariant holds even with overlapping
/// operations in flight: the existence check and the insert happen under a
/// single write lock.
pub struct Context {
    resources: RwLock<HashMap<String, Arc<ResourceEntity>>>,
    registry: Arc<ProfileRegistry>,
    expander: Arc<dyn TemplateExpander>,
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl Context {
    /// Creates a context using the given profile registry, the default
    /// `{name}` template expander and tracing diagnostics.
    pub fn new(registry: Arc<ProfileRegistry>) -> Self {
        Self {
            resources: RwLock::new(HashMap::new()),
            registry,
            expander: Arc::new(SimpleExpander),
            diagnostics: Arc::new(TracingSink),
        }
    }

    /// Replaces the URI-template expander, builder style.
    #[must_use]
    pub fn with_expander(mut self, expander: Arc<dyn TemplateExpander>) -> Self {
        self.expander = expander;
        self
    }

    /// Replaces the diagnostics sink, builder style.
    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// Returns the profile registry this context applies during extraction.
    pub fn registry(&self) -> &Arc<ProfileRegistry> {
        &self.registry
    }

    /// Returns the injected template expander.
    pub fn expander(&self) -> &dyn TemplateExpander {
        &*self.expander
    }

    /// Returns the injected diagnostics sink.
    pub fn diagnostics(&self) -> &dyn DiagnosticsSink {
        &*self.diagnostics
    }

    /// Returns the entity for `uri`, creating an unpopulated one on first
    /// reference. The same URI always yields the same entity instance.
    pub fn get(&self, uri: &str) -> Arc<ResourceEntity> {
        self.get_with(uri, |uri| ResourceEntity::new(uri))
    }

    /// Like [`Context::get`], constructing a missing entity with `factory`.
    pub fn get_with(
        &self,
        uri: &str,
        factory: impl FnOnce(&str) -> ResourceEntity,
    ) -> Arc<ResourceEntity> {
        let mut resources = self.resources.write();
        if let Some(existing) = resources.get(uri) {
            return Arc::clone(existing);
        }
        let created = Arc::new(factory(uri));
        debug_assert_eq!(created.uri(), uri);
        resources.insert(uri.to_string(), Arc::clone(&created));
        created
    }

    /// Returns true if an entity for `uri` has been created.
    pub fn contains(&self, uri: &str) -> bool {
        self.resources.read().contains_key(uri)
    }

    /// Returns the number of entities in the map.
    pub fn len(&self) -> usize {
        self.resources.read().len()
    }

    /// Returns true if no entities have been created yet.
    pub fn is_empty(&self) -> bool {
        self.resources.read().is_empty()
    }

    /// Copies a resource from another context into this one, returning this
    /// context's entity for the same URI.
    pub fn copy_from(&self, resource: &ResourceEntity) -> Arc<ResourceEntity> {
        let copy = self.get(resource.uri());
        copy.clone_state_from(resource);
        copy
    }

    /// Resolves the href or hrefs of a relation using this context's
    /// expander and diagnostics sink.
    pub fn href(
        &self,
        entity: &ResourceEntity,
        rel: &str,
        vars: Option<&TemplateVars>,
    ) -> Option<OneOrMany<String>> {
        links::resolve_href(entity, rel, vars, self.expander(), self.diagnostics())
    }

    /// Follows a relation to the entity or entities it points at.
    pub fn rel(
        &self,
        entity: &ResourceEntity,
        rel: &str,
        vars: Option<&TemplateVars>,
    ) -> Option<OneOrMany<Arc<ResourceEntity>>> {
        links::resolve_relation(self, entity, rel, vars)
    }

    /// Extracts a HAL document and every resource embedded in it into this
    /// context, flattening the tree into identity-mapped entities.
    ///
    /// Validation runs over the whole tree before anything is merged: every
    /// document needs a self link, and when `expected_self` is given the
    /// root's self href must match it. A failure anywhere leaves the context
    /// untouched.
    ///
    /// Merging is depth-first: children are merged before their parent. The
    /// returned list holds every touched entity in that order, children
    /// first, the root resource last. Sync timestamps are not modified;
    /// callers mark the batch synchronized.
    pub fn extract(
        &self,
        document: &Document,
        expected_self: Option<&str>,
    ) -> CoreResult<Vec<Arc<ResourceEntity>>> {
        validate_tree(document, expected_self)?;
        let mut touched = Vec::new();
        self.merge_tree(document, &mut touched)?;
        Ok(touched)
    }

    fn merge_tree(
        &self,
        document: &Document,
        touched: &mut Vec<Arc<ResourceEntity>>,
    ) -> CoreResult<()> {
        for embeds in document.embedded.values() {
            for embed in embeds.iter() {
                self.merge_tree(embed, touched)?;
            }
        }
        let uri = document.self_href().ok_or(CoreError::MissingSelfLink)?;
        let entity = self.get(uri);
        entity.update_from(document, &self.registry)?;
        touched.push(entity);
        Ok(())
    }
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("resources", &self.len())
            .finish()
    }
}

/// Checks every document in the tree before any merge happens.
fn validate_tree(document: &Document, expected_self: Option<&str>) -> CoreResult<()> {
    let self_href = document.self_href().ok_or(CoreError::MissingSelfLink)?;
    if let Some(expected) = expected_self {
        if self_href != expected {
            return Err(CoreError::Consistency {
                expected: expected.to_string(),
                was: self_href.to_string(),
            });
        }
    }
    for embeds in document.embedded.values() {
        for embed in embeds.iter() {
            validate_tree(embed, None)?;
        }
    }
    Ok(())
}
