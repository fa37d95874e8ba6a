//! The HAL document model.

use crate::link::{Link, OneOrMany};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A HAL document: one resource representation.
///
/// The reserved `_links` and `_embedded` sections are split out; every other
/// top-level key lands in [`Document::properties`]. Embedded documents are
/// fully recursive, so a deeply nested response parses into one tree.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The `_links` section: relation name to link or links.
    #[serde(rename = "_links", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, OneOrMany<Link>>,
    /// The `_embedded` section: relation name to document or documents.
    #[serde(rename = "_embedded", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub embedded: BTreeMap<String, OneOrMany<Document>>,
    /// Resource state: every top-level key outside the reserved sections.
    #[serde(flatten)]
    pub properties: Map<String, Value>,
}

impl Document {
    /// Creates a document whose self link points at `uri`.
    pub fn new(uri: impl Into<String>) -> Self {
        let mut links = BTreeMap::new();
        links.insert("self".to_string(), OneOrMany::One(Link::new(uri)));
        Self {
            links,
            embedded: BTreeMap::new(),
            properties: Map::new(),
        }
    }

    /// Returns the canonical URI of this document, from `_links.self.href`.
    pub fn self_href(&self) -> Option<&str> {
        self.links
            .get("self")
            .and_then(|links| links.first())
            .map(|link| link.href.as_str())
    }

    /// Returns the profile URIs declared in `_links.profile`, in order.
    pub fn profile_hrefs(&self) -> Vec<String> {
        self.links
            .get("profile")
            .map(|links| links.iter().map(|link| link.href.clone()).collect())
            .unwrap_or_default()
    }

    /// Sets a state property, builder style.
    #[must_use]
    pub fn with_property(mut self, key: impl Into<String>, value: Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    /// Adds a link under `rel`, builder style.
    #[must_use]
    pub fn with_link(mut self, rel: impl Into<String>, link: impl Into<OneOrMany<Link>>) -> Self {
        self.links.insert(rel.into(), link.into());
        self
    }

    /// Embeds a document or documents under `rel`, builder style.
    #[must_use]
    pub fn with_embedded(
        mut self,
        rel: impl Into<String>,
        docs: impl Into<OneOrMany<Document>>,
    ) -> Self {
        self.embedded.insert(rel.into(), docs.into());
        self
    }

    /// Parses a document from a JSON value.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    /// Parses a document from JSON text.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }

    /// Serializes the document to a JSON value.
    pub fn to_value(&self) -> Value {
        // A struct of maps and JSON values cannot fail to serialize.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
