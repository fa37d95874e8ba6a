//! HAL link objects and the one-or-many relation shape.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A HAL link object.
///
/// Only `href`, `templated` and `deprecation` are interpreted by the engine;
/// every other attribute (`title`, `name`, `type`, ...) is carried through
/// untouched in [`Link::other`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    /// The link target, either a URI or a URI template.
    pub href: String,
    /// True if `href` is a URI template that must be expanded before use.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub templated: Option<bool>,
    /// A URI documenting the deprecation of this link, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deprecation: Option<String>,
    /// Uninterpreted link attributes.
    #[serde(flatten, skip_serializing_if = "Map::is_empty")]
    pub other: Map<String, Value>,
}

impl Link {
    /// Creates a plain link to `href`.
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            templated: None,
            deprecation: None,
            other: Map::new(),
        }
    }

    /// Marks this link as templated.
    #[must_use]
    pub fn templated(mut self) -> Self {
        self.templated = Some(true);
        self
    }

    /// Marks this link as deprecated, pointing at `uri` for details.
    #[must_use]
    pub fn deprecated(mut self, uri: impl Into<String>) -> Self {
        self.deprecation = Some(uri.into());
        self
    }

    /// Returns true if this link must be expanded as a URI template.
    pub fn is_templated(&self) -> bool {
        self.templated == Some(true)
    }
}

/// A relation value: HAL allows both a single object and an array.
///
/// The distinction is significant on the wire and is preserved through
/// resolution, so `One` and `Many(vec![..1 element])` are not the same value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    /// A single value.
    One(T),
    /// An array of values.
    Many(Vec<T>),
}

impl<T> OneOrMany<T> {
    /// Iterates over the contained values.
    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        match self {
            OneOrMany::One(value) => std::slice::from_ref(value).iter(),
            OneOrMany::Many(values) => values.iter(),
        }
    }

    /// Returns the number of contained values.
    pub fn len(&self) -> usize {
        match self {
            OneOrMany::One(_) => 1,
            OneOrMany::Many(values) => values.len(),
        }
    }

    /// Returns true if no values are contained (an empty array).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true for the array shape, regardless of length.
    pub fn is_many(&self) -> bool {
        matches!(self, OneOrMany::Many(_))
    }

    /// Returns the first value, if any.
    pub fn first(&self) -> Option<&T> {
        self.iter().next()
    }

    /// Maps every contained value, preserving the shape.
    pub fn map<U>(&self, mut f: impl FnMut(&T) -> U) -> OneOrMany<U> {
        match self {
            OneOrMany::One(value) => OneOrMany::One(f(value)),
            OneOrMany::Many(values) => OneOrMany::Many(values.iter().map(f).collect()),
        }
    }
}

impl<T> From<T> for OneOrMany<T> {
    fn from(value: T) -> Self {
        OneOrMany::One(value)
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(values: Vec<T>) -> Self {
        OneOrMany::Many(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn link_serializes_without_empty_attributes() {
        let link = Link::new("http://example.com/1");
        let value = serde_json::to_value(&link).unwrap();
        assert_eq!(value, json!({"href": "http://example.com/1"}));
    }

    #[test]
    fn link_preserves_unknown_attributes() {
        let value = json!({"href": "http://x/1", "title": "First", "templated": true});
        let link: Link = serde_json::from_value(value.clone()).unwrap();
        assert!(link.is_templated());
        assert_eq!(link.other.get("title"), Some(&json!("First")));
        assert_eq!(serde_json::to_value(&link).unwrap(), value);
    }

    #[test]
    fn link_deprecation_round_trip() {
        let link = Link::new("http://x/1").deprecated("http://x/docs/gone");
        let value = serde_json::to_value(&link).unwrap();
        let back: Link = serde_json::from_value(value).unwrap();
        assert_eq!(back.deprecation.as_deref(), Some("http://x/docs/gone"));
    }

    #[test]
    fn one_or_many_shapes() {
        let one: OneOrMany<Link> = serde_json::from_value(json!({"href": "http://x/1"})).unwrap();
        assert!(!one.is_many());
        assert_eq!(one.len(), 1);

        let value = json!([{"href": "http://x/1"}, {"href": "http://x/2"}]);
        let many: OneOrMany<Link> = serde_json::from_value(value).unwrap();
        assert!(many.is_many());
        assert_eq!(many.len(), 2);
        let hrefs: Vec<_> = many.iter().map(|l| l.href.as_str()).collect();
        assert_eq!(hrefs, ["http://x/1", "http://x/2"]);
    }

    #[test]
    fn one_or_many_map_preserves_shape() {
        let one = OneOrMany::One(Link::new("http://x/1"));
        let mapped = one.map(|l| l.href.clone());
        assert_eq!(mapped, OneOrMany::One("http://x/1".to_string()));

        let many = OneOrMany::Many(vec![Link::new("http://x/1")]);
        assert!(many.map(|l| l.href.clone()).is_many());
    }

    #[test]
    fn empty_array_is_empty() {
        let none: OneOrMany<Link> = OneOrMany::Many(Vec::new());
        assert!(none.is_empty());
        assert!(none.first().is_none());
    }
}
