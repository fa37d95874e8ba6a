//! Profile capability sets.
//!
//! A profile URI identifies a schema contract a resource claims to follow.
//! Registering a profile attaches computed property definitions to every
//! entity that declares it; the definitions are shared code, installed on an
//! entity-private extension layer so entities never share mutable state.

use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

type Getter = Box<dyn Fn(&Map<String, Value>) -> Option<Value> + Send + Sync>;
type Setter = Box<dyn Fn(&mut Map<String, Value>, Value) + Send + Sync>;

/// A named computed property: a getter and an optional setter over an
/// entity's property bag.
pub struct PropertySpec {
    name: String,
    getter: Getter,
    setter: Option<Setter>,
}

impl PropertySpec {
    /// Creates a read-only computed property.
    pub fn getter(
        name: impl Into<String>,
        get: impl Fn(&Map<String, Value>) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            getter: Box::new(get),
            setter: None,
        }
    }

    /// Creates a read-write computed property.
    pub fn accessor(
        name: impl Into<String>,
        get: impl Fn(&Map<String, Value>) -> Option<Value> + Send + Sync + 'static,
        set: impl Fn(&mut Map<String, Value>, Value) + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            getter: Box::new(get),
            setter: Some(Box::new(set)),
        }
    }

    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Computes the property value from a property bag.
    pub fn get(&self, properties: &Map<String, Value>) -> Option<Value> {
        (self.getter)(properties)
    }

    /// Applies the setter, returning false when the property is read-only.
    pub fn set(&self, properties: &mut Map<String, Value>, value: Value) -> bool {
        match &self.setter {
            Some(setter) => {
                setter(properties, value);
                true
            }
            None => false,
        }
    }
}

impl fmt::Debug for PropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySpec")
            .field("name", &self.name)
            .field("writable", &self.setter.is_some())
            .finish()
    }
}

/// A set of computed property definitions attached to a profile URI.
#[derive(Debug, Default)]
pub struct Profile {
    specs: Vec<Arc<PropertySpec>>,
}

impl Profile {
    /// Creates an empty profile.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a read-only computed property, builder style.
    #[must_use]
    pub fn with_getter(
        mut self,
        name: impl Into<String>,
        get: impl Fn(&Map<String, Value>) -> Option<Value> + Send + Sync + 'static,
    ) -> Self {
        self.specs.push(Arc::new(PropertySpec::getter(name, get)));
        self
    }

    /// Adds a read-write computed property, builder style.
    #[must_use]
    pub fn with_accessor(
        mut self,
        name: impl Into<String>,
        get: impl Fn(&Map<String, Value>) -> Option<Value> + Send + Sync + 'static,
        set: impl Fn(&mut Map<String, Value>, Value) + Send + Sync + 'static,
    ) -> Self {
        self.specs
            .push(Arc::new(PropertySpec::accessor(name, get, set)));
        self
    }

    /// Returns the property definitions in registration order.
    pub fn specs(&self) -> &[Arc<PropertySpec>] {
        &self.specs
    }
}

/// Registry mapping profile URI to capability set.
///
/// Threaded explicitly through [`crate::Context`] construction rather than
/// held as process-global state, so contexts stay independently configurable.
/// Profiles must be registered before documents referencing them are
/// extracted; an unregistered profile URI resolves to no definitions.
#[derive(Debug, Default)]
pub struct ProfileRegistry {
    profiles: RwLock<HashMap<String, Arc<Profile>>>,
}

impl ProfileRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `profile` under `uri`, replacing any previous registration.
    pub fn register(&self, uri: impl Into<String>, profile: Profile) {
        self.profiles.write().insert(uri.into(), Arc::new(profile));
    }

    /// Looks up the capability set for a profile URI.
    pub fn lookup(&self, uri: &str) -> Option<Arc<Profile>> {
        self.profiles.read().get(uri).cloned()
    }

    /// Returns true if `uri` has a registered profile.
    pub fn is_registered(&self, uri: &str) -> bool {
        self.profiles.read().contains_key(uri)
    }
}
