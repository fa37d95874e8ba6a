//! # halgraph Core
//!
//! The identity-mapped HAL resource graph.
//!
//! This crate provides:
//! - [`Context`]: the per-session identity map owning one entity per URI
//! - [`ResourceEntity`]: the mutable resource node (links, embedded
//!   relations, property bag, profile extension, sync timestamp)
//! - [`ProfileRegistry`]: capability sets keyed by profile URI
//! - Link and relation resolution with usage diagnostics
//! - Recursive extraction of nested HAL documents into flat entities
//!
//! ## Key Invariants
//!
//! - One live entity per URI per context, for the context's lifetime
//! - Entity URIs never change after creation
//! - Property state is replaced wholesale on every merge, never key-merged
//! - Extraction is all-or-nothing: a self-link mismatch anywhere in a
//!   document tree leaves the context untouched

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod collaborators;
mod context;
mod error;
mod links;
mod profile;
mod resource;

pub use collaborators::{
    DiagnosticsSink, RecordingSink, SimpleExpander, TemplateExpander, TemplateVars, TracingSink,
};
pub use context::Context;
pub use error::{CoreError, CoreResult};
pub use links::{resolve_href, resolve_relation};
pub use profile::{Profile, ProfileRegistry, PropertySpec};
pub use resource::{ResourceEntity, WriteMode};
