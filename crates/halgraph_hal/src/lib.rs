//! # halgraph HAL
//!
//! HAL wire format and request envelope types for halgraph.
//!
//! This crate provides:
//! - The HAL document model (`_links`, `_embedded`, flattened properties)
//! - Link objects with template/deprecation attributes
//! - The `OneOrMany` shape HAL uses for relation values
//! - The ephemeral request/response envelope passed to the transport
//!
//! ## Design Principles
//!
//! - Documents are plain serde types; nothing here talks to the network
//! - Unknown link attributes and document properties are preserved
//! - `Request` is serializable so a durable queue can persist it

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod document;
mod envelope;
mod link;

pub use document::Document;
pub use envelope::{
    Method, Request, Response, ACCEPT, CONTENT_TYPE, HAL_MEDIA_TYPE, JSON_MEDIA_TYPE,
};
pub use link::{Link, OneOrMany};
