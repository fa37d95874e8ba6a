//! Error types for the resource graph.

use thiserror::Error;

/// Result type for graph operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur while building or merging the resource graph.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A document's self link does not match the URI it was requested for.
    ///
    /// Guards against responses describing the wrong resource, e.g. a
    /// misconfigured proxy or cache. Never retried automatically.
    #[error("self link href differs: expected '{expected}', was '{was}'")]
    Consistency {
        /// The URI the document was expected to describe.
        expected: String,
        /// The self href the document actually carried.
        was: String,
    },

    /// A document carries no `_links.self.href`.
    #[error("document has no self link")]
    MissingSelfLink,
}
