//! Error types for sync operations.

use crate::transport::TransportError;
use halgraph_core::CoreError;
use halgraph_store::StoreError;
use thiserror::Error;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Errors that can occur during sync operations.
///
/// Every error surfaces to the immediate caller. The engines never retry
/// and never swallow a failure.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The transport could not deliver the request or flagged the response
    /// as a failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response representation was inconsistent with the resource,
    /// such as a self link naming a different URI.
    #[error(transparent)]
    Consistency(#[from] CoreError),

    /// A HAL merge was attempted on a response with a different media type.
    #[error("unexpected content type '{found}', expected 'application/hal+json'")]
    ContentType {
        /// The media type the response carried, empty when absent.
        found: String,
    },

    /// A HAL merge was attempted on a response without a body.
    #[error("no body to merge in response")]
    EmptyBody,

    /// A response body or queued request failed to parse.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The offline cache or request queue failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The operation requires the network and the host is offline.
    #[error("network is offline")]
    Offline,
}
