//! Transport layer abstraction.

use halgraph_hal::{Request, Response};
use parking_lot::Mutex;
use std::collections::VecDeque;
use thiserror::Error;

/// Errors a transport signals.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request could not be delivered.
    #[error("request to '{url}' failed: {reason}")]
    Unreachable {
        /// The request URL.
        url: String,
        /// Transport-specific failure description.
        reason: String,
    },

    /// The server answered with a status the transport treats as failure.
    #[error("'{url}' answered with status {status}")]
    Status {
        /// The response status code.
        status: u16,
        /// The request URL.
        url: String,
    },
}

/// A transport delivers wire requests to the server.
///
/// This trait abstracts the HTTP layer, allowing for different
/// implementations (a blocking HTTP client, a loopback test server, a mock).
/// The transport owns the success policy: a returned [`Response`] is one the
/// engine may act on (including 204), while statuses the transport considers
/// failures come back as [`TransportError`].
pub trait Transport: Send + Sync {
    /// Performs a request and returns the response.
    fn request(&self, request: &Request) -> Result<Response, TransportError>;
}

/// A mock transport for testing.
///
/// Outcomes are scripted FIFO; every request is recorded for inspection.
/// An unscripted request fails with [`TransportError::Unreachable`].
#[derive(Debug, Default)]
pub struct MockTransport {
    script: Mutex<VecDeque<Result<Response, TransportError>>>,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    /// Creates a mock with an empty script.
    pub fn new() -> Self {
        Self::default()
    }

    /// Scripts the next outcome as a successful response.
    pub fn respond(&self, response: Response) {
        self.script.lock().push_back(Ok(response));
    }

    /// Scripts the next outcome as a transport failure.
    pub fn fail(&self, error: TransportError) {
        self.script.lock().push_back(Err(error));
    }

    /// Returns every request performed so far, in order.
    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().clone()
    }

    /// Returns the number of requests performed so far.
    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

impl Transport for MockTransport {
    fn request(&self, request: &Request) -> Result<Response, TransportError> {
        self.requests.lock().push(request.clone());
        self.script.lock().pop_front().unwrap_or_else(|| {
            Err(TransportError::Unreachable {
                url: request.url.clone(),
                reason: "no scripted response".to_string(),
            })
        })
    }
}
