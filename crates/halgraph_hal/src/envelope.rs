//! The ephemeral request/response envelope exchanged with the transport.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// The HAL media type required on responses that are merged as HAL documents.
pub const HAL_MEDIA_TYPE: &str = "application/hal+json";

/// The plain JSON media type used for state-only write bodies.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// The `Accept` header name.
pub const ACCEPT: &str = "Accept";

/// The `Content-Type` header name.
pub const CONTENT_TYPE: &str = "Content-Type";

/// An HTTP method, limited to the operations the engine performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    /// HTTP GET.
    Get,
    /// HTTP PUT.
    Put,
    /// HTTP DELETE.
    Delete,
    /// HTTP POST.
    Post,
}

impl Method {
    /// Returns the lowercase method name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "get",
            Method::Put => "put",
            Method::Delete => "delete",
            Method::Post => "post",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing request.
///
/// Not owned by any entity; serializable so the offline queue can persist
/// would-be requests for later replay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// The HTTP method.
    pub method: Method,
    /// The absolute request URL.
    pub url: String,
    /// Request headers.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
    /// JSON request body, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

impl Request {
    /// Creates a request with no headers and no body.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Adds a header, builder style.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the body, builder style.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// An incoming response.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    /// The HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: BTreeMap<String, String>,
    /// Raw response body, if any.
    pub body: Option<String>,
}

impl Response {
    /// Creates a response with no headers and no body.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Creates a HAL response carrying `value` as its body.
    pub fn hal(status: u16, value: &Value) -> Self {
        Self::new(status)
            .with_header(CONTENT_TYPE, HAL_MEDIA_TYPE)
            .with_body(value.to_string())
    }

    /// Adds a header, builder style.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Sets the body, builder style.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Looks up a header by name, case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Returns the media type from `Content-Type`, without parameters.
    pub fn content_type(&self) -> Option<&str> {
        self.header(CONTENT_TYPE)
            .map(|value| value.split(';').next().unwrap_or(value).trim())
    }

    /// Returns true for a 204 No Content response.
    pub fn is_no_content(&self) -> bool {
        self.status == 204
    }
}
