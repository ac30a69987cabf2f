//! Request and response types of the HTTP pipeline.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::HttpError;

/// Receives `(bytes_sent, bytes_total)` while a file part streams out.
pub type TransferProgress = Arc<dyn Fn(u64, u64) + Send + Sync>;

/// File attached to a multipart body.
#[derive(Clone)]
pub struct FilePart {
    /// Form field name.
    pub field_name: String,
    /// File name reported to the server.
    pub filename: String,
    /// MIME type of the part.
    pub mime: String,
    /// Contents.
    pub bytes: Bytes,
    /// Optional progress observer.
    pub progress: Option<TransferProgress>,
}

impl fmt::Debug for FilePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilePart")
            .field("field_name", &self.field_name)
            .field("filename", &self.filename)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish_non_exhaustive()
    }
}

/// Multipart form that can be rebuilt for every retry.
#[derive(Debug, Clone, Default)]
pub struct MultipartForm {
    /// Text fields, in order.
    pub fields: Vec<(String, String)>,
    /// Optional file part.
    pub file: Option<FilePart>,
}

impl MultipartForm {
    /// Creates an empty form.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a text field.
    #[must_use]
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    /// Sets the file part.
    #[must_use]
    pub fn file(mut self, part: FilePart) -> Self {
        self.file = Some(part);
        self
    }
}

/// Body of an outgoing request.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// JSON document.
    Json(serde_json::Value),
    /// Multipart form; the transport picks the content type.
    Multipart(MultipartForm),
}

impl RequestBody {
    /// Returns true for multipart bodies.
    #[must_use]
    pub const fn is_multipart(&self) -> bool {
        matches!(self, Self::Multipart(_))
    }
}

/// Per-request settings, mutable by request interceptors.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    /// HTTP method.
    pub method: Method,
    /// Headers; merged with the client's defaults.
    pub headers: HeaderMap,
    /// Query parameters appended to the URL.
    pub query: Vec<(String, String)>,
    /// Body.
    pub body: RequestBody,
    /// Per-attempt timeout overriding the client's default.
    pub timeout: Option<Duration>,
    /// Caller-side cancellation.
    pub signal: Option<CancellationToken>,
}

impl RequestConfig {
    /// Creates a config for `method` with no body.
    #[must_use]
    pub fn new(method: Method) -> Self {
        Self {
            method,
            headers: HeaderMap::new(),
            query: Vec::new(),
            body: RequestBody::Empty,
            timeout: None,
            signal: None,
        }
    }

    /// Adds a header, ignoring invalid names or values.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.set_header(name, value);
        self
    }

    /// Sets a header in place, ignoring invalid names or values.
    pub fn set_header(&mut self, name: &str, value: &str) {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
    }

    /// Appends query parameters.
    #[must_use]
    pub fn with_query<K, V>(mut self, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: ToString,
    {
        self.query
            .extend(params.into_iter().map(|(k, v)| (k.into(), v.to_string())));
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: RequestBody) -> Self {
        self.body = body;
        self
    }

    /// Sets the per-attempt timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the cancellation signal.
    #[must_use]
    pub fn with_signal(mut self, signal: CancellationToken) -> Self {
        self.signal = Some(signal);
        self
    }
}

/// A fully resolved request handed to the transport.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL including query.
    pub url: Url,
    /// Final headers.
    pub headers: HeaderMap,
    /// Body.
    pub body: RequestBody,
}

/// A buffered response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// Status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Body bytes.
    pub body: Bytes,
}

impl HttpResponse {
    /// Creates a response.
    #[must_use]
    pub fn new(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    /// Returns true for 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Canonical reason phrase for the status.
    #[must_use]
    pub fn status_text(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Parses the body as JSON.
    ///
    /// # Errors
    /// Returns `HttpError::Decode` if the body is not valid JSON for `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, HttpError> {
        serde_json::from_slice(&self.body).map_err(|e| HttpError::decode(e.to_string()))
    }

    /// Parses the body as JSON, treating an empty body as `null`.
    ///
    /// # Errors
    /// Returns `HttpError::Decode` if the body is not valid JSON.
    pub fn json_value(&self) -> Result<serde_json::Value, HttpError> {
        if self.body.is_empty() {
            return Ok(serde_json::Value::Null);
        }
        self.json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_names_are_case_insensitive() {
        let config = RequestConfig::new(Method::GET)
            .with_header("X-Trace", "1")
            .with_header("x-trace", "2");

        assert_eq!(config.headers.len(), 1);
        assert_eq!(config.headers.get("X-TRACE").unwrap(), "2");
    }

    #[test]
    fn test_json_value_of_empty_body_is_null() {
        let response = HttpResponse::new(StatusCode::NO_CONTENT, Bytes::new());
        assert_eq!(response.json_value().unwrap(), serde_json::Value::Null);
    }

    #[test]
    fn test_json_decode_error() {
        let response = HttpResponse::new(StatusCode::OK, "not json");
        let err = response.json::<serde_json::Value>().unwrap_err();
        assert!(matches!(err, HttpError::Decode { .. }));
    }
}
