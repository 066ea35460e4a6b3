//! HTTP response payload.

use std::collections::HashMap;

use bytes::Bytes;
use http::StatusCode;

/// Response body: decoded text or raw bytes, never both.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ResponseBody {
    /// No body captured.
    #[default]
    None,
    /// Text decoded with the server-declared character set.
    Text(String),
    /// Raw bytes (`application/octet-stream`).
    Bytes(Bytes),
}

/// The outcome of one HTTP exchange, delivered through the engine's drain.
///
/// Every legitimate failure (transport error after retry exhaustion, non-200
/// status, injected fault) is encoded here in [`error`](HttpResponse::error)
/// rather than raised, so it reaches the original caller's callback.
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// Error message; mutually exclusive with a successful body.
    pub error: Option<String>,
    /// HTTP status, once an exchange has completed.
    pub status: Option<StatusCode>,
    /// Status description.
    pub status_text: String,
    /// Response headers as received.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: ResponseBody,
}

impl HttpResponse {
    /// A response carrying only a text body (canned/debug responses).
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            body: ResponseBody::Text(text.into()),
            ..Self::default()
        }
    }

    /// A response carrying only an error message.
    pub fn from_error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    /// Whether the exchange succeeded (no error recorded).
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }

    /// The text body, if the response carried one.
    pub fn text(&self) -> Option<&str> {
        match &self.body {
            ResponseBody::Text(text) => Some(text),
            _ => None,
        }
    }

    /// The byte body, if the response carried one.
    pub fn bytes(&self) -> Option<&[u8]> {
        match &self.body {
            ResponseBody::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// The `Content-Type` header, if present.
    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_bytes_are_exclusive() {
        let text = HttpResponse::from_text("hello");
        assert_eq!(text.text(), Some("hello"));
        assert!(text.bytes().is_none());

        let bytes = HttpResponse {
            body: ResponseBody::Bytes(Bytes::from_static(b"\x00\x01")),
            ..HttpResponse::default()
        };
        assert!(bytes.text().is_none());
        assert_eq!(bytes.bytes(), Some(&b"\x00\x01"[..]));
    }

    #[test]
    fn test_error_response() {
        let response = HttpResponse::from_error("HTTP error: 404 Not Found");
        assert!(!response.is_success());
        assert_eq!(response.body, ResponseBody::None);
    }

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut response = HttpResponse::default();
        response
            .headers
            .insert("Content-Type".to_string(), "application/json".to_string());

        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.content_type(), Some("application/json"));
        assert!(response.header("x-missing").is_none());
    }
}
