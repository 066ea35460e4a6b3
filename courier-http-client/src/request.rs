//! HTTP request payload and builder.

use std::collections::HashMap;

use http::Method;

use crate::config::DEFAULT_RETRIES;
use crate::fault::FaultConfig;

/// OAuth 1.0a credential set attached to a request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OAuthCredentials {
    /// Consumer (application) key.
    pub consumer_key: String,
    /// Consumer secret.
    pub consumer_secret: String,
    /// Token; may be empty for temporary-credential requests.
    pub token: String,
    /// Token secret; may be empty.
    pub token_secret: String,
}

impl OAuthCredentials {
    /// Create a credential set.
    pub fn new(
        consumer_key: impl Into<String>,
        consumer_secret: impl Into<String>,
        token: impl Into<String>,
        token_secret: impl Into<String>,
    ) -> Self {
        Self {
            consumer_key: consumer_key.into(),
            consumer_secret: consumer_secret.into(),
            token: token.into(),
            token_secret: token_secret.into(),
        }
    }
}

/// Request body: a URL-encoded form string or opaque bytes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// URL-encoded form string. For GET requests the pipeline appends it to
    /// the URL as the query string instead of transmitting a body.
    Form(String),
    /// Opaque bytes.
    Raw(Vec<u8>),
}

impl RequestBody {
    /// Whether the body carries no content.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Form(form) => form.is_empty(),
            Self::Raw(bytes) => bytes.is_empty(),
        }
    }
}

/// One HTTP exchange to be executed on the engine's worker thread.
///
/// Built by the caller, wrapped in a
/// [`courier_queue::Request`] and enqueued; the pipeline consumes it exactly
/// once (mutating only the retry budget).
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Target URL.
    pub url: String,
    /// HTTP method.
    pub method: Method,
    /// Request headers (keys unique).
    ///
    /// A few headers are managed by the pipeline rather than this map:
    /// `Accept-Encoding` always offers gzip, and `Content-Type` /
    /// `Content-Length` are set when a body is written unless a
    /// `Content-Type` entry is present here.
    pub headers: HashMap<String, String>,
    /// Request body.
    pub body: RequestBody,
    /// OAuth credentials; presence enables request signing.
    pub oauth: Option<OAuthCredentials>,
    /// PEM certificate pinning the server identity for this request.
    ///
    /// When set, TLS validation accepts only a server matching this
    /// certificate; otherwise standard platform validation applies. Pinning
    /// is a per-request parameter, never shared state.
    pub pinned_cert: Option<String>,
    /// Whether transport errors are retried.
    pub retry: bool,
    /// Remaining retry budget; decremented by the pipeline.
    pub retries: u32,
    /// Emit request/response traces. Diagnostics only.
    pub trace: bool,
    /// Emit timing logs. Diagnostics only.
    pub profile: bool,
    /// Fault injection knobs.
    pub faults: FaultConfig,
    /// Canned response body; when set the pipeline returns it as the text
    /// body without touching the network. Takes precedence over everything
    /// else.
    pub debug_response: Option<String>,
}

impl HttpRequest {
    /// Create a request for the given URL and method.
    pub fn new(url: impl Into<String>, method: Method) -> Self {
        Self {
            url: url.into(),
            method,
            headers: HashMap::new(),
            body: RequestBody::Empty,
            oauth: None,
            pinned_cert: None,
            retry: true,
            retries: DEFAULT_RETRIES,
            trace: false,
            profile: false,
            faults: FaultConfig::default(),
            debug_response: None,
        }
    }

    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(url, Method::GET)
    }

    /// Create a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(url, Method::POST)
    }

    /// Add a header.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set a URL-encoded form body.
    pub fn form_body(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Form(body.into());
        self
    }

    /// Set an opaque byte body.
    pub fn raw_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = RequestBody::Raw(body.into());
        self
    }

    /// Sign this request with the given OAuth credentials.
    pub fn oauth(mut self, credentials: OAuthCredentials) -> Self {
        self.oauth = Some(credentials);
        self
    }

    /// Pin the server certificate for this request (PEM).
    pub fn pin_server_cert(mut self, pem: impl Into<String>) -> Self {
        self.pinned_cert = Some(pem.into());
        self
    }

    /// Set the retry budget.
    pub fn retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Disable retries entirely.
    pub fn no_retry(mut self) -> Self {
        self.retry = false;
        self
    }

    /// Enable request/response tracing.
    pub fn trace(mut self) -> Self {
        self.trace = true;
        self
    }

    /// Enable timing logs.
    pub fn profile(mut self) -> Self {
        self.profile = true;
        self
    }

    /// Set the fault injection configuration.
    pub fn faults(mut self, faults: FaultConfig) -> Self {
        self.faults = faults;
        self
    }

    /// Set a canned response body, skipping the network entirely.
    pub fn debug_response(mut self, body: impl Into<String>) -> Self {
        self.debug_response = Some(body.into());
        self
    }

    /// Whether a `Content-Type` header was supplied by the caller.
    pub(crate) fn has_content_type(&self) -> bool {
        self.headers
            .keys()
            .any(|key| key.eq_ignore_ascii_case("content-type"))
    }
}
