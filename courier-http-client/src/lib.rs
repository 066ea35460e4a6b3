//! # Courier HTTP Client
//!
//! The HTTP specialization of the Courier engine: a blocking execution
//! pipeline that turns one [`HttpRequest`] into one [`HttpResponse`] on the
//! engine's worker thread.
//!
//! ## Features
//!
//! - **Dual-priority queueing**: requests ride the engine's priority or
//!   normal lane, callbacks fire on the caller's own thread
//! - **OAuth 1.0a signing**: HMAC-SHA1 `Authorization` headers per request
//! - **Certificate pinning**: per-request trust in a single server
//!   certificate
//! - **Retry on transport errors**: immediate re-attempts against a
//!   per-request budget, no backoff
//! - **Gzip**: always offered, transparently decoded
//! - **Fault injection**: deterministic or probabilistic delays, dropped
//!   connections, lost responses, and synthetic API errors for offline tests
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier_http_client::{HttpEngine, HttpProcessor, HttpRequest, HttpResponse};
//! use courier_queue::{Engine, Request};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut engine: HttpEngine = Engine::new(HttpProcessor::new()?);
//!     engine.start()?;
//!
//!     let request = HttpRequest::get("https://api.example.com/status");
//!     engine.enqueue(Request::<HttpRequest, HttpResponse>::new(request).on_complete(|response| {
//!         match response.output().text() {
//!             Some(body) => println!("status: {body}"),
//!             None => eprintln!("error: {:?}", response.output().error),
//!         }
//!     }))?;
//!
//!     // Deliver callbacks from the host's own loop.
//!     engine.drain();
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod executor;
pub mod fault;
pub mod oauth;
pub mod request;
pub mod response;

pub use config::{DEFAULT_RETRIES, HttpClientConfig, HttpClientConfigBuilder};
pub use error::{HttpClientError, Result};
pub use executor::HttpProcessor;
pub use fault::FaultConfig;
pub use request::{HttpRequest, OAuthCredentials, RequestBody};
pub use response::{HttpResponse, ResponseBody};

/// An engine specialized to HTTP processing.
pub type HttpEngine = courier_queue::Engine<HttpProcessor>;

// Re-export common types
pub use bytes::Bytes;
pub use http::{HeaderMap, HeaderValue, Method, StatusCode, header};
pub use url::Url;

/// Prelude for common imports.
///
/// ```
/// use courier_http_client::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::{DEFAULT_RETRIES, HttpClientConfig, HttpClientConfigBuilder};
    pub use crate::error::{HttpClientError, Result};
    pub use crate::executor::HttpProcessor;
    pub use crate::fault::FaultConfig;
    pub use crate::request::{HttpRequest, OAuthCredentials, RequestBody};
    pub use crate::response::{HttpResponse, ResponseBody};
    pub use crate::HttpEngine;
    pub use http::{Method, StatusCode};
}
