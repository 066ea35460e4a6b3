//! Platform layer for Courier: environments, credentials, and session flows.
//!
//! Everything here is a thin call site over the engine's public contract:
//! flows build [`HttpRequest`](courier_http_client::HttpRequest)s, enqueue
//! them, and finish inside the drain callback on the host's own thread.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use courier_http_client::HttpProcessor;
//! use courier_platform::{PlatformConfig, UserSession};
//! use courier_queue::Engine;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PlatformConfig::from_env()?;
//!
//!     let mut engine = Engine::new(HttpProcessor::new()?);
//!     engine.start()?;
//!
//!     let session = UserSession::new(
//!         config.client_base_url(),
//!         config.client.clone(),
//!         "device-0001",
//!     );
//!     session.login(&engine, "player", "hunter2", |result| match result {
//!         Ok(()) => println!("logged in"),
//!         Err(error) => eprintln!("login failed: {error}"),
//!     })?;
//!
//!     // Deliver callbacks from the host's own loop.
//!     engine.drain();
//!     Ok(())
//! }
//! ```

pub mod env;
pub mod error;
pub mod query;
pub mod session;

pub use env::{Credentials, Environment, PlatformConfig};
pub use error::{PlatformError, Result};
pub use query::{query_string, query_string_repeat};
pub use session::{ServiceSession, TokenPair, UserSession};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::env::{Credentials, Environment, PlatformConfig};
    pub use crate::error::{PlatformError, Result};
    pub use crate::query::{query_string, query_string_repeat};
    pub use crate::session::{ServiceSession, TokenPair, UserSession};
}
