//! Background request/response engine for Courier.
//!
//! A single dedicated worker thread serially executes possibly-blocking
//! operations off the caller's execution context and hands completed results
//! back through a drain-on-demand channel, so a single-threaded host (e.g., a
//! frame-based update loop) can consume them without locking:
//!
//! - ⭐ Dual-priority lanes: the priority lane is always fully drained first
//! - 📥 Drain-on-demand delivery: callbacks fire on the caller's own thread
//! - 🔌 Pluggable [`Processor`] execution strategy
//! - ✋ Cooperative cancellation: a cancelled request never reaches a callback
//! - 🧵 Explicit lifecycle: start/stop per engine instance, no globals
//!
//! ## Quick Start
//!
//! ```
//! use courier_queue::{Engine, Processor, QueueError, QueueResult, Request};
//!
//! struct Uppercase;
//!
//! impl Processor for Uppercase {
//!     type Payload = String;
//!     type Output = String;
//!
//!     fn process(&mut self, payload: &mut String) -> QueueResult<Option<String>> {
//!         Ok(Some(payload.to_uppercase()))
//!     }
//!
//!     fn fault(&mut self, _payload: &String, error: &QueueError) -> String {
//!         format!("error: {error}")
//!     }
//! }
//!
//! let mut engine = Engine::new(Uppercase);
//! engine.start()?;
//!
//! let request = Request::new("hello".to_string())
//!     .on_complete(|response| assert_eq!(response.output(), "HELLO"));
//! engine.enqueue(request)?;
//!
//! // The host drains on its own cadence (e.g., once per frame).
//! while engine.drain() == 0 {
//!     std::thread::sleep(std::time::Duration::from_millis(1));
//! }
//!
//! engine.stop()?;
//! # Ok::<(), courier_queue::QueueError>(())
//! ```
//!
//! ## Cancellation
//!
//! ```
//! use courier_queue::{Engine, Processor, QueueError, QueueResult, Request};
//! # struct Noop;
//! # impl Processor for Noop {
//! #     type Payload = ();
//! #     type Output = ();
//! #     fn process(&mut self, _payload: &mut ()) -> QueueResult<Option<()>> { Ok(Some(())) }
//! #     fn fault(&mut self, _payload: &(), _error: &QueueError) {}
//! # }
//!
//! let engine = Engine::new(Noop);
//! let handle = engine.enqueue(Request::new(()))?;
//!
//! // The callback will never fire, whenever cancellation lands.
//! handle.cancel();
//! assert!(handle.is_cancelled());
//! # Ok::<(), courier_queue::QueueError>(())
//! ```

pub mod engine;
pub mod error;
pub mod processor;
pub mod request;

pub use engine::{Engine, EngineConfig};
pub use error::{QueueError, QueueResult};
pub use processor::Processor;
pub use request::{Callback, Handle, Request, Response};

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::engine::{Engine, EngineConfig};
    pub use crate::error::{QueueError, QueueResult};
    pub use crate::processor::Processor;
    pub use crate::request::{Callback, Handle, Request, Response};
}
