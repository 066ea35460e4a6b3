//! The pluggable execution strategy the engine runs on its worker thread.

use crate::error::{QueueError, QueueResult};

/// Processes one request payload into one response output.
///
/// The engine owns exactly one processor and invokes it serially from its
/// dedicated worker thread, so implementations may block (network I/O,
/// disk, ...) and may keep mutable state between requests.
///
/// Return values:
/// - `Ok(Some(output))` — the response is published and delivered to the
///   request's callback on the next drain.
/// - `Ok(None)` — deliberate discard: nothing is published and no callback
///   ever fires. Used to simulate a lost response; the caller cannot
///   distinguish this from a dropped packet.
/// - `Err(error)` — unhandled processing fault. The worker logs it and
///   publishes [`fault`](Processor::fault) as a terminal error response, so
///   the failure still reaches the caller's callback.
pub trait Processor: Send + 'static {
    /// Request payload type.
    type Payload: Send + 'static;

    /// Response output type.
    type Output: Send + 'static;

    /// Process a single request.
    ///
    /// The payload is mutable so implementations can track per-request
    /// attempt state (e.g., a retry budget).
    fn process(&mut self, payload: &mut Self::Payload) -> QueueResult<Option<Self::Output>>;

    /// Build the terminal output delivered when [`process`](Processor::process)
    /// returns an error.
    fn fault(&mut self, payload: &Self::Payload, error: &QueueError) -> Self::Output;
}
