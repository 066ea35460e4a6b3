//! Request and response envelopes shared between the caller and the worker.

use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{QueueError, QueueResult};

/// Completion callback invoked by [`Engine::drain`](crate::Engine::drain).
pub type Callback<T, U> = Box<dyn FnOnce(Response<T, U>) + Send + 'static>;

/// Flags shared between the caller's [`Handle`] and the enqueued request.
#[derive(Debug, Default)]
pub(crate) struct RequestState {
    cancelled: AtomicBool,
    queued: AtomicBool,
}

impl RequestState {
    pub(crate) fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    pub(crate) fn is_queued(&self) -> bool {
        self.queued.load(Ordering::SeqCst)
    }
}

/// A unit of background work: a payload, a lane selection, and an optional
/// completion callback.
///
/// A request is built by the caller, handed to
/// [`Engine::enqueue`](crate::Engine::enqueue), processed once on the worker
/// thread, and delivered back through [`Engine::drain`](crate::Engine::drain).
/// The caller keeps a [`Handle`] for cancellation after the request has been
/// moved into the engine.
pub struct Request<T, U> {
    payload: T,
    prioritized: bool,
    callback: Option<Callback<T, U>>,
    state: Arc<RequestState>,
}

impl<T, U> Request<T, U> {
    /// Create a new request wrapping the given payload.
    pub fn new(payload: T) -> Self {
        Self {
            payload,
            prioritized: false,
            callback: None,
            state: Arc::new(RequestState::default()),
        }
    }

    /// Route this request through the priority lane.
    ///
    /// The lane is fixed once the request is enqueued: the worker fully
    /// drains the priority lane before touching the normal lane.
    pub fn prioritized(mut self) -> Self {
        self.prioritized = true;
        self
    }

    /// Set the completion callback.
    ///
    /// The callback fires at most once, synchronously on the thread calling
    /// [`Engine::drain`](crate::Engine::drain), and never for a cancelled
    /// request.
    pub fn on_complete(mut self, callback: impl FnOnce(Response<T, U>) + Send + 'static) -> Self {
        self.callback = Some(Box::new(callback));
        self
    }

    /// Borrow the payload.
    pub fn payload(&self) -> &T {
        &self.payload
    }

    /// Mutably borrow the payload.
    pub fn payload_mut(&mut self) -> &mut T {
        &mut self.payload
    }

    /// Whether this request targets the priority lane.
    pub fn is_prioritized(&self) -> bool {
        self.prioritized
    }

    /// Whether the request has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Handle for cancellation and membership checks once the request has
    /// been moved into the engine.
    pub fn handle(&self) -> Handle {
        Handle {
            state: Arc::clone(&self.state),
            prioritized: self.prioritized,
        }
    }

    /// Clear the queued flag so a delivered request can be enqueued again.
    ///
    /// A request handed back by [`Response::into_parts`] still carries its
    /// queued flag; re-enqueueing it without a reset fails with
    /// [`QueueError::AlreadyQueued`].
    pub fn reset(&mut self) {
        self.state.queued.store(false, Ordering::SeqCst);
    }

    /// Mark the request queued, failing if it already was.
    pub(crate) fn mark_queued(&self) -> QueueResult<()> {
        if self.state.queued.swap(true, Ordering::SeqCst) {
            return Err(QueueError::AlreadyQueued);
        }
        Ok(())
    }

    pub(crate) fn cancel(&self) {
        self.state.cancel();
    }

    pub(crate) fn shares_state(&self, handle: &Handle) -> bool {
        Arc::ptr_eq(&self.state, &handle.state)
    }

    pub(crate) fn take_callback(&mut self) -> Option<Callback<T, U>> {
        self.callback.take()
    }
}

// The callback is not Debug; render everything else.
impl<T: fmt::Debug, U> fmt::Debug for Request<T, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("payload", &self.payload)
            .field("prioritized", &self.prioritized)
            .field("cancelled", &self.is_cancelled())
            .field("queued", &self.state.is_queued())
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

/// Caller-retained token for a request that has been moved into the engine.
///
/// Cloneable and cheap; cancellation through any clone is observed by the
/// worker and the drain.
#[derive(Debug, Clone)]
pub struct Handle {
    state: Arc<RequestState>,
    prioritized: bool,
}

impl Handle {
    /// Cancel the request.
    ///
    /// Idempotent, returns nothing. Cancellation is cooperative: work already
    /// executing runs to completion, but the callback will never fire.
    pub fn cancel(&self) {
        self.state.cancel();
    }

    /// Whether the request has been cancelled.
    pub fn is_cancelled(&self) -> bool {
        self.state.is_cancelled()
    }

    /// Whether the request has been accepted into a lane.
    pub fn is_queued(&self) -> bool {
        self.state.is_queued()
    }

    /// Whether the request was routed through the priority lane.
    pub fn is_prioritized(&self) -> bool {
        self.prioritized
    }
}

/// A completed request paired with its processing output.
///
/// Delivered by value to the request's callback during a drain; it does not
/// outlive the drain cycle unless the callback keeps it.
pub struct Response<T, U> {
    request: Request<T, U>,
    output: U,
}

impl<T, U> Response<T, U> {
    pub(crate) fn new(request: Request<T, U>, output: U) -> Self {
        Self { request, output }
    }

    /// Borrow the processing output.
    pub fn output(&self) -> &U {
        &self.output
    }

    /// Borrow the originating request.
    pub fn request(&self) -> &Request<T, U> {
        &self.request
    }

    /// Consume the response, returning the originating request and output.
    pub fn into_parts(self) -> (Request<T, U>, U) {
        (self.request, self.output)
    }

    /// Consume the response, keeping only the output.
    pub fn into_output(self) -> U {
        self.output
    }

    pub(crate) fn take_callback(&mut self) -> Option<Callback<T, U>> {
        self.request.take_callback()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        self.request.is_cancelled()
    }
}
