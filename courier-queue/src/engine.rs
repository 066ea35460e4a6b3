//! The engine: dual-lane request queue, worker thread, and drain.

use std::collections::VecDeque;
use std::mem;
use std::sync::Arc;
use std::sync::atomic::{AtomicIsize, Ordering};
use std::thread::{self, JoinHandle};

use parking_lot::{Condvar, Mutex};
use tracing::{debug, error, info, trace};

use crate::error::{QueueError, QueueResult};
use crate::processor::Processor;
use crate::request::{Handle, Request, Response};

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Name given to the worker thread.
    pub thread_name: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            thread_name: "courier-worker".to_string(),
        }
    }
}

impl EngineConfig {
    /// Set the worker thread name.
    pub fn with_thread_name(mut self, name: impl Into<String>) -> Self {
        self.thread_name = name.into();
        self
    }
}

/// The two pending lanes plus the shutdown flag, guarded by one mutex.
struct Lanes<P: Processor> {
    priority: VecDeque<Request<P::Payload, P::Output>>,
    normal: VecDeque<Request<P::Payload, P::Output>>,
    shutdown: bool,
}

struct Shared<P: Processor> {
    lanes: Mutex<Lanes<P>>,
    available: Condvar,
    completed: Mutex<Vec<Response<P::Payload, P::Output>>>,
    // Fast-path "anything to drain?" counter, readable without the buffer
    // lock. Signed because a drain may observe a response whose publish has
    // pushed but not yet incremented; the count dips below zero transiently
    // and converges once the increment lands.
    outstanding: AtomicIsize,
}

/// Background request/response engine.
///
/// One dedicated worker thread serially executes requests through the
/// engine's [`Processor`]; completed responses are handed back through
/// [`drain`](Engine::drain), which invokes callbacks synchronously on the
/// caller's own thread. The caller never blocks.
///
/// Engines are plain values with an explicit lifecycle: construct with a
/// processor, [`start`](Engine::start), hand out `&Engine` to collaborators
/// for enqueueing and draining, and [`stop`](Engine::stop) (or drop) to join
/// the worker. Tests can run any number of independent engines.
pub struct Engine<P: Processor> {
    shared: Arc<Shared<P>>,
    processor: Option<P>,
    worker: Option<JoinHandle<P>>,
    config: EngineConfig,
}

impl<P: Processor> Engine<P> {
    /// Create a new engine around the given processor. The worker thread is
    /// not spawned until [`start`](Engine::start).
    pub fn new(processor: P) -> Self {
        Self::with_config(processor, EngineConfig::default())
    }

    /// Create an engine with custom configuration.
    pub fn with_config(processor: P, config: EngineConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                lanes: Mutex::new(Lanes {
                    priority: VecDeque::new(),
                    normal: VecDeque::new(),
                    shutdown: false,
                }),
                available: Condvar::new(),
                completed: Mutex::new(Vec::new()),
                outstanding: AtomicIsize::new(0),
            }),
            processor: Some(processor),
            worker: None,
            config,
        }
    }

    /// Spawn the worker thread.
    pub fn start(&mut self) -> QueueResult<()> {
        if self.worker.is_some() {
            return Err(QueueError::WorkerAlreadyRunning);
        }
        let processor = self
            .processor
            .take()
            .ok_or(QueueError::WorkerAlreadyRunning)?;

        self.shared.lanes.lock().shutdown = false;

        let shared = Arc::clone(&self.shared);
        let handle = thread::Builder::new()
            .name(self.config.thread_name.clone())
            .spawn(move || run_worker(shared, processor))
            .map_err(|e| QueueError::Spawn(e.to_string()))?;

        info!(thread = %self.config.thread_name, "worker started");
        self.worker = Some(handle);
        Ok(())
    }

    /// Signal shutdown and join the worker thread.
    ///
    /// Requests still pending in the lanes are dropped without a callback.
    /// The engine can be started again afterwards.
    pub fn stop(&mut self) -> QueueResult<()> {
        let Some(handle) = self.worker.take() else {
            return Err(QueueError::WorkerNotRunning);
        };

        self.shared.lanes.lock().shutdown = true;
        self.shared.available.notify_all();

        match handle.join() {
            Ok(processor) => {
                info!("worker stopped");
                self.processor = Some(processor);
                Ok(())
            }
            Err(_) => Err(QueueError::Other("worker thread panicked".to_string())),
        }
    }

    /// Whether the worker thread is running.
    pub fn is_running(&self) -> bool {
        self.worker.is_some()
    }

    /// Enqueue a request for background processing.
    ///
    /// Fails with [`QueueError::AlreadyQueued`] if the request's queued flag
    /// is already set (a delivered request that was not
    /// [`reset`](Request::reset)); the lanes are not touched in that case.
    /// Returns a [`Handle`] for cancellation and membership checks.
    pub fn enqueue(&self, request: Request<P::Payload, P::Output>) -> QueueResult<Handle> {
        request.mark_queued()?;
        let handle = request.handle();

        {
            let mut lanes = self.shared.lanes.lock();
            if request.is_prioritized() {
                lanes.priority.push_back(request);
            } else {
                lanes.normal.push_back(request);
            }
        }
        self.shared.available.notify_one();

        Ok(handle)
    }

    /// Membership check against the lane implied by the handle's priority
    /// flag, for diagnostics and tests.
    pub fn contains(&self, handle: &Handle) -> bool {
        let lanes = self.shared.lanes.lock();
        let lane = if handle.is_prioritized() {
            &lanes.priority
        } else {
            &lanes.normal
        };
        lane.iter().any(|request| request.shares_state(handle))
    }

    /// Cancel every request currently pending in either lane.
    ///
    /// A request already picked up by the worker is not swept here; it is
    /// discarded at the pre-callback checkpoint instead.
    pub fn cancel_all(&self) {
        let lanes = self.shared.lanes.lock();
        for request in lanes.priority.iter().chain(lanes.normal.iter()) {
            request.cancel();
        }
    }

    /// Number of requests pending across both lanes.
    pub fn pending(&self) -> usize {
        let lanes = self.shared.lanes.lock();
        lanes.priority.len() + lanes.normal.len()
    }

    /// Number of completed responses awaiting a drain.
    pub fn outstanding(&self) -> usize {
        self.shared.outstanding.load(Ordering::Acquire).max(0) as usize
    }

    /// Deliver completed responses to their callbacks.
    ///
    /// Must be called from the host's single consumer context (e.g., once
    /// per frame or tick). Invokes zero or more callbacks synchronously on
    /// the calling thread, in publish order, skipping cancelled requests and
    /// requests without a callback. Returns the number of responses drained.
    ///
    /// When nothing is outstanding this returns immediately without taking
    /// any lock.
    pub fn drain(&self) -> usize {
        if self.shared.outstanding.load(Ordering::Acquire) <= 0 {
            return 0;
        }

        let drained = {
            let mut completed = self.shared.completed.lock();
            mem::take(&mut *completed)
        };

        let count = drained.len();
        for mut response in drained {
            let callback = response.take_callback();
            if response.is_cancelled() {
                trace!("skipping callback for cancelled request");
                continue;
            }
            if let Some(callback) = callback {
                callback(response);
            }
        }

        self.shared
            .outstanding
            .fetch_sub(count as isize, Ordering::AcqRel);
        count
    }
}

impl<P: Processor> Drop for Engine<P> {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.stop();
        }
    }
}

/// Worker loop: dequeue with priority, skip cancelled requests, run the
/// processor, publish. Returns the processor on shutdown so the engine can
/// be restarted.
fn run_worker<P: Processor>(shared: Arc<Shared<P>>, mut processor: P) -> P {
    loop {
        let mut request = {
            let mut lanes = shared.lanes.lock();
            loop {
                if lanes.shutdown {
                    return processor;
                }
                // Priority lane is always exhausted first; FIFO within a
                // lane. The condition is re-checked after every wakeup so an
                // enqueue racing the emptiness check is never lost.
                if let Some(request) = lanes.priority.pop_front() {
                    break request;
                }
                if let Some(request) = lanes.normal.pop_front() {
                    break request;
                }
                shared.available.wait(&mut lanes);
            }
        };

        // Cancellation guarantees silence, not error delivery.
        if request.is_cancelled() {
            debug!("discarding cancelled request before dispatch");
            continue;
        }

        match processor.process(request.payload_mut()) {
            Ok(Some(output)) => publish(&shared, Response::new(request, output)),
            Ok(None) => debug!("processor discarded the response"),
            Err(err) => {
                error!(error = %err, "unhandled processing fault, delivering terminal error response");
                let output = processor.fault(request.payload(), &err);
                publish(&shared, Response::new(request, output));
            }
        }
    }
}

fn publish<P: Processor>(shared: &Shared<P>, response: Response<P::Payload, P::Output>) {
    shared.completed.lock().push(response);
    shared.outstanding.fetch_add(1, Ordering::AcqRel);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::AtomicUsize;
    use std::time::{Duration, Instant};

    /// Doubles the payload; payloads of `0` fail processing.
    struct Doubler;

    impl Processor for Doubler {
        type Payload = u32;
        type Output = u32;

        fn process(&mut self, payload: &mut u32) -> QueueResult<Option<u32>> {
            if *payload == 0 {
                return Err(QueueError::ProcessingFailed("zero payload".to_string()));
            }
            Ok(Some(*payload * 2))
        }

        fn fault(&mut self, _payload: &u32, _error: &QueueError) -> u32 {
            u32::MAX
        }
    }

    fn wait_until(deadline: Duration, mut condition: impl FnMut() -> bool) -> bool {
        let start = Instant::now();
        while start.elapsed() < deadline {
            if condition() {
                return true;
            }
            thread::sleep(Duration::from_millis(5));
        }
        condition()
    }

    #[test]
    fn engine_processes_and_drains() {
        let mut engine = Engine::new(Doubler);
        engine.start().unwrap();

        let delivered = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&delivered);
        engine
            .enqueue(Request::new(21).on_complete(move |response| {
                seen.store(*response.output() as usize, Ordering::SeqCst);
            }))
            .unwrap();

        assert!(wait_until(Duration::from_secs(5), || engine.drain() > 0));
        assert_eq!(delivered.load(Ordering::SeqCst), 42);

        engine.stop().unwrap();
    }

    #[test]
    fn start_twice_fails() {
        let mut engine = Engine::new(Doubler);
        engine.start().unwrap();
        assert!(matches!(
            engine.start(),
            Err(QueueError::WorkerAlreadyRunning)
        ));
        engine.stop().unwrap();
    }

    #[test]
    fn stop_without_start_fails() {
        let mut engine = Engine::new(Doubler);
        assert!(matches!(engine.stop(), Err(QueueError::WorkerNotRunning)));
    }

    #[test]
    fn engine_restarts_after_stop() {
        let mut engine = Engine::new(Doubler);
        engine.start().unwrap();
        engine.stop().unwrap();
        engine.start().unwrap();

        let delivered = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&delivered);
        engine
            .enqueue(Request::new(1).on_complete(move |response| {
                seen.store(*response.output() as usize, Ordering::SeqCst);
            }))
            .unwrap();

        assert!(wait_until(Duration::from_secs(5), || engine.drain() > 0));
        assert_eq!(delivered.load(Ordering::SeqCst), 2);

        engine.stop().unwrap();
    }

    #[test]
    fn unhandled_fault_delivers_terminal_response() {
        let mut engine = Engine::new(Doubler);
        engine.start().unwrap();

        let delivered = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&delivered);
        engine
            .enqueue(Request::new(0).on_complete(move |response| {
                seen.store(*response.output() as usize, Ordering::SeqCst);
            }))
            .unwrap();

        assert!(wait_until(Duration::from_secs(5), || engine.drain() > 0));
        assert_eq!(delivered.load(Ordering::SeqCst), u32::MAX as usize);

        engine.stop().unwrap();
    }

    #[test]
    fn contains_tracks_lane_membership() {
        // Worker not started: requests stay in their lanes.
        let engine = Engine::new(Doubler);

        let normal = engine.enqueue(Request::new(1)).unwrap();
        let priority = engine.enqueue(Request::new(2).prioritized()).unwrap();

        assert!(engine.contains(&normal));
        assert!(engine.contains(&priority));
        assert_eq!(engine.pending(), 2);
    }

    #[test]
    fn cancel_all_sweeps_both_lanes() {
        let engine = Engine::new(Doubler);

        let normal = engine.enqueue(Request::new(1)).unwrap();
        let priority = engine.enqueue(Request::new(2).prioritized()).unwrap();

        engine.cancel_all();

        assert!(normal.is_cancelled());
        assert!(priority.is_cancelled());
    }

    #[test]
    fn drain_without_outstanding_is_a_no_op() {
        let engine = Engine::new(Doubler);
        assert_eq!(engine.drain(), 0);
        assert_eq!(engine.outstanding(), 0);
    }
}
