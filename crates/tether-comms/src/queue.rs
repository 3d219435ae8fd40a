//! Completion queues and the backend worker lifecycle.
//!
//! Each backend owns one [`CompletionQueue`]. The gRPC handlers push
//! incoming calls onto it and the simulation-facing handle pushes
//! commands; a single worker thread drains both in arrival order until
//! it sees [`QueueEvent::Shutdown`].

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver, Sender};
use tracing::{debug, trace, warn};

use crate::call::IncomingCall;
use crate::error::CommsError;
use crate::method::Method;

/// One item on a completion queue.
#[derive(Debug)]
pub enum QueueEvent {
    /// A request routed in by a gRPC handler.
    Call(IncomingCall),
    /// Producer: a message to hand to the next pull.
    Produce(Vec<u8>),
    /// Exchange: the simulation is waiting for the next request.
    Receive(Sender<Vec<u8>>),
    /// Exchange: the response to the current request.
    Respond(Vec<u8>),
    /// Drain and stop the worker.
    Shutdown,
}

/// A multi-producer queue drained by one backend worker.
#[derive(Debug)]
pub struct CompletionQueue {
    tx: Sender<QueueEvent>,
    rx: Receiver<QueueEvent>,
}

impl CompletionQueue {
    /// An empty queue.
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// A handle for pushing events.
    pub fn sender(&self) -> Sender<QueueEvent> {
        self.tx.clone()
    }

    pub(crate) fn into_parts(self) -> (Sender<QueueEvent>, Receiver<QueueEvent>) {
        (self.tx, self.rx)
    }
}

impl Default for CompletionQueue {
    fn default() -> Self {
        Self::new()
    }
}

// ── BackendState ────────────────────────────────────────────────

/// Lifecycle of a backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum BackendState {
    /// Not known to any manager.
    #[default]
    NotRegistered,
    /// Created by a manager; the server has not started.
    Registered,
    /// The worker is running.
    Started,
    /// Initial messages may be queued.
    Ready,
    /// The connection is established and calls are being served.
    Running,
    /// The worker has drained and exited.
    Shutdown,
}

impl BackendState {
    fn as_u8(self) -> u8 {
        match self {
            Self::NotRegistered => 0,
            Self::Registered => 1,
            Self::Started => 2,
            Self::Ready => 3,
            Self::Running => 4,
            Self::Shutdown => 5,
        }
    }

    fn from_u8(v: u8) -> Self {
        match v {
            1 => Self::Registered,
            2 => Self::Started,
            3 => Self::Ready,
            4 => Self::Running,
            5 => Self::Shutdown,
            _ => Self::NotRegistered,
        }
    }
}

/// A [`BackendState`] shared between a backend handle and its driver.
#[derive(Clone, Debug, Default)]
pub struct SharedState(Arc<AtomicU8>);

impl SharedState {
    /// Current state.
    pub fn get(&self) -> BackendState {
        BackendState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: BackendState) {
        self.0.store(state.as_u8(), Ordering::Release);
    }
}

// ── Workers ─────────────────────────────────────────────────────

/// The per-backend logic run on the worker thread.
pub(crate) trait QueueWorker: Send + 'static {
    /// Handle one non-shutdown event.
    fn on_event(&mut self, event: QueueEvent);

    /// Settle every outstanding call and waiter before the thread exits.
    fn drain(&mut self);
}

fn worker_loop(method: Method, mut worker: Box<dyn QueueWorker>, rx: Receiver<QueueEvent>) {
    while let Ok(event) = rx.recv() {
        if let QueueEvent::Shutdown = event {
            break;
        }
        trace!(%method, "queue event");
        worker.on_event(event);
    }
    // Events that raced the shutdown still get settled by `drain`.
    while let Ok(event) = rx.try_recv() {
        if !matches!(event, QueueEvent::Shutdown) {
            worker.on_event(event);
        }
    }
    worker.drain();
    debug!(%method, "queue drained and shut down");
}

/// Manager-side lifecycle hooks for one backend.
pub(crate) trait Lifecycle: Send {
    fn method(&self) -> Method;
    fn start(&mut self) -> Result<(), CommsError>;
    fn ready(&mut self);
    fn established(&mut self);
    fn shutdown(&mut self);
}

/// Drives one [`QueueWorker`] through the backend lifecycle.
pub(crate) struct BackendDriver {
    method: Method,
    state: SharedState,
    has_ready_stage: bool,
    tx: Sender<QueueEvent>,
    rx: Option<Receiver<QueueEvent>>,
    worker: Option<Box<dyn QueueWorker>>,
    thread: Option<JoinHandle<()>>,
}

impl BackendDriver {
    pub(crate) fn new(
        method: Method,
        queue: CompletionQueue,
        state: SharedState,
        worker: Box<dyn QueueWorker>,
        has_ready_stage: bool,
    ) -> Self {
        let (tx, rx) = queue.into_parts();
        state.set(BackendState::Registered);
        Self {
            method,
            state,
            has_ready_stage,
            tx,
            rx: Some(rx),
            worker: Some(worker),
            thread: None,
        }
    }
}

impl Lifecycle for BackendDriver {
    fn method(&self) -> Method {
        self.method
    }

    fn start(&mut self) -> Result<(), CommsError> {
        let (Some(worker), Some(rx)) = (self.worker.take(), self.rx.take()) else {
            return Ok(());
        };
        let method = self.method;
        let handle = thread::Builder::new()
            .name(format!("tether-{method}"))
            .spawn(move || worker_loop(method, worker, rx))
            .map_err(|e| CommsError::ThreadSpawnFailed {
                reason: e.to_string(),
            })?;
        self.thread = Some(handle);
        self.state.set(BackendState::Started);
        debug!(%method, "backend worker started");
        Ok(())
    }

    fn ready(&mut self) {
        if self.has_ready_stage && self.state.get() == BackendState::Started {
            self.state.set(BackendState::Ready);
        }
    }

    fn established(&mut self) {
        if matches!(self.state.get(), BackendState::Started | BackendState::Ready) {
            self.state.set(BackendState::Running);
        }
    }

    fn shutdown(&mut self) {
        let _ = self.tx.send(QueueEvent::Shutdown);
        // Never started: settle the queue on this thread.
        if let (Some(worker), Some(rx)) = (self.worker.take(), self.rx.take()) {
            worker_loop(self.method, worker, rx);
        }
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!(method = %self.method, "backend worker panicked");
            }
        }
        self.state.set(BackendState::Shutdown);
    }
}

impl Drop for BackendDriver {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shutdown();
        }
    }
}
