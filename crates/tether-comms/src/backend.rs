//! The three backend shapes served over one transport.
//!
//! - [`PollingBackend`]: the simulation checks, without blocking,
//!   whether the trainer has called. Each call is acked immediately.
//! - [`ProducerBackend`]: the simulation queues messages; each trainer
//!   pull receives the next one, waiting if none is queued yet.
//! - [`ExchangeBackend`]: strict alternation. The simulation receives
//!   one request and must respond before it can receive the next.
//!
//! Each handle talks to a worker thread through its
//! [`CompletionQueue`]; the gRPC handlers push calls onto the same
//! queue. Nothing here blocks the caller except the explicit `wait`
//! methods on [`PendingRequest`].

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use tonic::Status;
use tracing::{debug, trace, warn};

use tether_wire::{decode_frame, encode_frame, WireError, WireMessage};

use crate::call::{CallSlot, IncomingCall};
use crate::error::CommsError;
use crate::method::Method;
use crate::queue::{
    BackendDriver, BackendState, CompletionQueue, QueueEvent, QueueWorker, SharedState,
};

type FrameCheck = fn(&[u8]) -> Result<(), WireError>;

fn check_frame<T: WireMessage>(bytes: &[u8]) -> Result<(), WireError> {
    decode_frame::<T>(bytes).map(|_| ())
}

/// Pass a well-formed call through; reject a malformed one with
/// `InvalidArgument`.
fn accept(method: Method, check: FrameCheck, call: IncomingCall) -> Option<IncomingCall> {
    match check(&call.payload) {
        Ok(()) => Some(call),
        Err(e) => {
            warn!(%method, call_id = call.responder.call_id(), error = %e, "malformed request");
            call.reject(Status::invalid_argument(e.to_string()));
            None
        }
    }
}

fn cancelled() -> Status {
    Status::cancelled("backend shut down")
}

// ── Polling ─────────────────────────────────────────────────────

struct PollingWorker {
    method: Method,
    check: FrameCheck,
    ack: Vec<u8>,
    requests: Sender<Vec<u8>>,
}

impl QueueWorker for PollingWorker {
    fn on_event(&mut self, event: QueueEvent) {
        match event {
            QueueEvent::Call(call) => {
                let Some(call) = accept(self.method, self.check, call) else {
                    return;
                };
                trace!(method = %self.method, "message received on poll");
                let IncomingCall {
                    payload, responder, ..
                } = call;
                if let Err(e) = self.requests.send(payload) {
                    debug!(method = %self.method, error = %e, "poll inbox closed, request dropped");
                }
                responder.send(Ok(self.ack.clone()));
            }
            _ => warn!(method = %self.method, "invalid event in polling queue"),
        }
    }

    fn drain(&mut self) {}
}

/// Non-blocking inbox of trainer requests.
pub struct PollingBackend<Req> {
    state: SharedState,
    requests: Receiver<Vec<u8>>,
    _req: PhantomData<fn() -> Req>,
}

impl<Req: WireMessage> PollingBackend<Req> {
    /// Build the handle and its driver. Every call is acked with an
    /// encoded `Resp::default()`.
    pub(crate) fn new<Resp: WireMessage + Default>(
        method: Method,
        queue: CompletionQueue,
    ) -> (Self, BackendDriver) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let state = SharedState::default();
        let worker = PollingWorker {
            method,
            check: check_frame::<Req>,
            ack: encode_frame(&Resp::default()),
            requests: tx,
        };
        let driver = BackendDriver::new(method, queue, state.clone(), Box::new(worker), false);
        let backend = Self {
            state,
            requests: rx,
            _req: PhantomData,
        };
        (backend, driver)
    }

    /// The oldest unread request, if any.
    pub fn poll(&self) -> Result<Option<Req>, CommsError> {
        match self.requests.try_recv() {
            Ok(bytes) => Ok(Some(decode_frame(&bytes)?)),
            Err(_) => Ok(None),
        }
    }

    /// Lifecycle state.
    pub fn state(&self) -> BackendState {
        self.state.get()
    }
}

// ── Producer ────────────────────────────────────────────────────

struct ProducerWorker {
    method: Method,
    outgoing: VecDeque<Vec<u8>>,
    pulls: VecDeque<IncomingCall>,
}

impl QueueWorker for ProducerWorker {
    fn on_event(&mut self, event: QueueEvent) {
        match event {
            QueueEvent::Call(call) => match self.outgoing.pop_front() {
                Some(msg) => call.reply(&msg),
                None => self.pulls.push_back(call),
            },
            QueueEvent::Produce(msg) => match self.pulls.pop_front() {
                Some(call) => call.reply(&msg),
                None => self.outgoing.push_back(msg),
            },
            _ => warn!(method = %self.method, "invalid event in producer queue"),
        }
    }

    fn drain(&mut self) {
        if !self.outgoing.is_empty() {
            debug!(
                method = %self.method,
                dropped = self.outgoing.len(),
                "producer shut down with undelivered messages"
            );
        }
        for call in self.pulls.drain(..) {
            call.reject(cancelled());
        }
    }
}

/// Outbox of messages handed to trainer pulls in FIFO order.
pub struct ProducerBackend<Resp> {
    state: SharedState,
    tx: Sender<QueueEvent>,
    _resp: PhantomData<fn(Resp)>,
}

impl<Resp: WireMessage> ProducerBackend<Resp> {
    pub(crate) fn new(method: Method, queue: CompletionQueue) -> (Self, BackendDriver) {
        let tx = queue.sender();
        let state = SharedState::default();
        let worker = ProducerWorker {
            method,
            outgoing: VecDeque::new(),
            pulls: VecDeque::new(),
        };
        let driver = BackendDriver::new(method, queue, state.clone(), Box::new(worker), true);
        let backend = Self {
            state,
            tx,
            _resp: PhantomData,
        };
        (backend, driver)
    }

    /// Queue `msg` for the next pull.
    pub fn send(&self, msg: &Resp) -> Result<(), CommsError> {
        self.tx
            .send(QueueEvent::Produce(encode_frame(msg)))
            .map_err(|_| CommsError::QueueClosed)
    }

    /// Lifecycle state.
    pub fn state(&self) -> BackendState {
        self.state.get()
    }
}

// ── Exchange ────────────────────────────────────────────────────

struct ExchangeWorker {
    method: Method,
    check: FrameCheck,
    empty_response: Vec<u8>,
    slot: CallSlot,
    delivered: bool,
    backlog: VecDeque<IncomingCall>,
    waiter: Option<Sender<Vec<u8>>>,
    early_response: Option<Vec<u8>>,
    completed: Arc<AtomicU64>,
}

impl ExchangeWorker {
    fn hand_over(&mut self) {
        if !self.slot.is_ready() || self.delivered {
            return;
        }
        let Some(waiter) = self.waiter.take() else {
            return;
        };
        if let Some(request) = self.slot.request() {
            let _ = waiter.send(request.to_vec());
        }
        self.delivered = true;
        if let Some(response) = self.early_response.take() {
            self.complete(&response);
        }
    }

    fn complete(&mut self, response: &[u8]) {
        // Count first, so the handle sees the exchange settled by the
        // time the trainer holds the response.
        let n = self.completed.fetch_add(1, Ordering::AcqRel) + 1;
        self.slot.finish(response);
        self.slot.reset();
        self.delivered = false;
        trace!(method = %self.method, exchange = n, "exchange completed");
        if let Some(next) = self.backlog.pop_front() {
            let _ = self.slot.process(next);
        }
        self.hand_over();
    }
}

impl QueueWorker for ExchangeWorker {
    fn on_event(&mut self, event: QueueEvent) {
        match event {
            QueueEvent::Call(call) => {
                let Some(call) = accept(self.method, self.check, call) else {
                    return;
                };
                if self.slot.is_ready() {
                    self.backlog.push_back(call);
                } else {
                    self.slot.reset();
                    if let Err(call) = self.slot.process(call) {
                        self.backlog.push_back(call);
                    }
                    self.hand_over();
                }
            }
            QueueEvent::Receive(waiter) => {
                if self.waiter.is_some() || self.early_response.is_some() {
                    // The handle refuses a receive while an exchange is
                    // unsettled, so this only happens on misuse.
                    warn!(method = %self.method, "receive while an exchange is unsettled, ignoring");
                    return;
                }
                self.waiter = Some(waiter);
                self.hand_over();
            }
            QueueEvent::Respond(response) => {
                if self.slot.is_ready() && self.delivered {
                    self.complete(&response);
                } else {
                    self.early_response = Some(response);
                }
            }
            _ => warn!(method = %self.method, "invalid event in exchange queue"),
        }
    }

    fn drain(&mut self) {
        // Dropping the waiter resolves its PendingRequest to the default request.
        self.waiter = None;
        if self.slot.finish(&self.empty_response) {
            debug!(method = %self.method, "answered held exchange with empty response");
        }
        for call in self.backlog.drain(..) {
            call.reply(&self.empty_response);
        }
    }
}

/// A request that will arrive later.
///
/// If the backend shuts down first, the request resolves to
/// `Req::default()` so the simulation is never left waiting.
#[derive(Debug)]
pub struct PendingRequest<Req> {
    rx: Receiver<Vec<u8>>,
    _req: PhantomData<fn() -> Req>,
}

impl<Req: WireMessage + Default> PendingRequest<Req> {
    fn decode(bytes: Vec<u8>) -> Result<Req, CommsError> {
        Ok(decode_frame(&bytes)?)
    }

    /// Non-blocking check.
    pub fn try_take(&self) -> Option<Result<Req, CommsError>> {
        match self.rx.try_recv() {
            Ok(bytes) => Some(Self::decode(bytes)),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Ok(Req::default())),
        }
    }

    /// Wait up to `timeout`. `None` means the request has not arrived yet.
    pub fn wait_for(&self, timeout: Duration) -> Option<Result<Req, CommsError>> {
        match self.rx.recv_timeout(timeout) {
            Ok(bytes) => Some(Self::decode(bytes)),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => Some(Ok(Req::default())),
        }
    }

    /// Block until the request arrives.
    pub fn wait(self) -> Result<Req, CommsError> {
        match self.rx.recv() {
            Ok(bytes) => Self::decode(bytes),
            Err(_) => Ok(Req::default()),
        }
    }
}

/// Strict request/response channel to the trainer.
///
/// `respond` may run before the request has arrived; the response is
/// then held until it can answer the call. A new exchange cannot open
/// until that held response has gone out.
pub struct ExchangeBackend<Req, Resp> {
    state: SharedState,
    tx: Sender<QueueEvent>,
    in_exchange: bool,
    opened: u64,
    completed: Arc<AtomicU64>,
    _msgs: PhantomData<fn(Resp) -> Req>,
}

impl<Req, Resp> ExchangeBackend<Req, Resp>
where
    Req: WireMessage + Default,
    Resp: WireMessage + Default,
{
    pub(crate) fn new(method: Method, queue: CompletionQueue) -> (Self, BackendDriver) {
        let tx = queue.sender();
        let state = SharedState::default();
        let completed = Arc::new(AtomicU64::new(0));
        let worker = ExchangeWorker {
            method,
            check: check_frame::<Req>,
            empty_response: encode_frame(&Resp::default()),
            slot: CallSlot::new(),
            delivered: false,
            backlog: VecDeque::new(),
            waiter: None,
            early_response: None,
            completed: Arc::clone(&completed),
        };
        let driver = BackendDriver::new(method, queue, state.clone(), Box::new(worker), false);
        let backend = Self {
            state,
            tx,
            in_exchange: false,
            opened: 0,
            completed,
            _msgs: PhantomData,
        };
        (backend, driver)
    }

    /// Open an exchange and get a handle to its request.
    ///
    /// Fails with [`CommsError::ExchangeInProgress`] while the previous
    /// exchange awaits either its response or, for an early response,
    /// the request it answers.
    pub fn receive(&mut self) -> Result<PendingRequest<Req>, CommsError> {
        if self.in_exchange || !self.settled() {
            return Err(CommsError::ExchangeInProgress);
        }
        let (tx, rx) = bounded(1);
        self.tx
            .send(QueueEvent::Receive(tx))
            .map_err(|_| CommsError::QueueClosed)?;
        self.in_exchange = true;
        self.opened += 1;
        Ok(PendingRequest {
            rx,
            _req: PhantomData,
        })
    }

    /// Complete the open exchange.
    pub fn respond(&mut self, response: &Resp) -> Result<(), CommsError> {
        if !self.in_exchange {
            return Err(CommsError::NoExchange);
        }
        self.in_exchange = false;
        self.tx
            .send(QueueEvent::Respond(encode_frame(response)))
            .map_err(|_| CommsError::QueueClosed)
    }

    /// `true` between `receive` and `respond`.
    pub fn in_exchange(&self) -> bool {
        self.in_exchange
    }

    /// `true` once every opened exchange has answered its call.
    pub fn settled(&self) -> bool {
        self.completed.load(Ordering::Acquire) >= self.opened
    }

    /// Lifecycle state.
    pub fn state(&self) -> BackendState {
        self.state.get()
    }
}
