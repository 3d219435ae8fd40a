//! The inference policy and its worker thread.
//!
//! ```text
//!   InferencePolicy::request_decision
//!     │  in_flight = true
//!     ▼
//!   [task_tx: bounded(1)] ──► worker thread (owns the ModelBackend)
//!                               lock tensors
//!                               flatten obs ─► run_sync ─► unflatten action
//!                               in_flight = false
//!   DecisionHandle  ◄─────────  [reply: bounded(1)]
//! ```
//!
//! The worker exits when the task channel closes, on [`InferencePolicy::shutdown`]
//! or drop. A model that panics yields [`PolicyDecision::Error`] like any
//! other model failure, and the in-flight flag is cleared however the task
//! ends.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, TryRecvError};
use tether_core::PolicyError;
use tether_interact::InteractionDefinition;
use tether_space::{DictPoint, DictSpace, TensorBinding};
use tracing::{debug, error, warn};

use crate::decision::PolicyDecision;
use crate::model::ModelBackend;

// ── Tensors ─────────────────────────────────────────────────────

/// Persistent input/output tensors, reused across decisions.
#[derive(Debug, Default)]
struct Tensors {
    input: TensorBinding,
    output: TensorBinding,
}

/// Clears the in-flight flag when dropped, including during unwinding.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Everything the worker needs to run one decision.
///
/// However a task ends (answered, rejected by a closed channel, or
/// dropped by a dying worker) its guard clears the in-flight flag.
struct InferenceTask {
    observations: DictPoint,
    obs_space: Arc<DictSpace>,
    action_space: Arc<DictSpace>,
    tensors: Arc<Mutex<Tensors>>,
    reply: Sender<PolicyDecision>,
    _in_flight: InFlightGuard,
}

// ── Worker ──────────────────────────────────────────────────────

fn worker_loop(task_rx: Receiver<InferenceTask>, mut model: Box<dyn ModelBackend>) {
    while let Ok(task) = task_rx.recv() {
        let decision = match run_task(&task, model.as_mut()) {
            Ok(action) => PolicyDecision::Action(action),
            Err(e) => {
                error!(model = model.name(), error = %e, "failed to run the model");
                PolicyDecision::Error
            }
        };
        // Drop the task first, so a resolved handle never sees the flag set.
        let reply = task.reply.clone();
        drop(task);
        let _ = reply.send(decision);
    }
    debug!(model = model.name(), "inference worker exiting");
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

/// Run the model, turning a panic into [`PolicyError::ModelFailed`].
fn run_model(
    model: &mut dyn ModelBackend,
    input: &[f32],
    output: &mut [f32],
) -> Result<(), PolicyError> {
    match panic::catch_unwind(AssertUnwindSafe(|| model.run_sync(input, output))) {
        Ok(result) => result,
        Err(payload) => Err(PolicyError::ModelFailed {
            reason: format!("model panicked: {}", panic_message(payload.as_ref())),
        }),
    }
}

fn run_task(task: &InferenceTask, model: &mut dyn ModelBackend) -> Result<DictPoint, PolicyError> {
    let mut tensors = task.tensors.lock().unwrap_or_else(|e| e.into_inner());
    let Tensors { input, output } = &mut *tensors;
    input
        .write_point(&task.obs_space, &task.observations)
        .map_err(|e| PolicyError::ModelFailed {
            reason: format!("observation does not fit its space: {e}"),
        })?;
    run_model(model, input.as_slice(), output.as_mut_slice())?;
    output
        .read_point(&task.action_space)
        .map_err(|e| PolicyError::ModelFailed {
            reason: format!("model output does not fit the action space: {e}"),
        })
}

struct InferenceWorker {
    task_tx: Option<Sender<InferenceTask>>,
    thread: Option<JoinHandle<()>>,
}

impl InferenceWorker {
    fn spawn(model: Box<dyn ModelBackend>) -> Result<Self, PolicyError> {
        let (task_tx, task_rx) = crossbeam_channel::bounded(1);
        let thread = thread::Builder::new()
            .name("tether-inference".into())
            .spawn(move || worker_loop(task_rx, model))
            .map_err(|e| PolicyError::WorkerSpawnFailed {
                reason: e.to_string(),
            })?;
        Ok(Self {
            task_tx: Some(task_tx),
            thread: Some(thread),
        })
    }

    /// `false` once the worker thread has exited.
    fn is_alive(&self) -> bool {
        self.task_tx.is_some() && self.thread.as_ref().is_some_and(|h| !h.is_finished())
    }

    fn submit(&self, task: InferenceTask) -> Result<(), PolicyError> {
        let tx = self.task_tx.as_ref().ok_or(PolicyError::WorkerDisconnected)?;
        tx.send(task).map_err(|_| PolicyError::WorkerDisconnected)
    }

    fn shutdown(&mut self) {
        // Closing the channel ends the worker loop.
        self.task_tx.take();
        if let Some(handle) = self.thread.take() {
            if handle.join().is_err() {
                warn!("inference worker panicked");
            }
        }
    }
}

impl Drop for InferenceWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

// ── DecisionHandle ──────────────────────────────────────────────

/// A pending or resolved decision.
///
/// Returned immediately by [`InferencePolicy::request_decision`]; the tick
/// polls it with [`try_resolve`](Self::try_resolve) or bounds the wait
/// with [`wait_for`](Self::wait_for). A worker that disappears resolves
/// the handle to [`PolicyDecision::Error`].
#[derive(Debug)]
pub struct DecisionHandle {
    state: HandleState,
}

#[derive(Debug)]
enum HandleState {
    Ready(PolicyDecision),
    Pending(Receiver<PolicyDecision>),
    Taken,
}

impl DecisionHandle {
    /// A handle that is already resolved.
    pub fn ready(decision: PolicyDecision) -> Self {
        Self {
            state: HandleState::Ready(decision),
        }
    }

    fn pending(rx: Receiver<PolicyDecision>) -> Self {
        Self {
            state: HandleState::Pending(rx),
        }
    }

    /// Take the decision if it has arrived, without blocking.
    ///
    /// Returns `None` while pending and after the decision was taken.
    pub fn try_resolve(&mut self) -> Option<PolicyDecision> {
        match &self.state {
            HandleState::Ready(_) => self.take_ready(),
            HandleState::Pending(rx) => match rx.try_recv() {
                Ok(d) => self.finish(d),
                Err(TryRecvError::Empty) => None,
                Err(TryRecvError::Disconnected) => self.finish(PolicyDecision::Error),
            },
            HandleState::Taken => None,
        }
    }

    /// Block for at most `timeout`. `None` means it timed out.
    pub fn wait_for(&mut self, timeout: Duration) -> Option<PolicyDecision> {
        match &self.state {
            HandleState::Ready(_) => self.take_ready(),
            HandleState::Pending(rx) => match rx.recv_timeout(timeout) {
                Ok(d) => self.finish(d),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => self.finish(PolicyDecision::Error),
            },
            HandleState::Taken => None,
        }
    }

    /// Block until the decision arrives.
    pub fn wait(mut self) -> PolicyDecision {
        match std::mem::replace(&mut self.state, HandleState::Taken) {
            HandleState::Ready(d) => d,
            HandleState::Pending(rx) => rx.recv().unwrap_or(PolicyDecision::Error),
            HandleState::Taken => PolicyDecision::Empty,
        }
    }

    /// `true` once the decision has been taken from this handle.
    pub fn is_taken(&self) -> bool {
        matches!(self.state, HandleState::Taken)
    }

    fn take_ready(&mut self) -> Option<PolicyDecision> {
        match std::mem::replace(&mut self.state, HandleState::Taken) {
            HandleState::Ready(d) => Some(d),
            other => {
                self.state = other;
                None
            }
        }
    }

    fn finish(&mut self, decision: PolicyDecision) -> Option<PolicyDecision> {
        self.state = HandleState::Taken;
        Some(decision)
    }
}

// ── InferencePolicy ─────────────────────────────────────────────

/// Runs a [`ModelBackend`] on a background worker against fixed spaces.
///
/// # Examples
///
/// ```
/// use tether_core::PolicyError;
/// use tether_interact::InteractionDefinition;
/// use tether_policy::InferencePolicy;
/// use tether_space::{BoxPoint, BoxSpace, DictPoint, Point};
///
/// let mut def = InteractionDefinition::default();
/// def.obs_space.add("in", BoxSpace::uniform(2)).unwrap();
/// def.action_space.add("out", BoxSpace::uniform(1)).unwrap();
///
/// let mut policy = InferencePolicy::new();
/// policy.init(&def);
/// policy
///     .load_model(Box::new(|input: &[f32], output: &mut [f32]| -> Result<(), PolicyError> {
///         output[0] = input[0] - input[1];
///         Ok(())
///     }))
///     .unwrap();
///
/// let obs = DictPoint::new(vec![Point::Box(BoxPoint::new(vec![0.75, 0.25]))]);
/// let decision = policy.request_decision(&obs).unwrap().wait();
/// let action = decision.action().unwrap();
/// assert_eq!(action.points[0].as_box().unwrap().values, vec![0.5]);
/// ```
pub struct InferencePolicy {
    obs_space: Option<Arc<DictSpace>>,
    action_space: Option<Arc<DictSpace>>,
    tensors: Arc<Mutex<Tensors>>,
    in_flight: Arc<AtomicBool>,
    worker: Option<InferenceWorker>,
}

impl InferencePolicy {
    /// A policy with no spaces and no model.
    pub fn new() -> Self {
        Self {
            obs_space: None,
            action_space: None,
            tensors: Arc::new(Mutex::new(Tensors::default())),
            in_flight: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }

    /// Take the spaces from `definition` and size the tensors for them.
    pub fn init(&mut self, definition: &InteractionDefinition) {
        let obs_space = definition.effective_obs_space();
        let action_space = definition.action_space.clone();
        {
            let mut t = self.tensors.lock().unwrap_or_else(|e| e.into_inner());
            t.input = TensorBinding::for_space(&obs_space);
            t.output = TensorBinding::for_space(&action_space);
        }
        debug!(
            obs_size = obs_space.flattened_size(),
            action_size = action_space.flattened_size(),
            "inference policy initialized"
        );
        self.obs_space = Some(Arc::new(obs_space));
        self.action_space = Some(Arc::new(action_space));
    }

    /// Start a worker for `model`, replacing any previous one.
    pub fn load_model(&mut self, model: Box<dyn ModelBackend>) -> Result<(), PolicyError> {
        if let Some(mut old) = self.worker.take() {
            old.shutdown();
        }
        debug!(model = model.name(), "loading model");
        self.worker = Some(InferenceWorker::spawn(model)?);
        self.in_flight.store(false, Ordering::Release);
        Ok(())
    }

    /// Whether a model is loaded.
    pub fn has_model(&self) -> bool {
        self.worker.is_some()
    }

    /// Whether a decision is currently being computed.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Schedule one decision on the worker.
    ///
    /// With no model loaded, or a worker that has died, the returned
    /// handle is already resolved to [`PolicyDecision::Error`] and nothing
    /// is scheduled. A dead worker is released, so
    /// [`has_model`](Self::has_model) turns `false`.
    pub fn request_decision(
        &mut self,
        observations: &DictPoint,
    ) -> Result<DecisionHandle, PolicyError> {
        if self.worker.as_ref().is_some_and(|w| !w.is_alive()) {
            warn!("inference worker is gone, dropping the model");
            if let Some(mut dead) = self.worker.take() {
                dead.shutdown();
            }
            self.in_flight.store(false, Ordering::Release);
        }
        let Some(worker) = &self.worker else {
            warn!("decision requested with no model loaded");
            return Ok(DecisionHandle::ready(PolicyDecision::Error));
        };
        let (Some(obs_space), Some(action_space)) = (&self.obs_space, &self.action_space) else {
            return Err(PolicyError::NotInitialized);
        };
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PolicyError::DecisionInFlight);
        }
        let (reply, rx) = crossbeam_channel::bounded(1);
        let task = InferenceTask {
            observations: observations.clone(),
            obs_space: Arc::clone(obs_space),
            action_space: Arc::clone(action_space),
            tensors: Arc::clone(&self.tensors),
            reply,
            _in_flight: InFlightGuard(Arc::clone(&self.in_flight)),
        };
        if let Err(e) = worker.submit(task) {
            // The rejected task has already cleared the flag.
            warn!(error = %e, "inference worker is gone, dropping the model");
            if let Some(mut dead) = self.worker.take() {
                dead.shutdown();
            }
            return Ok(DecisionHandle::ready(PolicyDecision::Error));
        }
        Ok(DecisionHandle::pending(rx))
    }

    /// Stop the worker. Later requests resolve to [`PolicyDecision::Error`].
    pub fn shutdown(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.shutdown();
        }
    }
}

impl Default for InferencePolicy {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InferencePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InferencePolicy")
            .field("initialized", &self.obs_space.is_some())
            .field("has_model", &self.has_model())
            .field("in_flight", &self.is_in_flight())
            .finish()
    }
}
