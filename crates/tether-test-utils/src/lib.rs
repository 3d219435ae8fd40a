//! Test utilities and mock types for Tether development.
//!
//! Provides deterministic implementations of the interaction traits
//! ([`Observer`], [`Actuator`]) and of [`ModelBackend`] (including ones
//! that fail or panic on cue), plus scripted trainers and environments in
//! [`fixtures`].

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tether_core::PolicyError;
use tether_interact::{Actuator, Observer};
use tether_policy::ModelBackend;
use tether_space::{BoxSpace, Point, Space};

pub use fixtures::{ScriptedEnvironment, ScriptedTrainer};

// ── Interactors ─────────────────────────────────────────────────

/// Observer emitting the same Box values every step.
#[derive(Clone, Debug)]
pub struct ConstantObserver {
    label: String,
    space: BoxSpace,
    values: Vec<f32>,
}

impl ConstantObserver {
    /// Observer over a `[-1, 1]` Box sized to `values`.
    pub fn new(label: impl Into<String>, values: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            space: BoxSpace::uniform(values.len()),
            values,
        }
    }

    /// Observer over an explicit space. `values` must fit it.
    pub fn with_space(label: impl Into<String>, space: BoxSpace, values: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            space,
            values,
        }
    }
}

impl Observer for ConstantObserver {
    fn label(&self) -> &str {
        &self.label
    }

    fn observation_space(&self) -> Space {
        Space::Box(self.space.clone())
    }

    fn collect_observations(&mut self, out: &mut Point) {
        if let Some(point) = out.as_box_mut() {
            point.values.extend_from_slice(&self.values);
        }
    }
}

/// Shared log of the actions a [`RecordingActuator`] received.
pub type ActionLog = Arc<Mutex<Vec<Point>>>;

/// Actuator that records every action it is given.
///
/// The log is shared, so it stays readable after the actuator is boxed
/// and handed to an agent.
#[derive(Debug)]
pub struct RecordingActuator {
    label: String,
    space: Space,
    log: ActionLog,
}

impl RecordingActuator {
    /// Actuator over `space`, returning the handle to its log.
    pub fn new(label: impl Into<String>, space: impl Into<Space>) -> (Self, ActionLog) {
        let log = ActionLog::default();
        let actuator = Self {
            label: label.into(),
            space: space.into(),
            log: Arc::clone(&log),
        };
        (actuator, log)
    }

    /// Record into an existing log instead.
    pub fn with_log(mut self, log: ActionLog) -> Self {
        self.log = log;
        self
    }
}

impl Actuator for RecordingActuator {
    fn label(&self) -> &str {
        &self.label
    }

    fn action_space(&self) -> Space {
        self.space.clone()
    }

    fn take_action(&mut self, action: &Point) {
        if let Ok(mut log) = self.log.lock() {
            log.push(action.clone());
        }
    }
}

// ── Models ──────────────────────────────────────────────────────

/// Fills the action tensor with one value.
#[derive(Clone, Copy, Debug)]
pub struct ConstantModel(pub f32);

impl ModelBackend for ConstantModel {
    fn name(&self) -> &str {
        "constant"
    }

    fn run_sync(&mut self, _input: &[f32], output: &mut [f32]) -> Result<(), PolicyError> {
        output.fill(self.0);
        Ok(())
    }
}

/// Copies the observation tensor into the action tensor, truncating or
/// zero-padding as needed.
#[derive(Clone, Copy, Debug, Default)]
pub struct EchoModel;

impl ModelBackend for EchoModel {
    fn name(&self) -> &str {
        "echo"
    }

    fn run_sync(&mut self, input: &[f32], output: &mut [f32]) -> Result<(), PolicyError> {
        output.fill(0.0);
        let n = input.len().min(output.len());
        output[..n].copy_from_slice(&input[..n]);
        Ok(())
    }
}

/// Succeeds `succeed_count` times, then fails every call.
///
/// The call counter is shared so tests can observe it after the model
/// moves onto the inference worker.
#[derive(Debug)]
pub struct FailingModel {
    succeed_count: usize,
    calls: Arc<AtomicUsize>,
}

impl FailingModel {
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle to the number of runs attempted so far.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl ModelBackend for FailingModel {
    fn name(&self) -> &str {
        "failing"
    }

    fn run_sync(&mut self, _input: &[f32], output: &mut [f32]) -> Result<(), PolicyError> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            return Err(PolicyError::ModelFailed {
                reason: format!("scripted failure on call {n}"),
            });
        }
        output.fill(0.5);
        Ok(())
    }
}

/// Succeeds `succeed_count` times, then panics on every call.
///
/// Stands in for a backend that aborts instead of returning an error.
#[derive(Debug)]
pub struct PanickingModel {
    succeed_count: usize,
    calls: Arc<AtomicUsize>,
}

impl PanickingModel {
    pub fn new(succeed_count: usize) -> Self {
        Self {
            succeed_count,
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Handle to the number of runs attempted so far.
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

impl ModelBackend for PanickingModel {
    fn name(&self) -> &str {
        "panicking"
    }

    fn run_sync(&mut self, _input: &[f32], output: &mut [f32]) -> Result<(), PolicyError> {
        let n = self.calls.fetch_add(1, Ordering::Relaxed);
        if n >= self.succeed_count {
            panic!("scripted panic on call {n}");
        }
        output.fill(0.5);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_interact::InteractionDefinition;
    use tether_policy::{InferencePolicy, PolicyDecision};
    use tether_space::{BoxPoint, DictPoint};

    #[test]
    fn constant_observer_appends_its_values() {
        let mut obs = ConstantObserver::new("o", vec![0.1, 0.2]);
        let mut point = obs.observation_space().make_point();
        obs.collect_observations(&mut point);
        assert_eq!(point, Point::Box(BoxPoint::new(vec![0.1, 0.2])));
    }

    #[test]
    fn recording_actuator_shares_its_log() {
        let (mut act, log) = RecordingActuator::new("a", BoxSpace::uniform(1));
        act.take_action(&Point::Box(BoxPoint::new(vec![0.3])));
        assert_eq!(log.lock().unwrap().len(), 1);
    }

    #[test]
    fn echo_pads_with_zeros() {
        let mut out = [9.0; 3];
        EchoModel.run_sync(&[1.0], &mut out).unwrap();
        assert_eq!(out, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn failing_model_fails_after_budget() {
        let mut model = FailingModel::new(1);
        let calls = model.calls();
        let mut out = [0.0];
        assert!(model.run_sync(&[], &mut out).is_ok());
        assert!(matches!(
            model.run_sync(&[], &mut out),
            Err(PolicyError::ModelFailed { .. })
        ));
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }

    #[test]
    fn panicking_model_never_wedges_the_policy() {
        let mut def = InteractionDefinition::default();
        def.obs_space.add("o", BoxSpace::uniform(1)).unwrap();
        def.action_space.add("a", BoxSpace::uniform(1)).unwrap();
        let model = PanickingModel::new(1);
        let calls = model.calls();

        let mut policy = InferencePolicy::new();
        policy.init(&def);
        policy.load_model(Box::new(model)).unwrap();
        let obs = DictPoint::new(vec![Point::Box(BoxPoint::new(vec![0.0]))]);

        assert!(policy.request_decision(&obs).unwrap().wait().is_action());
        for _ in 0..3 {
            let decision = policy.request_decision(&obs).unwrap().wait();
            assert_eq!(decision, PolicyDecision::Error);
            assert!(!policy.is_in_flight());
        }
        assert!(policy.has_model());
        assert_eq!(calls.load(Ordering::Relaxed), 4);
    }
}
