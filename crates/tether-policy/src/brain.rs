//! Step-driven decision cadence on top of an [`InferencePolicy`].

use tether_core::PolicyError;
use tether_space::DictPoint;
use tracing::warn;

use crate::config::BrainConfig;
use crate::decision::PolicyDecision;
use crate::policy::{DecisionHandle, InferencePolicy};

/// Brain readiness.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BrainStatus {
    /// No action resolved yet.
    #[default]
    Idle,
    /// The held decision is an action.
    ActionReady,
    /// The last decision failed or timed out.
    Error,
}

/// Requests a decision every `decision_request_frequency` steps and
/// resolves it on the following act phase.
///
/// Resolution blocks the caller (bounded by the configured timeout when
/// one is set), which is what makes this brain synchronous: the action
/// for a step is always available by the end of that step's act phase.
#[derive(Debug)]
pub struct SynchronousBrain {
    config: BrainConfig,
    policy: InferencePolicy,
    step: u32,
    status: BrainStatus,
    pending: Option<DecisionHandle>,
    decision: Option<PolicyDecision>,
}

impl SynchronousBrain {
    /// A brain driving `policy` with `config`.
    pub fn new(config: BrainConfig, policy: InferencePolicy) -> Self {
        Self {
            config,
            policy,
            step: 0,
            status: BrainStatus::Idle,
            pending: None,
            decision: None,
        }
    }

    /// The configuration.
    pub fn config(&self) -> &BrainConfig {
        &self.config
    }

    /// The policy.
    pub fn policy(&self) -> &InferencePolicy {
        &self.policy
    }

    /// Mutable policy, for `init` and `load_model`.
    pub fn policy_mut(&mut self) -> &mut InferencePolicy {
        &mut self.policy
    }

    /// Current step.
    pub fn step(&self) -> u32 {
        self.step
    }

    /// Advance one step.
    pub fn increment_step(&mut self) {
        self.step = self.step.wrapping_add(1);
    }

    /// Current status.
    pub fn status(&self) -> BrainStatus {
        self.status
    }

    /// Override the status.
    pub fn set_status(&mut self, status: BrainStatus) {
        self.status = status;
    }

    /// `false` once the brain has errored.
    pub fn is_active(&self) -> bool {
        self.status != BrainStatus::Error
    }

    /// Rewind the step counter.
    pub fn reset(&mut self) {
        self.step = 0;
    }

    /// `true` on every `decision_request_frequency`-th step, starting at 0.
    pub fn is_decision_step(&self) -> bool {
        self.step % self.config.decision_request_frequency.max(1) == 0
    }

    /// A decision is pending or one is held.
    pub fn has_action(&self) -> bool {
        self.pending.is_some() || self.decision.is_some()
    }

    /// Act on decision steps, and between them too when configured to.
    pub fn is_action_step(&self) -> bool {
        self.has_action()
            && (self.is_decision_step() || self.config.take_action_between_decisions)
    }

    /// Apply a decision to the status. `Empty` leaves it unchanged.
    pub fn update_status_from_decision(&mut self, decision: &PolicyDecision) {
        match decision {
            PolicyDecision::Error => self.status = BrainStatus::Error,
            PolicyDecision::Action(_) => self.status = BrainStatus::ActionReady,
            PolicyDecision::Empty => {}
        }
    }

    /// Ask the policy for a decision on `observations`.
    pub fn request_decision(&mut self, observations: &DictPoint) -> Result<(), PolicyError> {
        let handle = self.policy.request_decision(observations)?;
        self.pending = Some(handle);
        Ok(())
    }

    /// Wait for the pending decision, if any, and update the status.
    ///
    /// On timeout the status becomes [`BrainStatus::Error`], the pending
    /// request is dropped, and the previously held decision is kept.
    pub fn resolve_decision(&mut self) {
        let Some(mut handle) = self.pending.take() else {
            return;
        };
        let resolved = match self.config.timeout() {
            Some(timeout) => handle.wait_for(timeout),
            None => Some(handle.wait()),
        };
        match resolved {
            Some(decision) => {
                self.update_status_from_decision(&decision);
                self.decision = Some(decision);
            }
            None => {
                warn!(
                    timeout_secs = self.config.timeout_secs,
                    "synchronous brain timed out waiting for a decision"
                );
                self.update_status_from_decision(&PolicyDecision::Error);
            }
        }
    }

    /// The held action, if the last resolved decision was one.
    pub fn action(&self) -> Option<&DictPoint> {
        self.decision.as_ref().and_then(PolicyDecision::action)
    }
}
