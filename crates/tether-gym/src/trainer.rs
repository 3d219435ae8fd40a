//! Agents driven by an external trainer.
//!
//! A [`Trainer`] is the user's reward/termination logic. A
//! [`TrainerAgent`] wraps one together with the agent's observers and
//! actuators and keeps the per-step [`TrainerState`] that goes out on
//! the wire.

use std::mem;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use tether_core::{
    AgentKey, AgentTrainingStatus, AgentUid, ConfigError, TrainingMsgStatus, UidAuthority,
};
use tether_interact::{Actuator, InteractionManager, Observer};
use tether_space::DictPoint;
use tether_wire::{dict_point_to_msg, dict_space_to_msg, AgentDefinition, AgentState, InitialAgentState};

use crate::error::ConnectorError;

// ── Trainer ─────────────────────────────────────────────────────

/// Per-agent training logic supplied by the simulation.
///
/// Each step the agent asks for the status first, then the reward, then
/// any extra info, in that order.
pub trait Trainer: Send {
    /// Reward earned since the previous step.
    fn compute_reward(&mut self) -> f32;

    /// Whether the episode is still running.
    fn compute_status(&mut self) -> AgentTrainingStatus;

    /// Extra key/value pairs for the trainer. `info` is empty on entry.
    fn info(&mut self, info: &mut IndexMap<String, String>) {
        let _ = info;
    }

    /// Return the agent to its starting condition.
    fn reset_trainer(&mut self) {}
}

// ── TrainerConfig ───────────────────────────────────────────────

/// Per-agent cadence settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TrainerConfig {
    /// Steps between decisions. Must be at least 1. Default: 1.
    pub decision_request_frequency: u32,
    /// Act on steps between decisions too. Default: `true`.
    pub take_action_between_decisions: bool,
    /// Normalize Box observations onto `[0, 1]`. Default: `false`.
    pub normalize_observations: bool,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            decision_request_frequency: 1,
            take_action_between_decisions: true,
            normalize_observations: false,
        }
    }
}

impl TrainerConfig {
    /// Check invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decision_request_frequency == 0 {
            return Err(ConfigError::InvalidDecisionFrequency { value: 0 });
        }
        Ok(())
    }
}

// ── TrainerState ────────────────────────────────────────────────

/// What an agent reports after thinking.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainerState {
    /// Reward from the last step.
    pub reward: f32,
    /// Episode status from the last step.
    pub status: AgentTrainingStatus,
    /// Whether the terminal state has gone out yet.
    pub msg_status: TrainingMsgStatus,
    /// Extra info from the last step.
    pub info: IndexMap<String, String>,
}

impl TrainerState {
    /// `true` once the episode has completed or been truncated.
    pub fn is_done(&self) -> bool {
        self.status.is_done()
    }

    /// Advance the last-message marker for a done agent.
    ///
    /// The first done step marks the terminal state as pending; the next
    /// one records it as sent. Agents that are not done are untouched.
    pub fn advance_msg_status(&mut self) {
        if !self.is_done() {
            return;
        }
        self.msg_status = match self.msg_status {
            TrainingMsgStatus::NoStatus => TrainingMsgStatus::LastMsgPending,
            TrainingMsgStatus::LastMsgPending | TrainingMsgStatus::LastMsgSent => {
                TrainingMsgStatus::LastMsgSent
            }
        };
    }
}

// ── TrainerAgent ────────────────────────────────────────────────

/// One externally-trained agent.
///
/// Built with its collaborators, then [`initialize`](Self::initialize)d
/// by its environment, which assigns the [`AgentKey`] and draws a UID.
///
/// # Examples
///
/// ```
/// use tether_core::{AgentKey, AgentTrainingStatus, UidAuthority};
/// use tether_gym::{Trainer, TrainerAgent};
/// use tether_interact::{DebugActuator, DebugBoxObserver};
/// use tether_space::BoxSpace;
///
/// struct Constant;
///
/// impl Trainer for Constant {
///     fn compute_reward(&mut self) -> f32 { 1.0 }
///     fn compute_status(&mut self) -> AgentTrainingStatus { AgentTrainingStatus::Running }
/// }
///
/// let mut agent = TrainerAgent::new("walker", Box::new(Constant))
///     .with_observer(Box::new(DebugBoxObserver::new("pos", BoxSpace::uniform(2), 1)))
///     .with_actuator(Box::new(DebugActuator::new("motor", BoxSpace::uniform(1))));
/// agent.initialize(AgentKey::new(0u32, 0u32), &mut UidAuthority::new()).unwrap();
///
/// assert_eq!(agent.think().reward, 1.0);
/// assert_eq!(agent.observations().len(), 1);
/// ```
pub struct TrainerAgent {
    name: String,
    trainer: Box<dyn Trainer>,
    config: TrainerConfig,
    interaction: InteractionManager,
    pending_observers: Vec<Box<dyn Observer>>,
    pending_actuators: Vec<Box<dyn Actuator>>,
    key: Option<AgentKey>,
    uid: Option<AgentUid>,
    state: TrainerState,
    step: u32,
}

impl TrainerAgent {
    /// An agent with no collaborators and the default config.
    pub fn new(name: impl Into<String>, trainer: Box<dyn Trainer>) -> Self {
        Self {
            name: name.into(),
            trainer,
            config: TrainerConfig::default(),
            interaction: InteractionManager::new(false),
            pending_observers: Vec::new(),
            pending_actuators: Vec::new(),
            key: None,
            uid: None,
            state: TrainerState::default(),
            step: 0,
        }
    }

    /// Add an observer. Order is registration order.
    pub fn with_observer(mut self, observer: Box<dyn Observer>) -> Self {
        self.pending_observers.push(observer);
        self
    }

    /// Add an actuator. Order is registration order.
    pub fn with_actuator(mut self, actuator: Box<dyn Actuator>) -> Self {
        self.pending_actuators.push(actuator);
        self
    }

    /// Replace the config.
    pub fn with_config(mut self, config: TrainerConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the interaction spaces, record `key`, and draw a UID.
    pub fn initialize(&mut self, key: AgentKey, uids: &mut UidAuthority) -> Result<(), ConnectorError> {
        if self.interaction.is_initialized() {
            return Err(ConnectorError::AgentAlreadyInitialized {
                agent: self.name.clone(),
            });
        }
        self.config.validate()?;
        self.interaction = InteractionManager::new(self.config.normalize_observations);
        self.interaction.initialize(
            mem::take(&mut self.pending_observers),
            mem::take(&mut self.pending_actuators),
        )?;
        let uid = uids.issue();
        self.key = Some(key);
        self.uid = Some(uid);
        info!(agent = %self.name, %key, %uid, "trainer agent initialized");
        Ok(())
    }

    /// Agent name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Address assigned at initialization.
    pub fn key(&self) -> Option<AgentKey> {
        self.key
    }

    /// UID drawn at initialization.
    pub fn uid(&self) -> Option<AgentUid> {
        self.uid
    }

    /// The config in force.
    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// State from the most recent think or reset.
    pub fn state(&self) -> &TrainerState {
        &self.state
    }

    /// Override the episode status.
    pub fn set_training_status(&mut self, status: AgentTrainingStatus) {
        self.state.status = status;
    }

    /// Override the last-message marker.
    pub fn set_msg_status(&mut self, status: TrainingMsgStatus) {
        self.state.msg_status = status;
    }

    /// Observations gathered by the most recent think or reset.
    pub fn observations(&self) -> &DictPoint {
        self.interaction.observations()
    }

    /// The interaction manager.
    pub fn interaction(&self) -> &InteractionManager {
        &self.interaction
    }

    /// Steps taken since the last reset.
    pub fn step(&self) -> u32 {
        self.step
    }

    /// `true` on steps where a fresh decision is due.
    pub fn is_decision_step(&self) -> bool {
        self.step % self.config.decision_request_frequency.max(1) == 0
    }

    /// `true` on decision steps, and on every step when acting between
    /// decisions.
    pub fn is_action_step(&self) -> bool {
        self.is_decision_step() || self.config.take_action_between_decisions
    }

    /// Compute status, reward, and info, then gather observations.
    pub fn think(&mut self) -> &TrainerState {
        self.state.status = self.trainer.compute_status();
        self.state.reward = self.trainer.compute_reward();
        self.state.info.clear();
        self.trainer.info(&mut self.state.info);
        if let Err(e) = self.interaction.aggregate_observations() {
            warn!(agent = %self.name, error = %e, "failed to aggregate observations");
        }
        self.state.advance_msg_status();
        &self.state
    }

    /// Deliver `action` to the actuators and advance the step.
    pub fn act(&mut self, action: &DictPoint) {
        if let Err(e) = self.interaction.distribute_actions(action) {
            warn!(agent = %self.name, error = %e, "action dropped");
        }
        self.step = self.step.wrapping_add(1);
    }

    /// Start a new episode.
    pub fn reset(&mut self) {
        self.trainer.reset_trainer();
        self.state.info.clear();
        self.step = 0;
        if let Err(e) = self.interaction.aggregate_observations() {
            warn!(agent = %self.name, error = %e, "failed to aggregate observations");
        }
        self.trainer.info(&mut self.state.info);
        self.state.status = AgentTrainingStatus::Running;
        self.state.msg_status = TrainingMsgStatus::NoStatus;
        debug!(agent = %self.name, "trainer agent reset");
    }

    /// The definition published to the trainer.
    pub fn definition(&self) -> AgentDefinition {
        let def = self.interaction.definition();
        AgentDefinition {
            action_space: dict_space_to_msg(&def.action_space),
            obs_space: dict_space_to_msg(&def.obs_space),
            normalize_obs: def.normalize_observations,
            normalize_actions: false,
            name: self.name.clone(),
        }
    }

    /// The per-step state message.
    pub fn agent_state(&self) -> AgentState {
        AgentState {
            observations: dict_point_to_msg(self.observations()),
            info: self.state.info.clone(),
            reward: self.state.reward,
            status: self.state.status,
        }
    }

    /// The post-reset state message.
    pub fn initial_state(&self) -> InitialAgentState {
        InitialAgentState {
            observations: dict_point_to_msg(self.observations()),
            info: self.state.info.clone(),
        }
    }
}

impl std::fmt::Debug for TrainerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrainerAgent")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("uid", &self.uid)
            .field("state", &self.state)
            .field("step", &self.step)
            .finish()
    }
}
