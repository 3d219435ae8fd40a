//! Training protocol messages.
//!
//! Maps are [`IndexMap`]s keyed by environment or agent id; encoding
//! preserves their insertion order.

use indexmap::IndexMap;
use tether_core::AgentTrainingStatus;

use crate::codec::{
    put_bool, put_f32, put_id_map, put_seq, put_str, put_str_map, put_u64, put_u8, Reader,
    WireMessage,
};
use crate::error::WireError;
use crate::space_msg::{DictPointMsg, DictSpaceMsg};

// ── Agent and environment state ─────────────────────────────────

fn put_status(buf: &mut Vec<u8>, status: AgentTrainingStatus) {
    put_u8(
        buf,
        match status {
            AgentTrainingStatus::Running => 0,
            AgentTrainingStatus::Completed => 1,
            AgentTrainingStatus::Truncated => 2,
        },
    );
}

fn read_status(r: &mut Reader<'_>) -> Result<AgentTrainingStatus, WireError> {
    match r.read_u8()? {
        0 => Ok(AgentTrainingStatus::Running),
        1 => Ok(AgentTrainingStatus::Completed),
        2 => Ok(AgentTrainingStatus::Truncated),
        tag => Err(WireError::UnknownTag {
            what: "agent status",
            tag,
        }),
    }
}

/// One agent's per-step state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentState {
    /// Aggregated observations.
    pub observations: DictPointMsg,
    /// Free-form diagnostic key/value pairs.
    pub info: IndexMap<String, String>,
    /// Reward for the last step.
    pub reward: f32,
    /// Episode status.
    pub status: AgentTrainingStatus,
}

impl WireMessage for AgentState {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.observations.encode(buf);
        put_str_map(buf, &self.info);
        put_f32(buf, self.reward);
        put_status(buf, self.status);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            observations: DictPointMsg::decode(r)?,
            info: r.read_str_map()?,
            reward: r.read_f32()?,
            status: read_status(r)?,
        })
    }
}

/// One agent's state right after a reset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InitialAgentState {
    /// Aggregated observations.
    pub observations: DictPointMsg,
    /// Free-form diagnostic key/value pairs.
    pub info: IndexMap<String, String>,
}

impl WireMessage for InitialAgentState {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.observations.encode(buf);
        put_str_map(buf, &self.info);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            observations: DictPointMsg::decode(r)?,
            info: r.read_str_map()?,
        })
    }
}

/// All reporting agents of one environment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvironmentState {
    /// Agent id to state. Agents whose final message was already sent are absent.
    pub agent_states: IndexMap<u32, AgentState>,
}

impl WireMessage for EnvironmentState {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_id_map(buf, &self.agent_states);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            agent_states: r.read_id_map()?,
        })
    }
}

/// All agents of one environment after a reset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InitialEnvironmentState {
    /// Agent id to initial state.
    pub agent_states: IndexMap<u32, InitialAgentState>,
}

impl WireMessage for InitialEnvironmentState {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_id_map(buf, &self.agent_states);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            agent_states: r.read_id_map()?,
        })
    }
}

/// Every environment's state, in environment order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingState {
    /// One entry per environment.
    pub environment_states: Vec<EnvironmentState>,
}

impl WireMessage for TrainingState {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_seq(buf, &self.environment_states);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            environment_states: r.read_seq()?,
        })
    }
}

/// Post-reset states of the environments that were reset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InitialTrainingState {
    /// Environment id to initial state; only reset environments appear.
    pub environment_states: IndexMap<u32, InitialEnvironmentState>,
}

impl WireMessage for InitialTrainingState {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_id_map(buf, &self.environment_states);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            environment_states: r.read_id_map()?,
        })
    }
}

// ── Definitions ─────────────────────────────────────────────────

/// One agent's interface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentDefinition {
    /// Action space.
    pub action_space: DictSpaceMsg,
    /// Observation space as seen by the trainer.
    pub obs_space: DictSpaceMsg,
    /// Observations arrive normalized.
    pub normalize_obs: bool,
    /// Reserved; always `false`.
    pub normalize_actions: bool,
    /// Agent name.
    pub name: String,
}

impl WireMessage for AgentDefinition {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.action_space.encode(buf);
        self.obs_space.encode(buf);
        put_bool(buf, self.normalize_obs);
        put_bool(buf, self.normalize_actions);
        put_str(buf, &self.name);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            action_space: DictSpaceMsg::decode(r)?,
            obs_space: DictSpaceMsg::decode(r)?,
            normalize_obs: r.read_bool()?,
            normalize_actions: r.read_bool()?,
            name: r.read_str()?,
        })
    }
}

/// Every agent of one environment.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvironmentDefinition {
    /// Agent id to definition.
    pub agent_definitions: IndexMap<u32, AgentDefinition>,
}

impl WireMessage for EnvironmentDefinition {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_id_map(buf, &self.agent_definitions);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            agent_definitions: r.read_id_map()?,
        })
    }
}

/// Every environment's definition, in environment order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingDefinition {
    /// One entry per environment.
    pub environment_definitions: Vec<EnvironmentDefinition>,
}

impl WireMessage for TrainingDefinition {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_seq(buf, &self.environment_definitions);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            environment_definitions: r.read_seq()?,
        })
    }
}

// ── Updates from the trainer ────────────────────────────────────

/// Connector-level status carried by an update.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum UpdateStatus {
    /// No change.
    #[default]
    None,
    /// The trainer hit an error.
    Errored,
    /// The trainer closed the session.
    Closed,
}

/// Actions for one agent.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AgentStateUpdate {
    /// One child per actuator.
    pub actions: DictPointMsg,
}

impl WireMessage for AgentStateUpdate {
    fn encode(&self, buf: &mut Vec<u8>) {
        self.actions.encode(buf);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        Ok(Self {
            actions: DictPointMsg::decode(r)?,
        })
    }
}

/// What the trainer wants one environment to do this tick.
#[derive(Clone, Debug, PartialEq)]
pub enum EnvironmentStateUpdate {
    /// Reset, optionally reseeding and applying options first.
    Reset {
        /// New seed, if any.
        seed: Option<u64>,
        /// Environment-specific options.
        options: IndexMap<String, String>,
    },
    /// Apply actions.
    Step {
        /// Agent id to actions.
        updates: IndexMap<u32, AgentStateUpdate>,
    },
}

const UPDATE_RESET: u8 = 0;
const UPDATE_STEP: u8 = 1;

impl WireMessage for EnvironmentStateUpdate {
    fn encode(&self, buf: &mut Vec<u8>) {
        match self {
            Self::Reset { seed, options } => {
                put_u8(buf, UPDATE_RESET);
                match seed {
                    Some(s) => {
                        put_bool(buf, true);
                        put_u64(buf, *s);
                    }
                    None => put_bool(buf, false),
                }
                put_str_map(buf, options);
            }
            Self::Step { updates } => {
                put_u8(buf, UPDATE_STEP);
                put_id_map(buf, updates);
            }
        }
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        match r.read_u8()? {
            UPDATE_RESET => {
                let seed = if r.read_bool()? {
                    Some(r.read_u64()?)
                } else {
                    None
                };
                Ok(Self::Reset {
                    seed,
                    options: r.read_str_map()?,
                })
            }
            UPDATE_STEP => Ok(Self::Step {
                updates: r.read_id_map()?,
            }),
            tag => Err(WireError::UnknownTag {
                what: "environment update",
                tag,
            }),
        }
    }
}

/// One tick's instructions from the trainer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrainingStateUpdate {
    /// Connector-level status.
    pub status: UpdateStatus,
    /// Environment id to update.
    pub updates: IndexMap<u32, EnvironmentStateUpdate>,
}

impl WireMessage for TrainingStateUpdate {
    fn encode(&self, buf: &mut Vec<u8>) {
        put_u8(
            buf,
            match self.status {
                UpdateStatus::None => 0,
                UpdateStatus::Errored => 1,
                UpdateStatus::Closed => 2,
            },
        );
        put_id_map(buf, &self.updates);
    }

    fn decode(r: &mut Reader<'_>) -> Result<Self, WireError> {
        let status = match r.read_u8()? {
            0 => UpdateStatus::None,
            1 => UpdateStatus::Errored,
            2 => UpdateStatus::Closed,
            tag => {
                return Err(WireError::UnknownTag {
                    what: "update status",
                    tag,
                })
            }
        };
        Ok(Self {
            status,
            updates: r.read_id_map()?,
        })
    }
}

// ── Empty requests ──────────────────────────────────────────────

macro_rules! empty_message {
    ($($(#[$meta:meta])* $name:ident;)*) => {
        $(
            $(#[$meta])*
            #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
            pub struct $name;

            impl WireMessage for $name {
                fn encode(&self, _buf: &mut Vec<u8>) {}

                fn decode(_r: &mut Reader<'_>) -> Result<Self, WireError> {
                    Ok(Self)
                }
            }
        )*
    };
}

empty_message! {
    /// The trainer asks the simulation to begin a session.
    StartGymConnector;
    /// Acknowledges [`StartGymConnector`].
    StartGymConnectorResponse;
    /// Pull request for the [`TrainingDefinition`].
    TrainingDefinitionRequest;
    /// Pull request for the next [`InitialTrainingState`].
    InitialTrainingStateRequest;
}
