//! Core types for the Tether reinforcement-learning bridge.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the vocabulary shared by every other Tether crate: agent and
//! environment identifiers, the explicit UID authority, lifecycle
//! statuses, and the error types that cross crate boundaries.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod error;
pub mod id;
pub mod status;

pub use error::{ConfigError, InteractionError, PolicyError};
pub use id::{AgentIndex, AgentKey, AgentUid, EnvId, UidAuthority};
pub use status::{
    AgentStatus, AgentTrainingStatus, ConnectorStatus, EnvironmentStatus, TrainingMsgStatus,
};
