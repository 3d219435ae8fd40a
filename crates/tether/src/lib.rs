//! Tether: a bridge between a running simulation and reinforcement
//! learning trainers.
//!
//! This is the top-level facade crate that re-exports the public API from
//! all Tether sub-crates. For most users, adding `tether` as a single
//! dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use tether::prelude::*;
//! use tether::gym::{GymConnector, LocalTransport, TrainerEvent};
//! use tether::wire::TrainingStateUpdate;
//! use std::time::Duration;
//!
//! // A trainer that pays 1.0 per step and never ends the episode.
//! struct Steady;
//! impl Trainer for Steady {
//!     fn compute_reward(&mut self) -> f32 { 1.0 }
//!     fn compute_status(&mut self) -> AgentTrainingStatus { AgentTrainingStatus::Running }
//! }
//!
//! // An environment with one agent observing two values, acting on one.
//! struct Arena;
//! impl Environment for Arena {
//!     fn reset_environment(&mut self) {}
//!     fn register_agents(&mut self) -> Vec<TrainerAgent> {
//!         vec![TrainerAgent::new("walker", Box::new(Steady))
//!             .with_observer(Box::new(DebugBoxObserver::new("pos", BoxSpace::uniform(2), 1)))
//!             .with_actuator(Box::new(DebugActuator::new("motor", BoxSpace::uniform(1))))]
//!     }
//! }
//!
//! // Drive the session in-process instead of over gRPC.
//! let (transport, trainer) = LocalTransport::pair();
//! let connector = GymConnector::new(Box::new(transport), Duration::from_secs(1));
//! let mut sim = Subsystem::with_connector(SubsystemSettings::default(), connector);
//! sim.add_environment(Box::new(Arena));
//! sim.prepare().unwrap();
//!
//! trainer.start();
//! trainer.send_update(TrainingStateUpdate::default());
//! sim.tick();
//!
//! let events = trainer.drain_events();
//! assert!(matches!(events[0], TrainerEvent::Definition(_)));
//! assert!(matches!(events.last(), Some(TrainerEvent::State(_))));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate. Use them for types not in the prelude:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`types`] | `tether-core` | IDs, status enums, shared error types |
//! | [`space`] | `tether-space` | Spaces, points, flattening, validation |
//! | [`interact`] | `tether-interact` | Observer/actuator traits and aggregation |
//! | [`policy`] | `tether-policy` | Asynchronous inference and local agents |
//! | [`wire`] | `tether-wire` | Training messages and the frame codec |
//! | [`comms`] | `tether-comms` | RPC server, backends, and trainer client |
//! | [`gym`] | `tether-gym` | Environments, gym connector, tick driver |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core IDs, statuses, and shared errors (`tether-core`).
pub use tether_core as types;

/// Spaces and points (`tether-space`).
///
/// [`space::DictSpace`] describes an agent's observations or actions;
/// [`space::TensorBinding`] holds their flat `f32` encoding.
pub use tether_space as space;

/// Observer and actuator traits (`tether-interact`).
///
/// Implement [`interact::Observer`] and [`interact::Actuator`] to connect
/// simulation state to agents.
pub use tether_interact as interact;

/// Locally-run inference (`tether-policy`).
///
/// Plug a model in through [`policy::ModelBackend`]; drive it with
/// [`policy::InferenceAgent`].
pub use tether_policy as policy;

/// Training messages and their binary framing (`tether-wire`).
pub use tether_wire as wire;

/// The RPC server and trainer-side client (`tether-comms`).
pub use tether_comms as comms;

/// Gym-style training sessions (`tether-gym`).
///
/// [`gym::Subsystem`] is the usual entry point.
pub use tether_gym as gym;

/// Common imports for typical Tether usage.
///
/// ```rust
/// use tether::prelude::*;
/// ```
///
/// This imports the most frequently used types: the subsystem and its
/// settings, the trainer and environment traits, interactors, spaces, and
/// inference building blocks.
pub mod prelude {
    // Core types
    pub use tether_core::{
        AgentIndex, AgentStatus, AgentTrainingStatus, ConnectorStatus, EnvId, EnvironmentStatus,
    };

    // Errors
    pub use tether_core::{ConfigError, InteractionError, PolicyError};
    pub use tether_gym::ConnectorError;
    pub use tether_space::SpaceError;

    // Spaces
    pub use tether_space::{
        BinaryPoint, BinarySpace, BoxPoint, BoxSpace, DictPoint, DictSpace, DiscretePoint,
        DiscreteSpace, Point, Space,
    };

    // Interaction
    pub use tether_interact::{Actuator, DebugActuator, DebugBoxObserver, Observer};

    // Inference
    pub use tether_policy::{BrainConfig, InferenceAgent, InferencePolicy, ModelBackend, SynchronousBrain};

    // Training
    pub use tether_comms::CommunicatorConfig;
    pub use tether_gym::{Environment, Subsystem, SubsystemSettings, Trainer, TrainerAgent, TrainerConfig};
}
