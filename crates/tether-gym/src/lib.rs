//! Gym-style training sessions for Tether.
//!
//! The simulation supplies [`Environment`]s, each registering
//! [`TrainerAgent`]s whose [`Trainer`] computes rewards and episode
//! status. A [`GymConnector`] owns the environments and exchanges
//! state with an external trainer through a [`ConnectorTransport`]:
//! [`RpcTransport`] over gRPC, or [`LocalTransport`] in-process.
//!
//! A [`Subsystem`] ties it together and runs the per-frame tick,
//! alongside any locally-driven inference agents.
//!
//! # Session shape
//!
//! 1. The trainer sends a start signal; the connector publishes the
//!    training definition.
//! 2. Each tick the trainer sends one update (resets or actions per
//!    environment). Resets are applied and the fresh states published;
//!    then every running environment thinks and the collected state
//!    answers the update.
//! 3. A close or error status in an update ends the session. Any open
//!    exchange is answered with an empty state.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod connector;
pub mod environment;
pub mod error;
pub mod settings;
pub mod subsystem;
pub mod trainer;
pub mod transport;

pub use connector::GymConnector;
pub use environment::{Environment, EnvironmentHost};
pub use error::ConnectorError;
pub use settings::SubsystemSettings;
pub use subsystem::Subsystem;
pub use trainer::{Trainer, TrainerAgent, TrainerConfig, TrainerState};
pub use transport::{ConnectorTransport, LocalTrainer, LocalTransport, RpcTransport, TrainerEvent};
