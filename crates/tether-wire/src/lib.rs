//! Wire messages and binary codec for the Tether RL bridge.
//!
//! Every message exchanged between the simulation and an external
//! trainer implements [`WireMessage`]. Encoding is little-endian with
//! `u32` length prefixes; a top-level frame adds the `b"TTHR"` magic
//! and a version byte ([`encode_frame`] / [`decode_frame`]).
//!
//! The [`convert`] module maps the validated [`tether_space`] model to
//! and from the plain message structs in [`space_msg`].

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod codec;
pub mod convert;
pub mod error;
pub mod space_msg;
pub mod training;

pub use codec::{decode_frame, encode_frame, Reader, WireMessage, MAGIC, VERSION};
pub use convert::{
    dict_point_from_msg, dict_point_to_msg, dict_space_from_msg, dict_space_to_msg,
    point_from_msg, point_to_msg, space_from_msg, space_to_msg,
};
pub use error::WireError;
pub use space_msg::{
    BinarySpaceMsg, BoxSpaceDimensionMsg, BoxSpaceMsg, DictPointMsg, DictSpaceMsg,
    DiscreteSpaceMsg, FundamentalPointMsg, FundamentalSpaceMsg,
};
pub use training::{
    AgentDefinition, AgentState, AgentStateUpdate, EnvironmentDefinition, EnvironmentState,
    EnvironmentStateUpdate, InitialAgentState, InitialEnvironmentState, InitialTrainingState,
    InitialTrainingStateRequest, StartGymConnector, StartGymConnectorResponse,
    TrainingDefinition, TrainingDefinitionRequest, TrainingState, TrainingStateUpdate,
    UpdateStatus,
};
