//! Asynchronous inference for Tether agents.
//!
//! The pipeline turns one observation [`DictPoint`](tether_space::DictPoint)
//! into one action Dict:
//!
//! ```text
//!   InferenceAgent::think                     InferenceAgent::act
//!     aggregate ──► SynchronousBrain ──► InferencePolicy ──► worker thread
//!                     request_decision      request_decision    flatten obs
//!                                           -> DecisionHandle   run model
//!                                                               unflatten action
//!                   resolve_decision  ◄──── DecisionHandle ◄────┘
//!     distribute ◄── action()
//! ```
//!
//! The model runs on a dedicated worker thread that owns the
//! [`ModelBackend`]. Observation and action tensors are allocated once by
//! [`InferencePolicy::init`] and reused; at most one decision may be in
//! flight per policy.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod agent;
pub mod brain;
pub mod config;
pub mod decision;
pub mod model;
pub mod policy;

pub use agent::InferenceAgent;
pub use brain::{BrainStatus, SynchronousBrain};
pub use config::BrainConfig;
pub use decision::PolicyDecision;
pub use model::ModelBackend;
pub use policy::{DecisionHandle, InferencePolicy};
