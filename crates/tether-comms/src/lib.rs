//! RPC plumbing between a Tether simulation and an external trainer.
//!
//! A [`CommunicationManager`] serves the `tether.GymService` gRPC
//! service (see `proto/tether.proto`) and owns a completion queue per
//! backend. Every RPC carries one [`tether_wire`] frame. The tonic
//! handlers push each call onto its backend's queue, and three backend
//! shapes answer them:
//!
//! - [`PollingBackend`]: non-blocking inbox, used for the start signal
//! - [`ProducerBackend`]: FIFO outbox served to trainer pulls, used for
//!   definitions and post-reset state
//! - [`ExchangeBackend`]: strict one-request-one-response, used for the
//!   per-tick update/state exchange
//!
//! Backends move through [`BackendState`] as the manager broadcasts
//! start, ready, connection-established, and shutdown. On shutdown an
//! exchange answers any call it is holding with an empty response and
//! resolves a waiting [`PendingRequest`] with a default request, so
//! neither side is left blocked.
//!
//! [`TrainerClient`] is the blocking counterpart used by tooling and
//! tests.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod backend;
pub mod call;
pub mod client;
pub mod config;
pub mod error;
pub mod manager;
pub mod method;
pub mod queue;
pub(crate) mod service;
pub(crate) mod transport;

/// Generated gRPC messages, client, and server for `tether.GymService`.
#[allow(missing_docs)]
pub mod proto {
    tonic::include_proto!("tether");
}

pub use backend::{ExchangeBackend, PendingRequest, PollingBackend, ProducerBackend};
pub use call::{CallResult, CallSlot, CallStage, IncomingCall, Responder};
pub use client::TrainerClient;
pub use config::{CommunicatorConfig, PORT_FLAG};
pub use error::CommsError;
pub use manager::{ComSystemState, CommunicationManager};
pub use method::Method;
pub use queue::{BackendState, CompletionQueue, QueueEvent};
