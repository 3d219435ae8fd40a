//! Observer/actuator aggregation for Tether.
//!
//! An [`InteractionManager`] owns one agent's observation and action
//! [`DictSpace`](tether_space::DictSpace)s, built by querying a set of
//! [`Observer`]s and [`Actuator`]s at initialization. Each tick it
//! aggregates observations into a reused [`DictPoint`](tether_space::DictPoint)
//! and distributes an action Dict back out, child by child.
//!
//! Child order in both Dicts is registration order. Labels are
//! [`interactor_id`]s, which prefix the collaborator's own label with its
//! index so duplicate labels never collide.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod debug;
pub mod definition;
pub mod interactor;
pub mod manager;

pub use debug::{DebugActuator, DebugBinaryObserver, DebugBoxObserver, DebugDiscreteObserver};
pub use definition::InteractionDefinition;
pub use interactor::{interactor_id, Actuator, Observer};
pub use manager::InteractionManager;
