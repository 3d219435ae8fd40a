//! Error types shared across crate boundaries.
//!
//! Each concern has its own error enum; none of them are panics. The
//! tick driver maps every one of these into observable state (agent
//! status, connector status) at the boundary where it is detected.

use std::error::Error;
use std::fmt;

/// Errors from the interaction aggregator.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionError {
    /// An action point's child count does not match the actuator count.
    ActionCountMismatch {
        /// Number of registered actuators.
        expected: usize,
        /// Number of sub-points in the action.
        got: usize,
    },
    /// Observations were requested before `initialize` was called.
    NotInitialized,
}

impl fmt::Display for InteractionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ActionCountMismatch { expected, got } => {
                write!(f, "action has {got} sub-points but {expected} actuators are registered")
            }
            Self::NotInitialized => write!(f, "interaction manager not initialized"),
        }
    }
}

impl Error for InteractionError {}

/// Errors from the inference decision pipeline.
///
/// Every variant collapses to a single "policy error" decision when
/// surfaced to an agent; the variants exist for logging.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PolicyError {
    /// No model backend has been loaded.
    NoModel,
    /// The policy was used before `init` supplied its spaces.
    NotInitialized,
    /// A decision is already in flight; buffers are not shareable.
    DecisionInFlight,
    /// The model backend failed to run.
    ModelFailed {
        /// Backend-supplied description.
        reason: String,
    },
    /// The inference worker thread could not be spawned.
    WorkerSpawnFailed {
        /// OS-level description.
        reason: String,
    },
    /// The inference worker went away before replying.
    WorkerDisconnected,
    /// The decision did not resolve within the brain's timeout.
    Timeout,
}

impl fmt::Display for PolicyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoModel => write!(f, "no model loaded"),
            Self::NotInitialized => write!(f, "policy not initialized"),
            Self::DecisionInFlight => write!(f, "a decision is already in flight"),
            Self::ModelFailed { reason } => write!(f, "model execution failed: {reason}"),
            Self::WorkerSpawnFailed { reason } => {
                write!(f, "inference worker spawn failed: {reason}")
            }
            Self::WorkerDisconnected => write!(f, "inference worker disconnected"),
            Self::Timeout => write!(f, "decision timed out"),
        }
    }
}

impl Error for PolicyError {}

/// Errors detected while validating configuration structs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The listen address is empty.
    EmptyAddress,
    /// A timeout is below the one-second minimum.
    InvalidTimeout {
        /// The configured value in seconds.
        value: u64,
    },
    /// Decision frequency must be at least one.
    InvalidDecisionFrequency {
        /// The configured value.
        value: u32,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyAddress => write!(f, "address must not be empty"),
            Self::InvalidTimeout { value } => {
                write!(f, "timeout must be at least 1 second, got {value}")
            }
            Self::InvalidDecisionFrequency { value } => {
                write!(f, "decision frequency must be at least 1, got {value}")
            }
        }
    }
}

impl Error for ConfigError {}
