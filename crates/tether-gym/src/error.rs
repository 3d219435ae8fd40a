//! Errors from the gym connector and its transports.

use std::error::Error;
use std::fmt;

use tether_comms::CommsError;
use tether_core::ConfigError;
use tether_space::SpaceError;
use tether_wire::WireError;

/// Errors raised while setting up or driving a training session.
///
/// None of these abort the tick: the connector turns them into
/// [`ConnectorStatus::Error`](tether_core::ConnectorStatus::Error) at the
/// point where they surface.
#[derive(Clone, Debug, PartialEq)]
pub enum ConnectorError {
    /// Settings failed validation.
    Config(ConfigError),
    /// The RPC layer failed.
    Comms(CommsError),
    /// A message could not be converted to or from the space model.
    Wire(WireError),
    /// An agent's observers or actuators declared an unusable space.
    Space(SpaceError),
    /// `initialize` was called twice on the same agent.
    AgentAlreadyInitialized {
        /// Agent name.
        agent: String,
    },
    /// The in-process trainer end was dropped.
    TrainerGone,
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid settings: {e}"),
            Self::Comms(e) => write!(f, "transport error: {e}"),
            Self::Wire(e) => write!(f, "wire error: {e}"),
            Self::Space(e) => write!(f, "space error: {e}"),
            Self::AgentAlreadyInitialized { agent } => {
                write!(f, "agent '{agent}' is already initialized")
            }
            Self::TrainerGone => write!(f, "trainer end of the transport was dropped"),
        }
    }
}

impl Error for ConnectorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Comms(e) => Some(e),
            Self::Wire(e) => Some(e),
            Self::Space(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for ConnectorError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<CommsError> for ConnectorError {
    fn from(e: CommsError) -> Self {
        Self::Comms(e)
    }
}

impl From<WireError> for ConnectorError {
    fn from(e: WireError) -> Self {
        Self::Wire(e)
    }
}

impl From<SpaceError> for ConnectorError {
    fn from(e: SpaceError) -> Self {
        Self::Space(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comms_error_is_the_source() {
        let e = ConnectorError::from(CommsError::QueueClosed);
        assert_eq!(e.to_string(), "transport error: completion queue is shut down");
        assert!(e.source().is_some());
        assert!(ConnectorError::TrainerGone.source().is_none());
    }
}
