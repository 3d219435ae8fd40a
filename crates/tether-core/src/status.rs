//! Lifecycle statuses shared between agents, environments, and connectors.

/// Training status an agent reports to the external trainer each step.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AgentTrainingStatus {
    /// Episode in progress.
    #[default]
    Running,
    /// Episode ended by reaching a terminal state.
    Completed,
    /// Episode cut short (time limit or external interruption).
    Truncated,
}

impl AgentTrainingStatus {
    /// `true` for [`Completed`](Self::Completed) and [`Truncated`](Self::Truncated).
    pub fn is_done(self) -> bool {
        matches!(self, Self::Completed | Self::Truncated)
    }
}

/// Tracks whether a done agent's final state has gone out on the wire.
///
/// A done agent sends exactly one more message carrying its terminal
/// state; after that it is omitted from environment states until reset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum TrainingMsgStatus {
    /// Agent is not done, or has just been reset.
    #[default]
    NoStatus,
    /// Agent is done; the next outgoing state includes it one last time.
    LastMsgPending,
    /// Terminal state already sent.
    LastMsgSent,
}

/// Status of an environment as seen by the gym connector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum EnvironmentStatus {
    /// Agents are stepping.
    #[default]
    Running,
    /// Every agent is done, or the trainer requested a reset.
    Completed,
    /// The environment failed and is skipped by the connector.
    Error,
}

/// Status of the session with the external trainer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum ConnectorStatus {
    /// Trainer connected and exchanging state.
    Running,
    /// Trainer closed the session; a new start signal may reopen it.
    Closed,
    /// Trainer reported an error, or the transport timed out.
    Error,
    /// Waiting for the first start signal.
    #[default]
    NotStarted,
}

impl ConnectorStatus {
    /// `true` while the connector should keep polling for a start signal.
    pub fn awaiting_start(self) -> bool {
        matches!(self, Self::NotStarted | Self::Closed)
    }
}

/// Status of a locally-driven inference agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum AgentStatus {
    /// Thinking and acting every tick.
    #[default]
    Running,
    /// Failed; skipped by the tick driver until re-initialized.
    Error,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn done_statuses() {
        assert!(!AgentTrainingStatus::Running.is_done());
        assert!(AgentTrainingStatus::Completed.is_done());
        assert!(AgentTrainingStatus::Truncated.is_done());
    }

    #[test]
    fn closed_connector_awaits_start() {
        assert!(ConnectorStatus::NotStarted.awaiting_start());
        assert!(ConnectorStatus::Closed.awaiting_start());
        assert!(!ConnectorStatus::Running.awaiting_start());
        assert!(!ConnectorStatus::Error.awaiting_start());
    }
}
