//! Subsystem settings.

use tether_comms::CommunicatorConfig;
use tether_core::ConfigError;

/// Settings for a [`Subsystem`](crate::Subsystem).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubsystemSettings {
    /// Where the gym connector listens.
    pub communicator: CommunicatorConfig,
    /// Serve the gym connector at all. Default: `true`.
    pub enable_gym_connector: bool,
}

impl Default for SubsystemSettings {
    fn default() -> Self {
        Self {
            communicator: CommunicatorConfig::default(),
            enable_gym_connector: true,
        }
    }
}

impl SubsystemSettings {
    /// Check invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.communicator.validate()
    }

    /// Apply command-line overrides to the communicator settings.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.communicator = self.communicator.with_args(args);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_enable_the_connector() {
        let s = SubsystemSettings::default();
        assert!(s.enable_gym_connector);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn args_reach_the_communicator() {
        let s = SubsystemSettings::default().with_args(["--tether-port=9200"]);
        assert_eq!(s.communicator.port, 9200);
    }
}
