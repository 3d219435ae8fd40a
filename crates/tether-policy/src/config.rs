//! Brain configuration.

use std::time::Duration;

use tether_core::ConfigError;

/// Decision cadence and timeout settings for a [`SynchronousBrain`](crate::SynchronousBrain).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BrainConfig {
    /// Request a decision every `n` steps. Must be at least 1.
    pub decision_request_frequency: u32,
    /// Re-apply the last action on steps between decisions.
    pub take_action_between_decisions: bool,
    /// Bound the wait for a pending decision by `timeout_secs`.
    pub use_timeout: bool,
    /// Seconds to wait when `use_timeout` is set.
    pub timeout_secs: u64,
}

impl Default for BrainConfig {
    fn default() -> Self {
        Self {
            decision_request_frequency: 1,
            take_action_between_decisions: true,
            use_timeout: false,
            timeout_secs: 30,
        }
    }
}

impl BrainConfig {
    /// Check invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.decision_request_frequency == 0 {
            return Err(ConfigError::InvalidDecisionFrequency {
                value: self.decision_request_frequency,
            });
        }
        if self.use_timeout && self.timeout_secs == 0 {
            return Err(ConfigError::InvalidTimeout {
                value: self.timeout_secs,
            });
        }
        Ok(())
    }

    /// The decision timeout, if one is in force.
    pub fn timeout(&self) -> Option<Duration> {
        self.use_timeout
            .then(|| Duration::from_secs(self.timeout_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        assert!(BrainConfig::default().validate().is_ok());
        assert_eq!(BrainConfig::default().timeout(), None);
    }

    #[test]
    fn zero_frequency_rejected() {
        let cfg = BrainConfig {
            decision_request_frequency: 0,
            ..BrainConfig::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::InvalidDecisionFrequency { value: 0 })
        );
    }

    #[test]
    fn zero_timeout_rejected_only_when_used() {
        let mut cfg = BrainConfig {
            timeout_secs: 0,
            ..BrainConfig::default()
        };
        assert!(cfg.validate().is_ok());
        cfg.use_timeout = true;
        assert_eq!(cfg.validate(), Err(ConfigError::InvalidTimeout { value: 0 }));
    }
}
