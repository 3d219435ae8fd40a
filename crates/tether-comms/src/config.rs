//! Communicator configuration.

use std::time::Duration;

use tether_core::ConfigError;

/// Command-line flag overriding [`CommunicatorConfig::port`].
pub const PORT_FLAG: &str = "--tether-port";

/// Where the RPC server listens and how long clients wait.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommunicatorConfig {
    /// Listen address. Default: `"127.0.0.1"`.
    pub address: String,
    /// Listen port; `0` lets the OS choose. Default: `8000`.
    pub port: u16,
    /// Seconds a blocking wait may take before it is treated as a
    /// failure. Minimum 1. Default: 30.
    pub timeout_secs: u64,
}

impl Default for CommunicatorConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".into(),
            port: 8000,
            timeout_secs: 30,
        }
    }
}

impl CommunicatorConfig {
    /// Check structural invariants.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.address.is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        if self.timeout_secs < 1 {
            return Err(ConfigError::InvalidTimeout {
                value: self.timeout_secs,
            });
        }
        Ok(())
    }

    /// `address:port`.
    pub fn url(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// The timeout as a [`Duration`].
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Apply a `--tether-port=<n>` or `--tether-port <n>` override from
    /// `args`. A missing or unparsable value keeps the configured port.
    ///
    /// # Examples
    ///
    /// ```
    /// use tether_comms::CommunicatorConfig;
    ///
    /// let cfg = CommunicatorConfig::default().with_args(["sim", "--tether-port=9100"]);
    /// assert_eq!(cfg.port, 9100);
    ///
    /// let cfg = CommunicatorConfig::default().with_args(["sim", "--tether-port", "oops"]);
    /// assert_eq!(cfg.port, 8000);
    /// ```
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            let value = if let Some(v) = arg.strip_prefix(PORT_FLAG).and_then(|r| r.strip_prefix('=')) {
                Some(v.to_string())
            } else if arg == PORT_FLAG {
                args.next().map(|v| v.as_ref().to_string())
            } else {
                None
            };
            if let Some(port) = value.and_then(|v| v.parse::<u16>().ok()) {
                self.port = port;
            }
        }
        self
    }
}
