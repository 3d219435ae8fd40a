//! Errors from the gRPC transport, the backends, and the trainer client.

use std::error::Error;
use std::fmt;
use std::io;

use tether_core::ConfigError;
use tether_wire::WireError;

use crate::method::Method;

/// Errors that can occur while serving or calling RPC methods.
#[derive(Clone, Debug, PartialEq)]
pub enum CommsError {
    /// The communicator configuration is invalid.
    Config(ConfigError),
    /// The listener could not bind its address.
    Bind {
        /// The address that was requested.
        address: String,
        /// OS-level reason.
        reason: String,
    },
    /// Runtime or socket setup failed.
    Io {
        /// Error kind reported by the OS.
        kind: io::ErrorKind,
        /// OS-level reason.
        reason: String,
    },
    /// A payload failed to decode.
    Wire(WireError),
    /// The trainer client could not reach the server.
    Connect {
        /// The address dialled.
        address: String,
        /// Transport-level reason.
        reason: String,
    },
    /// A second backend was created for a method that already has one.
    DuplicateMethod {
        /// The contested method.
        method: Method,
    },
    /// A backend worker thread could not be spawned.
    ThreadSpawnFailed {
        /// OS-level reason.
        reason: String,
    },
    /// The backend's completion queue has shut down.
    QueueClosed,
    /// Backends cannot be added once the server is running.
    AlreadyStarted,
    /// `receive` was called while an earlier exchange still awaits its response.
    ExchangeInProgress,
    /// `respond` was called with no exchange open.
    NoExchange,
    /// The server answered a call with a non-OK status.
    CallFailed {
        /// The method that was called.
        method: Method,
        /// The gRPC status code returned.
        code: tonic::Code,
        /// The status message returned.
        message: String,
    },
    /// No response arrived within the client timeout.
    TimedOut {
        /// The method that was called.
        method: Method,
    },
}

impl fmt::Display for CommsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(e) => write!(f, "invalid communicator config: {e}"),
            Self::Bind { address, reason } => {
                write!(f, "failed to bind {address}: {reason}")
            }
            Self::Io { kind, reason } => write!(f, "i/o error ({kind:?}): {reason}"),
            Self::Wire(e) => write!(f, "wire error: {e}"),
            Self::Connect { address, reason } => {
                write!(f, "failed to connect to {address}: {reason}")
            }
            Self::DuplicateMethod { method } => {
                write!(f, "a backend for {method} already exists")
            }
            Self::ThreadSpawnFailed { reason } => {
                write!(f, "failed to spawn thread: {reason}")
            }
            Self::QueueClosed => write!(f, "completion queue is shut down"),
            Self::AlreadyStarted => write!(f, "server already started"),
            Self::ExchangeInProgress => {
                write!(f, "existing exchange must be completed before a new one starts")
            }
            Self::NoExchange => write!(f, "no open exchange to complete"),
            Self::CallFailed {
                method,
                code,
                message,
            } => write!(f, "{method} call failed ({code:?}): {message}"),
            Self::TimedOut { method } => write!(f, "{method} call timed out"),
        }
    }
}

impl Error for CommsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Config(e) => Some(e),
            Self::Wire(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CommsError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl From<WireError> for CommsError {
    fn from(e: WireError) -> Self {
        Self::Wire(e)
    }
}

impl From<io::Error> for CommsError {
    fn from(e: io::Error) -> Self {
        Self::Io {
            kind: e.kind(),
            reason: e.to_string(),
        }
    }
}

impl CommsError {
    /// A failed call on `method` from the status the server returned.
    pub fn from_status(method: Method, status: &tonic::Status) -> Self {
        Self::CallFailed {
            method,
            code: status.code(),
            message: status.message().to_string(),
        }
    }
}
