//! The gym RPC methods.

use std::fmt;

/// The RPC methods the simulation serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Method {
    /// Polled once per tick until the trainer asks to start.
    StartGymConnector,
    /// Pulls the training definition.
    RequestTrainingDefinition,
    /// Pulls the next post-reset state.
    RequestInitialTrainingState,
    /// Strict per-tick update/state exchange.
    UpdateState,
}

impl Method {
    /// Every method, in service order.
    pub const ALL: [Method; 4] = [
        Method::StartGymConnector,
        Method::RequestTrainingDefinition,
        Method::RequestInitialTrainingState,
        Method::UpdateState,
    ];

    /// Stable name, used in thread names and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::StartGymConnector => "start-gym-connector",
            Self::RequestTrainingDefinition => "training-definition",
            Self::RequestInitialTrainingState => "initial-training-state",
            Self::UpdateState => "update-state",
        }
    }

    /// gRPC path of the method on `tether.GymService`.
    pub fn grpc_path(self) -> &'static str {
        match self {
            Self::StartGymConnector => "/tether.GymService/StartGymConnector",
            Self::RequestTrainingDefinition => "/tether.GymService/RequestTrainingDefinition",
            Self::RequestInitialTrainingState => "/tether.GymService/RequestInitialTrainingState",
            Self::UpdateState => "/tether.GymService/UpdateState",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_and_paths_are_distinct() {
        let names: indexmap::IndexSet<_> = Method::ALL.iter().map(|m| m.as_str()).collect();
        let paths: indexmap::IndexSet<_> = Method::ALL.iter().map(|m| m.grpc_path()).collect();
        assert_eq!(names.len(), 4);
        assert_eq!(paths.len(), 4);
        assert!(paths.iter().all(|p| p.starts_with("/tether.GymService/")));
    }
}
