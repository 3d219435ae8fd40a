//! Blocking trainer-side client.

use std::net::SocketAddr;
use std::time::Duration;

use tokio::runtime::{Builder, Runtime};
use tokio::time::timeout;
use tonic::transport::Channel;
use tonic::Request;

use tether_wire::{
    decode_frame, encode_frame, InitialTrainingState, InitialTrainingStateRequest,
    StartGymConnector, StartGymConnectorResponse, TrainingDefinition, TrainingDefinitionRequest,
    TrainingState, TrainingStateUpdate, WireMessage,
};

use crate::error::CommsError;
use crate::method::Method;
use crate::proto::gym_service_client::GymServiceClient;
use crate::proto::WireFrame;

/// Calls the simulation's gym service one method at a time.
///
/// Owns a single-threaded runtime so callers stay synchronous.
#[derive(Debug)]
pub struct TrainerClient {
    runtime: Runtime,
    client: GymServiceClient<Channel>,
    timeout: Duration,
}

impl TrainerClient {
    /// Connect to `addr`. Connecting and every call fail once `timeout`
    /// passes without an answer.
    pub fn connect(addr: SocketAddr, timeout: Duration) -> Result<Self, CommsError> {
        let runtime = Builder::new_current_thread().enable_all().build()?;
        let address = format!("http://{addr}");
        let connect_failed = |reason: String| CommsError::Connect {
            address: address.clone(),
            reason,
        };
        let endpoint = Channel::from_shared(address.clone())
            .map_err(|e| connect_failed(e.to_string()))?
            .connect_timeout(timeout);
        let channel = runtime
            .block_on(endpoint.connect())
            .map_err(|e| connect_failed(e.to_string()))?;
        Ok(Self {
            runtime,
            client: GymServiceClient::new(channel),
            timeout,
        })
    }

    /// Issue one call and wait for its response.
    pub fn call<Req, Resp>(&mut self, method: Method, request: &Req) -> Result<Resp, CommsError>
    where
        Req: WireMessage,
        Resp: WireMessage,
    {
        let request = Request::new(WireFrame {
            payload: encode_frame(request),
        });
        let limit = self.timeout;
        let client = &mut self.client;
        let call = async move {
            match method {
                Method::StartGymConnector => client.start_gym_connector(request).await,
                Method::RequestTrainingDefinition => {
                    client.request_training_definition(request).await
                }
                Method::RequestInitialTrainingState => {
                    client.request_initial_training_state(request).await
                }
                Method::UpdateState => client.update_state(request).await,
            }
        };
        // The timer must be created inside the runtime.
        let reply = self
            .runtime
            .block_on(async move { timeout(limit, call).await });
        let response = reply
            .map_err(|_| CommsError::TimedOut { method })?
            .map_err(|status| CommsError::from_status(method, &status))?;
        Ok(decode_frame(&response.into_inner().payload)?)
    }

    /// Ask the simulation to start a session.
    pub fn start(&mut self) -> Result<StartGymConnectorResponse, CommsError> {
        self.call(Method::StartGymConnector, &StartGymConnector)
    }

    /// Pull the training definition.
    pub fn training_definition(&mut self) -> Result<TrainingDefinition, CommsError> {
        self.call(
            Method::RequestTrainingDefinition,
            &TrainingDefinitionRequest,
        )
    }

    /// Pull the next post-reset state.
    pub fn initial_training_state(&mut self) -> Result<InitialTrainingState, CommsError> {
        self.call(
            Method::RequestInitialTrainingState,
            &InitialTrainingStateRequest,
        )
    }

    /// Send one tick's update and wait for the resulting state.
    pub fn update_state(&mut self, update: &TrainingStateUpdate) -> Result<TrainingState, CommsError> {
        self.call(Method::UpdateState, update)
    }
}
