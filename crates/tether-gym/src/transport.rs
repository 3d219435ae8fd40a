//! How a [`GymConnector`](crate::GymConnector) talks to its trainer.
//!
//! [`RpcTransport`] serves the four gym methods as a gRPC service
//! through a [`CommunicationManager`]. [`LocalTransport`] wires the same calls to
//! an in-process [`LocalTrainer`] over channels, for tests and for
//! trainers embedded in the simulation process.

use std::net::SocketAddr;
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender, TryRecvError};
use tracing::{debug, info};

use tether_comms::{
    CommunicationManager, CommunicatorConfig, ExchangeBackend, Method, PendingRequest,
    PollingBackend, ProducerBackend,
};
use tether_wire::{
    InitialTrainingState, StartGymConnector, StartGymConnectorResponse, TrainingDefinition,
    TrainingState, TrainingStateUpdate,
};

use crate::error::ConnectorError;

const GYM_SERVICE: &str = "gym";

/// The trainer-facing half of a connector.
pub trait ConnectorTransport: Send {
    /// Bring the transport up.
    fn enable(&mut self) -> Result<(), ConnectorError>;

    /// Non-blocking: has the trainer asked to start a session?
    fn check_for_start(&mut self) -> Result<bool, ConnectorError>;

    /// A session started; publish the definition.
    fn on_started(&mut self, definition: &TrainingDefinition) -> Result<(), ConnectorError>;

    /// The trainer closed the session.
    fn on_closed(&mut self) -> Result<(), ConnectorError> {
        Ok(())
    }

    /// The session failed.
    fn on_error(&mut self) -> Result<(), ConnectorError> {
        Ok(())
    }

    /// Wait up to `timeout` for the trainer's next update. `Ok(None)`
    /// means nothing arrived in time.
    fn request_update(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<TrainingStateUpdate>, ConnectorError>;

    /// Answer the last update with the collected state.
    fn submit_state(&mut self, state: &TrainingState) -> Result<(), ConnectorError>;

    /// Publish the states of environments that were just reset.
    fn submit_post_reset_state(&mut self, state: &InitialTrainingState) -> Result<(), ConnectorError>;

    /// The address the trainer should dial, for network transports.
    fn local_addr(&self) -> Option<SocketAddr> {
        None
    }

    /// Release every resource.
    fn shutdown(&mut self) {}
}

// ── RpcTransport ────────────────────────────────────────────────

/// Serves the gym methods over gRPC.
///
/// | Method | Backend |
/// |--------|---------|
/// | `StartGymConnector` | polling |
/// | `RequestTrainingDefinition` | producer |
/// | `RequestInitialTrainingState` | producer |
/// | `UpdateState` | exchange |
///
/// A closed or failed session answers any update it has taken with an
/// empty [`TrainingState`] so the trainer is never left waiting.
pub struct RpcTransport {
    manager: CommunicationManager,
    start: PollingBackend<StartGymConnector>,
    definitions: ProducerBackend<TrainingDefinition>,
    initial_states: ProducerBackend<InitialTrainingState>,
    updates: ExchangeBackend<TrainingStateUpdate, TrainingState>,
    pending: Option<PendingRequest<TrainingStateUpdate>>,
}

impl RpcTransport {
    /// Register every backend. Nothing is bound until
    /// [`enable`](ConnectorTransport::enable).
    pub fn new(config: CommunicatorConfig) -> Result<Self, ConnectorError> {
        let mut manager = CommunicationManager::new(config)?;
        let start = manager.create_polling_backend::<StartGymConnector, StartGymConnectorResponse>(
            GYM_SERVICE,
            Method::StartGymConnector,
        )?;
        let definitions = manager
            .create_producer_backend::<TrainingDefinition>(GYM_SERVICE, Method::RequestTrainingDefinition)?;
        let initial_states = manager.create_producer_backend::<InitialTrainingState>(
            GYM_SERVICE,
            Method::RequestInitialTrainingState,
        )?;
        let updates = manager
            .create_exchange_backend::<TrainingStateUpdate, TrainingState>(GYM_SERVICE, Method::UpdateState)?;
        Ok(Self {
            manager,
            start,
            definitions,
            initial_states,
            updates,
            pending: None,
        })
    }

    fn release_exchange(&mut self) -> Result<(), ConnectorError> {
        // An undelivered request keeps its exchange open for the next session.
        if self.pending.is_some() {
            return Ok(());
        }
        if self.updates.in_exchange() {
            self.updates.respond(&TrainingState::default())?;
            debug!("answered open exchange with an empty state");
        }
        Ok(())
    }
}

impl ConnectorTransport for RpcTransport {
    fn enable(&mut self) -> Result<(), ConnectorError> {
        self.manager.start_backends()?;
        Ok(())
    }

    fn check_for_start(&mut self) -> Result<bool, ConnectorError> {
        Ok(self.start.poll()?.is_some())
    }

    fn on_started(&mut self, definition: &TrainingDefinition) -> Result<(), ConnectorError> {
        self.definitions.send(definition)?;
        Ok(())
    }

    fn on_closed(&mut self) -> Result<(), ConnectorError> {
        self.release_exchange()
    }

    fn on_error(&mut self) -> Result<(), ConnectorError> {
        self.release_exchange()
    }

    fn request_update(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<TrainingStateUpdate>, ConnectorError> {
        let pending = match self.pending.take() {
            Some(p) => p,
            None => self.updates.receive()?,
        };
        match pending.wait_for(timeout) {
            Some(result) => Ok(Some(result?)),
            None => {
                self.pending = Some(pending);
                Ok(None)
            }
        }
    }

    fn submit_state(&mut self, state: &TrainingState) -> Result<(), ConnectorError> {
        self.updates.respond(state)?;
        Ok(())
    }

    fn submit_post_reset_state(&mut self, state: &InitialTrainingState) -> Result<(), ConnectorError> {
        self.initial_states.send(state)?;
        Ok(())
    }

    fn local_addr(&self) -> Option<SocketAddr> {
        self.manager.local_addr()
    }

    fn shutdown(&mut self) {
        self.pending = None;
        self.manager.shutdown_server();
    }
}

impl std::fmt::Debug for RpcTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RpcTransport")
            .field("manager", &self.manager)
            .field("in_exchange", &self.updates.in_exchange())
            .finish()
    }
}

// ── LocalTransport ──────────────────────────────────────────────

/// What the simulation sent to a [`LocalTrainer`].
#[derive(Clone, Debug, PartialEq)]
pub enum TrainerEvent {
    /// Published when a session starts.
    Definition(TrainingDefinition),
    /// States of freshly reset environments.
    InitialState(InitialTrainingState),
    /// The answer to an update.
    State(TrainingState),
}

/// Simulation end of an in-process transport.
#[derive(Debug)]
pub struct LocalTransport {
    start_rx: Receiver<()>,
    update_rx: Receiver<TrainingStateUpdate>,
    event_tx: Sender<TrainerEvent>,
    awaiting_state: bool,
}

/// Trainer end of an in-process transport.
#[derive(Debug)]
pub struct LocalTrainer {
    start_tx: Sender<()>,
    update_tx: Sender<TrainingStateUpdate>,
    event_rx: Receiver<TrainerEvent>,
}

impl LocalTransport {
    /// A connected pair.
    pub fn pair() -> (LocalTransport, LocalTrainer) {
        let (start_tx, start_rx) = unbounded();
        let (update_tx, update_rx) = unbounded();
        let (event_tx, event_rx) = unbounded();
        (
            LocalTransport {
                start_rx,
                update_rx,
                event_tx,
                awaiting_state: false,
            },
            LocalTrainer {
                start_tx,
                update_tx,
                event_rx,
            },
        )
    }

    fn emit(&self, event: TrainerEvent) -> Result<(), ConnectorError> {
        self.event_tx
            .send(event)
            .map_err(|_| ConnectorError::TrainerGone)
    }

    fn release_exchange(&mut self) -> Result<(), ConnectorError> {
        if std::mem::take(&mut self.awaiting_state) {
            self.emit(TrainerEvent::State(TrainingState::default()))?;
        }
        Ok(())
    }
}

impl ConnectorTransport for LocalTransport {
    fn enable(&mut self) -> Result<(), ConnectorError> {
        info!("local transport enabled");
        Ok(())
    }

    fn check_for_start(&mut self) -> Result<bool, ConnectorError> {
        match self.start_rx.try_recv() {
            Ok(()) => Ok(true),
            Err(TryRecvError::Empty) => Ok(false),
            Err(TryRecvError::Disconnected) => Err(ConnectorError::TrainerGone),
        }
    }

    fn on_started(&mut self, definition: &TrainingDefinition) -> Result<(), ConnectorError> {
        self.emit(TrainerEvent::Definition(definition.clone()))
    }

    fn on_closed(&mut self) -> Result<(), ConnectorError> {
        self.release_exchange()
    }

    fn on_error(&mut self) -> Result<(), ConnectorError> {
        self.release_exchange()
    }

    fn request_update(
        &mut self,
        timeout: Duration,
    ) -> Result<Option<TrainingStateUpdate>, ConnectorError> {
        match self.update_rx.recv_timeout(timeout) {
            Ok(update) => {
                self.awaiting_state = true;
                Ok(Some(update))
            }
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ConnectorError::TrainerGone),
        }
    }

    fn submit_state(&mut self, state: &TrainingState) -> Result<(), ConnectorError> {
        self.awaiting_state = false;
        self.emit(TrainerEvent::State(state.clone()))
    }

    fn submit_post_reset_state(&mut self, state: &InitialTrainingState) -> Result<(), ConnectorError> {
        self.emit(TrainerEvent::InitialState(state.clone()))
    }
}

impl LocalTrainer {
    /// Ask the simulation to start a session.
    pub fn start(&self) {
        let _ = self.start_tx.send(());
    }

    /// Queue the next update.
    pub fn send_update(&self, update: TrainingStateUpdate) {
        let _ = self.update_tx.send(update);
    }

    /// The next event, if one is already waiting.
    pub fn try_event(&self) -> Option<TrainerEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Every event waiting now, oldest first.
    pub fn drain_events(&self) -> Vec<TrainerEvent> {
        self.event_rx.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_pair_round_trips_calls() {
        let (mut sim, trainer) = LocalTransport::pair();
        assert!(!sim.check_for_start().unwrap());
        trainer.start();
        assert!(sim.check_for_start().unwrap());

        assert_eq!(sim.request_update(Duration::from_millis(1)).unwrap(), None);
        trainer.send_update(TrainingStateUpdate::default());
        let update = sim.request_update(Duration::from_millis(100)).unwrap();
        assert_eq!(update, Some(TrainingStateUpdate::default()));
        sim.submit_state(&TrainingState::default()).unwrap();
        assert_eq!(
            trainer.drain_events(),
            vec![TrainerEvent::State(TrainingState::default())]
        );
    }

    #[test]
    fn close_answers_open_exchange_once() {
        let (mut sim, trainer) = LocalTransport::pair();
        trainer.send_update(TrainingStateUpdate::default());
        sim.request_update(Duration::from_millis(100)).unwrap();
        sim.on_closed().unwrap();
        sim.on_closed().unwrap();
        assert_eq!(trainer.drain_events().len(), 1);
    }

    #[test]
    fn dropped_trainer_is_reported() {
        let (mut sim, trainer) = LocalTransport::pair();
        drop(trainer);
        assert_eq!(sim.check_for_start(), Err(ConnectorError::TrainerGone));
        assert_eq!(
            sim.submit_state(&TrainingState::default()),
            Err(ConnectorError::TrainerGone)
        );
    }

    #[test]
    fn rpc_transport_registers_all_gym_methods() {
        let transport = RpcTransport::new(CommunicatorConfig {
            port: 0,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(transport.manager.num_backends(), Method::ALL.len());
        assert!(transport.local_addr().is_none());
    }
}
