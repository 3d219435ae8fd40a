use std::thread;
use std::time::{Duration, Instant};

use tether_comms::{CommsError, CommunicationManager, CommunicatorConfig, Method, TrainerClient};
use tether_wire::{
    EnvironmentState, InitialTrainingState, StartGymConnector, StartGymConnectorResponse,
    TrainingDefinition, TrainingState, TrainingStateUpdate, UpdateStatus,
};

const WAIT: Duration = Duration::from_secs(5);

fn manager() -> CommunicationManager {
    CommunicationManager::new(CommunicatorConfig {
        port: 0,
        ..Default::default()
    })
    .unwrap()
}

#[test]
fn full_session_over_loopback() {
    let mut m = manager();
    let start = m
        .create_polling_backend::<StartGymConnector, StartGymConnectorResponse>(
            "gym",
            Method::StartGymConnector,
        )
        .unwrap();
    let definitions = m
        .create_producer_backend::<TrainingDefinition>("gym", Method::RequestTrainingDefinition)
        .unwrap();
    let initial = m
        .create_producer_backend::<InitialTrainingState>(
            "gym",
            Method::RequestInitialTrainingState,
        )
        .unwrap();
    let mut exchange = m
        .create_exchange_backend::<TrainingStateUpdate, TrainingState>(
            "gym",
            Method::UpdateState,
        )
        .unwrap();
    m.start_backends().unwrap();
    let addr = m.local_addr().unwrap();

    let trainer = thread::spawn(move || {
        let mut client = TrainerClient::connect(addr, WAIT).unwrap();
        client.start().unwrap();
        let def = client.training_definition().unwrap();
        let init = client.initial_training_state().unwrap();
        let state = client
            .update_state(&TrainingStateUpdate::default())
            .unwrap();
        (def, init, state)
    });

    // Simulation side: poll until the start signal arrives.
    let deadline = Instant::now() + WAIT;
    while start.poll().unwrap().is_none() {
        assert!(Instant::now() < deadline, "start signal never arrived");
        thread::sleep(Duration::from_millis(1));
    }
    definitions
        .send(&TrainingDefinition {
            environment_definitions: vec![Default::default(); 2],
        })
        .unwrap();
    initial.send(&InitialTrainingState::default()).unwrap();

    let pending = exchange.receive().unwrap();
    let update = pending.wait_for(WAIT).unwrap().unwrap();
    assert_eq!(update.status, UpdateStatus::None);
    exchange
        .respond(&TrainingState {
            environment_states: vec![EnvironmentState::default()],
        })
        .unwrap();

    let (def, init, state) = trainer.join().unwrap();
    assert_eq!(def.environment_definitions.len(), 2);
    assert!(init.environment_states.is_empty());
    assert_eq!(state.environment_states.len(), 1);
    m.shutdown_server();
}

#[test]
fn unserved_method_is_unimplemented() {
    let mut m = manager();
    m.create_producer_backend::<TrainingDefinition>("gym", Method::RequestTrainingDefinition)
        .unwrap();
    m.start_backends().unwrap();

    let mut client = TrainerClient::connect(m.local_addr().unwrap(), WAIT).unwrap();
    assert!(matches!(
        client.update_state(&TrainingStateUpdate::default()),
        Err(CommsError::CallFailed {
            method: Method::UpdateState,
            code: tonic::Code::Unimplemented,
            ..
        })
    ));
    m.shutdown_server();
}

#[test]
fn malformed_payload_is_invalid_argument() {
    let mut m = manager();
    let _start = m
        .create_polling_backend::<StartGymConnector, StartGymConnectorResponse>(
            "gym",
            Method::StartGymConnector,
        )
        .unwrap();
    m.start_backends().unwrap();

    let mut client = TrainerClient::connect(m.local_addr().unwrap(), WAIT).unwrap();
    // A definition request is not a valid start frame.
    let result: Result<StartGymConnectorResponse, _> =
        client.call(Method::StartGymConnector, &TrainingDefinition::default());
    assert!(matches!(
        result,
        Err(CommsError::CallFailed {
            code: tonic::Code::InvalidArgument,
            ..
        })
    ));
    m.shutdown_server();
}

#[test]
fn connect_to_closed_port_fails() {
    let mut m = manager();
    m.start_backends().unwrap();
    let addr = m.local_addr().unwrap();
    m.shutdown_server();
    assert!(matches!(
        TrainerClient::connect(addr, Duration::from_millis(500)),
        Err(CommsError::Connect { .. })
    ));
}

#[test]
fn shutdown_unblocks_trainer_waiting_on_exchange() {
    let mut m = manager();
    let _exchange = m
        .create_exchange_backend::<TrainingStateUpdate, TrainingState>(
            "gym",
            Method::UpdateState,
        )
        .unwrap();
    m.start_backends().unwrap();
    let addr = m.local_addr().unwrap();

    let trainer = thread::spawn(move || {
        let mut client = TrainerClient::connect(addr, WAIT).unwrap();
        client.update_state(&TrainingStateUpdate::default())
    });
    // Give the call time to reach the backend before shutting down.
    thread::sleep(Duration::from_millis(100));
    m.shutdown_server();

    match trainer.join().unwrap() {
        Ok(state) => assert_eq!(state, TrainingState::default()),
        Err(e) => assert!(
            matches!(
                e,
                CommsError::CallFailed {
                    code: tonic::Code::Cancelled | tonic::Code::Unavailable,
                    ..
                }
            ),
            "{e}"
        ),
    }
}
