use std::time::Duration;

use indexmap::IndexMap;
use tether_core::AgentTrainingStatus;
use tether_gym::{GymConnector, LocalTransport, Subsystem, SubsystemSettings, TrainerEvent};
use tether_space::{BoxPoint, DictPoint, Point};
use tether_test_utils::ScriptedEnvironment;
use tether_wire::{
    dict_point_to_msg, AgentStateUpdate, EnvironmentStateUpdate, TrainingStateUpdate, UpdateStatus,
};

fn one_env(update: EnvironmentStateUpdate) -> TrainingStateUpdate {
    TrainingStateUpdate {
        status: UpdateStatus::None,
        updates: [(0u32, update)].into_iter().collect(),
    }
}

fn step(value: f32, agents: u32) -> EnvironmentStateUpdate {
    let action = DictPoint::new(vec![Point::Box(BoxPoint::new(vec![value]))]);
    EnvironmentStateUpdate::Step {
        updates: (0..agents)
            .map(|i| {
                (
                    i,
                    AgentStateUpdate {
                        actions: dict_point_to_msg(&action),
                    },
                )
            })
            .collect(),
    }
}

#[test]
fn scripted_episode_runs_to_completion_and_resets() {
    let mut env = ScriptedEnvironment::new(2, 2);
    let log = env.log();
    let actions = env.action_logs();

    let (transport, trainer) = LocalTransport::pair();
    let connector = GymConnector::new(Box::new(transport), Duration::from_secs(1));
    let mut sim = Subsystem::with_connector(SubsystemSettings::default(), connector);
    sim.add_environment(Box::new(env));
    sim.prepare().unwrap();

    trainer.start();
    let options: IndexMap<String, String> = [("mode".to_string(), "fast".to_string())]
        .into_iter()
        .collect();
    trainer.send_update(one_env(EnvironmentStateUpdate::Reset {
        seed: Some(11),
        options: options.clone(),
    }));
    sim.tick();

    let events = trainer.drain_events();
    assert_eq!(events.len(), 3, "{events:?}");
    assert!(matches!(events[0], TrainerEvent::Definition(_)));
    assert!(matches!(events[1], TrainerEvent::InitialState(_)));
    {
        let log = log.lock().unwrap();
        assert_eq!(log.seeds, vec![11]);
        assert_eq!(log.options, vec![options]);
        assert_eq!(log.resets, 1);
    }

    trainer.send_update(one_env(step(0.5, 2)));
    sim.tick();

    let events = trainer.drain_events();
    assert_eq!(events.len(), 2, "{events:?}");
    match &events[0] {
        TrainerEvent::State(state) => {
            let agents = &state.environment_states[0].agent_states;
            assert_eq!(agents.len(), 2);
            for agent in agents.values() {
                assert_eq!(agent.status, AgentTrainingStatus::Completed);
                assert_eq!(agent.reward, 1.0);
            }
        }
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(events[1], TrainerEvent::InitialState(_)));

    for agent_actions in &actions {
        let recorded = agent_actions.lock().unwrap();
        assert_eq!(*recorded, vec![Point::Box(BoxPoint::new(vec![0.5]))]);
    }
    let log = log.lock().unwrap();
    assert_eq!(log.resets, 2);
    assert_eq!(log.agent_steps, 4);
}

#[test]
fn closing_update_ends_the_session() {
    let (transport, trainer) = LocalTransport::pair();
    let connector = GymConnector::new(Box::new(transport), Duration::from_secs(1));
    let mut sim = Subsystem::with_connector(SubsystemSettings::default(), connector);
    sim.add_environment(Box::new(ScriptedEnvironment::new(1, 10)));
    sim.prepare().unwrap();

    trainer.start();
    trainer.send_update(TrainingStateUpdate {
        status: UpdateStatus::Closed,
        updates: IndexMap::new(),
    });
    sim.tick();
    assert!(!sim.connector().unwrap().is_running());
    sim.shutdown();
}
