//! End-to-end training loop over the in-process transport.
//!
//! Demonstrates: register environments → start session → reset → step
//! with actions → read rewards → episode completes → automatic reset,
//! with a locally-driven inference agent ticking alongside.

use std::time::Duration;

use tether_gym::{GymConnector, LocalTransport, Subsystem, SubsystemSettings, TrainerEvent};
use tether_interact::InteractionManager;
use tether_policy::{BrainConfig, InferenceAgent, InferencePolicy, SynchronousBrain};
use tether_space::{BoxPoint, BoxSpace, DictPoint, Point};
use tether_test_utils::{ConstantModel, ConstantObserver, RecordingActuator, ScriptedEnvironment};
use tether_wire::{
    dict_point_to_msg, AgentStateUpdate, EnvironmentStateUpdate, TrainingStateUpdate,
};

const ENVS: u32 = 2;
const AGENTS: u32 = 2;

fn main() {
    println!("=== Tether Local Training Loop ===\n");

    let (transport, trainer) = LocalTransport::pair();
    let connector = GymConnector::new(Box::new(transport), Duration::from_secs(5));
    let mut sim = Subsystem::with_connector(SubsystemSettings::default(), connector);
    for _ in 0..ENVS {
        sim.add_environment(Box::new(ScriptedEnvironment::new(AGENTS as usize, 5)));
    }

    let brain = SynchronousBrain::new(BrainConfig::default(), InferencePolicy::new());
    let mut npc = InferenceAgent::new("npc", InteractionManager::new(false), brain);
    let (actuator, npc_actions) = RecordingActuator::new("steer", BoxSpace::uniform(1));
    npc.initialize(
        vec![Box::new(ConstantObserver::new("heading", vec![0.25]))],
        vec![Box::new(actuator)],
    )
    .unwrap();
    npc.brain_mut()
        .policy_mut()
        .load_model(Box::new(ConstantModel(0.5)))
        .unwrap();
    sim.register_inference_agent(npc);
    sim.prepare().unwrap();

    trainer.start();
    trainer.send_update(TrainingStateUpdate {
        updates: (0..ENVS)
            .map(|e| {
                (
                    e,
                    EnvironmentStateUpdate::Reset {
                        seed: Some(u64::from(e)),
                        options: Default::default(),
                    },
                )
            })
            .collect(),
        ..TrainingStateUpdate::default()
    });
    sim.tick();
    for event in trainer.drain_events() {
        if let TrainerEvent::Definition(def) = event {
            println!(
                "Definition: {} environments, {} agents in env 0",
                def.environment_definitions.len(),
                def.environment_definitions[0].agent_definitions.len()
            );
        }
    }

    let mut total_reward = 0.0f32;
    let mut episodes = 0usize;
    for step in 0..20u32 {
        let value = (step % 4) as f32 * 0.25 - 0.5;
        let action = dict_point_to_msg(&DictPoint::new(vec![Point::Box(BoxPoint::new(vec![value]))]));
        trainer.send_update(TrainingStateUpdate {
            updates: (0..ENVS)
                .map(|e| {
                    let agents = (0..AGENTS)
                        .map(|a| {
                            (
                                a,
                                AgentStateUpdate {
                                    actions: action.clone(),
                                },
                            )
                        })
                        .collect();
                    (e, EnvironmentStateUpdate::Step { updates: agents })
                })
                .collect(),
            ..TrainingStateUpdate::default()
        });
        sim.tick();

        for event in trainer.drain_events() {
            match event {
                TrainerEvent::State(state) => {
                    let reward: f32 = state
                        .environment_states
                        .iter()
                        .flat_map(|env| env.agent_states.values())
                        .map(|agent| agent.reward)
                        .sum();
                    total_reward += reward;
                }
                TrainerEvent::InitialState(init) => {
                    episodes += init.environment_states.len();
                }
                TrainerEvent::Definition(_) => {}
            }
        }
        if step % 5 == 4 {
            println!("  step {step:2}: total reward {total_reward:6.1}, resets {episodes}");
        }
    }

    let npc_acted = npc_actions.lock().map(|log| log.len()).unwrap_or(0);
    println!("\nInference agent applied {npc_acted} actions");
    sim.shutdown();
    println!("Done.");
}
