//! Reusable training fixtures.
//!
//! - [`ScriptedTrainer`]: fixed reward, completes after a set number of steps.
//! - [`ScriptedEnvironment`]: registers scripted agents and records
//!   every reset, seed, and option set it receives.

use std::sync::{Arc, Mutex};

use indexmap::IndexMap;
use tether_core::{AgentIndex, AgentTrainingStatus};
use tether_gym::{Environment, Trainer, TrainerAgent, TrainerState};
use tether_space::BoxSpace;

use crate::{ActionLog, ConstantObserver, RecordingActuator};

/// Earns `reward` each step and completes after `episode_length` steps.
///
/// `reset_trainer` restarts the count.
#[derive(Clone, Debug)]
pub struct ScriptedTrainer {
    reward: f32,
    episode_length: u32,
    elapsed: u32,
}

impl ScriptedTrainer {
    pub fn new(reward: f32, episode_length: u32) -> Self {
        Self {
            reward,
            episode_length,
            elapsed: 0,
        }
    }
}

impl Trainer for ScriptedTrainer {
    fn compute_reward(&mut self) -> f32 {
        self.reward
    }

    fn compute_status(&mut self) -> AgentTrainingStatus {
        self.elapsed += 1;
        if self.elapsed >= self.episode_length {
            AgentTrainingStatus::Completed
        } else {
            AgentTrainingStatus::Running
        }
    }

    fn info(&mut self, info: &mut IndexMap<String, String>) {
        info.insert("elapsed".into(), self.elapsed.to_string());
    }

    fn reset_trainer(&mut self) {
        self.elapsed = 0;
    }
}

/// What a [`ScriptedEnvironment`] has been asked to do.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EnvironmentLog {
    pub resets: usize,
    pub seeds: Vec<u64>,
    pub options: Vec<IndexMap<String, String>>,
    pub agent_steps: usize,
}

/// Environment whose agents each observe one constant Box value and
/// act through a [`RecordingActuator`].
#[derive(Debug)]
pub struct ScriptedEnvironment {
    agents: usize,
    episode_length: u32,
    log: Arc<Mutex<EnvironmentLog>>,
    actions: Vec<ActionLog>,
}

impl ScriptedEnvironment {
    /// `agents` agents whose episodes last `episode_length` steps.
    pub fn new(agents: usize, episode_length: u32) -> Self {
        Self {
            agents,
            episode_length,
            log: Arc::default(),
            actions: Vec::new(),
        }
    }

    /// Handle to the environment's call log.
    pub fn log(&self) -> Arc<Mutex<EnvironmentLog>> {
        Arc::clone(&self.log)
    }

    /// Action logs, one per agent, in registration order. Take them
    /// before boxing the environment.
    pub fn action_logs(&mut self) -> Vec<ActionLog> {
        if self.actions.is_empty() {
            self.actions = (0..self.agents).map(|_| ActionLog::default()).collect();
        }
        self.actions.clone()
    }
}

impl Environment for ScriptedEnvironment {
    fn reset_environment(&mut self) {
        if let Ok(mut log) = self.log.lock() {
            log.resets += 1;
        }
    }

    fn seed(&mut self, seed: u64) {
        if let Ok(mut log) = self.log.lock() {
            log.seeds.push(seed);
        }
    }

    fn set_options(&mut self, options: &IndexMap<String, String>) {
        if let Ok(mut log) = self.log.lock() {
            log.options.push(options.clone());
        }
    }

    fn register_agents(&mut self) -> Vec<TrainerAgent> {
        let logs = self.action_logs();
        logs.into_iter()
            .enumerate()
            .map(|(i, actions)| {
                let (actuator, _) = RecordingActuator::new("move", BoxSpace::uniform(1));
                let actuator = actuator.with_log(actions);
                TrainerAgent::new(
                    format!("agent_{i}"),
                    Box::new(ScriptedTrainer::new(1.0, self.episode_length)),
                )
                .with_observer(Box::new(ConstantObserver::new("pos", vec![i as f32 * 0.1])))
                .with_actuator(Box::new(actuator))
            })
            .collect()
    }

    fn on_agent_step(&mut self, _agent: AgentIndex, _state: &TrainerState) {
        if let Ok(mut log) = self.log.lock() {
            log.agent_steps += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trainer_completes_then_restarts() {
        let mut t = ScriptedTrainer::new(0.5, 2);
        assert_eq!(t.compute_status(), AgentTrainingStatus::Running);
        assert_eq!(t.compute_status(), AgentTrainingStatus::Completed);
        t.reset_trainer();
        assert_eq!(t.compute_status(), AgentTrainingStatus::Running);
        assert_eq!(t.compute_reward(), 0.5);
    }

    #[test]
    fn environment_registers_requested_agents() {
        let mut env = ScriptedEnvironment::new(3, 5);
        let logs = env.action_logs();
        let agents = env.register_agents();
        assert_eq!(agents.len(), 3);
        assert_eq!(logs.len(), 3);
        env.seed(7);
        env.reset_environment();
        let log = env.log();
        let log = log.lock().unwrap();
        assert_eq!(log.seeds, vec![7]);
        assert_eq!(log.resets, 1);
    }
}
