//! An agent driven by a local model instead of an external trainer.

use tether_core::AgentStatus;
use tether_interact::{Actuator, InteractionManager, Observer};
use tether_space::SpaceError;
use tracing::{info, warn};

use crate::brain::{BrainStatus, SynchronousBrain};

/// Couples an [`InteractionManager`] to a [`SynchronousBrain`].
///
/// Each tick the driver calls [`think`](Self::think) then
/// [`act`](Self::act). Any failure moves the agent to
/// [`AgentStatus::Error`], after which both phases are skipped.
#[derive(Debug)]
pub struct InferenceAgent {
    name: String,
    interaction: InteractionManager,
    brain: SynchronousBrain,
    status: AgentStatus,
}

impl InferenceAgent {
    /// An uninitialized agent.
    pub fn new(name: impl Into<String>, interaction: InteractionManager, brain: SynchronousBrain) -> Self {
        Self {
            name: name.into(),
            interaction,
            brain,
            status: AgentStatus::Running,
        }
    }

    /// Build the interaction spaces and size the policy's tensors.
    pub fn initialize(
        &mut self,
        observers: Vec<Box<dyn Observer>>,
        actuators: Vec<Box<dyn Actuator>>,
    ) -> Result<(), SpaceError> {
        self.interaction.initialize(observers, actuators)?;
        self.brain.policy_mut().init(self.interaction.definition());
        info!(agent = %self.name, "inference agent initialized");
        Ok(())
    }

    /// Agent name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current status.
    pub fn status(&self) -> AgentStatus {
        self.status
    }

    /// Override the status.
    pub fn set_status(&mut self, status: AgentStatus) {
        self.status = status;
    }

    /// The interaction manager.
    pub fn interaction(&self) -> &InteractionManager {
        &self.interaction
    }

    /// The brain.
    pub fn brain(&self) -> &SynchronousBrain {
        &self.brain
    }

    /// Mutable brain, for loading a model.
    pub fn brain_mut(&mut self) -> &mut SynchronousBrain {
        &mut self.brain
    }

    /// On decision steps, aggregate observations and request a decision.
    pub fn think(&mut self) {
        if !self.brain.is_decision_step() || self.status != AgentStatus::Running {
            return;
        }
        let result = match self.interaction.aggregate_observations() {
            Ok(obs) => self.brain.request_decision(obs).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };
        if let Err(reason) = result {
            warn!(agent = %self.name, %reason, "error during agent step");
            self.status = AgentStatus::Error;
        }
    }

    /// On action steps, resolve the decision and distribute it. Always
    /// advances the brain's step.
    pub fn act(&mut self) {
        if self.brain.is_action_step() && self.status == AgentStatus::Running {
            self.brain.resolve_decision();
            match self.brain.status() {
                BrainStatus::ActionReady => {
                    if let Some(action) = self.brain.action() {
                        if let Err(e) = self.interaction.distribute_actions(action) {
                            warn!(agent = %self.name, error = %e, "failed to distribute actions");
                            self.status = AgentStatus::Error;
                        }
                    }
                }
                BrainStatus::Error => {
                    warn!(agent = %self.name, "brain errored, agent disabled");
                    self.status = AgentStatus::Error;
                }
                BrainStatus::Idle => {}
            }
        }
        self.brain.increment_step();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BrainConfig;
    use crate::policy::InferencePolicy;
    use tether_core::PolicyError;
    use tether_interact::{DebugActuator, DebugBoxObserver};
    use tether_space::BoxSpace;

    fn agent(frequency: u32) -> InferenceAgent {
        let brain = SynchronousBrain::new(
            BrainConfig {
                decision_request_frequency: frequency,
                ..BrainConfig::default()
            },
            InferencePolicy::new(),
        );
        let mut a = InferenceAgent::new("runner", InteractionManager::new(false), brain);
        a.initialize(
            vec![Box::new(DebugBoxObserver::new("o", BoxSpace::uniform(2), 3))],
            vec![Box::new(DebugActuator::new("m", BoxSpace::uniform(2)))],
        )
        .unwrap();
        a
    }

    fn echo(input: &[f32], output: &mut [f32]) -> Result<(), PolicyError> {
        output.copy_from_slice(input);
        Ok(())
    }

    #[test]
    fn no_model_errors_the_agent_on_first_act() {
        let mut a = agent(1);
        a.think();
        assert_eq!(a.status(), AgentStatus::Running);
        a.act();
        assert_eq!(a.status(), AgentStatus::Error);
        assert_eq!(a.brain().step(), 1);

        // Errored agents are skipped but still step.
        a.think();
        a.act();
        assert_eq!(a.brain().step(), 2);
    }

    #[test]
    fn model_drives_actions_each_step() {
        let mut a = agent(2);
        a.brain_mut().policy_mut().load_model(Box::new(echo)).unwrap();
        for _ in 0..5 {
            a.think();
            a.act();
            assert_eq!(a.status(), AgentStatus::Running);
        }
        assert_eq!(a.brain().status(), BrainStatus::ActionReady);
        assert_eq!(a.brain().step(), 5);
    }
}
