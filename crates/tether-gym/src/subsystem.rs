//! The per-frame tick driver.
//!
//! [`Subsystem`] owns the gym connector, any locally-driven
//! [`InferenceAgent`]s, and the session's [`UidAuthority`]. Each
//! [`tick`](Subsystem::tick) runs, in order:
//!
//! 1. While the connector awaits a start signal, poll for one; on start,
//!    let inference agents think.
//! 2. If running, resolve the trainer's update and apply its status and
//!    environment updates.
//! 3. Inference agents act.
//! 4. If running, reset completed environments.
//! 5. If running, collect environment states and submit them.
//! 6. Inference agents think.
//! 7. If running and not the session's first tick, reset environments
//!    that completed during this tick.

use tracing::{info, warn};

use tether_core::{AgentStatus, UidAuthority};
use tether_policy::InferenceAgent;

use crate::connector::GymConnector;
use crate::environment::Environment;
use crate::error::ConnectorError;
use crate::settings::SubsystemSettings;
use crate::transport::RpcTransport;

/// Drives the connector and inference agents one tick at a time.
pub struct Subsystem {
    settings: SubsystemSettings,
    uids: UidAuthority,
    connector: Option<GymConnector>,
    inference_agents: Vec<InferenceAgent>,
    first_step: bool,
}

impl Subsystem {
    /// A subsystem serving the gym methods over gRPC if
    /// `enable_gym_connector` is set.
    pub fn new(settings: SubsystemSettings) -> Result<Self, ConnectorError> {
        settings.validate()?;
        let connector = if settings.enable_gym_connector {
            let transport = RpcTransport::new(settings.communicator.clone())?;
            Some(GymConnector::new(
                Box::new(transport),
                settings.communicator.timeout(),
            ))
        } else {
            None
        };
        Ok(Self::assemble(settings, connector))
    }

    /// A subsystem around a connector built elsewhere, such as one over
    /// a [`LocalTransport`](crate::LocalTransport).
    pub fn with_connector(settings: SubsystemSettings, connector: GymConnector) -> Self {
        Self::assemble(settings, Some(connector))
    }

    fn assemble(settings: SubsystemSettings, connector: Option<GymConnector>) -> Self {
        Self {
            settings,
            uids: UidAuthority::new(),
            connector,
            inference_agents: Vec::new(),
            first_step: true,
        }
    }

    /// The settings in force.
    pub fn settings(&self) -> &SubsystemSettings {
        &self.settings
    }

    /// The UID authority shared by every agent in the session.
    pub fn uids(&mut self) -> &mut UidAuthority {
        &mut self.uids
    }

    /// The gym connector, if enabled.
    pub fn connector(&self) -> Option<&GymConnector> {
        self.connector.as_ref()
    }

    /// Mutable gym connector, for registering callbacks.
    pub fn connector_mut(&mut self) -> Option<&mut GymConnector> {
        self.connector.as_mut()
    }

    /// Add an environment to the gym connector. Returns `false` when the
    /// connector is disabled.
    pub fn add_environment(&mut self, env: Box<dyn Environment>) -> bool {
        match &mut self.connector {
            Some(c) => {
                c.add_environment(env);
                true
            }
            None => {
                warn!("gym connector disabled, environment ignored");
                false
            }
        }
    }

    /// Register an already-initialized inference agent.
    pub fn register_inference_agent(&mut self, agent: InferenceAgent) {
        info!(agent = agent.name(), "inference agent registered");
        self.inference_agents.push(agent);
    }

    /// Registered inference agents.
    pub fn inference_agents(&self) -> &[InferenceAgent] {
        &self.inference_agents
    }

    /// Initialize environments and, if any agents registered, enable the
    /// connector's transport.
    pub fn prepare(&mut self) -> Result<(), ConnectorError> {
        let Some(connector) = &mut self.connector else {
            info!(
                inference_agents = self.inference_agents.len(),
                "subsystem prepared without gym connector"
            );
            return Ok(());
        };
        connector.init(&mut self.uids);
        let agents = connector.num_agents();
        if agents == 0 {
            info!("no trainer agents, gym connector not enabled");
            return Ok(());
        }
        connector.enable()?;
        info!(
            agents,
            inference_agents = self.inference_agents.len(),
            "subsystem prepared"
        );
        Ok(())
    }

    /// Run one tick.
    pub fn tick(&mut self) {
        let connector = self.connector.as_mut().filter(|c| c.is_enabled());
        let Some(connector) = connector else {
            Self::inference_act(&mut self.inference_agents);
            Self::inference_think(&mut self.inference_agents);
            return;
        };

        if connector.is_not_started() {
            self.first_step = true;
            if connector.check_for_start() {
                Self::inference_think(&mut self.inference_agents);
            }
        }

        if connector.is_running() {
            if let Some(update) = connector.resolve_update() {
                connector.update_connector_status(&update);
                connector.update_environments(&update);
            }
        }
        Self::inference_act(&mut self.inference_agents);
        if connector.is_running() {
            connector.reset_completed_environments();
        }

        if connector.is_running() {
            let state = connector.collect_environment_states();
            connector.submit_environment_states(&state);
        }
        Self::inference_think(&mut self.inference_agents);

        if !self.first_step && connector.is_running() {
            connector.reset_completed_environments();
        }
        self.first_step = false;
    }

    fn inference_think(agents: &mut [InferenceAgent]) {
        for agent in agents.iter_mut() {
            if agent.status() == AgentStatus::Error {
                continue;
            }
            agent.think();
        }
    }

    fn inference_act(agents: &mut [InferenceAgent]) {
        for agent in agents.iter_mut() {
            if agent.status() == AgentStatus::Error {
                warn!(agent = agent.name(), "skipping errored inference agent");
                continue;
            }
            agent.act();
        }
    }

    /// Stop inference workers and the connector's transport.
    pub fn shutdown(&mut self) {
        for agent in &mut self.inference_agents {
            agent.brain_mut().policy_mut().shutdown();
        }
        if let Some(c) = &mut self.connector {
            c.shutdown();
        }
        info!("subsystem shut down");
    }
}

impl std::fmt::Debug for Subsystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subsystem")
            .field("connector", &self.connector)
            .field("inference_agents", &self.inference_agents.len())
            .field("first_step", &self.first_step)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::{Trainer, TrainerAgent};
    use crate::transport::{LocalTrainer, LocalTransport, TrainerEvent};
    use indexmap::IndexMap;
    use std::time::Duration;
    use tether_core::{AgentTrainingStatus, ConnectorStatus};
    use tether_interact::{DebugActuator, DebugBoxObserver, InteractionManager};
    use tether_policy::{BrainConfig, InferencePolicy, SynchronousBrain};
    use tether_space::BoxSpace;
    use tether_wire::{EnvironmentStateUpdate, TrainingStateUpdate, UpdateStatus};

    struct EndsAfter(u32);

    impl Trainer for EndsAfter {
        fn compute_reward(&mut self) -> f32 {
            1.0
        }

        fn compute_status(&mut self) -> AgentTrainingStatus {
            if self.0 == 0 {
                return AgentTrainingStatus::Completed;
            }
            self.0 -= 1;
            AgentTrainingStatus::Running
        }

        fn reset_trainer(&mut self) {
            self.0 = 1;
        }
    }

    struct Track;

    impl Environment for Track {
        fn reset_environment(&mut self) {}

        fn register_agents(&mut self) -> Vec<TrainerAgent> {
            vec![TrainerAgent::new("car", Box::new(EndsAfter(1)))
                .with_observer(Box::new(DebugBoxObserver::new("speed", BoxSpace::uniform(1), 4)))
                .with_actuator(Box::new(DebugActuator::new("pedal", BoxSpace::uniform(1))))]
        }
    }

    fn subsystem() -> (Subsystem, LocalTrainer) {
        let (transport, trainer) = LocalTransport::pair();
        let connector = GymConnector::new(Box::new(transport), Duration::from_millis(200));
        let mut s = Subsystem::with_connector(SubsystemSettings::default(), connector);
        assert!(s.add_environment(Box::new(Track)));
        s.prepare().unwrap();
        (s, trainer)
    }

    fn inference_agent() -> InferenceAgent {
        let brain = SynchronousBrain::new(BrainConfig::default(), InferencePolicy::new());
        let mut agent = InferenceAgent::new("npc", InteractionManager::new(false), brain);
        agent
            .initialize(
                vec![Box::new(DebugBoxObserver::new("o", BoxSpace::uniform(1), 1))],
                vec![Box::new(DebugActuator::new("m", BoxSpace::uniform(1)))],
            )
            .unwrap();
        agent
    }

    #[test]
    fn idle_until_start_signal() {
        let (mut s, trainer) = subsystem();
        s.tick();
        s.tick();
        assert_eq!(s.connector().unwrap().status(), ConnectorStatus::NotStarted);
        assert!(trainer.try_event().is_none());
    }

    #[test]
    fn first_tick_resets_then_reports_state() {
        let (mut s, trainer) = subsystem();
        trainer.start();
        trainer.send_update(TrainingStateUpdate {
            status: UpdateStatus::None,
            updates: [(
                0u32,
                EnvironmentStateUpdate::Reset {
                    seed: None,
                    options: IndexMap::new(),
                },
            )]
            .into_iter()
            .collect(),
        });
        s.tick();

        let events = trainer.drain_events();
        assert_eq!(events.len(), 3, "{events:?}");
        assert!(matches!(events[0], TrainerEvent::Definition(_)));
        match &events[1] {
            TrainerEvent::InitialState(init) => assert!(init.environment_states.contains_key(&0u32)),
            other => panic!("unexpected {other:?}"),
        }
        match &events[2] {
            TrainerEvent::State(state) => {
                let agent = &state.environment_states[0].agent_states[&0u32];
                assert_eq!(agent.status, AgentTrainingStatus::Running);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn completed_environment_resets_after_first_tick() {
        let (mut s, trainer) = subsystem();
        trainer.start();
        trainer.send_update(TrainingStateUpdate::default());
        s.tick();
        trainer.drain_events();

        // Counter at 1 after init: Running, then Completed on the next think.
        trainer.send_update(TrainingStateUpdate::default());
        s.tick();
        let events = trainer.drain_events();
        assert!(matches!(events[0], TrainerEvent::State(_)));
        assert!(
            matches!(events.last(), Some(TrainerEvent::InitialState(_))),
            "{events:?}"
        );
    }

    #[test]
    fn timeout_stops_the_session() {
        let (mut s, trainer) = subsystem();
        trainer.start();
        s.tick();
        assert_eq!(s.connector().unwrap().status(), ConnectorStatus::Error);
        s.tick();
        assert_eq!(s.connector().unwrap().status(), ConnectorStatus::Error);
    }

    #[test]
    fn inference_agents_tick_without_connector() {
        let mut s = Subsystem::new(SubsystemSettings {
            enable_gym_connector: false,
            ..SubsystemSettings::default()
        })
        .unwrap();
        assert!(!s.add_environment(Box::new(Track)));
        s.register_inference_agent(inference_agent());
        s.prepare().unwrap();
        s.tick();
        s.tick();
        // No model loaded: the first act errors the agent.
        assert_eq!(s.inference_agents()[0].status(), AgentStatus::Error);
        s.shutdown();
    }
}
