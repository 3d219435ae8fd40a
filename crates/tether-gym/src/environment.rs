//! Environments and the host that drives their agents.

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use tether_core::{
    AgentIndex, AgentKey, AgentTrainingStatus, EnvId, EnvironmentStatus, TrainingMsgStatus,
    UidAuthority,
};
use tether_wire::{
    dict_point_from_msg, AgentStateUpdate, EnvironmentDefinition, EnvironmentState,
    InitialEnvironmentState,
};

use crate::trainer::{TrainerAgent, TrainerState};

/// Environment-level logic supplied by the simulation.
pub trait Environment: Send {
    /// One-time setup before agents are registered.
    fn initialize_environment(&mut self) {}

    /// Return the environment to a starting configuration. Agents are
    /// reset afterwards by the host.
    fn reset_environment(&mut self);

    /// Seed the environment's randomness for the next reset.
    fn seed(&mut self, seed: u64) {
        let _ = seed;
    }

    /// Apply trainer-supplied reset options.
    fn set_options(&mut self, options: &IndexMap<String, String>) {
        let _ = options;
    }

    /// The agents taking part. Called once, after
    /// [`initialize_environment`](Self::initialize_environment).
    fn register_agents(&mut self) -> Vec<TrainerAgent>;

    /// Called after each agent thinks, with its fresh state.
    fn on_agent_step(&mut self, agent: AgentIndex, state: &TrainerState) {
        let _ = (agent, state);
    }
}

/// Owns one [`Environment`] and its registered [`TrainerAgent`]s.
///
/// Agents are keyed by [`AgentIndex`], assigned in ascending order as
/// they initialize. An agent whose initialization fails is dropped
/// without consuming an index.
pub struct EnvironmentHost {
    env: Box<dyn Environment>,
    id: EnvId,
    agents: IndexMap<AgentIndex, TrainerAgent>,
    status: EnvironmentStatus,
}

impl EnvironmentHost {
    /// Wrap `env`. Nothing runs until [`initialize`](Self::initialize).
    pub fn new(env: Box<dyn Environment>) -> Self {
        Self {
            env,
            id: EnvId::default(),
            agents: IndexMap::new(),
            status: EnvironmentStatus::Running,
        }
    }

    /// Set up the environment and register its agents under `id`.
    pub fn initialize(&mut self, id: EnvId, uids: &mut UidAuthority) {
        self.id = id;
        self.env.initialize_environment();
        for mut agent in self.env.register_agents() {
            let index = self.next_index();
            match agent.initialize(AgentKey::new(id, index), uids) {
                Ok(()) => {
                    self.agents.insert(index, agent);
                }
                Err(e) => {
                    warn!(env_id = %id, agent = agent.name(), error = %e, "agent failed to initialize, skipping");
                }
            }
        }
        if self.agents.is_empty() {
            warn!(env_id = %id, "environment has no agents");
        }
        info!(env_id = %id, agents = self.agents.len(), "environment initialized");
    }

    fn next_index(&self) -> AgentIndex {
        self.agents
            .keys()
            .max()
            .map_or(AgentIndex(0), |max| AgentIndex(max.0 + 1))
    }

    /// Identifier assigned at initialization.
    pub fn id(&self) -> EnvId {
        self.id
    }

    /// Current status.
    pub fn status(&self) -> EnvironmentStatus {
        self.status
    }

    /// Override the status.
    pub fn set_status(&mut self, status: EnvironmentStatus) {
        self.status = status;
    }

    /// Flag the environment for reset on the next pass.
    pub fn mark_completed(&mut self) {
        self.status = EnvironmentStatus::Completed;
    }

    /// Number of registered agents.
    pub fn num_agents(&self) -> usize {
        self.agents.len()
    }

    /// Look up an agent.
    pub fn agent(&self, index: AgentIndex) -> Option<&TrainerAgent> {
        self.agents.get(&index)
    }

    /// Agents in ascending index order.
    pub fn agents(&self) -> impl Iterator<Item = (AgentIndex, &TrainerAgent)> {
        self.agents.iter().map(|(i, a)| (*i, a))
    }

    /// Forward a seed to the environment.
    pub fn seed(&mut self, seed: u64) {
        self.env.seed(seed);
    }

    /// Forward reset options to the environment.
    pub fn set_options(&mut self, options: &IndexMap<String, String>) {
        self.env.set_options(options);
    }

    /// Reset the environment, then every agent.
    pub fn reset(&mut self) {
        self.env.reset_environment();
        for agent in self.agents.values_mut() {
            agent.reset();
        }
        debug!(env_id = %self.id, "environment reset");
    }

    /// Let every agent think. Marks the environment completed once all of
    /// its agents are done; an environment without agents never completes.
    pub fn all_agents_think(&mut self) {
        let mut all_done = !self.agents.is_empty();
        for (index, agent) in self.agents.iter_mut() {
            let state = agent.think();
            self.env.on_agent_step(*index, state);
            all_done &= state.is_done();
        }
        if all_done {
            self.status = EnvironmentStatus::Completed;
        }
    }

    /// Apply one step's actions. Agents that are not running are skipped.
    pub fn all_agents_act(&mut self, updates: &IndexMap<u32, AgentStateUpdate>) {
        for (index, update) in updates {
            let Some(agent) = self.agents.get_mut(&AgentIndex(*index)) else {
                warn!(env_id = %self.id, agent = *index, "action for unknown agent");
                continue;
            };
            if agent.state().status != AgentTrainingStatus::Running {
                continue;
            }
            agent.act(&dict_point_from_msg(&update.actions));
        }
    }

    /// Definitions of every agent.
    pub fn definition(&self) -> EnvironmentDefinition {
        EnvironmentDefinition {
            agent_definitions: self
                .agents
                .iter()
                .map(|(i, a)| (i.0, a.definition()))
                .collect(),
        }
    }

    /// Per-step states. Agents whose terminal state already went out are
    /// omitted.
    pub fn state(&self) -> EnvironmentState {
        EnvironmentState {
            agent_states: self
                .agents
                .iter()
                .filter(|(_, a)| a.state().msg_status != TrainingMsgStatus::LastMsgSent)
                .map(|(i, a)| (i.0, a.agent_state()))
                .collect(),
        }
    }

    /// Post-reset states of every agent.
    pub fn initial_state(&self) -> InitialEnvironmentState {
        InitialEnvironmentState {
            agent_states: self
                .agents
                .iter()
                .map(|(i, a)| (i.0, a.initial_state()))
                .collect(),
        }
    }
}

impl std::fmt::Debug for EnvironmentHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnvironmentHost")
            .field("id", &self.id)
            .field("agents", &self.agents.len())
            .field("status", &self.status)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::Trainer;
    use std::sync::{Arc, Mutex};
    use tether_interact::{DebugActuator, DebugBoxObserver};
    use tether_space::{BoxPoint, BoxSpace, DictPoint, Point};
    use tether_wire::dict_point_to_msg;

    struct Fixed(AgentTrainingStatus);

    impl Trainer for Fixed {
        fn compute_reward(&mut self) -> f32 {
            1.0
        }

        fn compute_status(&mut self) -> AgentTrainingStatus {
            self.0
        }
    }

    #[derive(Default)]
    struct Log {
        calls: Vec<String>,
    }

    struct Arena {
        statuses: Vec<AgentTrainingStatus>,
        log: Arc<Mutex<Log>>,
    }

    impl Arena {
        fn record(&self, call: impl Into<String>) {
            self.log.lock().unwrap().calls.push(call.into());
        }
    }

    impl Environment for Arena {
        fn initialize_environment(&mut self) {
            self.record("init");
        }

        fn reset_environment(&mut self) {
            self.record("reset");
        }

        fn seed(&mut self, seed: u64) {
            self.record(format!("seed {seed}"));
        }

        fn register_agents(&mut self) -> Vec<TrainerAgent> {
            self.statuses
                .iter()
                .enumerate()
                .map(|(i, s)| {
                    TrainerAgent::new(format!("a{i}"), Box::new(Fixed(*s)))
                        .with_observer(Box::new(DebugBoxObserver::new("o", BoxSpace::uniform(1), i as u64)))
                        .with_actuator(Box::new(DebugActuator::new("m", BoxSpace::uniform(1))))
                })
                .collect()
        }

        fn on_agent_step(&mut self, agent: AgentIndex, _state: &TrainerState) {
            self.record(format!("step {agent}"));
        }
    }

    fn host(statuses: Vec<AgentTrainingStatus>) -> (EnvironmentHost, Arc<Mutex<Log>>) {
        let log = Arc::new(Mutex::new(Log::default()));
        let mut h = EnvironmentHost::new(Box::new(Arena {
            statuses,
            log: Arc::clone(&log),
        }));
        h.initialize(EnvId(2), &mut UidAuthority::new());
        (h, log)
    }

    #[test]
    fn agents_get_ascending_indices() {
        let (h, _) = host(vec![AgentTrainingStatus::Running; 3]);
        let keys: Vec<_> = h.agents().map(|(i, a)| (i, a.key())).collect();
        assert_eq!(keys.len(), 3);
        for (n, (index, key)) in keys.into_iter().enumerate() {
            assert_eq!(index, AgentIndex(n as u32));
            assert_eq!(key, Some(AgentKey::new(2u32, n as u32)));
        }
    }

    #[test]
    fn completes_only_when_every_agent_is_done() {
        let (mut h, log) = host(vec![AgentTrainingStatus::Completed, AgentTrainingStatus::Running]);
        h.all_agents_think();
        assert_eq!(h.status(), EnvironmentStatus::Running);
        assert_eq!(log.lock().unwrap().calls, vec!["init", "step 0", "step 1"]);

        let (mut h, _) = host(vec![AgentTrainingStatus::Truncated, AgentTrainingStatus::Completed]);
        h.all_agents_think();
        assert_eq!(h.status(), EnvironmentStatus::Completed);
    }

    #[test]
    fn empty_environment_never_completes() {
        let (mut h, _) = host(Vec::new());
        h.all_agents_think();
        assert_eq!(h.status(), EnvironmentStatus::Running);
    }

    #[test]
    fn sent_agents_are_omitted_from_state() {
        let (mut h, _) = host(vec![AgentTrainingStatus::Completed, AgentTrainingStatus::Running]);
        h.all_agents_think();
        assert_eq!(h.state().agent_states.len(), 2);
        h.all_agents_think();
        let ids: Vec<u32> = h.state().agent_states.keys().copied().collect();
        assert_eq!(ids, vec![1]);
        assert_eq!(h.initial_state().agent_states.len(), 2);
    }

    #[test]
    fn act_skips_done_and_unknown_agents() {
        let (mut h, _) = host(vec![AgentTrainingStatus::Completed, AgentTrainingStatus::Running]);
        h.all_agents_think();
        let action = AgentStateUpdate {
            actions: dict_point_to_msg(&DictPoint::new(vec![Point::Box(BoxPoint::new(vec![0.1]))])),
        };
        let updates: IndexMap<u32, AgentStateUpdate> =
            [(0, action.clone()), (1, action.clone()), (9, action)].into_iter().collect();
        h.all_agents_act(&updates);
        assert_eq!(h.agent(AgentIndex(0)).unwrap().step(), 0);
        assert_eq!(h.agent(AgentIndex(1)).unwrap().step(), 1);
    }

    #[test]
    fn reset_runs_environment_then_agents() {
        let (mut h, log) = host(vec![AgentTrainingStatus::Completed]);
        h.all_agents_think();
        h.seed(7);
        h.reset();
        assert_eq!(
            log.lock().unwrap().calls,
            vec!["init", "step 0", "seed 7", "reset"]
        );
        let agent = h.agent(AgentIndex(0)).unwrap();
        assert_eq!(agent.state().status, AgentTrainingStatus::Running);
        assert_eq!(h.definition().agent_definitions.len(), 1);
    }
}
