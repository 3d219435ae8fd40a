//! The session between the simulation's environments and one trainer.

use std::net::SocketAddr;
use std::time::Duration;

use indexmap::IndexMap;
use tracing::{debug, info, warn};

use tether_core::{ConnectorStatus, EnvId, EnvironmentStatus, UidAuthority};
use tether_wire::{
    EnvironmentStateUpdate, InitialTrainingState, TrainingDefinition, TrainingState,
    TrainingStateUpdate, UpdateStatus,
};

use crate::environment::{Environment, EnvironmentHost};
use crate::error::ConnectorError;
use crate::transport::ConnectorTransport;

type Callback = Box<dyn FnMut() + Send>;

/// Owns the environments and drives them from trainer updates.
///
/// Status moves `NotStarted -> Running` on a start signal, then to
/// `Closed` or `Error` from the trainer's update status. A transport
/// failure or an update timeout also ends in `Error`. A closed
/// connector may be restarted by another start signal.
///
/// Callbacks registered with [`on_start`](Self::on_start),
/// [`on_close`](Self::on_close), and [`on_error`](Self::on_error) run in
/// registration order whenever the status changes to match.
pub struct GymConnector {
    transport: Box<dyn ConnectorTransport>,
    environments: Vec<EnvironmentHost>,
    status: ConnectorStatus,
    timeout: Duration,
    definition: TrainingDefinition,
    enabled: bool,
    on_start: Vec<Callback>,
    on_close: Vec<Callback>,
    on_error: Vec<Callback>,
}

impl GymConnector {
    /// A connector with no environments that waits `timeout` for each
    /// update.
    pub fn new(transport: Box<dyn ConnectorTransport>, timeout: Duration) -> Self {
        Self {
            transport,
            environments: Vec::new(),
            status: ConnectorStatus::NotStarted,
            timeout,
            definition: TrainingDefinition::default(),
            enabled: false,
            on_start: Vec::new(),
            on_close: Vec::new(),
            on_error: Vec::new(),
        }
    }

    /// Add an environment. Its id is its position.
    pub fn add_environment(&mut self, env: Box<dyn Environment>) -> EnvId {
        let id = EnvId(self.environments.len() as u32);
        self.environments.push(EnvironmentHost::new(env));
        id
    }

    /// Initialize every environment and snapshot the training definition.
    pub fn init(&mut self, uids: &mut UidAuthority) {
        for (i, env) in self.environments.iter_mut().enumerate() {
            env.initialize(EnvId(i as u32), uids);
        }
        self.definition = TrainingDefinition {
            environment_definitions: self.environments.iter().map(EnvironmentHost::definition).collect(),
        };
        info!(
            environments = self.environments.len(),
            agents = self.num_agents(),
            "gym connector initialized"
        );
    }

    /// Bring the transport up.
    pub fn enable(&mut self) -> Result<(), ConnectorError> {
        self.transport.enable()?;
        self.enabled = true;
        Ok(())
    }

    /// The address the trainer should dial, once enabled.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.transport.local_addr()
    }

    /// Whether [`enable`](Self::enable) succeeded.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Register a callback for sessions starting.
    pub fn on_start(&mut self, f: impl FnMut() + Send + 'static) {
        self.on_start.push(Box::new(f));
    }

    /// Register a callback for sessions closing.
    pub fn on_close(&mut self, f: impl FnMut() + Send + 'static) {
        self.on_close.push(Box::new(f));
    }

    /// Register a callback for sessions failing.
    pub fn on_error(&mut self, f: impl FnMut() + Send + 'static) {
        self.on_error.push(Box::new(f));
    }

    // ── status ──────────────────────────────────────────────────

    /// Current status.
    pub fn status(&self) -> ConnectorStatus {
        self.status
    }

    /// `true` while waiting for a start signal.
    pub fn is_not_started(&self) -> bool {
        self.status.awaiting_start()
    }

    /// `true` while a session is live.
    pub fn is_running(&self) -> bool {
        self.status == ConnectorStatus::Running
    }

    /// Change status, notifying the transport and callbacks on a change.
    pub fn set_status(&mut self, status: ConnectorStatus) {
        if status == self.status {
            return;
        }
        info!(from = ?self.status, to = ?status, "connector status changed");
        self.status = status;
        let (hook, callbacks) = match status {
            ConnectorStatus::Running => (self.transport.on_started(&self.definition), &mut self.on_start),
            ConnectorStatus::Closed => (self.transport.on_closed(), &mut self.on_close),
            ConnectorStatus::Error => (self.transport.on_error(), &mut self.on_error),
            ConnectorStatus::NotStarted => return,
        };
        for f in callbacks.iter_mut() {
            f();
        }
        if let Err(e) = hook {
            warn!(error = %e, "transport failed to handle status change");
            if status != ConnectorStatus::Error {
                self.fail(&e);
            }
        }
    }

    fn fail(&mut self, error: &ConnectorError) {
        warn!(%error, "gym connector error");
        self.set_status(ConnectorStatus::Error);
    }

    /// Apply the connector-level status carried by `update`.
    pub fn update_connector_status(&mut self, update: &TrainingStateUpdate) {
        match update.status {
            UpdateStatus::Errored => self.set_status(ConnectorStatus::Error),
            UpdateStatus::Closed => self.set_status(ConnectorStatus::Closed),
            UpdateStatus::None => {}
        }
    }

    /// Poll for a start signal. Returns `true` once the session is live.
    pub fn check_for_start(&mut self) -> bool {
        match self.transport.check_for_start() {
            Ok(true) => self.set_status(ConnectorStatus::Running),
            Ok(false) => {}
            Err(e) => {
                self.fail(&e);
                return false;
            }
        }
        self.is_running()
    }

    // ── environments ────────────────────────────────────────────

    /// Number of environments.
    pub fn num_environments(&self) -> usize {
        self.environments.len()
    }

    /// Total agents across every environment.
    pub fn num_agents(&self) -> usize {
        self.environments.iter().map(EnvironmentHost::num_agents).sum()
    }

    /// Look up an environment.
    pub fn environment(&self, id: EnvId) -> Option<&EnvironmentHost> {
        self.environments.get(id.0 as usize)
    }

    /// The definition snapshot taken at [`init`](Self::init).
    pub fn training_definition(&self) -> &TrainingDefinition {
        &self.definition
    }

    /// Apply each environment's update: resets mark the environment
    /// completed after seeding and applying options; steps distribute
    /// actions.
    pub fn update_environments(&mut self, update: &TrainingStateUpdate) {
        for (env_id, env_update) in &update.updates {
            let Some(env) = self.environments.get_mut(*env_id as usize) else {
                warn!(env_id = *env_id, "update for unknown environment");
                continue;
            };
            match env_update {
                EnvironmentStateUpdate::Reset { seed, options } => {
                    if let Some(seed) = seed {
                        env.seed(*seed);
                    }
                    if !options.is_empty() {
                        env.set_options(options);
                    }
                    env.mark_completed();
                }
                EnvironmentStateUpdate::Step { updates } => env.all_agents_act(updates),
            }
        }
    }

    /// Reset every completed environment and publish their fresh states.
    /// Returns how many were reset.
    pub fn reset_completed_environments(&mut self) -> usize {
        let mut initial = InitialTrainingState {
            environment_states: IndexMap::new(),
        };
        for env in &mut self.environments {
            if env.status() == EnvironmentStatus::Completed {
                env.reset();
                initial
                    .environment_states
                    .insert(env.id().0, env.initial_state());
            }
        }
        let count = initial.environment_states.len();
        if count == 0 {
            return 0;
        }
        debug!(count, "environments reset");
        if let Err(e) = self.transport.submit_post_reset_state(&initial) {
            self.fail(&e);
        }
        for id in initial.environment_states.keys() {
            self.environments[*id as usize].set_status(EnvironmentStatus::Running);
        }
        count
    }

    /// Let every non-errored environment think, then snapshot all of
    /// them.
    pub fn collect_environment_states(&mut self) -> TrainingState {
        for env in &mut self.environments {
            if env.status() != EnvironmentStatus::Error {
                env.all_agents_think();
            }
        }
        TrainingState {
            environment_states: self.environments.iter().map(EnvironmentHost::state).collect(),
        }
    }

    /// Answer the trainer's update with `state`.
    pub fn submit_environment_states(&mut self, state: &TrainingState) {
        if let Err(e) = self.transport.submit_state(state) {
            self.fail(&e);
        }
    }

    /// Wait for the trainer's next update.
    ///
    /// A timeout sets the status to `Error` without running callbacks; a
    /// transport failure goes through the normal error path.
    pub fn resolve_update(&mut self) -> Option<TrainingStateUpdate> {
        match self.transport.request_update(self.timeout) {
            Ok(Some(update)) => Some(update),
            Ok(None) => {
                warn!(timeout = ?self.timeout, "timed out waiting for trainer update");
                self.status = ConnectorStatus::Error;
                None
            }
            Err(e) => {
                self.fail(&e);
                None
            }
        }
    }

    /// Shut the transport down.
    pub fn shutdown(&mut self) {
        self.transport.shutdown();
        self.enabled = false;
    }
}

impl std::fmt::Debug for GymConnector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GymConnector")
            .field("environments", &self.environments)
            .field("status", &self.status)
            .field("timeout", &self.timeout)
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trainer::{Trainer, TrainerAgent};
    use crate::transport::{LocalTrainer, LocalTransport, TrainerEvent};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tether_core::AgentTrainingStatus;
    use tether_interact::{DebugActuator, DebugBoxObserver};
    use tether_space::BoxSpace;

    struct Always(AgentTrainingStatus);

    impl Trainer for Always {
        fn compute_reward(&mut self) -> f32 {
            0.0
        }

        fn compute_status(&mut self) -> AgentTrainingStatus {
            self.0
        }
    }

    struct Single {
        status: AgentTrainingStatus,
        seeds: Arc<AtomicUsize>,
    }

    impl Environment for Single {
        fn reset_environment(&mut self) {}

        fn seed(&mut self, _seed: u64) {
            self.seeds.fetch_add(1, Ordering::SeqCst);
        }

        fn register_agents(&mut self) -> Vec<TrainerAgent> {
            vec![TrainerAgent::new("solo", Box::new(Always(self.status)))
                .with_observer(Box::new(DebugBoxObserver::new("o", BoxSpace::uniform(1), 0)))
                .with_actuator(Box::new(DebugActuator::new("m", BoxSpace::uniform(1))))]
        }
    }

    fn connector(statuses: &[AgentTrainingStatus]) -> (GymConnector, LocalTrainer, Arc<AtomicUsize>) {
        let (transport, trainer) = LocalTransport::pair();
        let seeds = Arc::new(AtomicUsize::new(0));
        let mut c = GymConnector::new(Box::new(transport), Duration::from_millis(50));
        for s in statuses {
            c.add_environment(Box::new(Single {
                status: *s,
                seeds: Arc::clone(&seeds),
            }));
        }
        c.init(&mut UidAuthority::new());
        c.enable().unwrap();
        (c, trainer, seeds)
    }

    fn reset_all(n: u32, seed: Option<u64>) -> TrainingStateUpdate {
        TrainingStateUpdate {
            status: UpdateStatus::None,
            updates: (0..n)
                .map(|i| {
                    (
                        i,
                        EnvironmentStateUpdate::Reset {
                            seed,
                            options: IndexMap::new(),
                        },
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn start_signal_publishes_definition_and_runs_callbacks() {
        let (mut c, trainer, _) = connector(&[AgentTrainingStatus::Running; 2]);
        let started = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&started);
        c.on_start(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!c.check_for_start());
        assert!(c.is_not_started());
        trainer.start();
        assert!(c.check_for_start());
        assert!(c.is_running());
        assert_eq!(started.load(Ordering::SeqCst), 1);
        match trainer.try_event() {
            Some(TrainerEvent::Definition(def)) => assert_eq!(def.environment_definitions.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn reset_update_marks_then_resets_only_targeted_environments() {
        let (mut c, trainer, seeds) = connector(&[AgentTrainingStatus::Running; 3]);
        let mut update = reset_all(3, Some(11));
        update.updates.shift_remove(&1u32);
        c.update_environments(&update);
        assert_eq!(seeds.load(Ordering::SeqCst), 2);
        assert_eq!(c.environment(EnvId(1)).unwrap().status(), EnvironmentStatus::Running);

        assert_eq!(c.reset_completed_environments(), 2);
        match trainer.try_event() {
            Some(TrainerEvent::InitialState(s)) => {
                let ids: Vec<u32> = s.environment_states.keys().copied().collect();
                assert_eq!(ids, vec![0, 2]);
            }
            other => panic!("unexpected {other:?}"),
        }
        for i in 0..3 {
            assert_eq!(c.environment(EnvId(i)).unwrap().status(), EnvironmentStatus::Running);
        }
        assert_eq!(c.reset_completed_environments(), 0);
        assert!(trainer.try_event().is_none());
    }

    #[test]
    fn errored_environments_are_not_stepped() {
        let (mut c, _trainer, _) = connector(&[AgentTrainingStatus::Completed; 2]);
        c.environments[1].set_status(EnvironmentStatus::Error);
        let state = c.collect_environment_states();
        assert_eq!(state.environment_states.len(), 2);
        assert_eq!(c.environment(EnvId(0)).unwrap().status(), EnvironmentStatus::Completed);
        assert_eq!(c.environment(EnvId(1)).unwrap().status(), EnvironmentStatus::Error);
    }

    #[test]
    fn close_update_answers_trainer_and_allows_restart() {
        let (mut c, trainer, _) = connector(&[AgentTrainingStatus::Running]);
        let closed = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closed);
        c.on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        trainer.start();
        c.check_for_start();
        trainer.drain_events();

        trainer.send_update(TrainingStateUpdate {
            status: UpdateStatus::Closed,
            updates: IndexMap::new(),
        });
        let update = c.resolve_update().unwrap();
        c.update_connector_status(&update);
        assert_eq!(c.status(), ConnectorStatus::Closed);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
        assert_eq!(
            trainer.drain_events(),
            vec![TrainerEvent::State(TrainingState::default())]
        );

        trainer.start();
        assert!(c.check_for_start());
    }

    #[test]
    fn error_update_runs_error_callbacks() {
        let (mut c, trainer, _) = connector(&[AgentTrainingStatus::Running]);
        let errors = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&errors);
        c.on_error(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        c.set_status(ConnectorStatus::Running);
        c.update_connector_status(&TrainingStateUpdate {
            status: UpdateStatus::Errored,
            updates: IndexMap::new(),
        });
        assert_eq!(c.status(), ConnectorStatus::Error);
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        drop(trainer);
    }

    #[test]
    fn timeout_sets_error_without_callbacks() {
        let (mut c, _trainer, _) = connector(&[AgentTrainingStatus::Running]);
        let errors = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&errors);
        c.on_error(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        c.set_status(ConnectorStatus::Running);
        assert!(c.resolve_update().is_none());
        assert_eq!(c.status(), ConnectorStatus::Error);
        assert_eq!(errors.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn dropped_trainer_errors_the_connector() {
        let (mut c, trainer, _) = connector(&[AgentTrainingStatus::Running]);
        drop(trainer);
        assert!(!c.check_for_start());
        assert_eq!(c.status(), ConnectorStatus::Error);
    }
}
