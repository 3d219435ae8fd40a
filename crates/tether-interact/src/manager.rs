//! The per-agent interaction aggregator.

use tether_core::InteractionError;
use tether_space::{DictPoint, SpaceError};
use tracing::debug;

use crate::definition::InteractionDefinition;
use crate::interactor::{interactor_id, Actuator, Observer};

/// Owns one agent's observers, actuators, spaces, and observation buffer.
///
/// # Examples
///
/// ```
/// use tether_interact::{DebugActuator, DebugBoxObserver, InteractionManager};
/// use tether_space::{BoxSpace, DictPoint};
///
/// let mut mgr = InteractionManager::new(false);
/// mgr.initialize(
///     vec![Box::new(DebugBoxObserver::new("pos", BoxSpace::uniform(2), 7))],
///     vec![Box::new(DebugActuator::new("motor", BoxSpace::uniform(1)))],
/// )
/// .unwrap();
///
/// let obs = mgr.aggregate_observations().unwrap();
/// assert_eq!(obs.len(), 1);
/// assert_eq!(obs.points[0].len(), 2);
///
/// let action = mgr.definition().action_space.unflatten(&[0.3], 0).unwrap();
/// mgr.distribute_actions(&action).unwrap();
/// ```
pub struct InteractionManager {
    observers: Vec<Box<dyn Observer>>,
    actuators: Vec<Box<dyn Actuator>>,
    definition: InteractionDefinition,
    observations: DictPoint,
    initialized: bool,
}

impl InteractionManager {
    /// An uninitialized manager.
    pub fn new(normalize_observations: bool) -> Self {
        Self {
            observers: Vec::new(),
            actuators: Vec::new(),
            definition: InteractionDefinition::new(normalize_observations),
            observations: DictPoint::default(),
            initialized: false,
        }
    }

    /// Take ownership of the collaborators and build both Dict spaces.
    ///
    /// Each collaborator's `setup()` runs before its space is queried.
    /// The observation buffer is allocated once here and reused by every
    /// subsequent [`aggregate_observations`](Self::aggregate_observations).
    pub fn initialize(
        &mut self,
        mut observers: Vec<Box<dyn Observer>>,
        mut actuators: Vec<Box<dyn Actuator>>,
    ) -> Result<(), SpaceError> {
        let mut def = InteractionDefinition::new(self.definition.normalize_observations);
        for (i, obs) in observers.iter_mut().enumerate() {
            obs.setup();
            def.obs_space
                .add(interactor_id(i, obs.label()), obs.observation_space())?;
        }
        for (i, act) in actuators.iter_mut().enumerate() {
            act.setup();
            def.action_space
                .add(interactor_id(i, act.label()), act.action_space())?;
        }
        debug!(
            observers = observers.len(),
            actuators = actuators.len(),
            obs_size = def.obs_space.flattened_size(),
            action_size = def.action_space.flattened_size(),
            "interaction manager initialized"
        );
        self.observations = def.obs_space.make_point();
        self.definition = def;
        self.observers = observers;
        self.actuators = actuators;
        self.initialized = true;
        Ok(())
    }

    /// Whether [`initialize`](Self::initialize) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// The spaces built at initialization.
    pub fn definition(&self) -> &InteractionDefinition {
        &self.definition
    }

    /// Number of registered observers.
    pub fn num_observers(&self) -> usize {
        self.observers.len()
    }

    /// Number of registered actuators.
    pub fn num_actuators(&self) -> usize {
        self.actuators.len()
    }

    /// The most recently aggregated observations.
    pub fn observations(&self) -> &DictPoint {
        &self.observations
    }

    /// Reset the held observation point, fill each child from its
    /// observer, then normalize if the definition asks for it.
    ///
    /// The returned reference is invalidated by the next call.
    pub fn aggregate_observations(&mut self) -> Result<&DictPoint, InteractionError> {
        if !self.initialized {
            return Err(InteractionError::NotInitialized);
        }
        self.observations.reset();
        for (obs, slot) in self.observers.iter_mut().zip(self.observations.points.iter_mut()) {
            obs.collect_observations(slot);
        }
        if self.definition.normalize_observations {
            self.definition
                .obs_space
                .normalize_observation(&mut self.observations);
        }
        Ok(&self.observations)
    }

    /// Deliver child `i` of `actions` to actuator `i`.
    ///
    /// A child count that differs from the actuator count delivers nothing.
    /// Children that fail validation are still delivered.
    pub fn distribute_actions(&mut self, actions: &DictPoint) -> Result<(), InteractionError> {
        if actions.len() != self.actuators.len() {
            return Err(InteractionError::ActionCountMismatch {
                expected: self.actuators.len(),
                got: actions.len(),
            });
        }
        for (i, (act, action)) in self.actuators.iter_mut().zip(actions).enumerate() {
            if let Some((label, space)) = self.definition.action_space.get_index(i) {
                let result = space.validate(action);
                if !result.is_success() {
                    debug!(actuator = label, %result, "action failed validation");
                }
            }
            act.take_action(action);
        }
        Ok(())
    }
}

impl std::fmt::Debug for InteractionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionManager")
            .field("observers", &self.observers.len())
            .field("actuators", &self.actuators.len())
            .field("definition", &self.definition)
            .field("initialized", &self.initialized)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debug::{DebugActuator, DebugBinaryObserver, DebugBoxObserver};
    use tether_space::{BinarySpace, BoxPoint, BoxSpace, Point};

    fn manager(normalize: bool) -> InteractionManager {
        let mut m = InteractionManager::new(normalize);
        m.initialize(
            vec![
                Box::new(DebugBoxObserver::new(
                    "pos",
                    BoxSpace::from_bounds(&[10.0, 10.0], &[20.0, 20.0]).unwrap(),
                    1,
                )),
                Box::new(DebugBinaryObserver::new("touch", BinarySpace::new(3), 2)),
            ],
            vec![
                Box::new(DebugActuator::new("a", BoxSpace::uniform(1))),
                Box::new(DebugActuator::new("a", BinarySpace::new(1))),
            ],
        )
        .unwrap();
        m
    }

    #[test]
    fn labels_are_index_prefixed() {
        let m = manager(false);
        let obs: Vec<_> = m.definition().obs_space.labels().collect();
        assert_eq!(obs, vec!["00000_pos", "00001_touch"]);
        let act: Vec<_> = m.definition().action_space.labels().collect();
        assert_eq!(act, vec!["00000_a", "00001_a"]);
    }

    #[test]
    fn aggregate_before_initialize_errors() {
        let mut m = InteractionManager::new(false);
        assert_eq!(
            m.aggregate_observations().unwrap_err(),
            InteractionError::NotInitialized
        );
    }

    #[test]
    fn aggregated_observations_validate() {
        let mut m = manager(false);
        for _ in 0..3 {
            let obs = m.aggregate_observations().unwrap().clone();
            assert!(m.definition().obs_space.validate(&obs).is_success());
        }
    }

    #[test]
    fn normalization_maps_into_unit_interval() {
        let mut m = manager(true);
        let obs = m.aggregate_observations().unwrap();
        let values = &obs.points[0].as_box().unwrap().values;
        assert_eq!(values.len(), 2);
        assert!(values.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    #[test]
    fn mismatched_action_count_delivers_nothing() {
        let mut m = manager(false);
        let short = DictPoint::new(vec![Point::Box(BoxPoint::new(vec![0.1]))]);
        assert_eq!(
            m.distribute_actions(&short),
            Err(InteractionError::ActionCountMismatch {
                expected: 2,
                got: 1
            })
        );
    }
}
