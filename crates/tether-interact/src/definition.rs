//! The spaces and flags that define an agent's interface.

use tether_space::{DictSpace, Space};

/// Observation and action spaces of one agent, plus its normalization flag.
///
/// Built by [`InteractionManager::initialize`](crate::InteractionManager::initialize)
/// and published to the trainer as part of the agent definition.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InteractionDefinition {
    /// One child per observer, in registration order.
    pub obs_space: DictSpace,
    /// One child per actuator, in registration order.
    pub action_space: DictSpace,
    /// Normalize Box observations onto `[0, 1]` during aggregation.
    pub normalize_observations: bool,
}

impl InteractionDefinition {
    /// An empty definition with the given normalization flag.
    pub fn new(normalize_observations: bool) -> Self {
        Self {
            normalize_observations,
            ..Self::default()
        }
    }

    /// The observation space as the trainer sees it: the normalized space
    /// when normalization is on, the raw space otherwise.
    pub fn effective_obs_space(&self) -> DictSpace {
        if !self.normalize_observations {
            return self.obs_space.clone();
        }
        DictSpace::try_from_iter(self.obs_space.iter().map(|(label, space)| match space {
            Space::Box(b) => (label, Space::Box(b.normalized_space())),
            other => (label, other.clone()),
        }))
        .expect("labels of an existing DictSpace are unique")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_space::{BoxSpace, BoxSpaceDimension, DiscreteSpace};

    #[test]
    fn effective_space_normalizes_box_children_only() {
        let mut def = InteractionDefinition::new(true);
        def.obs_space
            .add("pos", BoxSpace::from_bounds(&[-5.0], &[5.0]).unwrap())
            .unwrap();
        def.obs_space
            .add("gear", DiscreteSpace::new(vec![4]).unwrap())
            .unwrap();

        let eff = def.effective_obs_space();
        match eff.get("pos") {
            Some(Space::Box(b)) => assert_eq!(b.dimensions(), &[BoxSpaceDimension::zero_one()]),
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(eff.get("gear"), def.obs_space.get("gear"));

        def.normalize_observations = false;
        assert_eq!(def.effective_obs_space(), def.obs_space);
    }
}
