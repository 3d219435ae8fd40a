//! Benchmark profiles for the Tether RL bridge.
//!
//! Deterministic inputs shared by the benches and examples:
//!
//! - [`reference_space`]: a Dict mixing Box, Discrete, and Binary children
//! - [`reference_point`]: a valid point of any Dict, derived from a seed
//! - [`reference_training_state`]: a populated per-step state message

#![forbid(unsafe_code)]
#![deny(rustdoc::broken_intra_doc_links)]

use indexmap::IndexMap;
use tether_core::AgentTrainingStatus;
use tether_space::{
    BinaryPoint, BinarySpace, BoxPoint, BoxSpace, DictPoint, DictSpace, DiscretePoint,
    DiscreteSpace, Point, Space,
};
use tether_wire::{dict_point_to_msg, AgentState, EnvironmentState, TrainingState};

/// Build a Dict with `children` entries cycling Box(8), Discrete([5, 3]),
/// and Binary(4). Flattened size grows by 8, 8, and 4 per child.
pub fn reference_space(children: usize) -> DictSpace {
    let mut space = DictSpace::new();
    for i in 0..children {
        let child: Space = match i % 3 {
            0 => BoxSpace::uniform(8).into(),
            1 => match DiscreteSpace::new(vec![5, 3]) {
                Ok(s) => s.into(),
                Err(_) => BoxSpace::uniform(2).into(),
            },
            _ => BinarySpace::new(4).into(),
        };
        // Labels are unique by construction.
        let _ = space.add(format!("child_{i:03}"), child);
    }
    space
}

/// A point that validates against `space`.
///
/// Values are a cheap hash of `seed` and position, so different seeds give
/// different points without pulling in a random generator.
pub fn reference_point(space: &DictSpace, seed: u64) -> DictPoint {
    let mut point = DictPoint::default();
    for (c, (_, child)) in space.iter().enumerate() {
        let mix = |d: usize| seed.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ ((c * 31 + d) as u64);
        let p = match child {
            Space::Box(s) => Point::Box(BoxPoint::new(
                s.dimensions()
                    .iter()
                    .enumerate()
                    .map(|(d, dim)| dim.low + (mix(d) % 1000) as f32 / 1000.0 * dim.width())
                    .collect(),
            )),
            Space::Discrete(s) => Point::Discrete(DiscretePoint::new(
                s.high()
                    .iter()
                    .enumerate()
                    .map(|(d, &h)| (mix(d) % u64::from(h)) as i32)
                    .collect(),
            )),
            Space::Binary(s) => Point::Binary(BinaryPoint::new(
                (0..s.shape()).map(|d| mix(d) & 1 == 1).collect(),
            )),
        };
        point.push(p);
    }
    point
}

/// A per-step state for `envs` environments of `agents` agents each,
/// every agent observing a point of `obs_space`.
pub fn reference_training_state(envs: usize, agents: u32, obs_space: &DictSpace) -> TrainingState {
    TrainingState {
        environment_states: (0..envs)
            .map(|e| EnvironmentState {
                agent_states: (0..agents)
                    .map(|a| {
                        let mut info = IndexMap::new();
                        info.insert("step".to_string(), e.to_string());
                        let state = AgentState {
                            observations: dict_point_to_msg(&reference_point(
                                obs_space,
                                e as u64 * 1000 + u64::from(a),
                            )),
                            info,
                            reward: a as f32 * 0.5,
                            status: AgentTrainingStatus::Running,
                        };
                        (a, state)
                    })
                    .collect(),
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_space::ValidationResult;

    #[test]
    fn reference_point_is_valid() {
        let space = reference_space(9);
        for seed in 0..5 {
            let point = reference_point(&space, seed);
            assert_eq!(space.validate(&point), ValidationResult::Success);
        }
    }

    #[test]
    fn reference_space_sizes() {
        assert_eq!(reference_space(3).flattened_size(), 8 + 8 + 4);
    }

    #[test]
    fn training_state_shape() {
        let state = reference_training_state(2, 3, &reference_space(2));
        assert_eq!(state.environment_states.len(), 2);
        assert_eq!(state.environment_states[1].agent_states.len(), 3);
    }
}
