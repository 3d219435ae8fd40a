//! Debug observers and actuators.
//!
//! Observers emit seeded pseudo-random values that always conform to
//! their space, so a pipeline can be exercised before real sensors exist.
//! The actuator accepts any action of its space and keeps the last one.

use rand_chacha::rand_core::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tether_space::{BinarySpace, BoxSpace, DiscreteSpace, Point, Space};
use tracing::trace;

use crate::interactor::{Actuator, Observer};

/// Uniform `f32` in `[0, 1)` from the top 24 bits of one draw.
fn unit_f32(rng: &mut ChaCha8Rng) -> f32 {
    (rng.next_u32() >> 8) as f32 / (1u32 << 24) as f32
}

// ── Observers ───────────────────────────────────────────────────

/// Emits uniform values inside each Box dimension.
#[derive(Clone, Debug)]
pub struct DebugBoxObserver {
    label: String,
    space: BoxSpace,
    rng: ChaCha8Rng,
}

impl DebugBoxObserver {
    /// Observer over `space` seeded with `seed`.
    pub fn new(label: impl Into<String>, space: BoxSpace, seed: u64) -> Self {
        Self {
            label: label.into(),
            space,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Observer for DebugBoxObserver {
    fn label(&self) -> &str {
        &self.label
    }

    fn observation_space(&self) -> Space {
        Space::Box(self.space.clone())
    }

    fn collect_observations(&mut self, out: &mut Point) {
        let Some(point) = out.as_box_mut() else {
            return;
        };
        for dim in self.space.dimensions() {
            let v = dim.low + unit_f32(&mut self.rng) * dim.width();
            point.values.push(v.clamp(dim.low, dim.high));
        }
    }
}

/// Emits fair coin flips.
#[derive(Clone, Debug)]
pub struct DebugBinaryObserver {
    label: String,
    space: BinarySpace,
    rng: ChaCha8Rng,
}

impl DebugBinaryObserver {
    /// Observer over `space` seeded with `seed`.
    pub fn new(label: impl Into<String>, space: BinarySpace, seed: u64) -> Self {
        Self {
            label: label.into(),
            space,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Observer for DebugBinaryObserver {
    fn label(&self) -> &str {
        &self.label
    }

    fn observation_space(&self) -> Space {
        Space::Binary(self.space.clone())
    }

    fn collect_observations(&mut self, out: &mut Point) {
        let Some(point) = out.as_binary_mut() else {
            return;
        };
        for _ in 0..self.space.shape() {
            point.values.push(self.rng.next_u32() & 1 == 1);
        }
    }
}

/// Emits a uniform integer in `[0, high)` per dimension.
#[derive(Clone, Debug)]
pub struct DebugDiscreteObserver {
    label: String,
    space: DiscreteSpace,
    rng: ChaCha8Rng,
}

impl DebugDiscreteObserver {
    /// Observer over `space` seeded with `seed`.
    pub fn new(label: impl Into<String>, space: DiscreteSpace, seed: u64) -> Self {
        Self {
            label: label.into(),
            space,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Observer for DebugDiscreteObserver {
    fn label(&self) -> &str {
        &self.label
    }

    fn observation_space(&self) -> Space {
        Space::Discrete(self.space.clone())
    }

    fn collect_observations(&mut self, out: &mut Point) {
        let Some(point) = out.as_discrete_mut() else {
            return;
        };
        for &high in self.space.high() {
            point.values.push((self.rng.next_u32() % high) as i32);
        }
    }
}

// ── Actuator ────────────────────────────────────────────────────

/// Accepts actions of any variant and keeps the most recent one.
#[derive(Clone, Debug)]
pub struct DebugActuator {
    label: String,
    space: Space,
    last_action: Option<Point>,
    actions_taken: u64,
}

impl DebugActuator {
    /// Actuator declaring `space`.
    pub fn new(label: impl Into<String>, space: impl Into<Space>) -> Self {
        Self {
            label: label.into(),
            space: space.into(),
            last_action: None,
            actions_taken: 0,
        }
    }

    /// The most recent action, if any.
    pub fn last_action(&self) -> Option<&Point> {
        self.last_action.as_ref()
    }

    /// Number of actions received.
    pub fn actions_taken(&self) -> u64 {
        self.actions_taken
    }
}

impl Actuator for DebugActuator {
    fn label(&self) -> &str {
        &self.label
    }

    fn action_space(&self) -> Space {
        self.space.clone()
    }

    fn take_action(&mut self, action: &Point) {
        trace!(actuator = %self.label, kind = %action.kind(), "debug action");
        self.actions_taken += 1;
        self.last_action = Some(action.clone());
    }
}
