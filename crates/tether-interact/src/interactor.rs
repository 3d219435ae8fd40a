//! The [`Observer`] and [`Actuator`] capabilities.

use tether_space::{Point, Space};

/// Format the Dict label of the `index`-th interactor: a five-digit
/// zero-padded index, an underscore, then the interactor's label.
///
/// # Examples
///
/// ```
/// assert_eq!(tether_interact::interactor_id(3, "camera"), "00003_camera");
/// ```
pub fn interactor_id(index: usize, label: &str) -> String {
    format!("{index:05}_{label}")
}

/// Produces one observation point per tick.
///
/// # Contract
///
/// - `observation_space()` is queried once, after `setup()`.
/// - `collect_observations()` receives an empty point of the declared
///   variant and must push exactly `num_dimensions()` values into it.
///
/// # Examples
///
/// ```
/// use tether_interact::Observer;
/// use tether_space::{BoxSpace, Point, Space};
///
/// struct Speed(f32);
///
/// impl Observer for Speed {
///     fn label(&self) -> &str { "speed" }
///     fn observation_space(&self) -> Space { BoxSpace::uniform(1).into() }
///     fn collect_observations(&mut self, out: &mut Point) {
///         if let Some(p) = out.as_box_mut() {
///             p.values.push(self.0);
///         }
///     }
/// }
///
/// let mut obs = Speed(0.5);
/// let mut point = obs.observation_space().make_point();
/// obs.collect_observations(&mut point);
/// assert_eq!(point.len(), 1);
/// ```
pub trait Observer: Send {
    /// Human-readable label, used to build the Dict key.
    fn label(&self) -> &str;

    /// One-time hook run before the space is queried.
    fn setup(&mut self) {}

    /// The space this observer's points conform to.
    fn observation_space(&self) -> Space;

    /// Fill `out` with the current observation.
    fn collect_observations(&mut self, out: &mut Point);
}

/// Consumes one action point per decision.
pub trait Actuator: Send {
    /// Human-readable label, used to build the Dict key.
    fn label(&self) -> &str;

    /// One-time hook run before the space is queried.
    fn setup(&mut self) {}

    /// The space this actuator's actions conform to.
    fn action_space(&self) -> Space;

    /// Apply `action` to the simulation.
    fn take_action(&mut self, action: &Point);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_pads_to_five_digits() {
        assert_eq!(interactor_id(0, "a"), "00000_a");
        assert_eq!(interactor_id(12345, "b"), "12345_b");
        assert_eq!(interactor_id(123456, "c"), "123456_c");
    }
}
