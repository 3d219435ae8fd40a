use std::sync::{Arc, Mutex};

use tether_interact::{Actuator, DebugDiscreteObserver, InteractionManager, Observer};
use tether_space::{BoxSpace, DiscreteSpace, Point, Space, TensorBinding};

struct Fixed(Vec<f32>);

impl Observer for Fixed {
    fn label(&self) -> &str {
        "fixed"
    }

    fn observation_space(&self) -> Space {
        BoxSpace::from_bounds(&[0.0, 0.0], &[10.0, 10.0])
            .unwrap()
            .into()
    }

    fn collect_observations(&mut self, out: &mut Point) {
        out.as_box_mut().unwrap().values.extend(&self.0);
    }
}

struct Recording {
    space: Space,
    seen: Arc<Mutex<Vec<Point>>>,
    setup_calls: usize,
}

impl Actuator for Recording {
    fn label(&self) -> &str {
        "rec"
    }

    fn setup(&mut self) {
        self.setup_calls += 1;
    }

    fn action_space(&self) -> Space {
        assert_eq!(self.setup_calls, 1, "space queried before setup");
        self.space.clone()
    }

    fn take_action(&mut self, action: &Point) {
        self.seen.lock().unwrap().push(action.clone());
    }
}

#[test]
fn observations_flatten_and_logits_reach_actuators_in_order() {
    let seen_box = Arc::new(Mutex::new(Vec::new()));
    let seen_disc = Arc::new(Mutex::new(Vec::new()));

    let mut mgr = InteractionManager::new(true);
    mgr.initialize(
        vec![
            Box::new(Fixed(vec![2.5, 10.0])),
            Box::new(DebugDiscreteObserver::new(
                "d",
                DiscreteSpace::new(vec![4]).unwrap(),
                9,
            )),
        ],
        vec![
            Box::new(Recording {
                space: BoxSpace::uniform(2).into(),
                seen: seen_box.clone(),
                setup_calls: 0,
            }),
            Box::new(Recording {
                space: DiscreteSpace::new(vec![3]).unwrap().into(),
                seen: seen_disc.clone(),
                setup_calls: 0,
            }),
        ],
    )
    .unwrap();

    let obs = mgr.aggregate_observations().unwrap().clone();
    assert_eq!(obs.points[0].as_box().unwrap().values, vec![0.25, 1.0]);
    let binding = TensorBinding::from_point(&mgr.definition().obs_space, &obs).unwrap();
    assert_eq!(binding.len(), 6);

    let logits = TensorBinding::from(vec![0.5, -0.5, 0.0, 3.0, 1.0]);
    let action = logits.read_point(&mgr.definition().action_space).unwrap();
    mgr.distribute_actions(&action).unwrap();

    assert_eq!(
        seen_box.lock().unwrap()[0].as_box().unwrap().values,
        vec![0.5, -0.5]
    );
    assert_eq!(
        seen_disc.lock().unwrap()[0].as_discrete().unwrap().values,
        vec![1]
    );
}
