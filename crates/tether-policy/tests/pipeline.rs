use std::sync::{Arc, Mutex};

use tether_core::PolicyError;
use tether_interact::InteractionDefinition;
use tether_policy::{InferencePolicy, PolicyDecision};
use tether_space::{
    BoxPoint, BoxSpace, BoxSpaceDimension, DictPoint, DiscretePoint, DiscreteSpace, Point,
};

fn spaces() -> InteractionDefinition {
    let box_space = BoxSpace::new(vec![
        BoxSpaceDimension::new(-1.0, 1.0).unwrap(),
        BoxSpaceDimension::new(0.0, 10.0).unwrap(),
    ])
    .unwrap();
    let mut def = InteractionDefinition::default();
    def.obs_space.add("pos", box_space.clone()).unwrap();
    def.obs_space
        .add("choice", DiscreteSpace::new(vec![3]).unwrap())
        .unwrap();
    def.action_space.add("pos", box_space).unwrap();
    def.action_space
        .add("choice", DiscreteSpace::new(vec![3]).unwrap())
        .unwrap();
    def
}

#[test]
fn model_sees_flat_observation_and_logits_decode_to_action() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_model = Arc::clone(&seen);

    let mut policy = InferencePolicy::new();
    policy.init(&spaces());
    policy
        .load_model(Box::new(
            move |input: &[f32], output: &mut [f32]| -> Result<(), PolicyError> {
                seen_in_model.lock().unwrap().push(input.to_vec());
                output.copy_from_slice(&[0.1, 5.2, 0.3, 7.0, 9.9]);
                Ok(())
            },
        ))
        .unwrap();

    let obs = DictPoint::new(vec![
        Point::Box(BoxPoint::new(vec![0.5, 5.0])),
        Point::Discrete(DiscretePoint::new(vec![2])),
    ]);
    let decision = policy.request_decision(&obs).unwrap().wait();

    assert_eq!(seen.lock().unwrap()[0], vec![0.5, 5.0, 0.0, 0.0, 1.0]);
    assert_eq!(
        decision,
        PolicyDecision::Action(DictPoint::new(vec![
            Point::Box(BoxPoint::new(vec![0.1, 5.2])),
            Point::Discrete(DiscretePoint::new(vec![2])),
        ]))
    );
}

#[test]
fn buffers_are_rezeroed_between_decisions() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_in_model = Arc::clone(&seen);

    let mut policy = InferencePolicy::new();
    policy.init(&spaces());
    policy
        .load_model(Box::new(
            move |input: &[f32], _: &mut [f32]| -> Result<(), PolicyError> {
                seen_in_model.lock().unwrap().push(input.to_vec());
                Ok(())
            },
        ))
        .unwrap();

    for choice in [0, 1] {
        let obs = DictPoint::new(vec![
            Point::Box(BoxPoint::new(vec![0.0, 0.0])),
            Point::Discrete(DiscretePoint::new(vec![choice])),
        ]);
        assert!(policy.request_decision(&obs).unwrap().wait().is_action());
    }
    let seen = seen.lock().unwrap();
    assert_eq!(seen[1], vec![0.0, 0.0, 0.0, 1.0, 0.0]);
}
