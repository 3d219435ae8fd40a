//! Adapters between the [`tether_space`] model and wire messages.
//!
//! Conversion to a message is infallible. Conversion from a message
//! re-checks every structural invariant the model enforces, since a
//! decoded message may come from anywhere.

use tether_space::{
    BinaryPoint, BinarySpace, BoxPoint, BoxSpace, BoxSpaceDimension, DictPoint, DictSpace,
    DiscretePoint, DiscreteSpace, Point, Space,
};

use crate::error::WireError;
use crate::space_msg::{
    BinarySpaceMsg, BoxSpaceDimensionMsg, BoxSpaceMsg, DictPointMsg, DictSpaceMsg,
    DiscreteSpaceMsg, FundamentalPointMsg, FundamentalSpaceMsg,
};

// ── Spaces ──────────────────────────────────────────────────────

/// Encode one fundamental space.
pub fn space_to_msg(space: &Space) -> FundamentalSpaceMsg {
    match space {
        Space::Box(s) => FundamentalSpaceMsg::Box(BoxSpaceMsg {
            dimensions: s
                .dimensions()
                .iter()
                .map(|d| BoxSpaceDimensionMsg {
                    low: d.low,
                    high: d.high,
                })
                .collect(),
        }),
        Space::Discrete(s) => FundamentalSpaceMsg::Discrete(DiscreteSpaceMsg {
            high: s.high().to_vec(),
        }),
        Space::Binary(s) => FundamentalSpaceMsg::Binary(BinarySpaceMsg {
            shape: s.shape() as u32,
        }),
    }
}

/// Decode one fundamental space, rejecting invalid bounds.
pub fn space_from_msg(msg: &FundamentalSpaceMsg) -> Result<Space, WireError> {
    Ok(match msg {
        FundamentalSpaceMsg::Box(s) => {
            let dims = s
                .dimensions
                .iter()
                .map(|d| BoxSpaceDimension::new(d.low, d.high))
                .collect::<Result<Vec<_>, _>>()?;
            Space::Box(BoxSpace::new(dims)?)
        }
        FundamentalSpaceMsg::Discrete(s) => Space::Discrete(DiscreteSpace::new(s.high.clone())?),
        FundamentalSpaceMsg::Binary(s) => Space::Binary(BinarySpace::new(s.shape as usize)),
    })
}

/// Encode a Dict space as parallel label/value arrays.
pub fn dict_space_to_msg(space: &DictSpace) -> DictSpaceMsg {
    let mut msg = DictSpaceMsg::default();
    for (label, child) in space.iter() {
        msg.labels.push(label.to_string());
        msg.values.push(space_to_msg(child));
    }
    msg
}

/// Decode a Dict space. Labels and values must pair up and labels must be unique.
pub fn dict_space_from_msg(msg: &DictSpaceMsg) -> Result<DictSpace, WireError> {
    if msg.labels.len() != msg.values.len() {
        return Err(WireError::LabelCountMismatch {
            labels: msg.labels.len(),
            values: msg.values.len(),
        });
    }
    let mut space = DictSpace::new();
    for (label, value) in msg.labels.iter().zip(&msg.values) {
        space.add(label.clone(), space_from_msg(value)?)?;
    }
    Ok(space)
}

// ── Points ──────────────────────────────────────────────────────

/// Encode one fundamental point.
pub fn point_to_msg(point: &Point) -> FundamentalPointMsg {
    match point {
        Point::Box(p) => FundamentalPointMsg::Box(p.values.clone()),
        Point::Discrete(p) => FundamentalPointMsg::Discrete(p.values.clone()),
        Point::Binary(p) => FundamentalPointMsg::Binary(p.values.clone()),
    }
}

/// Decode one fundamental point. Values are not validated against any space.
pub fn point_from_msg(msg: &FundamentalPointMsg) -> Point {
    match msg {
        FundamentalPointMsg::Box(v) => Point::Box(BoxPoint::new(v.clone())),
        FundamentalPointMsg::Discrete(v) => Point::Discrete(DiscretePoint::new(v.clone())),
        FundamentalPointMsg::Binary(v) => Point::Binary(BinaryPoint::new(v.clone())),
    }
}

/// Encode a Dict point, children in order.
pub fn dict_point_to_msg(point: &DictPoint) -> DictPointMsg {
    DictPointMsg {
        values: point.iter().map(point_to_msg).collect(),
    }
}

/// Decode a Dict point, children in order.
pub fn dict_point_from_msg(msg: &DictPointMsg) -> DictPoint {
    msg.values.iter().map(point_from_msg).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_space::SpaceError;

    fn mixed() -> DictSpace {
        let mut d = DictSpace::new();
        d.add("00000_pos", BoxSpace::from_bounds(&[-1.0, 0.0], &[1.0, 10.0]).unwrap())
            .unwrap();
        d.add("00001_choice", DiscreteSpace::new(vec![3, 2]).unwrap())
            .unwrap();
        d.add("00002_flags", BinarySpace::new(4)).unwrap();
        d
    }

    #[test]
    fn dict_space_survives_conversion() {
        let space = mixed();
        let back = dict_space_from_msg(&dict_space_to_msg(&space)).unwrap();
        assert_eq!(back, space);
        assert_eq!(
            back.labels().collect::<Vec<_>>(),
            vec!["00000_pos", "00001_choice", "00002_flags"]
        );
    }

    #[test]
    fn label_count_mismatch_rejected() {
        let mut msg = dict_space_to_msg(&mixed());
        msg.labels.pop();
        assert_eq!(
            dict_space_from_msg(&msg),
            Err(WireError::LabelCountMismatch {
                labels: 2,
                values: 3
            })
        );
    }

    #[test]
    fn inverted_box_bounds_rejected() {
        let msg = FundamentalSpaceMsg::Box(BoxSpaceMsg {
            dimensions: vec![BoxSpaceDimensionMsg { low: 2.0, high: 1.0 }],
        });
        assert_eq!(
            space_from_msg(&msg),
            Err(WireError::Space(SpaceError::InvalidBounds { low: 2.0, high: 1.0 }))
        );
    }

    #[test]
    fn duplicate_labels_rejected() {
        let msg = DictSpaceMsg {
            labels: vec!["a".into(), "a".into()],
            values: vec![
                FundamentalSpaceMsg::Binary(BinarySpaceMsg { shape: 1 }),
                FundamentalSpaceMsg::Binary(BinarySpaceMsg { shape: 1 }),
            ],
        };
        assert!(matches!(
            dict_space_from_msg(&msg),
            Err(WireError::Space(SpaceError::DuplicateLabel { .. }))
        ));
    }

    #[test]
    fn dict_point_keeps_child_order() {
        let point = DictPoint::new(vec![
            Point::Binary(BinaryPoint::new(vec![true])),
            Point::Box(BoxPoint::new(vec![0.25])),
            Point::Discrete(DiscretePoint::new(vec![1])),
        ]);
        let msg = dict_point_to_msg(&point);
        assert!(matches!(msg.values[0], FundamentalPointMsg::Binary(_)));
        assert_eq!(dict_point_from_msg(&msg), point);
    }
}
