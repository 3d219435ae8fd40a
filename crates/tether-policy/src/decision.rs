//! The result of one decision request.

use tether_space::DictPoint;

/// What a policy produced for one observation.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum PolicyDecision {
    /// A structured action, one child per actuator.
    Action(DictPoint),
    /// No decision. Leaves the brain's status unchanged.
    #[default]
    Empty,
    /// The policy could not decide (no model, model failure, timeout).
    Error,
}

impl PolicyDecision {
    /// `true` for [`Action`](Self::Action).
    pub fn is_action(&self) -> bool {
        matches!(self, Self::Action(_))
    }

    /// `true` for [`Empty`](Self::Empty).
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// `true` for [`Error`](Self::Error).
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error)
    }

    /// The action, if this is one.
    pub fn action(&self) -> Option<&DictPoint> {
        match self {
            Self::Action(a) => Some(a),
            _ => None,
        }
    }
}
