//! Strongly-typed identifiers and the [`UidAuthority`] that issues agent UIDs.

use std::fmt;

/// Identifies an environment within a gym connector.
///
/// Environments are registered once and never deregistered, so
/// `EnvId(n)` is simply the n-th registered environment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EnvId(pub u32);

impl fmt::Display for EnvId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for EnvId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Identifies an agent within its environment.
///
/// Assigned in ascending order as agents register; an environment's
/// next index is always one past the largest index handed out.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AgentIndex(pub u32);

impl fmt::Display for AgentIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AgentIndex {
    fn from(v: u32) -> Self {
        Self(v)
    }
}

/// Fully-qualified agent address: environment plus per-environment index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AgentKey {
    /// Owning environment.
    pub env_id: EnvId,
    /// Index within the environment.
    pub agent_id: AgentIndex,
}

impl AgentKey {
    /// Build a key from raw environment and agent indices.
    pub fn new(env_id: impl Into<EnvId>, agent_id: impl Into<AgentIndex>) -> Self {
        Self {
            env_id: env_id.into(),
            agent_id: agent_id.into(),
        }
    }
}

impl fmt::Display for AgentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "env{}/agent{}", self.env_id, self.agent_id)
    }
}

/// Process-unique agent identifier issued by a [`UidAuthority`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentUid(pub u64);

impl fmt::Display for AgentUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The single registration authority for [`AgentUid`]s.
///
/// Owned by the subsystem driver and passed by `&mut` to every agent
/// during initialization. There is no ambient global counter: two
/// authorities issue overlapping sequences, so a session must route all
/// registrations through one instance.
///
/// # Examples
///
/// ```
/// use tether_core::{AgentUid, UidAuthority};
///
/// let mut uids = UidAuthority::new();
/// assert_eq!(uids.issue(), AgentUid(0));
/// assert_eq!(uids.issue(), AgentUid(1));
/// assert_eq!(uids.issued(), 2);
/// ```
#[derive(Debug, Default)]
pub struct UidAuthority {
    next: u64,
}

impl UidAuthority {
    /// Create an authority whose first UID is `0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next UID.
    pub fn issue(&mut self) -> AgentUid {
        let uid = AgentUid(self.next);
        self.next += 1;
        uid
    }

    /// Number of UIDs issued so far.
    pub fn issued(&self) -> u64 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn agent_key_display() {
        let key = AgentKey::new(3u32, 7u32);
        assert_eq!(key.to_string(), "env3/agent7");
    }

    #[test]
    fn agent_keys_order_by_env_then_agent() {
        let a = AgentKey::new(0u32, 9u32);
        let b = AgentKey::new(1u32, 0u32);
        assert!(a < b);
    }

    proptest! {
        #[test]
        fn authority_never_repeats(n in 1usize..512) {
            let mut uids = UidAuthority::new();
            let issued: Vec<AgentUid> = (0..n).map(|_| uids.issue()).collect();
            for pair in issued.windows(2) {
                prop_assert!(pair[0] < pair[1]);
            }
            prop_assert_eq!(uids.issued(), n as u64);
        }
    }
}
