//! Identity types for peers and networked entities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a networked entity within a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Create a new entity ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "entity:{}", self.0)
    }
}

/// Identifier of a session participant
///
/// Peer 0 is the host: the peer that creates the session and, by convention,
/// holds State Authority over shared world objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeerId(pub u64);

impl PeerId {
    /// The host peer
    pub const HOST: PeerId = PeerId(0);

    /// Create a new peer ID
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw ID value
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Check if this is the host peer
    pub fn is_host(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_host() {
            write!(f, "peer:host")
        } else {
            write!(f, "peer:{}", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_id() {
        let id = EntityId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "entity:42");
    }

    #[test]
    fn test_peer_id() {
        assert!(PeerId::HOST.is_host());
        assert_eq!(format!("{}", PeerId::HOST), "peer:host");

        let peer = PeerId::new(3);
        assert!(!peer.is_host());
        assert_eq!(format!("{}", peer), "peer:3");
    }
}
