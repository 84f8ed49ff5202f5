//! Error types for duet-core
//!
//! None of these are fatal. Every variant describes a request that was
//! dropped at the point of detection; the simulation keeps running.

use crate::{EntityId, ModeTag, PeerId, Role};
use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A write or intent execution by a peer lacking the required authority
    #[error("authority violation: {peer} lacks {role} authority over {entity}")]
    AuthorityViolation {
        peer: PeerId,
        entity: EntityId,
        role: Role,
    },

    /// A one-shot mutation arrived after its guard was already set
    #[error("guard already set on {0}")]
    GuardAlreadySet(EntityId),

    /// An exclusive mode was requested while another exclusive mode is active
    #[error("invalid transition: {from} -> {to}")]
    InvalidTransition { from: ModeTag, to: ModeTag },

    /// A collaborator needed by a feature is not configured
    #[error("missing collaborator: {0}")]
    MissingCollaborator(&'static str),

    /// Authority was already assigned to this entity
    #[error("authority already assigned for {0}")]
    AlreadyAssigned(EntityId),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Type error on field {field}: expected {expected}, got {got}")]
    TypeError {
        field: String,
        expected: &'static str,
        got: &'static str,
    },

    /// A state index outside the object's accepted range
    #[error("index {index} out of range 0..={max} for {entity}")]
    InvalidIndex { entity: EntityId, index: i64, max: i64 },

    /// A carry request for an object already carried by someone else
    #[error("{entity} is already carried by {carrier}")]
    CarryOccupied { entity: EntityId, carrier: EntityId },
}

impl Error {
    /// Whether this error is an expected, benign rejection (a lost race or a
    /// duplicate request) rather than a misbehaving peer
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            Error::GuardAlreadySet(_)
                | Error::InvalidTransition { .. }
                | Error::CarryOccupied { .. }
                | Error::MissingCollaborator(_)
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
