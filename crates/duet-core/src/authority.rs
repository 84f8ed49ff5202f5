//! Authority registry: who may mutate and who may drive each entity
//!
//! Every networked entity has exactly one State Authority (the peer whose
//! writes to the entity's replicated fields are the truth) and at most one
//! Input Authority (the peer whose local input drives the entity).
//!
//! The rule "only the State Authority writes" is expressed once, in
//! [`AuthorityRegistry::grant_write`]. The returned [`WriteGrant`] cannot be
//! built anywhere else, and [`ReplicatedStore::write`](crate::ReplicatedStore::write)
//! only accepts writes that present one.

use crate::{EntityId, Error, PeerId, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The kind of authority a peer can hold over an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    /// May write replicated fields; target of intents
    State,
    /// May read local input and issue intents
    Input,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::State => write!(f, "state"),
            Role::Input => write!(f, "input"),
        }
    }
}

/// Authority assignment of a single entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityAuthority {
    /// Peer holding State Authority
    pub state: PeerId,
    /// Peer holding Input Authority, if the entity reads input at all
    pub input: Option<PeerId>,
}

impl EntityAuthority {
    /// An entity owned by `state` that reads no input
    pub fn state_only(state: PeerId) -> Self {
        Self { state, input: None }
    }

    /// An entity owned by `state` and driven by `input`
    pub fn with_input(state: PeerId, input: PeerId) -> Self {
        Self {
            state,
            input: Some(input),
        }
    }

    /// Whether `peer` holds `role` over this entity
    pub fn permits(&self, peer: PeerId, role: Role) -> bool {
        match role {
            Role::State => self.state == peer,
            Role::Input => self.input == Some(peer),
        }
    }
}

/// Capability to write the replicated fields of one entity
///
/// Only obtainable from [`AuthorityRegistry::grant_write`], so holding one
/// proves the holder is the entity's State Authority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteGrant {
    entity: EntityId,
    peer: PeerId,
}

impl WriteGrant {
    /// The entity this grant allows writing
    pub fn entity(&self) -> EntityId {
        self.entity
    }

    /// The peer holding the grant
    pub fn peer(&self) -> PeerId {
        self.peer
    }
}

/// Per-peer view of authority assignments
#[derive(Debug, Clone, Default)]
pub struct AuthorityRegistry {
    entries: IndexMap<EntityId, EntityAuthority>,
}

impl AuthorityRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign authority at spawn
    ///
    /// Fails without changing anything if the entity already has an
    /// assignment: authority is fixed for the entity's lifetime.
    pub fn assign(&mut self, entity: EntityId, authority: EntityAuthority) -> Result<()> {
        if self.entries.contains_key(&entity) {
            tracing::warn!(%entity, "authority reassignment refused");
            return Err(Error::AlreadyAssigned(entity));
        }
        self.entries.insert(entity, authority);
        Ok(())
    }

    /// Forget an entity (despawn)
    pub fn release(&mut self, entity: EntityId) -> Option<EntityAuthority> {
        self.entries.shift_remove(&entity)
    }

    /// Get the assignment of an entity
    pub fn get(&self, entity: EntityId) -> Option<&EntityAuthority> {
        self.entries.get(&entity)
    }

    /// Check whether the entity is known
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entries.contains_key(&entity)
    }

    /// Whether `peer` is the State Authority of `entity`
    pub fn has_state_authority(&self, entity: EntityId, peer: PeerId) -> bool {
        self.permits(entity, peer, Role::State)
    }

    /// Whether `peer` is the Input Authority of `entity`
    pub fn has_input_authority(&self, entity: EntityId, peer: PeerId) -> bool {
        self.permits(entity, peer, Role::Input)
    }

    /// Whether `peer` holds `role` over `entity`; unknown entities permit nothing
    pub fn permits(&self, entity: EntityId, peer: PeerId, role: Role) -> bool {
        self.entries
            .get(&entity)
            .is_some_and(|authority| authority.permits(peer, role))
    }

    /// Check that `peer` holds `role` over `entity`
    pub fn require(&self, entity: EntityId, peer: PeerId, role: Role) -> Result<()> {
        if !self.contains(entity) {
            return Err(Error::EntityNotFound(entity));
        }
        if self.permits(entity, peer, role) {
            Ok(())
        } else {
            Err(Error::AuthorityViolation { peer, entity, role })
        }
    }

    /// Obtain the capability to write `entity`'s replicated fields
    pub fn grant_write(&self, entity: EntityId, peer: PeerId) -> Result<WriteGrant> {
        self.require(entity, peer, Role::State)?;
        Ok(WriteGrant { entity, peer })
    }

    /// Entities over which `peer` holds `role`, in spawn order
    pub fn owned_by(&self, peer: PeerId, role: Role) -> impl Iterator<Item = EntityId> + '_ {
        self.entries
            .iter()
            .filter(move |(_, authority)| authority.permits(peer, role))
            .map(|(id, _)| *id)
    }

    /// Number of registered entities
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
