//! Spawn descriptions
//!
//! A [`SpawnSpec`] is everything every peer needs to create the same entity:
//! its kind (with spawn-time links), its authority assignment and its
//! initial transform. The session applies it identically on every peer.

use duet_core::{fields, EntityAuthority, EntityId, PeerId, Value, ValueMap};
use duet_motion::{Collider, SurfaceTag};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// Highest paint index accepted by default
pub const DEFAULT_MAX_INDEX: i64 = 4;

/// What an entity is
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum EntityKind {
    /// Player-controlled actor
    Actor,
    /// One-shot paintable object, optionally counted by a shared counter
    Paintable {
        max_index: i64,
        counter: Option<EntityId>,
    },
    /// Shared progress counter with a win threshold
    Counter { target: i64 },
    /// One-shot pressure switch toggling a gate
    Switch { gate: Option<EntityId> },
    /// Bridge or door; walkable while open
    Gate { open: bool },
    /// Object actors can push or carry
    Carryable,
    /// Countdown towards defeat
    Timer { seconds: f32 },
}

impl EntityKind {
    pub fn name(&self) -> &'static str {
        match self {
            EntityKind::Actor => "actor",
            EntityKind::Paintable { .. } => "paintable",
            EntityKind::Counter { .. } => "counter",
            EntityKind::Switch { .. } => "switch",
            EntityKind::Gate { .. } => "gate",
            EntityKind::Carryable => "carryable",
            EntityKind::Timer { .. } => "timer",
        }
    }

    /// Forget a link to `entity`
    pub fn unlink(&mut self, entity: EntityId) {
        match self {
            EntityKind::Paintable { counter, .. } if *counter == Some(entity) => *counter = None,
            EntityKind::Switch { gate } if *gate == Some(entity) => *gate = None,
            _ => {}
        }
    }

    /// Surface tag of the entity's collider, if it has one
    pub fn surface(&self) -> Option<SurfaceTag> {
        match self {
            EntityKind::Paintable { .. } | EntityKind::Switch { .. } => Some(SurfaceTag::Interact),
            EntityKind::Carryable => Some(SurfaceTag::Carryable),
            EntityKind::Gate { .. } => Some(SurfaceTag::Ground),
            EntityKind::Actor | EntityKind::Counter { .. } | EntityKind::Timer { .. } => None,
        }
    }

    /// Whether the entity is placed in the world
    fn has_transform(&self) -> bool {
        !matches!(self, EntityKind::Counter { .. } | EntityKind::Timer { .. })
    }
}

/// Description of an entity to spawn
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpawnSpec {
    pub kind: EntityKind,
    pub authority: EntityAuthority,
    pub position: Vec3,
    pub rotation: Quat,
    /// Collider half extents, for kinds with a collider
    pub half_extents: Vec3,
}

impl SpawnSpec {
    /// A spec owned by the host at the origin
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            authority: EntityAuthority::state_only(PeerId::HOST),
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            half_extents: Vec3::splat(0.5),
        }
    }

    /// An actor driven by `owner`, simulated authoritatively by the host
    pub fn actor(owner: PeerId, position: Vec3) -> Self {
        Self::new(EntityKind::Actor)
            .with_authority(EntityAuthority::with_input(PeerId::HOST, owner))
            .at(position)
    }

    pub fn paintable(position: Vec3, counter: Option<EntityId>) -> Self {
        Self::new(EntityKind::Paintable {
            max_index: DEFAULT_MAX_INDEX,
            counter,
        })
        .at(position)
    }

    pub fn counter(target: i64) -> Self {
        Self::new(EntityKind::Counter { target })
    }

    pub fn switch(position: Vec3, gate: Option<EntityId>) -> Self {
        Self::new(EntityKind::Switch { gate }).at(position)
    }

    pub fn gate(position: Vec3, half_extents: Vec3) -> Self {
        Self::new(EntityKind::Gate { open: false })
            .at(position)
            .with_extents(half_extents)
    }

    pub fn carryable(position: Vec3) -> Self {
        Self::new(EntityKind::Carryable).at(position)
    }

    pub fn timer(seconds: f32) -> Self {
        Self::new(EntityKind::Timer { seconds })
    }

    pub fn at(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_extents(mut self, half_extents: Vec3) -> Self {
        self.half_extents = half_extents;
        self
    }

    pub fn with_authority(mut self, authority: EntityAuthority) -> Self {
        self.authority = authority;
        self
    }

    /// Move State Authority to another peer, keeping Input Authority
    pub fn owned_by(mut self, peer: PeerId) -> Self {
        self.authority.state = peer;
        self
    }

    /// Drop a counter or gate link pointing at a despawned entity
    pub fn unlink(&mut self, entity: EntityId) {
        self.kind.unlink(entity);
    }

    /// Replicated fields at spawn
    pub fn initial_fields(&self) -> ValueMap {
        let mut map = ValueMap::new();
        if self.kind.has_transform() {
            map.insert(fields::POSITION.into(), self.position.into());
            map.insert(fields::ROTATION.into(), self.rotation.into());
        }
        match self.kind {
            EntityKind::Actor => {
                map.insert(fields::MODE.into(), Value::Int(0));
            }
            EntityKind::Paintable { .. } => {
                map.insert(fields::STATE_INDEX.into(), Value::Int(-1));
                map.insert(fields::USED.into(), false.into());
            }
            EntityKind::Counter { target } => {
                map.insert(fields::COUNT.into(), Value::Int(0));
                map.insert(fields::TARGET.into(), Value::Int(target));
                map.insert(fields::REACHED.into(), false.into());
            }
            EntityKind::Switch { .. } => {
                map.insert(fields::USED.into(), false.into());
            }
            EntityKind::Gate { open } => {
                map.insert(fields::OPEN.into(), open.into());
            }
            EntityKind::Carryable => {
                map.insert(fields::CARRIER.into(), Value::Null);
            }
            EntityKind::Timer { seconds } => {
                map.insert(fields::REMAINING.into(), seconds.into());
                map.insert(fields::EXPIRED.into(), false.into());
            }
        }
        map
    }

    /// Collider for the level scene
    pub fn collider(&self, entity: EntityId) -> Option<Collider> {
        let tag = self.kind.surface()?;
        Some(Collider::centered(self.position, self.half_extents, tag).with_entity(entity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_actor_authority() {
        let spec = SpawnSpec::actor(PeerId::new(2), Vec3::ONE);
        assert_eq!(spec.authority.state, PeerId::HOST);
        assert_eq!(spec.authority.input, Some(PeerId::new(2)));
        assert!(spec.collider(EntityId::new(1)).is_none());

        let values = spec.initial_fields();
        assert_eq!(values.get(fields::POSITION), Some(&Value::Vec3(Vec3::ONE)));
        assert_eq!(values.get(fields::MODE), Some(&Value::Int(0)));
    }

    #[test]
    fn test_paintable_fields() {
        let spec = SpawnSpec::paintable(Vec3::ZERO, Some(EntityId::new(7)));
        let values = spec.initial_fields();
        assert_eq!(values.get(fields::STATE_INDEX), Some(&Value::Int(-1)));
        assert_eq!(values.get(fields::USED), Some(&Value::Bool(false)));

        let collider = spec.collider(EntityId::new(3)).unwrap();
        assert_eq!(collider.tag, SurfaceTag::Interact);
        assert_eq!(collider.entity, Some(EntityId::new(3)));
    }

    #[test]
    fn test_counter_has_no_transform() {
        let values = SpawnSpec::counter(4).initial_fields();
        assert!(values.get(fields::POSITION).is_none());
        assert_eq!(values.get(fields::TARGET), Some(&Value::Int(4)));
    }

    #[test]
    fn test_owned_by_keeps_input() {
        let spec = SpawnSpec::actor(PeerId::new(1), Vec3::ZERO).owned_by(PeerId::new(1));
        assert_eq!(
            spec.authority,
            EntityAuthority::with_input(PeerId::new(1), PeerId::new(1))
        );
    }
}
