//! Carry/push follower
//!
//! A carryable object stores its carrier in the replicated `carrier` field.
//! While the field is set, the object's State Authority pulls the object
//! toward the carrier's hold point every tick with a rate-limited blend, and
//! drops it as soon as it would touch a wall.

use crate::config::CarryConfig;
use duet_core::{fields, EntityId, Error, ReplicatedStore, Result, Tick, Value, WriteGrant};
use duet_motion::{LayerMask, PhysicsQuery, StaticScene};
use glam::{Quat, Vec3};

/// What one follow step did
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FollowOutcome {
    /// Nobody carries the object
    Idle,
    Moved { position: Vec3 },
    /// The object hit a wall and was released by `carrier`
    Blocked { carrier: EntityId },
}

/// Operations on carryable objects
pub struct Carryable;

impl Carryable {
    /// Current carrier, if any
    pub fn carrier(store: &ReplicatedStore, entity: EntityId) -> Option<EntityId> {
        store.get_entity_ref(entity, fields::CARRIER)
    }

    /// Attach the object to `carrier`
    ///
    /// Returns `Ok(false)` if `carrier` already holds it and fails with
    /// `CarryOccupied` if someone else does.
    pub fn start(
        store: &mut ReplicatedStore,
        grant: &WriteGrant,
        carrier: EntityId,
        tick: Tick,
    ) -> Result<bool> {
        let entity = grant.entity();
        match Self::carrier(store, entity) {
            Some(current) if current == carrier => Ok(false),
            Some(current) => Err(Error::CarryOccupied {
                entity,
                carrier: current,
            }),
            None => store.write(grant, fields::CARRIER, carrier, tick),
        }
    }

    /// Detach the object if `carrier` holds it; returns whether it did
    pub fn stop(
        store: &mut ReplicatedStore,
        grant: &WriteGrant,
        carrier: EntityId,
        tick: Tick,
    ) -> Result<bool> {
        if Self::carrier(store, grant.entity()) != Some(carrier) {
            return Ok(false);
        }
        store.write(grant, fields::CARRIER, Value::Null, tick)
    }

    /// Detach the object whoever holds it, returning the former carrier
    pub fn clear(
        store: &mut ReplicatedStore,
        grant: &WriteGrant,
        tick: Tick,
    ) -> Result<Option<EntityId>> {
        let previous = Self::carrier(store, grant.entity());
        if previous.is_some() {
            store.write(grant, fields::CARRIER, Value::Null, tick)?;
        }
        Ok(previous)
    }

    /// Move the object one tick toward its carrier's hold point
    ///
    /// `carrier_pose` is the carrier's position and rotation as known to this
    /// peer. The scene collider follows the object.
    pub fn follow(
        store: &mut ReplicatedStore,
        grant: &WriteGrant,
        scene: &mut StaticScene,
        config: &CarryConfig,
        carrier_pose: (Vec3, Quat),
        dt: f32,
        tick: Tick,
    ) -> Result<FollowOutcome> {
        let entity = grant.entity();
        let Some(carrier) = Self::carrier(store, entity) else {
            return Ok(FollowOutcome::Idle);
        };

        let (carrier_position, carrier_rotation) = carrier_pose;
        let position = store
            .get_vec3(entity, fields::POSITION)
            .unwrap_or(carrier_position);
        let rotation = store
            .get_quat(entity, fields::ROTATION)
            .unwrap_or(carrier_rotation);

        let hold_point = carrier_position + carrier_rotation * config.hold_offset;
        let next_position = position.lerp(hold_point, (config.position_lerp * dt).min(1.0));
        let next_rotation = rotation
            .slerp(carrier_rotation, (config.rotation_lerp * dt).min(1.0))
            .normalize();

        let walls = scene.overlap_sphere(next_position, config.collision_radius, LayerMask::WALL);
        if !walls.is_empty() {
            store.write(grant, fields::CARRIER, Value::Null, tick)?;
            return Ok(FollowOutcome::Blocked { carrier });
        }

        store.write(grant, fields::POSITION, next_position, tick)?;
        store.write(grant, fields::ROTATION, next_rotation, tick)?;
        scene.move_entity(entity, next_position);
        Ok(FollowOutcome::Moved {
            position: next_position,
        })
    }
}
