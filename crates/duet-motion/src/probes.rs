//! Raycast probes used by the locomotion state machine

use crate::body::{look_rotation, CharacterBody};
use crate::config::LocomotionConfig;
use crate::physics::{LayerMask, PhysicsQuery, RayHit, SurfaceTag};
use glam::{Quat, Vec3};

/// Cast the stacked forward rays and return the first ledge hit, lowest ray first
pub fn scan_ledge(
    config: &LocomotionConfig,
    layer: LayerMask,
    body: &CharacterBody,
    physics: &dyn PhysicsQuery,
) -> Option<RayHit> {
    let forward = body.forward();
    (0..config.ray_amount).find_map(|i| {
        let height = config.ray_height + config.ray_offset * i as f32;
        let origin = body.position + Vec3::Y * height;
        physics
            .raycast(origin, forward, config.ray_length, layer)
            .filter(|hit| hit.tag == SurfaceTag::Ledge)
    })
}

/// Hanging position and rotation for a ledge hit
///
/// The actor faces into the wall and hangs slightly above and in front of
/// the hit point.
pub fn grab_pose(config: &LocomotionConfig, hit: &RayHit, fallback: Quat) -> (Vec3, Quat) {
    let rotation = look_rotation(-hit.normal).unwrap_or(fallback);
    let forward = rotation * Vec3::Z;
    let position =
        hit.point + Vec3::Y * config.grab_height_offset - forward * config.grab_forward_offset;
    (position, rotation)
}

/// Whether something other than a ledge blocks sideways movement along `direction`
pub fn blocked_laterally(
    config: &LocomotionConfig,
    body: &CharacterBody,
    direction: Vec3,
    physics: &dyn PhysicsQuery,
) -> bool {
    let origin = body.position + Vec3::Y * config.lateral_ray_offset;
    physics
        .raycast(origin, direction, config.lateral_ray_length, LayerMask::ALL)
        .is_some_and(|hit| hit.tag != SurfaceTag::Ledge)
}

/// Whether the ledge continues a step further along `direction`
pub fn ledge_continues(
    config: &LocomotionConfig,
    layer: LayerMask,
    body: &CharacterBody,
    direction: Vec3,
    physics: &dyn PhysicsQuery,
) -> bool {
    let origin = body.position
        + direction * config.ledge_continuity_lateral_offset
        + Vec3::Y * config.lateral_ray_offset;
    physics
        .raycast(origin, body.forward(), config.ray_length * 0.8, layer)
        .is_some()
}

/// The networked object in front of the actor, if any
pub fn probe_interact(
    config: &LocomotionConfig,
    layer: LayerMask,
    body: &CharacterBody,
    physics: &dyn PhysicsQuery,
) -> Option<RayHit> {
    let origin = body.position + Vec3::Y * config.interact_ray_height;
    physics
        .raycast(origin, body.forward(), config.interact_distance, layer)
        .filter(|hit| {
            hit.entity.is_some()
                && matches!(hit.tag, SurfaceTag::Interact | SurfaceTag::Carryable)
        })
}
