//! Kinematic character body
//!
//! A capsule-ish body moved by explicit displacements. It resolves only what
//! locomotion needs: ground contact (probe down and snap) and horizontal
//! blocking (probe along the move and stop short). The controller can be
//! disabled while the actor hangs from or climbs a ledge; moves are then
//! applied verbatim.

use crate::physics::{LayerMask, PhysicsQuery};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// How far above the feet the ground probe starts
const GROUND_PROBE_LIFT: f32 = 0.3;
/// Extra probe length so a resting body keeps contact
const GROUND_SNAP: f32 = 0.05;
/// Height of the horizontal blocking probe
const BODY_PROBE_HEIGHT: f32 = 0.5;

/// Position, rotation and velocity of an actor
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterBody {
    /// Feet position
    pub position: Vec3,
    pub rotation: Quat,
    pub velocity: Vec3,
    /// Horizontal radius used for wall blocking
    pub radius: f32,
    /// Whether the physical controller resolves collisions
    pub controller_enabled: bool,
    /// Ground contact after the last move
    pub grounded: bool,
}

impl CharacterBody {
    /// A body at rest, facing +Z
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            rotation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            radius: 0.3,
            controller_enabled: true,
            grounded: false,
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    /// Facing direction
    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Right-hand direction
    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    /// Turn to face a horizontal direction; ignored for near-zero directions
    pub fn face(&mut self, direction: Vec3) {
        if let Some(rotation) = look_rotation(direction) {
            self.rotation = rotation;
        }
    }

    /// Move by `delta`, resolving ground and walls when the controller is enabled
    pub fn move_by(&mut self, delta: Vec3, physics: &dyn PhysicsQuery) {
        if !self.controller_enabled {
            self.position += delta;
            return;
        }

        let horizontal = Vec3::new(delta.x, 0.0, delta.z);
        let distance = horizontal.length();
        if distance > 1e-6 {
            let direction = horizontal / distance;
            let origin = self.position + Vec3::Y * BODY_PROBE_HEIGHT;
            let allowed = match physics.raycast(
                origin,
                direction,
                distance + self.radius,
                solid_mask(),
            ) {
                Some(hit) => (hit.distance - self.radius).max(0.0),
                None => distance,
            };
            self.position += direction * allowed;
        }

        self.resolve_vertical(delta.y, physics);
    }

    /// Probe for ground without moving; updates `grounded`
    pub fn probe_ground(&mut self, physics: &dyn PhysicsQuery) -> bool {
        self.resolve_vertical(0.0, physics);
        self.grounded
    }

    fn resolve_vertical(&mut self, dy: f32, physics: &dyn PhysicsQuery) {
        if dy > 0.0 {
            self.position.y += dy;
            self.grounded = false;
            return;
        }

        let origin = self.position + Vec3::Y * GROUND_PROBE_LIFT;
        let reach = GROUND_PROBE_LIFT - dy + GROUND_SNAP;
        match physics.raycast(origin, Vec3::NEG_Y, reach, solid_mask()) {
            Some(hit) if hit.normal.y > 0.5 => {
                self.position.y = hit.point.y;
                self.grounded = true;
            }
            _ => {
                self.position.y += dy;
                self.grounded = false;
            }
        }
    }
}

/// Colliders the body cannot pass through; carryable objects are pushed, not walked into
fn solid_mask() -> LayerMask {
    LayerMask::GROUND | LayerMask::WALL | LayerMask::LEDGE | LayerMask::INTERACT
}

/// Rotation whose forward (+Z) points along the horizontal part of `direction`
pub fn look_rotation(direction: Vec3) -> Option<Quat> {
    let flat = Vec3::new(direction.x, 0.0, direction.z);
    if flat.length_squared() < 1e-8 {
        return None;
    }
    Some(Quat::from_rotation_y(flat.x.atan2(flat.z)))
}
