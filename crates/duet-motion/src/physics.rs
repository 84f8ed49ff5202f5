//! Physics query collaborator
//!
//! Locomotion and carry logic only ever ask two questions of the world: what
//! does a ray hit, and what overlaps a sphere. [`PhysicsQuery`] is that seam.
//! [`StaticScene`] answers it over tagged axis-aligned boxes, which is all a
//! level blockout needs.

use duet_core::EntityId;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::BitOr;

/// Gameplay tag of a collider surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SurfaceTag {
    /// Walkable floor
    Ground,
    /// Obstruction; blocks ledge traversal and carried objects
    Wall,
    /// Grabbable ledge edge
    Ledge,
    /// Object an actor can interact with
    Interact,
    /// Object an actor can carry or push
    Carryable,
}

impl SurfaceTag {
    /// The single-tag layer mask of this tag
    pub fn layer(self) -> LayerMask {
        let bit = match self {
            SurfaceTag::Ground => 0,
            SurfaceTag::Wall => 1,
            SurfaceTag::Ledge => 2,
            SurfaceTag::Interact => 3,
            SurfaceTag::Carryable => 4,
        };
        LayerMask(1 << bit)
    }
}

impl fmt::Display for SurfaceTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SurfaceTag::Ground => "ground",
            SurfaceTag::Wall => "wall",
            SurfaceTag::Ledge => "ledge",
            SurfaceTag::Interact => "interact",
            SurfaceTag::Carryable => "carryable",
        };
        f.write_str(name)
    }
}

/// Set of surface tags a query considers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const NONE: LayerMask = LayerMask(0);
    pub const ALL: LayerMask = LayerMask(u32::MAX);
    pub const GROUND: LayerMask = LayerMask(1 << 0);
    pub const WALL: LayerMask = LayerMask(1 << 1);
    pub const LEDGE: LayerMask = LayerMask(1 << 2);
    pub const INTERACT: LayerMask = LayerMask(1 << 3);
    pub const CARRYABLE: LayerMask = LayerMask(1 << 4);

    /// Whether the mask includes `tag`
    pub fn contains(self, tag: SurfaceTag) -> bool {
        self.0 & tag.layer().0 != 0
    }
}

impl BitOr for LayerMask {
    type Output = LayerMask;

    fn bitor(self, rhs: LayerMask) -> LayerMask {
        LayerMask(self.0 | rhs.0)
    }
}

/// Result of a successful raycast
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    /// Outward surface normal at `point`
    pub normal: Vec3,
    pub distance: f32,
    pub tag: SurfaceTag,
    /// Networked entity owning the collider, if any
    pub entity: Option<EntityId>,
}

/// A collider found by a sphere overlap
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Overlap {
    pub tag: SurfaceTag,
    pub entity: Option<EntityId>,
}

/// Spatial queries against the level
pub trait PhysicsQuery {
    /// Cast a ray and return the nearest hit on `mask` within `max_distance`
    ///
    /// Colliders containing `origin` are not hit.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit>;

    /// Every collider on `mask` touching the sphere
    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<Overlap>;
}

/// An axis-aligned box collider
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Collider {
    pub min: Vec3,
    pub max: Vec3,
    pub tag: SurfaceTag,
    pub entity: Option<EntityId>,
}

impl Collider {
    /// Box spanning two corners
    pub fn new(min: Vec3, max: Vec3, tag: SurfaceTag) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
            tag,
            entity: None,
        }
    }

    /// Box around a center
    pub fn centered(center: Vec3, half_extents: Vec3, tag: SurfaceTag) -> Self {
        Self::new(center - half_extents, center + half_extents, tag)
    }

    /// Attach the collider to a networked entity
    pub fn with_entity(mut self, entity: EntityId) -> Self {
        self.entity = Some(entity);
        self
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Slab test; returns entry distance and entry face normal
    fn ray_entry(&self, origin: Vec3, direction: Vec3, max_distance: f32) -> Option<(f32, Vec3)> {
        const AXES: [Vec3; 3] = [Vec3::X, Vec3::Y, Vec3::Z];

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = max_distance;
        let mut normal = Vec3::ZERO;

        for (axis, unit) in AXES.iter().enumerate() {
            let o = origin[axis];
            let d = direction[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);

            if d.abs() < 1e-8 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }

            let (near, far, face) = if d > 0.0 {
                ((lo - o) / d, (hi - o) / d, -*unit)
            } else {
                ((hi - o) / d, (lo - o) / d, *unit)
            };
            if near > t_enter {
                t_enter = near;
                normal = face;
            }
            t_exit = t_exit.min(far);
            if t_enter > t_exit {
                return None;
            }
        }

        (t_enter >= 0.0).then_some((t_enter, normal))
    }

    fn touches_sphere(&self, center: Vec3, radius: f32) -> bool {
        let closest = center.clamp(self.min, self.max);
        closest.distance_squared(center) <= radius * radius
    }
}

/// Level geometry made of tagged boxes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StaticScene {
    colliders: Vec<Collider>,
}

impl StaticScene {
    /// Create an empty scene
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a box spanning two corners
    pub fn with_box(mut self, min: Vec3, max: Vec3, tag: SurfaceTag) -> Self {
        self.colliders.push(Collider::new(min, max, tag));
        self
    }

    /// Add a collider
    pub fn add(&mut self, collider: Collider) {
        self.colliders.push(collider);
    }

    /// Insert or move the collider of a networked entity
    pub fn upsert_entity(&mut self, collider: Collider) {
        let Some(entity) = collider.entity else {
            self.colliders.push(collider);
            return;
        };
        match self.colliders.iter_mut().find(|c| c.entity == Some(entity)) {
            Some(existing) => *existing = collider,
            None => self.colliders.push(collider),
        }
    }

    /// Recenter the collider of a networked entity, keeping its size
    pub fn move_entity(&mut self, entity: EntityId, center: Vec3) -> bool {
        match self.colliders.iter_mut().find(|c| c.entity == Some(entity)) {
            Some(collider) => {
                let half = collider.half_extents();
                collider.min = center - half;
                collider.max = center + half;
                true
            }
            None => false,
        }
    }

    /// Remove the collider of a networked entity
    pub fn remove_entity(&mut self, entity: EntityId) {
        self.colliders.retain(|c| c.entity != Some(entity));
    }

    pub fn colliders(&self) -> &[Collider] {
        &self.colliders
    }
}

impl PhysicsQuery for StaticScene {
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        mask: LayerMask,
    ) -> Option<RayHit> {
        let direction = direction.try_normalize()?;

        self.colliders
            .iter()
            .filter(|c| mask.contains(c.tag))
            .filter_map(|c| {
                c.ray_entry(origin, direction, max_distance)
                    .map(|(distance, normal)| RayHit {
                        point: origin + direction * distance,
                        normal,
                        distance,
                        tag: c.tag,
                        entity: c.entity,
                    })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    fn overlap_sphere(&self, center: Vec3, radius: f32, mask: LayerMask) -> Vec<Overlap> {
        self.colliders
            .iter()
            .filter(|c| mask.contains(c.tag) && c.touches_sphere(center, radius))
            .map(|c| Overlap {
                tag: c.tag,
                entity: c.entity,
            })
            .collect()
    }
}
