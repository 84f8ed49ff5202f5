//! Transform interpolation for smooth rendering
//!
//! Replicated positions change once per tick, while the display runs at its
//! own rate. The interpolator keeps the two most recent transforms of each
//! entity and blends between them with the clock's render alpha.

use duet_core::{EntityId, Tick};
use glam::{Quat, Vec3};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// World-space position and rotation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Transform {
    /// Create a transform
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// Blend toward `other`; `alpha` 0 is `self`, 1 is `other`
    pub fn lerp(&self, other: &Transform, alpha: f32) -> Transform {
        let alpha = alpha.clamp(0.0, 1.0);
        Transform {
            position: self.position.lerp(other.position, alpha),
            rotation: self.rotation.slerp(other.rotation, alpha),
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::ZERO, Quat::IDENTITY)
    }
}

#[derive(Debug, Clone, Copy)]
struct Samples {
    prev: Option<(Tick, Transform)>,
    curr: (Tick, Transform),
}

/// Per-entity interpolator
#[derive(Debug, Default)]
pub struct Interpolator {
    entities: IndexMap<EntityId, Samples>,
}

impl Interpolator {
    /// Create a new interpolator
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the transform an entity had at `tick`
    ///
    /// Pushing the same tick twice replaces the current sample.
    pub fn push(&mut self, entity: EntityId, tick: Tick, transform: Transform) {
        match self.entities.get_mut(&entity) {
            Some(samples) if samples.curr.0 == tick => samples.curr.1 = transform,
            Some(samples) if samples.curr.0 < tick => {
                samples.prev = Some(samples.curr);
                samples.curr = (tick, transform);
            }
            Some(_) => {}
            None => {
                self.entities.insert(
                    entity,
                    Samples {
                        prev: None,
                        curr: (tick, transform),
                    },
                );
            }
        }
    }

    /// Get the blended transform of an entity
    ///
    /// `alpha` is the interpolation factor:
    /// - 0.0 = previous sample
    /// - 1.0 = current sample
    pub fn interpolate(&self, entity: EntityId, alpha: f32) -> Option<Transform> {
        let samples = self.entities.get(&entity)?;
        Some(match samples.prev {
            Some((_, prev)) => prev.lerp(&samples.curr.1, alpha),
            None => samples.curr.1,
        })
    }

    /// Get the tick of an entity's newest sample
    pub fn current_tick(&self, entity: EntityId) -> Option<Tick> {
        self.entities.get(&entity).map(|s| s.curr.0)
    }

    /// Check if interpolation is possible (two samples held)
    pub fn can_interpolate(&self, entity: EntityId) -> bool {
        self.entities
            .get(&entity)
            .is_some_and(|s| s.prev.is_some())
    }

    /// Entities with at least one sample
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Forget an entity
    pub fn remove(&mut self, entity: EntityId) {
        self.entities.shift_remove(&entity);
    }

    /// Reset the interpolator
    pub fn reset(&mut self) {
        self.entities.clear();
    }
}
