//! Presentation seam
//!
//! A peer reports what its player should see through [`Presentation`]:
//! effects as they arrive, mode changes of its own actors as they happen, and
//! mirrored state once per render. Every method has an empty default, so an
//! implementation only overrides what it draws.

use duet_core::{EffectKind, Effect, EntityId, ModeTag, Value, ValueMap};
use duet_netcode::Transform;
use indexmap::IndexMap;

/// Receiver of everything a peer wants shown
pub trait Presentation {
    /// An actor changed locomotion mode
    fn mode_changed(&mut self, _actor: EntityId, _from: ModeTag, _to: ModeTag) {}

    /// An effect was applied or received
    fn effect(&mut self, _effect: &Effect) {}

    /// A paintable shows a new state index
    fn mutation_applied(&mut self, _entity: EntityId, _index: i64) {}

    fn counter_changed(&mut self, _counter: EntityId, _count: i64, _target: i64) {}

    fn gate_changed(&mut self, _gate: EntityId, _open: bool) {}

    /// Seconds left on a countdown
    fn timer_changed(&mut self, _timer: EntityId, _remaining: f64) {}

    /// Interpolated transform for this render
    fn transform(&mut self, _entity: EntityId, _transform: Transform) {}
}

/// Presentation that shows nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NullPresentation;

impl Presentation for NullPresentation {}

/// A single recorded notification
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Notification {
    ModeChanged {
        actor: EntityId,
        from: ModeTag,
        to: ModeTag,
    },
    Effect(Effect),
    MutationApplied {
        entity: EntityId,
        index: i64,
    },
    CounterChanged {
        counter: EntityId,
        count: i64,
        target: i64,
    },
    GateChanged {
        gate: EntityId,
        open: bool,
    },
    TimerChanged {
        timer: EntityId,
        remaining: f64,
    },
}

/// Presentation that keeps every notification, for tests and replays
///
/// Transforms are not logged; only the latest one per entity is kept.
#[derive(Debug, Clone, Default)]
pub struct RecordingPresentation {
    notifications: Vec<Notification>,
    transforms: IndexMap<EntityId, Transform>,
}

impl RecordingPresentation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Notifications in arrival order
    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Effects in arrival order
    pub fn effects(&self) -> impl Iterator<Item = &Effect> {
        self.notifications.iter().filter_map(|n| match n {
            Notification::Effect(effect) => Some(effect),
            _ => None,
        })
    }

    /// How many effects matched `predicate`
    pub fn count_effects(&self, predicate: impl Fn(&EffectKind) -> bool) -> usize {
        self.effects().filter(|effect| predicate(&effect.kind)).count()
    }

    /// Modes an actor went through, in order
    pub fn modes(&self, actor: EntityId) -> Vec<ModeTag> {
        self.notifications
            .iter()
            .filter_map(|n| match *n {
                Notification::ModeChanged { actor: a, to, .. } if a == actor => Some(to),
                _ => None,
            })
            .collect()
    }

    /// Latest transform shown for an entity
    pub fn transform_of(&self, entity: EntityId) -> Option<Transform> {
        self.transforms.get(&entity).copied()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
        self.transforms.clear();
    }
}

impl Presentation for RecordingPresentation {
    fn mode_changed(&mut self, actor: EntityId, from: ModeTag, to: ModeTag) {
        self.notifications
            .push(Notification::ModeChanged { actor, from, to });
    }

    fn effect(&mut self, effect: &Effect) {
        self.notifications.push(Notification::Effect(*effect));
    }

    fn mutation_applied(&mut self, entity: EntityId, index: i64) {
        self.notifications
            .push(Notification::MutationApplied { entity, index });
    }

    fn counter_changed(&mut self, counter: EntityId, count: i64, target: i64) {
        self.notifications.push(Notification::CounterChanged {
            counter,
            count,
            target,
        });
    }

    fn gate_changed(&mut self, gate: EntityId, open: bool) {
        self.notifications.push(Notification::GateChanged { gate, open });
    }

    fn timer_changed(&mut self, timer: EntityId, remaining: f64) {
        self.notifications
            .push(Notification::TimerChanged { timer, remaining });
    }

    fn transform(&mut self, entity: EntityId, transform: Transform) {
        self.transforms.insert(entity, transform);
    }
}

/// Last value shown per entity field
///
/// Replication may deliver the same value more than once and renders run more
/// often than ticks; the reconciler lets a render notify only on change.
#[derive(Debug, Clone, Default)]
pub struct Reconciler {
    applied: IndexMap<EntityId, ValueMap>,
}

impl Reconciler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take spawn-time values as already shown
    pub fn seed(&mut self, entity: EntityId, fields: &ValueMap) {
        self.applied.insert(entity, fields.clone());
    }

    /// Record `value` as shown, returning the previous value if it differs
    ///
    /// A field never seen before counts as previously `Null`.
    pub fn reconcile(&mut self, entity: EntityId, field: &str, value: Value) -> Option<Value> {
        let shown = self.applied.entry(entity).or_default();
        match shown.get_mut(field) {
            Some(last) if *last == value => None,
            Some(last) => Some(std::mem::replace(last, value)),
            None => {
                shown.insert(field.to_string(), value);
                Some(Value::Null)
            }
        }
    }

    pub fn forget(&mut self, entity: EntityId) {
        self.applied.shift_remove(&entity);
    }
}
