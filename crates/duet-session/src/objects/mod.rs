//! World-object behaviors
//!
//! Objects keep all of their mutable state in replicated fields, so mirrors
//! learn about every change through ordinary replication. Behaviors only run
//! on the object's State Authority: every mutating function takes the
//! [`WriteGrant`] proving it.

mod carry;
mod counter;
mod paintable;
mod switch;
mod timer;

pub use carry::{Carryable, FollowOutcome};
pub use counter::{Increment, SharedCounter};
pub use paintable::Paintable;
pub use switch::{Gate, Switch};
pub use timer::CountdownTimer;

use duet_core::{fields, EntityId, Error, ReplicatedStore, Result, Tick, Value, WriteGrant};

/// Write-once guard kept in the `used` field
pub struct OneShot;

impl OneShot {
    /// Whether the guarded mutation already happened
    pub fn is_set(store: &ReplicatedStore, entity: EntityId) -> bool {
        store.get_bool(entity, fields::USED).unwrap_or(false)
    }

    /// Set the guard, failing if it was already set
    pub fn claim(store: &mut ReplicatedStore, grant: &WriteGrant, tick: Tick) -> Result<()> {
        let entity = grant.entity();
        if Self::is_set(store, entity) {
            return Err(Error::GuardAlreadySet(entity));
        }
        store.write(grant, fields::USED, true, tick)?;
        Ok(())
    }
}

/// Read a field that must exist and hold an integer
pub(crate) fn int_field(store: &ReplicatedStore, entity: EntityId, field: &str) -> Result<i64> {
    let value = read(store, entity, field)?;
    value.as_int().ok_or_else(|| type_error(field, "int", &value))
}

/// Read a field that must exist and hold a boolean
pub(crate) fn bool_field(store: &ReplicatedStore, entity: EntityId, field: &str) -> Result<bool> {
    let value = read(store, entity, field)?;
    value.as_bool().ok_or_else(|| type_error(field, "bool", &value))
}

fn read(store: &ReplicatedStore, entity: EntityId, field: &str) -> Result<Value> {
    if !store.contains(entity) {
        return Err(Error::EntityNotFound(entity));
    }
    Ok(store.get(entity, field).copied().unwrap_or(Value::Null))
}

fn type_error(field: &str, expected: &'static str, got: &Value) -> Error {
    Error::TypeError {
        field: field.to_string(),
        expected,
        got: got.type_name(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::SpawnSpec;
    use glam::Vec3;

    #[test]
    fn test_one_shot() {
        let (_, mut store, grant) = fixtures::spawned(SpawnSpec::switch(Vec3::ZERO, None));
        let entity = grant.entity();

        assert!(!OneShot::is_set(&store, entity));
        OneShot::claim(&mut store, &grant, 1).unwrap();
        assert!(OneShot::is_set(&store, entity));
        assert_eq!(
            OneShot::claim(&mut store, &grant, 2),
            Err(Error::GuardAlreadySet(entity))
        );
    }

    #[test]
    fn test_typed_reads() {
        let (_, store, grant) = fixtures::spawned(SpawnSpec::counter(3));
        let entity = grant.entity();

        assert_eq!(int_field(&store, entity, fields::TARGET), Ok(3));
        assert!(matches!(
            bool_field(&store, entity, fields::COUNT),
            Err(Error::TypeError { expected: "bool", .. })
        ));
        assert_eq!(
            int_field(&store, EntityId::new(99), fields::COUNT),
            Err(Error::EntityNotFound(EntityId::new(99)))
        );
    }
}
