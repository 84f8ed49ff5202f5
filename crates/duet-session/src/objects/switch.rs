//! Pressure switch and the gate it toggles

use super::{bool_field, OneShot};
use duet_core::{fields, EntityId, ReplicatedStore, Result, Tick, WriteGrant};

/// One-shot switch linked to a gate
pub struct Switch;

impl Switch {
    /// Mark the switch used; fails with `GuardAlreadySet` on every later press
    pub fn press(store: &mut ReplicatedStore, grant: &WriteGrant, tick: Tick) -> Result<()> {
        OneShot::claim(store, grant, tick)
    }
}

/// A bridge that appears (or a door that opens) when toggled
pub struct Gate;

impl Gate {
    pub fn is_open(store: &ReplicatedStore, entity: EntityId) -> bool {
        store.get_bool(entity, fields::OPEN).unwrap_or(false)
    }

    /// Flip the gate, returning the new state
    pub fn toggle(store: &mut ReplicatedStore, grant: &WriteGrant, tick: Tick) -> Result<bool> {
        let open = !bool_field(store, grant.entity(), fields::OPEN)?;
        store.write(grant, fields::OPEN, open, tick)?;
        Ok(open)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::fixtures;
    use crate::spawn::SpawnSpec;
    use duet_core::Error;
    use glam::Vec3;

    #[test]
    fn test_press_once() {
        let (_, mut store, grant) = fixtures::spawned(SpawnSpec::switch(Vec3::ZERO, None));
        Switch::press(&mut store, &grant, 1).unwrap();
        assert_eq!(
            Switch::press(&mut store, &grant, 2),
            Err(Error::GuardAlreadySet(grant.entity()))
        );
    }

    #[test]
    fn test_gate_toggle() {
        let (_, mut store, grant) =
            fixtures::spawned(SpawnSpec::gate(Vec3::ZERO, Vec3::new(1.0, 0.1, 3.0)));
        assert!(!Gate::is_open(&store, grant.entity()));
        assert!(Gate::toggle(&mut store, &grant, 1).unwrap());
        assert!(Gate::is_open(&store, grant.entity()));
        assert!(!Gate::toggle(&mut store, &grant, 2).unwrap());
    }
}
