//! Shared progress counter

use super::{bool_field, int_field};
use duet_core::{fields, EntityId, ReplicatedStore, Result, Tick, WriteGrant};

/// Counter of completed objects with a win threshold
///
/// The counter is only ever incremented as part of a successful guarded
/// mutation, so it counts distinct objects, never requests.
pub struct SharedCounter;

/// Result of one increment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Increment {
    pub count: i64,
    pub target: i64,
    /// The threshold was crossed by this increment
    pub reached: bool,
}

impl SharedCounter {
    pub fn count(store: &ReplicatedStore, entity: EntityId) -> Option<i64> {
        store.get_int(entity, fields::COUNT)
    }

    pub fn target(store: &ReplicatedStore, entity: EntityId) -> Option<i64> {
        store.get_int(entity, fields::TARGET)
    }

    /// Add one and check the threshold
    ///
    /// `reached` is true only for the increment that first makes
    /// `count >= target`; the flag is replicated so it never fires again.
    pub fn increment(
        store: &mut ReplicatedStore,
        grant: &WriteGrant,
        tick: Tick,
    ) -> Result<Increment> {
        let entity = grant.entity();
        let count = int_field(store, entity, fields::COUNT)? + 1;
        let target = int_field(store, entity, fields::TARGET)?;
        let already = bool_field(store, entity, fields::REACHED)?;

        store.write(grant, fields::COUNT, count, tick)?;

        let reached = !already && count >= target;
        if reached {
            store.write(grant, fields::REACHED, true, tick)?;
        }
        Ok(Increment {
            count,
            target,
            reached,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::objects::fixtures;
    use crate::spawn::SpawnSpec;

    #[test]
    fn test_threshold_fires_once() {
        let (_, mut store, grant) = fixtures::spawned(SpawnSpec::counter(2));

        let first = SharedCounter::increment(&mut store, &grant, 1).unwrap();
        assert_eq!(first.count, 1);
        assert!(!first.reached);

        let second = SharedCounter::increment(&mut store, &grant, 2).unwrap();
        assert!(second.reached);

        let third = SharedCounter::increment(&mut store, &grant, 3).unwrap();
        assert_eq!(third.count, 3);
        assert!(!third.reached);
        assert_eq!(SharedCounter::count(&store, grant.entity()), Some(3));
    }
}
