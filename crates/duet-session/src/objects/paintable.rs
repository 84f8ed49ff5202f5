//! One-shot paintable object

use super::OneShot;
use duet_core::{fields, EntityId, Error, ReplicatedStore, Result, Tick, WriteGrant};
use serde::{Deserialize, Serialize};

/// An object whose appearance can be changed exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paintable {
    /// Highest accepted state index
    pub max_index: i64,
    /// Counter incremented by the successful mutation
    pub counter: Option<EntityId>,
}

impl Paintable {
    pub fn new(max_index: i64, counter: Option<EntityId>) -> Self {
        Self { max_index, counter }
    }

    /// Applied state index; `None` while unset
    pub fn current(store: &ReplicatedStore, entity: EntityId) -> Option<i64> {
        store
            .get_int(entity, fields::STATE_INDEX)
            .filter(|index| *index >= 0)
    }

    /// Set the state index and the guard
    ///
    /// Fails with `GuardAlreadySet` after the first success and with
    /// `InvalidIndex` for an index outside `0..=max_index`; neither failure
    /// changes anything.
    pub fn apply(
        &self,
        store: &mut ReplicatedStore,
        grant: &WriteGrant,
        index: i64,
        tick: Tick,
    ) -> Result<()> {
        let entity = grant.entity();
        if OneShot::is_set(store, entity) {
            return Err(Error::GuardAlreadySet(entity));
        }
        if !(0..=self.max_index).contains(&index) {
            return Err(Error::InvalidIndex {
                entity,
                index,
                max: self.max_index,
            });
        }

        store.write(grant, fields::STATE_INDEX, index, tick)?;
        OneShot::claim(store, grant, tick)
    }
}
