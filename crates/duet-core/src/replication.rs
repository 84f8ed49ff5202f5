//! Replicated state store
//!
//! Each peer keeps one store holding every known entity's replicated fields.
//! On the State Authority the store is the truth; everywhere else it is a
//! mirror fed by [`FieldUpdate`]s.
//!
//! Ordering rule: every write is stamped with a [`Version`] that grows with
//! program order on the writing peer. A mirror keeps, per field, the value
//! with the highest version it has seen, so late or reordered updates never
//! overwrite newer ones (last-writer-wins by tick sequence).

use crate::{EntityId, Error, Result, Tick, Value, ValueMap, WriteGrant};
use glam::{Quat, Vec3};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Position of a write in its authority's program order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Version {
    /// Tick in which the write happened
    pub tick: Tick,
    /// Store-wide sequence number, strictly increasing
    pub seq: u64,
}

impl Version {
    /// Version of values installed at spawn
    pub const ZERO: Version = Version { tick: 0, seq: 0 };
}

/// A value together with the version that produced it
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stamped {
    pub value: Value,
    pub version: Version,
}

/// One replicated field change, as sent to observers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUpdate {
    pub entity: EntityId,
    pub field: String,
    pub value: Value,
    pub version: Version,
}

type FieldMap = IndexMap<String, Stamped>;

/// Storage for the replicated fields of all entities known to a peer
#[derive(Debug, Clone, Default)]
pub struct ReplicatedStore {
    entities: IndexMap<EntityId, FieldMap>,
    /// Local authoritative writes not yet broadcast
    pending: Vec<FieldUpdate>,
    next_seq: u64,
}

impl ReplicatedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entities: IndexMap::new(),
            pending: Vec::new(),
            next_seq: 1,
        }
    }

    /// Seed an entity with its spawn-time fields
    ///
    /// Spawn values carry [`Version::ZERO`], so any later authoritative write
    /// supersedes them. Installing an already present entity replaces it.
    pub fn install(&mut self, entity: EntityId, fields: &ValueMap) {
        let map = fields
            .iter()
            .map(|(name, value)| {
                (
                    name.clone(),
                    Stamped {
                        value: *value,
                        version: Version::ZERO,
                    },
                )
            })
            .collect();
        self.entities.insert(entity, map);
    }

    /// Remove an entity and any of its updates still waiting to be sent
    pub fn remove(&mut self, entity: EntityId) -> bool {
        self.pending.retain(|update| update.entity != entity);
        self.entities.shift_remove(&entity).is_some()
    }

    /// Check whether the entity is known
    pub fn contains(&self, entity: EntityId) -> bool {
        self.entities.contains_key(&entity)
    }

    /// Write a field as the entity's State Authority
    ///
    /// Returns `Ok(true)` if the value changed and an update was queued,
    /// `Ok(false)` if the field already held this value.
    pub fn write(
        &mut self,
        grant: &WriteGrant,
        field: &str,
        value: impl Into<Value>,
        tick: Tick,
    ) -> Result<bool> {
        let entity = grant.entity();
        let value = value.into();
        let fields = self
            .entities
            .get_mut(&entity)
            .ok_or(Error::EntityNotFound(entity))?;

        if fields.get(field).is_some_and(|stamped| stamped.value == value) {
            return Ok(false);
        }

        let version = Version {
            tick,
            seq: self.next_seq,
        };
        self.next_seq += 1;

        fields.insert(field.to_string(), Stamped { value, version });
        self.pending.push(FieldUpdate {
            entity,
            field: field.to_string(),
            value,
            version,
        });
        Ok(true)
    }

    /// Apply an update received from the entity's State Authority
    ///
    /// Returns true if the update was newer than what the mirror held.
    pub fn apply_remote(&mut self, update: &FieldUpdate) -> bool {
        let Some(fields) = self.entities.get_mut(&update.entity) else {
            tracing::trace!(entity = %update.entity, field = %update.field, "update for unknown entity");
            return false;
        };

        match fields.get_mut(&update.field) {
            Some(current) if current.version >= update.version => {
                tracing::trace!(
                    entity = %update.entity,
                    field = %update.field,
                    held = ?current.version,
                    stale = ?update.version,
                    "stale update ignored"
                );
                false
            }
            Some(current) => {
                current.value = update.value;
                current.version = update.version;
                true
            }
            None => {
                fields.insert(
                    update.field.clone(),
                    Stamped {
                        value: update.value,
                        version: update.version,
                    },
                );
                true
            }
        }
    }

    /// Drain local writes queued for broadcast, in program order
    pub fn take_pending(&mut self) -> Vec<FieldUpdate> {
        std::mem::take(&mut self.pending)
    }

    /// Whether local writes are waiting to be broadcast
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Get a field value
    pub fn get(&self, entity: EntityId, field: &str) -> Option<&Value> {
        self.entities
            .get(&entity)
            .and_then(|fields| fields.get(field))
            .map(|stamped| &stamped.value)
    }

    /// Get the version a field is at
    pub fn version(&self, entity: EntityId, field: &str) -> Option<Version> {
        self.entities
            .get(&entity)
            .and_then(|fields| fields.get(field))
            .map(|stamped| stamped.version)
    }

    /// Iterate over the fields of an entity
    pub fn fields(&self, entity: EntityId) -> impl Iterator<Item = (&str, &Value)> {
        self.entities
            .get(&entity)
            .into_iter()
            .flat_map(|fields| fields.iter().map(|(k, s)| (k.as_str(), &s.value)))
    }

    /// Get a boolean field
    pub fn get_bool(&self, entity: EntityId, field: &str) -> Option<bool> {
        self.get(entity, field).and_then(Value::as_bool)
    }

    /// Get an integer field
    pub fn get_int(&self, entity: EntityId, field: &str) -> Option<i64> {
        self.get(entity, field).and_then(Value::as_int)
    }

    /// Get a float field
    pub fn get_float(&self, entity: EntityId, field: &str) -> Option<f64> {
        self.get(entity, field).and_then(Value::as_float)
    }

    /// Get a position field
    pub fn get_vec3(&self, entity: EntityId, field: &str) -> Option<Vec3> {
        self.get(entity, field).and_then(Value::as_vec3)
    }

    /// Get a rotation field
    pub fn get_quat(&self, entity: EntityId, field: &str) -> Option<Quat> {
        self.get(entity, field).and_then(Value::as_quat)
    }

    /// Get an entity reference field; `Null` reads as `None`
    pub fn get_entity_ref(&self, entity: EntityId, field: &str) -> Option<EntityId> {
        self.get(entity, field).and_then(Value::as_entity_ref)
    }

    /// Get the ids of all known entities
    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.keys().copied()
    }

    /// Number of known entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AuthorityRegistry, EntityAuthority, PeerId};
    use proptest::prelude::*;

    fn setup() -> (AuthorityRegistry, ReplicatedStore, EntityId) {
        let id = EntityId::new(1);
        let mut registry = AuthorityRegistry::new();
        registry
            .assign(id, EntityAuthority::state_only(PeerId::HOST))
            .unwrap();

        let mut fields = ValueMap::new();
        fields.insert("state_index".into(), Value::Int(-1));
        fields.insert("mutated".into(), Value::Bool(false));

        let mut store = ReplicatedStore::new();
        store.install(id, &fields);
        (registry, store, id)
    }

    #[test]
    fn test_install_and_write() {
        let (registry, mut store, id) = setup();
        assert_eq!(store.get_int(id, "state_index"), Some(-1));
        assert_eq!(store.version(id, "state_index"), Some(Version::ZERO));

        let grant = registry.grant_write(id, PeerId::HOST).unwrap();
        assert!(store.write(&grant, "state_index", 3i64, 5).unwrap());
        assert!(!store.write(&grant, "state_index", 3i64, 6).unwrap());

        let pending = store.take_pending();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].value, Value::Int(3));
        assert_eq!(pending[0].version.tick, 5);
        assert!(!store.has_pending());
    }

    #[test]
    fn test_program_order_within_tick() {
        let (registry, mut store, id) = setup();
        let grant = registry.grant_write(id, PeerId::HOST).unwrap();
        store.write(&grant, "state_index", 1i64, 2).unwrap();
        store.write(&grant, "mutated", true, 2).unwrap();

        let pending = store.take_pending();
        assert!(pending[0].version < pending[1].version);
    }

    #[test]
    fn test_stale_update_rejected() {
        let (_, mut mirror, id) = setup();
        let newer = FieldUpdate {
            entity: id,
            field: "state_index".into(),
            value: Value::Int(4),
            version: Version { tick: 10, seq: 8 },
        };
        let older = FieldUpdate {
            value: Value::Int(2),
            version: Version { tick: 9, seq: 7 },
            ..newer.clone()
        };

        assert!(mirror.apply_remote(&newer));
        assert!(!mirror.apply_remote(&older));
        assert!(!mirror.apply_remote(&newer));
        assert_eq!(mirror.get_int(id, "state_index"), Some(4));
    }

    #[test]
    fn test_remove_drops_pending() {
        let (registry, mut store, id) = setup();
        let grant = registry.grant_write(id, PeerId::HOST).unwrap();
        store.write(&grant, "mutated", true, 1).unwrap();

        assert!(store.remove(id));
        assert!(store.take_pending().is_empty());
        assert!(store.write(&grant, "mutated", false, 2).is_err());
        assert!(!store.apply_remote(&FieldUpdate {
            entity: id,
            field: "mutated".into(),
            value: Value::Bool(true),
            version: Version { tick: 3, seq: 3 },
        }));
    }

    proptest! {
        #[test]
        fn prop_reordered_delivery_converges(
            updates in prop::collection::vec(any::<i64>(), 1..24)
                .prop_flat_map(|values| {
                    let len = values.len();
                    (Just(values), Just((0..len).collect::<Vec<_>>()).prop_shuffle())
                })
        ) {
            let (values, order) = updates;
            let (registry, mut authority, id) = setup();
            let (_, mut mirror, _) = setup();
            let grant = registry.grant_write(id, PeerId::HOST).unwrap();

            for (tick, value) in values.iter().enumerate() {
                authority.write(&grant, "state_index", *value, tick as u64 + 1).unwrap();
            }
            let sent = authority.take_pending();
            for i in order {
                if let Some(update) = sent.get(i) {
                    mirror.apply_remote(update);
                }
            }

            prop_assert_eq!(
                mirror.get(id, "state_index"),
                authority.get(id, "state_index")
            );
        }
    }
}
