//! Countdown timer

use super::bool_field;
use duet_core::{fields, EntityId, Error, ReplicatedStore, Result, Tick, WriteGrant};

/// Level countdown; expiry is the defeat condition
pub struct CountdownTimer;

impl CountdownTimer {
    /// Seconds left
    pub fn remaining(store: &ReplicatedStore, entity: EntityId) -> Option<f64> {
        store.get_float(entity, fields::REMAINING)
    }

    pub fn is_expired(store: &ReplicatedStore, entity: EntityId) -> bool {
        store.get_bool(entity, fields::EXPIRED).unwrap_or(false)
    }

    /// Count down by `dt`; returns true on the tick the timer expires
    pub fn tick(
        store: &mut ReplicatedStore,
        grant: &WriteGrant,
        dt: f32,
        tick: Tick,
    ) -> Result<bool> {
        let entity = grant.entity();
        if bool_field(store, entity, fields::EXPIRED)? {
            return Ok(false);
        }
        let remaining = Self::remaining(store, entity).ok_or_else(|| Error::TypeError {
            field: fields::REMAINING.to_string(),
            expected: "float",
            got: store
                .get(entity, fields::REMAINING)
                .map_or("null", |value| value.type_name()),
        })?;

        let remaining = (remaining - f64::from(dt)).max(0.0);
        store.write(grant, fields::REMAINING, remaining, tick)?;
        if remaining > 0.0 {
            return Ok(false);
        }
        store.write(grant, fields::EXPIRED, true, tick)?;
        Ok(true)
    }
}
