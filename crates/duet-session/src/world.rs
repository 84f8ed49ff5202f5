//! One peer's view of the session
//!
//! A `World` bundles what a peer knows about every networked entity: who
//! holds authority over it, its replicated fields, its kind and its collider
//! in the level scene. Every peer has its own `World`; they agree because
//! spawns are applied identically everywhere and every later change flows
//! through replication.

use crate::config::CarryConfig;
use crate::objects::{Carryable, CountdownTimer, FollowOutcome, Gate};
use crate::spawn::{EntityKind, SpawnSpec};
use duet_core::{
    fields, AuthorityRegistry, CarryStopReason, Effect, EffectKind, EntityId, Error, PeerId,
    ReplicatedStore, Result, Role, Tick, WriteGrant,
};
use duet_motion::{Collider, StaticScene};
use glam::{Quat, Vec3};
use indexmap::IndexMap;

/// Spawn-time facts about an entity
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorldObject {
    pub kind: EntityKind,
    /// Collider placed in the scene while the object is solid
    pub collider: Option<Collider>,
}

/// Entities, authority and level geometry as seen by one peer
#[derive(Debug, Clone)]
pub struct World {
    peer: PeerId,
    registry: AuthorityRegistry,
    store: ReplicatedStore,
    scene: StaticScene,
    objects: IndexMap<EntityId, WorldObject>,
    /// Send tick of the newest pose report accepted per actor
    pose_ticks: IndexMap<EntityId, Tick>,
}

impl World {
    /// Create a world over the given level geometry
    pub fn new(peer: PeerId, scene: StaticScene) -> Self {
        Self {
            peer,
            registry: AuthorityRegistry::new(),
            store: ReplicatedStore::new(),
            scene,
            objects: IndexMap::new(),
            pose_ticks: IndexMap::new(),
        }
    }

    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn registry(&self) -> &AuthorityRegistry {
        &self.registry
    }

    pub fn store(&self) -> &ReplicatedStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ReplicatedStore {
        &mut self.store
    }

    pub fn scene(&self) -> &StaticScene {
        &self.scene
    }

    pub fn object(&self, entity: EntityId) -> Option<&WorldObject> {
        self.objects.get(&entity)
    }

    pub fn kind(&self, entity: EntityId) -> Option<EntityKind> {
        self.objects.get(&entity).map(|object| object.kind)
    }

    pub fn contains(&self, entity: EntityId) -> bool {
        self.objects.contains_key(&entity)
    }

    /// Entities in spawn order
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &WorldObject)> {
        self.objects.iter().map(|(id, object)| (*id, object))
    }

    /// Whether this peer holds State Authority over `entity`
    pub fn is_authority(&self, entity: EntityId) -> bool {
        self.registry.has_state_authority(entity, self.peer)
    }

    /// Write capability for an entity this peer is the authority of
    pub fn grant(&self, entity: EntityId) -> Result<WriteGrant> {
        self.registry.grant_write(entity, self.peer)
    }

    /// Replicated position and rotation of an entity
    pub fn pose(&self, entity: EntityId) -> Option<(Vec3, Quat)> {
        let position = self.store.get_vec3(entity, fields::POSITION)?;
        let rotation = self.store.get_quat(entity, fields::ROTATION)?;
        Some((position, rotation))
    }

    /// Record a pose report sent at `sent`, unless a newer one was accepted
    ///
    /// Reports from one owner can overtake each other on the network; only
    /// a strictly newer send tick may overwrite the actor's pose.
    pub fn accept_pose(&mut self, actor: EntityId, sent: Tick) -> bool {
        match self.pose_ticks.get(&actor) {
            Some(newest) if sent <= *newest => false,
            _ => {
                self.pose_ticks.insert(actor, sent);
                true
            }
        }
    }

    /// Create an entity from its spawn description
    ///
    /// A paintable's counter and a switch's gate must already exist, be of
    /// the right kind and share the new entity's State Authority.
    pub fn spawn(&mut self, entity: EntityId, spec: &SpawnSpec) -> Result<()> {
        match spec.kind {
            EntityKind::Paintable {
                counter: Some(counter),
                ..
            } => self.check_link(counter, "counter", spec.authority.state)?,
            EntityKind::Switch { gate: Some(gate) } => {
                self.check_link(gate, "gate", spec.authority.state)?
            }
            _ => {}
        }
        self.registry.assign(entity, spec.authority)?;
        self.store.install(entity, &spec.initial_fields());

        let object = WorldObject {
            kind: spec.kind,
            collider: spec.collider(entity),
        };
        self.objects.insert(entity, object);
        self.sync_collider(entity);

        tracing::debug!(
            peer = %self.peer,
            %entity,
            kind = spec.kind.name(),
            state = %spec.authority.state,
            "spawned"
        );
        Ok(())
    }

    /// Write capability for the counter or gate an object is linked to
    ///
    /// Checked before the object's own guard is claimed, so a broken link
    /// never leaves a half-applied mutation behind.
    pub fn link_grant(&self, link: EntityId, expected: &'static str) -> Result<WriteGrant> {
        self.check_link(link, expected, self.peer)?;
        self.grant(link)
    }

    fn check_link(&self, link: EntityId, expected: &'static str, owner: PeerId) -> Result<()> {
        let kind = self.kind(link).ok_or(Error::EntityNotFound(link))?;
        if kind.name() != expected {
            return Err(Error::TypeError {
                field: expected.to_string(),
                expected,
                got: kind.name(),
            });
        }
        if !self.registry.has_state_authority(link, owner) {
            return Err(Error::AuthorityViolation {
                peer: owner,
                entity: link,
                role: Role::State,
            });
        }
        Ok(())
    }

    /// Remove an entity and every link that points at it
    ///
    /// Returns the effects this peer, as authority, emits for links it broke.
    pub fn despawn(&mut self, entity: EntityId, tick: Tick) -> Result<Vec<Effect>> {
        let Some(object) = self.objects.shift_remove(&entity) else {
            return Err(Error::EntityNotFound(entity));
        };
        let mut effects = Vec::new();

        let carried: Vec<EntityId> = self
            .objects
            .iter()
            .filter(|(id, object)| {
                object.kind == EntityKind::Carryable
                    && Carryable::carrier(&self.store, **id) == Some(entity)
            })
            .map(|(id, _)| *id)
            .collect();
        for target in carried {
            let Ok(grant) = self.grant(target) else {
                continue;
            };
            Carryable::clear(&mut self.store, &grant, tick)?;
            effects.push(Effect::new(
                self.peer,
                target,
                EffectKind::CarryStopped {
                    carrier: entity,
                    reason: CarryStopReason::Despawned,
                },
                tick,
            ));
        }

        for other in self.objects.values_mut() {
            other.kind.unlink(entity);
        }

        self.registry.release(entity);
        self.store.remove(entity);
        self.pose_ticks.shift_remove(&entity);
        self.scene.remove_entity(entity);

        tracing::debug!(peer = %self.peer, %entity, kind = object.kind.name(), "despawned");
        Ok(effects)
    }

    /// Make the scene collider of `entity` match its replicated state
    ///
    /// Gates are solid only while open; everything else with a collider is
    /// always solid.
    pub fn sync_collider(&mut self, entity: EntityId) {
        let Some(object) = self.objects.get(&entity) else {
            return;
        };
        let Some(collider) = object.collider else {
            return;
        };
        let solid = match object.kind {
            EntityKind::Gate { .. } => Gate::is_open(&self.store, entity),
            _ => true,
        };
        if solid {
            let collider = match self.store.get_vec3(entity, fields::POSITION) {
                Some(position) => Collider::centered(position, collider.half_extents(), collider.tag)
                    .with_entity(entity),
                None => collider,
            };
            self.scene.upsert_entity(collider);
        } else {
            self.scene.remove_entity(entity);
        }
    }

    /// Bring every collider in line with the replicated fields
    pub fn sync_colliders(&mut self) {
        let ids: Vec<EntityId> = self.objects.keys().copied().collect();
        for entity in ids {
            self.sync_collider(entity);
        }
    }

    /// Step the objects this peer simulates: carry followers and timers
    pub fn step_objects(&mut self, carry: &CarryConfig, dt: f32, tick: Tick) -> Vec<Effect> {
        let owned: Vec<(EntityId, EntityKind)> = self
            .objects
            .iter()
            .filter(|(id, _)| self.registry.has_state_authority(**id, self.peer))
            .map(|(id, object)| (*id, object.kind))
            .collect();

        let mut effects = Vec::new();
        for (entity, kind) in owned {
            let result = match kind {
                EntityKind::Carryable => self.step_carryable(entity, carry, dt, tick),
                EntityKind::Timer { .. } => self.step_timer(entity, dt, tick),
                _ => Ok(None),
            };
            match result {
                Ok(Some(effect)) => effects.push(effect),
                Ok(None) => {}
                Err(err) => tracing::warn!(peer = %self.peer, %entity, %tick, error = %err, "object step failed"),
            }
        }
        effects
    }

    fn step_carryable(
        &mut self,
        entity: EntityId,
        config: &CarryConfig,
        dt: f32,
        tick: Tick,
    ) -> Result<Option<Effect>> {
        let Some(carrier) = Carryable::carrier(&self.store, entity) else {
            return Ok(None);
        };
        let grant = self.grant(entity)?;
        let Some(pose) = self.pose(carrier) else {
            Carryable::clear(&mut self.store, &grant, tick)?;
            return Ok(Some(Effect::new(
                self.peer,
                entity,
                EffectKind::CarryStopped {
                    carrier,
                    reason: CarryStopReason::Despawned,
                },
                tick,
            )));
        };

        let outcome = Carryable::follow(
            &mut self.store,
            &grant,
            &mut self.scene,
            config,
            pose,
            dt,
            tick,
        )?;
        match outcome {
            FollowOutcome::Blocked { carrier } => {
                tracing::debug!(peer = %self.peer, %entity, %carrier, %tick, "carry blocked by wall");
                Ok(Some(Effect::new(
                    self.peer,
                    entity,
                    EffectKind::CarryStopped {
                        carrier,
                        reason: CarryStopReason::Blocked,
                    },
                    tick,
                )))
            }
            FollowOutcome::Idle | FollowOutcome::Moved { .. } => Ok(None),
        }
    }

    fn step_timer(&mut self, entity: EntityId, dt: f32, tick: Tick) -> Result<Option<Effect>> {
        let grant = self.grant(entity)?;
        if !CountdownTimer::tick(&mut self.store, &grant, dt, tick)? {
            return Ok(None);
        }
        tracing::info!(peer = %self.peer, %entity, %tick, "time expired");
        Ok(Some(Effect::new(self.peer, entity, EffectKind::TimeExpired, tick)))
    }
}
