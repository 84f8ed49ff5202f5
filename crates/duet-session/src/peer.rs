//! One participant of a session
//!
//! A [`Peer`] owns its [`World`], the actors it drives, and its presentation.
//! [`Peer::tick`] runs one fixed step:
//!
//! 1. advance the tick
//! 2. drain the inbox: replication, intents for entities this peer owns,
//!    effects from other authorities
//! 3. step the actors this peer drives from their latched input
//! 4. step the objects this peer owns (carry followers, timers)
//! 5. route this tick's intents: execute the ones this peer owns, send the
//!    rest to their State Authority
//! 6. show and broadcast the effects, then flush replication
//!
//! Intents received in step 2 run before the peer's own intents of the same
//! tick, so racing requests resolve in arrival order at the authority.

use crate::actor::ActorController;
use crate::config::{CarryConfig, SessionConfig};
use crate::error::Result;
use crate::interaction;
use crate::objects::{CountdownTimer, Gate, Paintable, SharedCounter};
use crate::presentation::{NullPresentation, Presentation, Reconciler};
use crate::spawn::{EntityKind, SpawnSpec};
use crate::world::World;
use duet_core::{
    fields, Effect, EffectKind, EntityId, Error as CoreError, FieldUpdate, InputFrame, Intent,
    IntentKind, ModeTag, PeerId, Role, Tick, Value,
};
use duet_motion::{LocomotionConfig, StaticScene};
use duet_netcode::{Delivery, InputBuffer, Interpolator, Packet, Transform, Transport};
use indexmap::IndexMap;

/// A participant's simulation state
pub struct Peer<P: Presentation = NullPresentation> {
    id: PeerId,
    tick: Tick,
    dt: f32,
    world: World,
    locomotion: LocomotionConfig,
    carry: CarryConfig,
    actors: IndexMap<EntityId, ActorController>,
    inputs: IndexMap<EntityId, InputBuffer>,
    /// Intents issued outside locomotion, routed on the next tick
    outbox: Vec<Intent>,
    /// Effects produced outside a tick, broadcast on the next tick
    held_effects: Vec<Effect>,
    interpolator: Interpolator,
    reconciler: Reconciler,
    presentation: P,
}

impl<P: Presentation> Peer<P> {
    /// Create a peer over the level geometry
    pub fn new(id: PeerId, config: &SessionConfig, scene: StaticScene, presentation: P) -> Self {
        Self {
            id,
            tick: 0,
            dt: config.tick_rate.dt(),
            world: World::new(id, scene),
            locomotion: config.locomotion.clone(),
            carry: config.carry.clone(),
            actors: IndexMap::new(),
            inputs: IndexMap::new(),
            outbox: Vec::new(),
            held_effects: Vec::new(),
            interpolator: Interpolator::new(),
            reconciler: Reconciler::new(),
            presentation,
        }
    }

    pub fn id(&self) -> PeerId {
        self.id
    }

    /// Last completed tick
    pub fn current_tick(&self) -> Tick {
        self.tick
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn presentation(&self) -> &P {
        &self.presentation
    }

    pub fn presentation_mut(&mut self) -> &mut P {
        &mut self.presentation
    }

    /// The controller of an actor this peer drives
    pub fn actor(&self, entity: EntityId) -> Option<&ActorController> {
        self.actors.get(&entity)
    }

    /// Actors this peer drives, in spawn order
    pub fn local_actors(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.actors.keys().copied()
    }

    /// Continue counting from `tick`, for peers joining a running session
    pub(crate) fn resume_at(&mut self, tick: Tick) {
        self.tick = tick;
    }

    /// Create an entity; actors this peer has Input Authority over get a controller
    pub fn spawn(&mut self, entity: EntityId, spec: &SpawnSpec) -> Result<()> {
        self.world.spawn(entity, spec)?;
        self.reconciler.seed(entity, &spec.initial_fields());

        if spec.kind == EntityKind::Actor
            && self.world.registry().has_input_authority(entity, self.id)
        {
            let mut actor = ActorController::new(
                entity,
                self.locomotion.clone(),
                spec.position,
                spec.rotation,
            );
            actor.settle(self.world.scene());
            self.actors.insert(entity, actor);
            self.inputs
                .insert(entity, InputBuffer::new());
        }
        if let Some((position, rotation)) = self.world.pose(entity) {
            self.interpolator
                .push(entity, self.tick, Transform::new(position, rotation));
        }
        Ok(())
    }

    /// Remove an entity, releasing every actor interacting with it
    pub fn despawn(&mut self, entity: EntityId) -> Result<()> {
        for (actor, controller) in self.actors.iter_mut() {
            if let Some(transition) = controller.force_release(entity) {
                self.presentation
                    .mode_changed(*actor, transition.from, transition.to);
            }
        }
        self.actors.shift_remove(&entity);
        self.inputs.shift_remove(&entity);
        self.outbox
            .retain(|intent| intent.actor != entity && intent.target != entity);
        self.interpolator.remove(entity);
        self.reconciler.forget(entity);

        let effects = self.world.despawn(entity, self.tick)?;
        self.held_effects.extend(effects);
        Ok(())
    }

    /// Latch one display frame of input for an actor this peer drives
    pub fn record_input(&mut self, actor: EntityId, frame: InputFrame) -> Result<()> {
        let buffer = self
            .inputs
            .get_mut(&actor)
            .ok_or(CoreError::AuthorityViolation {
                peer: self.id,
                entity: actor,
                role: Role::Input,
            })?;
        buffer.record(frame);
        Ok(())
    }

    /// Queue an intent on behalf of an actor this peer drives
    pub fn issue(&mut self, actor: EntityId, target: EntityId, kind: IntentKind) -> Result<()> {
        self.world.registry().require(actor, self.id, Role::Input)?;
        self.outbox.push(Intent::new(self.id, actor, target, kind));
        Ok(())
    }

    /// Fields written by this peer, as updates a joining peer can apply
    pub fn snapshot(&self) -> Vec<FieldUpdate> {
        let store = self.world.store();
        self.world
            .entities()
            .filter(|(entity, _)| self.world.is_authority(*entity))
            .flat_map(|(entity, _)| {
                store.fields(entity).filter_map(move |(field, value)| {
                    let version = store.version(entity, field)?;
                    Some(FieldUpdate {
                        entity,
                        field: field.to_string(),
                        value: *value,
                        version,
                    })
                })
            })
            .collect()
    }

    /// Apply a snapshot taken from `from`, keeping only what it owns
    pub fn apply_snapshot(&mut self, from: PeerId, updates: &[FieldUpdate]) {
        self.apply_replication(from, updates);
        self.world.sync_colliders();
    }

    /// Run one fixed step
    pub fn tick(&mut self, transport: &mut dyn Transport) -> Result<()> {
        self.tick += 1;
        let tick = self.tick;
        let mut effects = std::mem::take(&mut self.held_effects);

        for delivery in transport.drain_packets()? {
            self.receive(delivery, &mut effects);
        }
        self.world.sync_colliders();

        let mut intents: Vec<Intent> = std::mem::take(&mut self.outbox)
            .into_iter()
            .map(|intent| intent.at_tick(tick))
            .collect();
        for (entity, actor) in self.actors.iter_mut() {
            let input = self
                .inputs
                .get_mut(entity)
                .map_or_else(InputFrame::neutral, |buffer| buffer.take());
            let step = actor.step(self.id, &input, self.world.scene(), self.dt, tick);
            for transition in &step.outcome.transitions {
                self.presentation
                    .mode_changed(*entity, transition.from, transition.to);
            }
            intents.extend(step.intents);
        }

        effects.extend(self.world.step_objects(&self.carry, self.dt, tick));

        for intent in intents {
            self.route(intent, transport, &mut effects);
        }

        for effect in &effects {
            self.dispatch(effect);
            if let Err(err) = transport.broadcast_packet(&Packet::Effect(*effect)) {
                tracing::warn!(peer = %self.id, %tick, error = %err, "effect broadcast failed");
            }
        }

        let updates = self.world.store_mut().take_pending();
        if !updates.is_empty() {
            let packet = Packet::Replicate {
                from: self.id,
                tick,
                updates,
            };
            if let Err(err) = transport.broadcast_packet(&packet) {
                tracing::warn!(peer = %self.id, %tick, error = %err, "replication broadcast failed");
            }
        }

        self.sample_transforms();
        Ok(())
    }

    /// Push mirrored state to presentation; `alpha` is the render blend
    pub fn render(&mut self, alpha: f32) {
        let store = self.world.store();
        for (entity, object) in self.world.entities() {
            match object.kind {
                EntityKind::Actor if !self.actors.contains_key(&entity) => {
                    let code = store.get_int(entity, fields::MODE).unwrap_or(0);
                    if let Some(previous) =
                        self.reconciler
                            .reconcile(entity, fields::MODE, Value::Int(code))
                    {
                        let from = previous
                            .as_int()
                            .and_then(ModeTag::from_code)
                            .unwrap_or(ModeTag::Grounded);
                        if let Some(to) = ModeTag::from_code(code) {
                            self.presentation.mode_changed(entity, from, to);
                        }
                    }
                }
                EntityKind::Paintable { .. } => {
                    if let Some(index) = Paintable::current(store, entity) {
                        if self
                            .reconciler
                            .reconcile(entity, fields::STATE_INDEX, Value::Int(index))
                            .is_some()
                        {
                            self.presentation.mutation_applied(entity, index);
                        }
                    }
                }
                EntityKind::Counter { .. } => {
                    let count = SharedCounter::count(store, entity).unwrap_or(0);
                    let target = SharedCounter::target(store, entity).unwrap_or(0);
                    if self
                        .reconciler
                        .reconcile(entity, fields::COUNT, Value::Int(count))
                        .is_some()
                    {
                        self.presentation.counter_changed(entity, count, target);
                    }
                }
                EntityKind::Gate { .. } => {
                    let open = Gate::is_open(store, entity);
                    if self
                        .reconciler
                        .reconcile(entity, fields::OPEN, Value::Bool(open))
                        .is_some()
                    {
                        self.presentation.gate_changed(entity, open);
                    }
                }
                EntityKind::Timer { .. } => {
                    if let Some(remaining) = CountdownTimer::remaining(store, entity) {
                        if self
                            .reconciler
                            .reconcile(entity, fields::REMAINING, Value::Float(remaining))
                            .is_some()
                        {
                            self.presentation.timer_changed(entity, remaining);
                        }
                    }
                }
                _ => {}
            }

            if let Some(transform) = self.interpolator.interpolate(entity, alpha) {
                self.presentation.transform(entity, transform);
            }
        }
    }

    fn receive(&mut self, delivery: Delivery, effects: &mut Vec<Effect>) {
        let from = delivery.from;
        match delivery.packet {
            Packet::Replicate {
                from: claimed,
                updates,
                ..
            } => {
                if claimed != from {
                    tracing::warn!(peer = %self.id, %from, %claimed, "replication with forged origin dropped");
                    return;
                }
                self.apply_replication(from, &updates);
            }
            Packet::Intent(intent) => {
                if intent.sender != from {
                    tracing::warn!(peer = %self.id, %from, %intent, "intent with forged sender dropped");
                    return;
                }
                if !self.world.is_authority(intent.target) {
                    tracing::warn!(peer = %self.id, %intent, "intent for an entity this peer does not own");
                    return;
                }
                self.execute(&intent, effects);
            }
            Packet::Effect(effect) => {
                let authoritative = effect.source == from
                    && self
                        .world
                        .registry()
                        .has_state_authority(effect.target, from);
                if !authoritative {
                    tracing::warn!(peer = %self.id, %from, %effect, "effect from a non-authority dropped");
                    return;
                }
                self.dispatch(&effect);
            }
        }
    }

    fn apply_replication(&mut self, from: PeerId, updates: &[FieldUpdate]) {
        for update in updates {
            if !self
                .world
                .registry()
                .has_state_authority(update.entity, from)
            {
                let err = CoreError::AuthorityViolation {
                    peer: from,
                    entity: update.entity,
                    role: Role::State,
                };
                tracing::warn!(peer = %self.id, field = %update.field, error = %err, "replicated field dropped");
                continue;
            }
            self.world.store_mut().apply_remote(update);
        }
    }

    fn route(&mut self, intent: Intent, transport: &mut dyn Transport, effects: &mut Vec<Effect>) {
        if self.world.is_authority(intent.target) {
            self.execute(&intent, effects);
            return;
        }
        let Some(owner) = self
            .world
            .registry()
            .get(intent.target)
            .map(|authority| authority.state)
        else {
            tracing::debug!(peer = %self.id, %intent, "intent for an unknown entity dropped");
            return;
        };
        tracing::trace!(peer = %self.id, %owner, %intent, "intent sent");
        if let Err(err) = transport.send_packet(owner, &Packet::Intent(intent)) {
            tracing::warn!(peer = %self.id, %owner, %intent, error = %err, "intent send failed");
        }
    }

    fn execute(&mut self, intent: &Intent, effects: &mut Vec<Effect>) {
        match interaction::execute(&mut self.world, intent, self.tick) {
            Ok(produced) => effects.extend(produced),
            Err(err) => {
                if err.is_benign() {
                    tracing::debug!(peer = %self.id, %intent, error = %err, "intent rejected");
                } else {
                    tracing::warn!(peer = %self.id, %intent, error = %err, "intent rejected");
                }
                if let Some(effect) = interaction::refusal(intent, &err, self.id, self.tick) {
                    effects.push(effect);
                }
            }
        }
    }

    /// Show an effect and apply its consequences for local actors
    fn dispatch(&mut self, effect: &Effect) {
        if let EffectKind::CarryStopped { carrier, reason } = effect.kind {
            if let Some(actor) = self.actors.get_mut(&carrier) {
                if let Some(transition) = actor.force_release(effect.target) {
                    tracing::debug!(peer = %self.id, actor = %carrier, %reason, "carry ended by authority");
                    self.presentation
                        .mode_changed(carrier, transition.from, transition.to);
                }
            }
        }
        self.presentation.effect(effect);
    }

    fn sample_transforms(&mut self) {
        for (entity, _) in self.world.entities() {
            let pose = match self.actors.get(&entity) {
                Some(actor) => Some(actor.pose()),
                None => self.world.pose(entity),
            };
            if let Some((position, rotation)) = pose {
                self.interpolator
                    .push(entity, self.tick, Transform::new(position, rotation));
            }
        }
    }
}

impl<P: Presentation> std::fmt::Debug for Peer<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Peer")
            .field("id", &self.id)
            .field("tick", &self.tick)
            .field("entities", &self.world.entities().count())
            .field("actors", &self.actors.len())
            .finish()
    }
}
