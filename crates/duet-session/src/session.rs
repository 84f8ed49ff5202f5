//! Session context
//!
//! A [`Session`] runs every peer of one game in a single process over a
//! [`SimNetwork`]. It owns what would otherwise be global: the clock, the
//! network, the peers and the entity id counter. Several sessions can live in
//! one process without sharing anything.
//!
//! # Example
//!
//! ```
//! use duet_core::{IntentKind, PeerId};
//! use duet_session::{NeutralInput, Session, SessionConfig, SpawnSpec};
//! use duet_motion::StaticScene;
//! use glam::Vec3;
//!
//! let mut session: Session = Session::new(SessionConfig::default(), StaticScene::new()).unwrap();
//! session.join(PeerId::new(1)).unwrap();
//!
//! let actor = session.spawn(SpawnSpec::actor(PeerId::new(1), Vec3::ZERO)).unwrap();
//! let counter = session.spawn(SpawnSpec::counter(1)).unwrap();
//! let tile = session.spawn(SpawnSpec::paintable(Vec3::Z * 2.0, Some(counter))).unwrap();
//!
//! session.issue(PeerId::new(1), actor, tile, IntentKind::RequestMutate { index: 2 }).unwrap();
//! session.run_ticks(10, &mut NeutralInput).unwrap();
//!
//! for peer in session.peers() {
//!     assert_eq!(peer.world().store().get_int(counter, "count"), Some(1));
//! }
//! ```

use crate::config::SessionConfig;
use crate::error::{Error, Result};
use crate::input::InputSource;
use crate::peer::Peer;
use crate::presentation::{NullPresentation, Presentation};
use crate::spawn::SpawnSpec;
use duet_core::{Clock, EntityId, Error as CoreError, InputFrame, IntentKind, PeerId, Tick};
use duet_motion::StaticScene;
use duet_netcode::SimNetwork;
use indexmap::IndexMap;

/// Every peer of one game, stepped together
pub struct Session<P: Presentation + Default = NullPresentation> {
    config: SessionConfig,
    clock: Clock,
    network: SimNetwork,
    scene: StaticScene,
    peers: IndexMap<PeerId, Peer<P>>,
    spawned: IndexMap<EntityId, SpawnSpec>,
    next_entity: u64,
    tick: Tick,
}

impl<P: Presentation + Default> Session<P> {
    /// Start a session with the host as its only peer
    pub fn new(config: SessionConfig, scene: StaticScene) -> Result<Self> {
        config.validate()?;
        let clock = Clock::new(config.tick_rate).with_max_steps(config.max_steps_per_frame);
        let network = SimNetwork::new(config.network.clone());
        let mut session = Self {
            config,
            clock,
            network,
            scene,
            peers: IndexMap::new(),
            spawned: IndexMap::new(),
            next_entity: 0,
            tick: 0,
        };
        session.join(PeerId::HOST)?;
        Ok(session)
    }

    /// Connect a peer; it receives every live entity and the current state
    pub fn join(&mut self, id: PeerId) -> Result<()> {
        if self.peers.contains_key(&id) {
            return Err(Error::DuplicatePeer(id));
        }
        self.network.join(id);

        let mut peer = Peer::new(id, &self.config, self.scene.clone(), P::default());
        peer.resume_at(self.tick);
        for (entity, spec) in &self.spawned {
            peer.spawn(*entity, spec)?;
        }
        for other in self.peers.values() {
            peer.apply_snapshot(other.id(), &other.snapshot());
        }

        tracing::info!(peer = %id, entities = self.spawned.len(), tick = self.tick, "peer joined");
        self.peers.insert(id, peer);
        Ok(())
    }

    /// Create an entity on every peer
    pub fn spawn(&mut self, spec: SpawnSpec) -> Result<EntityId> {
        let authority = spec.authority;
        for peer in std::iter::once(authority.state).chain(authority.input) {
            if !self.peers.contains_key(&peer) {
                return Err(Error::UnknownPeer(peer));
            }
        }

        self.next_entity += 1;
        let entity = EntityId::new(self.next_entity);
        for peer in self.peers.values_mut() {
            peer.spawn(entity, &spec)?;
        }
        self.spawned.insert(entity, spec);

        tracing::info!(%entity, kind = spec.kind.name(), state = %authority.state, "entity spawned");
        Ok(entity)
    }

    /// Remove an entity from every peer, breaking links that reference it
    pub fn despawn(&mut self, entity: EntityId) -> Result<()> {
        if self.spawned.shift_remove(&entity).is_none() {
            return Err(CoreError::EntityNotFound(entity).into());
        }
        for spec in self.spawned.values_mut() {
            spec.unlink(entity);
        }
        for peer in self.peers.values_mut() {
            peer.despawn(entity)?;
        }
        tracing::info!(%entity, tick = self.tick, "entity despawned");
        Ok(())
    }

    /// Queue an intent on `peer` for its next tick
    pub fn issue(
        &mut self,
        peer: PeerId,
        actor: EntityId,
        target: EntityId,
        kind: IntentKind,
    ) -> Result<()> {
        self.peer_mut(peer)?.issue(actor, target, kind)
    }

    /// Latch input for an actor driven by `peer`
    pub fn record_input(&mut self, peer: PeerId, actor: EntityId, frame: InputFrame) -> Result<()> {
        self.peer_mut(peer)?.record_input(actor, frame)
    }

    /// Run one display frame of `frame_dt` seconds
    ///
    /// Input is sampled once, as many fixed ticks as the clock yields are
    /// run, and every peer renders with the clock's blend. Returns the number
    /// of ticks run.
    pub fn frame(&mut self, frame_dt: f32, input: &mut dyn InputSource) -> Result<u32> {
        self.sample_input(input)?;
        let steps = self.clock.advance(frame_dt);
        for _ in 0..steps {
            self.tick_all()?;
        }
        let alpha = self.clock.alpha();
        for peer in self.peers.values_mut() {
            peer.render(alpha);
        }
        Ok(steps)
    }

    /// Run exactly `ticks` fixed steps, sampling input and rendering once per step
    pub fn run_ticks(&mut self, ticks: u32, input: &mut dyn InputSource) -> Result<()> {
        for _ in 0..ticks {
            self.sample_input(input)?;
            self.tick_all()?;
            for peer in self.peers.values_mut() {
                peer.render(1.0);
            }
        }
        Ok(())
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Last completed tick
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn peer(&self, id: PeerId) -> Option<&Peer<P>> {
        self.peers.get(&id)
    }

    pub fn peer_mut(&mut self, id: PeerId) -> Result<&mut Peer<P>> {
        self.peers.get_mut(&id).ok_or(Error::UnknownPeer(id))
    }

    /// Peers in join order, host first
    pub fn peers(&self) -> impl Iterator<Item = &Peer<P>> {
        self.peers.values()
    }

    pub fn network(&self) -> &SimNetwork {
        &self.network
    }

    pub fn network_mut(&mut self) -> &mut SimNetwork {
        &mut self.network
    }

    /// Live entities and how they were spawned
    pub fn spawned(&self) -> impl Iterator<Item = (EntityId, &SpawnSpec)> {
        self.spawned.iter().map(|(id, spec)| (*id, spec))
    }

    fn sample_input(&mut self, input: &mut dyn InputSource) -> Result<()> {
        let next = self.tick + 1;
        for peer in self.peers.values_mut() {
            let actors: Vec<EntityId> = peer.local_actors().collect();
            for actor in actors {
                let frame = input.sample(actor, next);
                peer.record_input(actor, frame)?;
            }
        }
        Ok(())
    }

    fn tick_all(&mut self) -> Result<()> {
        self.tick += 1;
        self.network.set_now(self.tick);
        for (id, peer) in self.peers.iter_mut() {
            peer.tick(&mut self.network.endpoint(*id))?;
        }
        Ok(())
    }
}

impl<P: Presentation + Default> std::fmt::Debug for Session<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("tick", &self.tick)
            .field("peers", &self.peers.keys().collect::<Vec<_>>())
            .field("entities", &self.spawned.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{NeutralInput, ScriptedInput};
    use crate::objects::{Carryable, CountdownTimer, Paintable, SharedCounter};
    use crate::presentation::RecordingPresentation;
    use crate::spawn::EntityKind;
    use duet_core::{
        fields, CarryStopReason, EffectKind, FieldUpdate, ModeTag, Role, Value, Version,
    };
    use duet_motion::SurfaceTag;
    use duet_netcode::{NetworkConfig, Packet, Transport};
    use glam::Vec3;
    use proptest::prelude::*;

    const HOST: PeerId = PeerId::HOST;
    const CLIENT: PeerId = PeerId(1);

    type Recorded = Session<RecordingPresentation>;

    fn ground() -> StaticScene {
        StaticScene::new().with_box(
            Vec3::new(-20.0, -1.0, -20.0),
            Vec3::new(20.0, 0.0, 20.0),
            SurfaceTag::Ground,
        )
    }

    fn session_with(scene: StaticScene) -> Recorded {
        let config = SessionConfig {
            network: NetworkConfig::fixed(1),
            ..SessionConfig::default()
        };
        let mut session = Session::new(config, scene).unwrap();
        session.join(CLIENT).unwrap();
        session
    }

    struct Level {
        session: Recorded,
        host_actor: EntityId,
        client_actor: EntityId,
        counter: EntityId,
        tiles: Vec<EntityId>,
    }

    fn level(target: i64) -> Level {
        level_in(session_with(ground()), target)
    }

    fn level_in(mut session: Recorded, target: i64) -> Level {
        let host_actor = session
            .spawn(SpawnSpec::actor(HOST, Vec3::new(-2.0, 0.0, 0.0)))
            .unwrap();
        let client_actor = session
            .spawn(SpawnSpec::actor(CLIENT, Vec3::new(2.0, 0.0, 0.0)))
            .unwrap();
        let counter = session.spawn(SpawnSpec::counter(target)).unwrap();
        let tiles = (0..4)
            .map(|i| {
                session
                    .spawn(SpawnSpec::paintable(
                        Vec3::new(i as f32 * 2.0, 0.5, 8.0),
                        Some(counter),
                    ))
                    .unwrap()
            })
            .collect();
        Level {
            session,
            host_actor,
            client_actor,
            counter,
            tiles,
        }
    }

    fn paint(index: i64) -> IntentKind {
        IntentKind::RequestMutate { index }
    }

    fn jittered(seed: u64) -> Recorded {
        let config = SessionConfig {
            network: NetworkConfig {
                min_latency_ticks: 1,
                max_latency_ticks: 4,
                seed,
            },
            ..SessionConfig::default()
        };
        let mut session = Session::new(config, ground()).unwrap();
        session.join(CLIENT).unwrap();
        session
    }

    fn scripted_frame(code: u8) -> InputFrame {
        match code {
            1 => InputFrame::neutral().with_move(1.0, 0.0),
            2 => InputFrame::neutral().with_move(0.0, -1.0),
            3 => InputFrame::neutral().with_jump(),
            4 => InputFrame::neutral().with_move(-1.0, 0.0).with_jump(),
            _ => InputFrame::neutral(),
        }
    }

    #[test]
    fn test_race_resolves_in_arrival_order() {
        let mut l = level(4);
        let tile = l.tiles[0];

        l.session.issue(CLIENT, l.client_actor, tile, paint(3)).unwrap();
        l.session.run_ticks(1, &mut NeutralInput).unwrap();
        l.session.issue(HOST, l.host_actor, tile, paint(1)).unwrap();
        l.session.run_ticks(4, &mut NeutralInput).unwrap();

        for peer in l.session.peers() {
            let store = peer.world().store();
            assert_eq!(Paintable::current(store, tile), Some(3));
            assert_eq!(SharedCounter::count(store, l.counter), Some(1));
            let applied = peer
                .presentation()
                .count_effects(|kind| matches!(kind, EffectKind::MutationApplied { .. }));
            assert_eq!(applied, 1);
        }
    }

    #[test]
    fn test_threshold_reached_once_per_peer() {
        let mut l = level(4);
        for (i, tile) in l.tiles.clone().into_iter().enumerate() {
            l.session
                .issue(CLIENT, l.client_actor, tile, paint(i as i64))
                .unwrap();
            l.session
                .issue(HOST, l.host_actor, tile, paint(0))
                .unwrap();
        }
        l.session.run_ticks(6, &mut NeutralInput).unwrap();

        for peer in l.session.peers() {
            let reached = peer
                .presentation()
                .count_effects(|kind| matches!(kind, EffectKind::ThresholdReached { .. }));
            assert_eq!(reached, 1);
            assert_eq!(SharedCounter::count(peer.world().store(), l.counter), Some(4));
        }
    }

    #[test]
    fn test_forged_replication_ignored() {
        let mut l = level(4);
        let tile = l.tiles[1];
        let forged = Packet::Replicate {
            from: CLIENT,
            tick: 1,
            updates: vec![FieldUpdate {
                entity: tile,
                field: fields::STATE_INDEX.to_string(),
                value: Value::Int(2),
                version: Version { tick: 99, seq: 0 },
            }],
        };
        l.session
            .network_mut()
            .endpoint(CLIENT)
            .send_packet(HOST, &forged)
            .unwrap();
        l.session.run_ticks(3, &mut NeutralInput).unwrap();

        for peer in l.session.peers() {
            assert_eq!(Paintable::current(peer.world().store(), tile), None);
        }
    }

    #[test]
    fn test_carry_released_by_wall() {
        let scene = ground().with_box(
            Vec3::new(-2.0, 0.0, 3.2),
            Vec3::new(2.0, 2.0, 3.6),
            SurfaceTag::Wall,
        );
        let mut session = session_with(scene);
        let actor = session.spawn(SpawnSpec::actor(CLIENT, Vec3::ZERO)).unwrap();
        let crate_id = session
            .spawn(SpawnSpec::carryable(Vec3::new(0.0, 0.5, 1.5)))
            .unwrap();

        let mut script = ScriptedInput::new()
            .hold(actor, 1..2, InputFrame::neutral().with_interact())
            .hold(actor, 2..200, InputFrame::neutral().with_move(0.0, 1.0));
        session.run_ticks(90, &mut script).unwrap();

        let client = session.peer(CLIENT).unwrap();
        let kinds: Vec<EffectKind> = client.presentation().effects().map(|e| e.kind).collect();
        assert_eq!(kinds[0], EffectKind::CarryStarted { carrier: actor });
        assert!(kinds.contains(&EffectKind::CarryStopped {
            carrier: actor,
            reason: CarryStopReason::Blocked
        }));
        assert_ne!(client.actor(actor).unwrap().tag(), ModeTag::Interacting);
        assert!(client
            .presentation()
            .modes(actor)
            .starts_with(&[ModeTag::Interacting]));

        for peer in session.peers() {
            assert_eq!(Carryable::carrier(peer.world().store(), crate_id), None);
        }
    }

    #[test]
    fn test_second_carrier_refused() {
        let mut session = session_with(ground());
        let host_actor = session.spawn(SpawnSpec::actor(HOST, Vec3::ZERO)).unwrap();
        let client_actor = session
            .spawn(SpawnSpec::actor(CLIENT, Vec3::new(0.0, 0.0, 3.0)))
            .unwrap();
        let crate_id = session
            .spawn(SpawnSpec::carryable(Vec3::new(0.0, 0.5, 1.5)))
            .unwrap();

        session
            .issue(HOST, host_actor, crate_id, IntentKind::StartCarry)
            .unwrap();
        session.run_ticks(1, &mut NeutralInput).unwrap();
        session
            .issue(CLIENT, client_actor, crate_id, IntentKind::StartCarry)
            .unwrap();
        session.run_ticks(4, &mut NeutralInput).unwrap();

        let refused = EffectKind::CarryStopped {
            carrier: client_actor,
            reason: CarryStopReason::Refused,
        };
        for peer in session.peers() {
            assert_eq!(
                Carryable::carrier(peer.world().store(), crate_id),
                Some(host_actor)
            );
            assert_eq!(peer.presentation().count_effects(|kind| *kind == refused), 1);
        }
    }

    #[test]
    fn test_despawn_clears_links() {
        let mut l = level(2);
        l.session.despawn(l.counter).unwrap();
        l.session
            .issue(CLIENT, l.client_actor, l.tiles[0], paint(1))
            .unwrap();
        l.session.run_ticks(4, &mut NeutralInput).unwrap();

        for peer in l.session.peers() {
            assert!(!peer.world().contains(l.counter));
            assert_eq!(Paintable::current(peer.world().store(), l.tiles[0]), Some(1));
            let counted = peer
                .presentation()
                .count_effects(|kind| matches!(kind, EffectKind::CounterChanged { .. }));
            assert_eq!(counted, 0);
        }
        assert!(l.session.despawn(l.counter).is_err());

        l.session.join(PeerId::new(2)).unwrap();
        let late = l.session.peer(PeerId::new(2)).unwrap();
        assert_eq!(Paintable::current(late.world().store(), l.tiles[0]), Some(1));
        assert!(matches!(
            late.world().kind(l.tiles[1]),
            Some(EntityKind::Paintable { counter: None, .. })
        ));
    }

    #[test]
    fn test_despawned_carrier_drops_object() {
        let mut session = session_with(ground());
        let actor = session.spawn(SpawnSpec::actor(CLIENT, Vec3::ZERO)).unwrap();
        let crate_id = session
            .spawn(SpawnSpec::carryable(Vec3::new(0.0, 0.5, 1.5)))
            .unwrap();
        session
            .issue(CLIENT, actor, crate_id, IntentKind::StartCarry)
            .unwrap();
        session.run_ticks(3, &mut NeutralInput).unwrap();
        assert_eq!(
            Carryable::carrier(session.peer(HOST).unwrap().world().store(), crate_id),
            Some(actor)
        );

        session.despawn(actor).unwrap();
        session.run_ticks(3, &mut NeutralInput).unwrap();
        for peer in session.peers() {
            assert_eq!(Carryable::carrier(peer.world().store(), crate_id), None);
            let dropped = peer.presentation().count_effects(|kind| {
                matches!(
                    kind,
                    EffectKind::CarryStopped {
                        reason: CarryStopReason::Despawned,
                        ..
                    }
                )
            });
            assert_eq!(dropped, 1);
        }
    }

    #[test]
    fn test_timer_expires_once_everywhere() {
        let mut session = session_with(ground());
        let timer = session.spawn(SpawnSpec::timer(0.1)).unwrap();
        session.run_ticks(20, &mut NeutralInput).unwrap();

        for peer in session.peers() {
            assert!(CountdownTimer::is_expired(peer.world().store(), timer));
            let expired = peer
                .presentation()
                .count_effects(|kind| matches!(kind, EffectKind::TimeExpired));
            assert_eq!(expired, 1);
        }
    }

    #[test]
    fn test_late_joiner_sees_current_state() {
        let mut l = level(4);
        l.session
            .issue(HOST, l.host_actor, l.tiles[2], paint(2))
            .unwrap();
        l.session.run_ticks(3, &mut NeutralInput).unwrap();

        let late = PeerId::new(2);
        l.session.join(late).unwrap();
        assert!(matches!(l.session.join(late), Err(Error::DuplicatePeer(_))));

        let store = l.session.peer(late).unwrap().world().store();
        assert_eq!(Paintable::current(store, l.tiles[2]), Some(2));
        assert_eq!(SharedCounter::count(store, l.counter), Some(1));
        assert_eq!(l.session.peer(late).unwrap().current_tick(), l.session.tick());
    }

    #[test]
    fn test_spawn_needs_known_peers() {
        let mut session = session_with(ground());
        let stranger = PeerId::new(7);
        assert!(matches!(
            session.spawn(SpawnSpec::actor(stranger, Vec3::ZERO)),
            Err(Error::UnknownPeer(p)) if p == stranger
        ));
        assert_eq!(session.spawned().count(), 0);
    }

    #[test]
    fn test_tile_counts_on_its_own_authority() {
        let mut session = session_with(ground());
        let actor = session.spawn(SpawnSpec::actor(CLIENT, Vec3::ZERO)).unwrap();
        let counter = session
            .spawn(SpawnSpec::counter(1).owned_by(CLIENT))
            .unwrap();

        let split = session.spawn(SpawnSpec::paintable(Vec3::Z * 2.0, Some(counter)));
        assert!(matches!(
            split,
            Err(Error::Core(CoreError::AuthorityViolation { entity, role: Role::State, .. }))
                if entity == counter
        ));
        assert_eq!(session.spawned().count(), 2);
        for peer in session.peers() {
            assert_eq!(peer.world().entities().count(), 2);
        }

        let tile = session
            .spawn(SpawnSpec::paintable(Vec3::Z * 2.0, Some(counter)).owned_by(CLIENT))
            .unwrap();
        session.issue(CLIENT, actor, tile, paint(2)).unwrap();
        session.run_ticks(4, &mut NeutralInput).unwrap();

        for peer in session.peers() {
            let store = peer.world().store();
            assert_eq!(Paintable::current(store, tile), Some(2));
            assert_eq!(SharedCounter::count(store, counter), Some(1));
            let applied = peer
                .presentation()
                .count_effects(|kind| matches!(kind, EffectKind::MutationApplied { .. }));
            assert_eq!(applied, 1);
        }
    }

    #[test]
    fn test_frame_runs_clock_steps() {
        let mut session = session_with(ground());
        let steps = session.frame(0.055, &mut NeutralInput).unwrap();
        assert_eq!(steps, 3);
        assert_eq!(session.tick(), 3);
        let long = session.frame(1.0, &mut NeutralInput).unwrap();
        assert_eq!(long, session.config().max_steps_per_frame);
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn prop_peers_converge(
            requests in prop::collection::vec((any::<bool>(), 0usize..4, 0i64..=4, 0u32..3), 1..12)
        ) {
            let mut l = level(3);
            for (from_client, tile, index, wait) in requests {
                let (peer, actor) = if from_client {
                    (CLIENT, l.client_actor)
                } else {
                    (HOST, l.host_actor)
                };
                l.session.issue(peer, actor, l.tiles[tile], paint(index)).unwrap();
                l.session.run_ticks(wait, &mut NeutralInput).unwrap();
            }
            l.session.run_ticks(6, &mut NeutralInput).unwrap();

            let host = l.session.peer(HOST).unwrap().world().store();
            let client = l.session.peer(CLIENT).unwrap().world().store();
            let painted = l
                .tiles
                .iter()
                .filter(|tile| Paintable::current(host, **tile).is_some())
                .count() as i64;
            for tile in &l.tiles {
                prop_assert_eq!(Paintable::current(host, *tile), Paintable::current(client, *tile));
            }
            prop_assert_eq!(SharedCounter::count(host, l.counter), Some(painted));
            prop_assert_eq!(SharedCounter::count(client, l.counter), Some(painted));
            let reached_everywhere = l.session.peers().all(|peer| {
                let reached = peer
                    .presentation()
                    .count_effects(|kind| matches!(kind, EffectKind::ThresholdReached { .. }));
                reached == usize::from(painted >= 3)
            });
            prop_assert!(reached_everywhere);
        }

        #[test]
        fn prop_peers_converge_under_jitter(
            seed in any::<u64>(),
            moves in prop::collection::vec((0u8..5, 0u8..5), 10..60),
            requests in prop::collection::vec((any::<bool>(), 0usize..4, 0i64..=4), 1..8),
        ) {
            let mut l = level_in(jittered(seed), 3);
            let (host_actor, client_actor) = (l.host_actor, l.client_actor);
            let scripted = moves.len() as u32;
            let mut input = move |actor: EntityId, tick: Tick| {
                let Some((host, client)) = moves.get(tick as usize) else {
                    return InputFrame::neutral();
                };
                match actor {
                    a if a == host_actor => scripted_frame(*host),
                    a if a == client_actor => scripted_frame(*client),
                    _ => InputFrame::neutral(),
                }
            };

            for (i, (from_client, tile, index)) in requests.into_iter().enumerate() {
                let (peer, actor) = if from_client {
                    (CLIENT, client_actor)
                } else {
                    (HOST, host_actor)
                };
                l.session.issue(peer, actor, l.tiles[tile], paint(index)).unwrap();
                l.session.run_ticks(1 + i as u32 % 3, &mut input).unwrap();
            }
            l.session.run_ticks(scripted + 90, &mut input).unwrap();

            let host = l.session.peer(HOST).unwrap();
            let client = l.session.peer(CLIENT).unwrap();
            let (host_store, client_store) = (host.world().store(), client.world().store());
            prop_assert_eq!(host_store.len(), client_store.len());
            for entity in host_store.ids() {
                for (field, value) in host_store.fields(entity) {
                    prop_assert_eq!(client_store.get(entity, field), Some(value));
                }
            }

            for (peer, actor) in [(host, host_actor), (client, client_actor)] {
                let driven = peer.actor(actor).unwrap().tag();
                prop_assert_eq!(
                    host_store.get_int(actor, fields::MODE),
                    Some(driven.as_code())
                );
            }

            let painted = l
                .tiles
                .iter()
                .filter(|tile| Paintable::current(host_store, **tile).is_some())
                .count() as i64;
            prop_assert_eq!(SharedCounter::count(client_store, l.counter), Some(painted));
        }
    }
}
