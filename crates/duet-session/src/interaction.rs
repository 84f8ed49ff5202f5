//! Request-confirm protocol, authority side
//!
//! [`execute`] runs one intent on the State Authority of its target. The
//! sender must hold Input Authority over the acting actor, and this peer must
//! hold State Authority over the target; otherwise nothing happens. On
//! success every mutation is already applied when the returned effects are
//! handed out, so an effect never precedes its cause.

use crate::objects::{Carryable, Gate, Paintable, SharedCounter, Switch};
use crate::spawn::EntityKind;
use crate::world::World;
use duet_core::{
    fields, CarryStopReason, Effect, EffectKind, EntityId, Error, Intent, IntentKind, PeerId,
    Result, Role, Tick, WriteGrant,
};

/// Validate and apply an intent addressed to an entity this peer owns
pub fn execute(world: &mut World, intent: &Intent, tick: Tick) -> Result<Vec<Effect>> {
    world
        .registry()
        .require(intent.actor, intent.sender, Role::Input)?;
    let grant = world.grant(intent.target)?;
    let kind = world
        .kind(intent.target)
        .ok_or(Error::EntityNotFound(intent.target))?;
    let source = world.peer();
    let effect = |target: EntityId, kind: EffectKind| Effect::new(source, target, kind, tick);

    match intent.kind {
        IntentKind::ReportPose {
            position,
            rotation,
            mode,
        } => {
            if intent.actor != intent.target {
                return Err(Error::AuthorityViolation {
                    peer: intent.sender,
                    entity: intent.target,
                    role: Role::Input,
                });
            }
            if !world.accept_pose(intent.actor, intent.tick) {
                tracing::trace!(entity = %intent.actor, sent = %intent.tick, %tick, "stale pose report");
                return Ok(Vec::new());
            }
            let store = world.store_mut();
            store.write(&grant, fields::POSITION, position, tick)?;
            store.write(&grant, fields::ROTATION, rotation, tick)?;
            store.write(&grant, fields::MODE, mode.as_code(), tick)?;
            Ok(Vec::new())
        }

        IntentKind::RequestMutate { index } => {
            let EntityKind::Paintable { max_index, counter } = kind else {
                return Err(wrong_kind(fields::STATE_INDEX, "paintable", kind));
            };
            let counter_grant = counter
                .map(|counter| world.link_grant(counter, "counter"))
                .transpose()?;
            Paintable::new(max_index, counter).apply(world.store_mut(), &grant, index, tick)?;
            tracing::debug!(entity = %intent.target, actor = %intent.actor, index, %tick, "mutation applied");

            let mut effects = vec![effect(
                intent.target,
                EffectKind::MutationApplied {
                    actor: intent.actor,
                    index: Some(index),
                },
            )];
            if let Some(counter_grant) = counter_grant {
                effects.extend(count(world, &counter_grant, tick)?);
            }
            Ok(effects)
        }

        IntentKind::PressSwitch => {
            let EntityKind::Switch { gate } = kind else {
                return Err(wrong_kind(fields::USED, "switch", kind));
            };
            let gate_grant = gate.map(|gate| world.link_grant(gate, "gate")).transpose()?;
            Switch::press(world.store_mut(), &grant, tick)?;
            tracing::debug!(entity = %intent.target, actor = %intent.actor, %tick, "switch pressed");

            let mut effects = vec![effect(
                intent.target,
                EffectKind::MutationApplied {
                    actor: intent.actor,
                    index: None,
                },
            )];
            if let Some(gate_grant) = gate_grant {
                let gate = gate_grant.entity();
                let open = Gate::toggle(world.store_mut(), &gate_grant, tick)?;
                world.sync_collider(gate);
                effects.push(effect(gate, EffectKind::GateToggled { open }));
            }
            Ok(effects)
        }

        IntentKind::StartCarry => {
            if kind != EntityKind::Carryable {
                tracing::trace!(entity = %intent.target, kind = kind.name(), "static interactable, no carry link");
                return Ok(Vec::new());
            }
            if !Carryable::start(world.store_mut(), &grant, intent.actor, tick)? {
                return Ok(Vec::new());
            }
            Ok(vec![effect(
                intent.target,
                EffectKind::CarryStarted {
                    carrier: intent.actor,
                },
            )])
        }

        IntentKind::StopCarry => {
            if kind != EntityKind::Carryable {
                return Ok(Vec::new());
            }
            if !Carryable::stop(world.store_mut(), &grant, intent.actor, tick)? {
                return Ok(Vec::new());
            }
            Ok(vec![effect(
                intent.target,
                EffectKind::CarryStopped {
                    carrier: intent.actor,
                    reason: CarryStopReason::Released,
                },
            )])
        }
    }
}

/// Effect telling the requester its intent was turned down, when it needs one
///
/// A refused carry has to reach the actor's peer, which already entered its
/// interacting mode locally.
pub fn refusal(intent: &Intent, error: &Error, source: PeerId, tick: Tick) -> Option<Effect> {
    match (intent.kind, error) {
        (IntentKind::StartCarry, Error::CarryOccupied { .. }) => Some(Effect::new(
            source,
            intent.target,
            EffectKind::CarryStopped {
                carrier: intent.actor,
                reason: CarryStopReason::Refused,
            },
            tick,
        )),
        _ => None,
    }
}

/// Increment a counter after a successful mutation
fn count(world: &mut World, grant: &WriteGrant, tick: Tick) -> Result<Vec<Effect>> {
    let counter = grant.entity();
    let step = SharedCounter::increment(world.store_mut(), grant, tick)?;
    let source = world.peer();

    let mut effects = vec![Effect::new(
        source,
        counter,
        EffectKind::CounterChanged { count: step.count },
        tick,
    )];
    if step.reached {
        tracing::info!(%counter, count = step.count, threshold = step.target, %tick, "threshold reached");
        effects.push(Effect::new(
            source,
            counter,
            EffectKind::ThresholdReached {
                count: step.count,
                target: step.target,
            },
            tick,
        ));
    }
    Ok(effects)
}

fn wrong_kind(field: &str, expected: &'static str, got: EntityKind) -> Error {
    Error::TypeError {
        field: field.to_string(),
        expected,
        got: got.name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spawn::SpawnSpec;
    use duet_core::ModeTag;
    use duet_motion::StaticScene;
    use glam::{Quat, Vec3};

    const HOST: PeerId = PeerId::HOST;
    const CLIENT: PeerId = PeerId(1);

    struct Fixture {
        world: World,
        host_actor: EntityId,
        client_actor: EntityId,
        counter: EntityId,
        paintables: Vec<EntityId>,
        switch: EntityId,
        gate: EntityId,
        crate_id: EntityId,
    }

    fn fixture(target: i64) -> Fixture {
        let mut world = World::new(HOST, StaticScene::new());
        let mut next = 0;
        let mut spawn = |world: &mut World, spec: SpawnSpec| {
            next += 1;
            let id = EntityId::new(next);
            world.spawn(id, &spec).unwrap();
            id
        };

        let host_actor = spawn(&mut world, SpawnSpec::actor(HOST, Vec3::ZERO));
        let client_actor = spawn(&mut world, SpawnSpec::actor(CLIENT, Vec3::X));
        let counter = spawn(&mut world, SpawnSpec::counter(target));
        let paintables = (0..4)
            .map(|i| {
                spawn(
                    &mut world,
                    SpawnSpec::paintable(Vec3::new(i as f32, 0.5, 5.0), Some(counter)),
                )
            })
            .collect();
        let gate = spawn(&mut world, SpawnSpec::gate(Vec3::Z * 10.0, Vec3::ONE));
        let switch = spawn(&mut world, SpawnSpec::switch(Vec3::Z * 8.0, Some(gate)));
        let crate_id = spawn(&mut world, SpawnSpec::carryable(Vec3::Z * 2.0));

        Fixture {
            world,
            host_actor,
            client_actor,
            counter,
            paintables,
            switch,
            gate,
            crate_id,
        }
    }

    fn mutate(sender: PeerId, actor: EntityId, target: EntityId, index: i64) -> Intent {
        Intent::new(sender, actor, target, IntentKind::RequestMutate { index })
    }

    #[test]
    fn test_first_mutation_wins() {
        let mut f = fixture(4);
        let target = f.paintables[0];

        let effects = execute(&mut f.world, &mutate(CLIENT, f.client_actor, target, 3), 1).unwrap();
        let kinds: Vec<_> = effects.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EffectKind::MutationApplied {
                    actor: f.client_actor,
                    index: Some(3)
                },
                EffectKind::CounterChanged { count: 1 },
            ]
        );

        let second = execute(&mut f.world, &mutate(HOST, f.host_actor, target, 1), 1);
        assert_eq!(second, Err(Error::GuardAlreadySet(target)));
        assert_eq!(Paintable::current(f.world.store(), target), Some(3));
        assert_eq!(SharedCounter::count(f.world.store(), f.counter), Some(1));
    }

    #[test]
    fn test_threshold_once() {
        let mut f = fixture(4);
        let mut reached = 0;
        for (i, target) in f.paintables.clone().into_iter().enumerate() {
            for attempt in 0..2 {
                let actor = if attempt == 0 { f.client_actor } else { f.host_actor };
                let sender = if attempt == 0 { CLIENT } else { HOST };
                let Ok(effects) = execute(&mut f.world, &mutate(sender, actor, target, i as i64), 1)
                else {
                    continue;
                };
                reached += effects
                    .iter()
                    .filter(|e| matches!(e.kind, EffectKind::ThresholdReached { .. }))
                    .count();
            }
        }
        assert_eq!(reached, 1);
        assert_eq!(SharedCounter::count(f.world.store(), f.counter), Some(4));
    }

    #[test]
    fn test_sender_must_drive_actor() {
        let mut f = fixture(4);
        let forged = mutate(CLIENT, f.host_actor, f.paintables[0], 2);
        assert_eq!(
            execute(&mut f.world, &forged, 1),
            Err(Error::AuthorityViolation {
                peer: CLIENT,
                entity: f.host_actor,
                role: Role::Input
            })
        );
        assert_eq!(Paintable::current(f.world.store(), f.paintables[0]), None);
    }

    #[test]
    fn test_mirror_refuses_execution() {
        let mut f = fixture(4);
        let mut mirror = World::new(CLIENT, StaticScene::new());
        for (id, object) in f.world.entities() {
            let spec = match object.kind {
                EntityKind::Actor if id == f.client_actor => SpawnSpec::actor(CLIENT, Vec3::X),
                EntityKind::Actor => SpawnSpec::actor(HOST, Vec3::ZERO),
                kind => SpawnSpec::new(kind),
            };
            mirror.spawn(id, &spec).unwrap();
        }
        let intent = mutate(CLIENT, f.client_actor, f.paintables[1], 2);
        assert!(matches!(
            execute(&mut mirror, &intent, 1),
            Err(Error::AuthorityViolation { role: Role::State, .. })
        ));
        assert!(execute(&mut f.world, &intent, 1).is_ok());
    }

    #[test]
    fn test_switch_toggles_gate_once() {
        let mut f = fixture(4);
        let press = Intent::new(CLIENT, f.client_actor, f.switch, IntentKind::PressSwitch);

        let effects = execute(&mut f.world, &press, 1).unwrap();
        assert_eq!(effects.len(), 2);
        assert_eq!(effects[1].target, f.gate);
        assert_eq!(effects[1].kind, EffectKind::GateToggled { open: true });
        assert!(Gate::is_open(f.world.store(), f.gate));

        assert_eq!(
            execute(&mut f.world, &press, 2),
            Err(Error::GuardAlreadySet(f.switch))
        );
        assert!(Gate::is_open(f.world.store(), f.gate));
    }

    #[test]
    fn test_carry_refusal() {
        let mut f = fixture(4);
        let start = |sender, actor| Intent::new(sender, actor, f.crate_id, IntentKind::StartCarry);

        let effects = execute(&mut f.world, &start(CLIENT, f.client_actor), 1).unwrap();
        assert_eq!(
            effects[0].kind,
            EffectKind::CarryStarted {
                carrier: f.client_actor
            }
        );

        let rival = start(HOST, f.host_actor);
        let err = execute(&mut f.world, &rival, 2).unwrap_err();
        let refused = refusal(&rival, &err, HOST, 2).unwrap();
        assert_eq!(
            refused.kind,
            EffectKind::CarryStopped {
                carrier: f.host_actor,
                reason: CarryStopReason::Refused
            }
        );

        let stop = Intent::new(CLIENT, f.client_actor, f.crate_id, IntentKind::StopCarry);
        let effects = execute(&mut f.world, &stop, 3).unwrap();
        assert_eq!(effects.len(), 1);
        assert!(execute(&mut f.world, &stop, 4).unwrap().is_empty());
    }

    #[test]
    fn test_report_pose_writes_own_actor_only() {
        let mut f = fixture(4);
        let pose = IntentKind::ReportPose {
            position: Vec3::new(1.0, 2.0, 3.0),
            rotation: Quat::IDENTITY,
            mode: ModeTag::LedgeGrabbed,
        };

        let own = Intent::new(CLIENT, f.client_actor, f.client_actor, pose);
        assert!(execute(&mut f.world, &own, 1).unwrap().is_empty());
        assert_eq!(
            f.world.pose(f.client_actor).map(|(p, _)| p),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );
        assert_eq!(
            f.world.store().get_int(f.client_actor, fields::MODE),
            Some(ModeTag::LedgeGrabbed.as_code())
        );

        let other = Intent::new(CLIENT, f.client_actor, f.host_actor, pose);
        assert!(execute(&mut f.world, &other, 2).is_err());
    }

    #[test]
    fn test_older_pose_report_never_overwrites_newer() {
        let mut f = fixture(4);
        let report = |x: f32, mode: ModeTag, sent: Tick| {
            let pose = IntentKind::ReportPose {
                position: Vec3::new(x, 1.0, 0.0),
                rotation: Quat::IDENTITY,
                mode,
            };
            Intent::new(CLIENT, f.client_actor, f.client_actor, pose).at_tick(sent)
        };
        let climbing = report(5.0, ModeTag::Climbing, 5);
        let grabbed = report(4.0, ModeTag::LedgeGrabbed, 4);

        execute(&mut f.world, &climbing, 7).unwrap();
        assert!(execute(&mut f.world, &grabbed, 8).unwrap().is_empty());
        assert!(execute(&mut f.world, &climbing, 8).unwrap().is_empty());

        let store = f.world.store();
        assert_eq!(f.world.pose(f.client_actor).map(|(p, _)| p.x), Some(5.0));
        assert_eq!(
            store.get_int(f.client_actor, fields::MODE),
            Some(ModeTag::Climbing.as_code())
        );
        assert_eq!(
            store.version(f.client_actor, fields::MODE).map(|v| v.tick),
            Some(7)
        );

        execute(&mut f.world, &report(6.0, ModeTag::Grounded, 6), 9).unwrap();
        assert_eq!(f.world.pose(f.client_actor).map(|(p, _)| p.x), Some(6.0));
    }

    #[test]
    fn test_client_owned_tile_counts_on_client() {
        let mut world = World::new(CLIENT, StaticScene::new());
        let client_actor = EntityId::new(1);
        let counter = EntityId::new(2);
        let tile = EntityId::new(3);
        world
            .spawn(client_actor, &SpawnSpec::actor(CLIENT, Vec3::ZERO))
            .unwrap();
        world
            .spawn(counter, &SpawnSpec::counter(1).owned_by(CLIENT))
            .unwrap();
        world
            .spawn(tile, &SpawnSpec::paintable(Vec3::Z, Some(counter)).owned_by(CLIENT))
            .unwrap();

        let effects = execute(&mut world, &mutate(CLIENT, client_actor, tile, 2), 1).unwrap();
        let kinds: Vec<_> = effects.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EffectKind::MutationApplied {
                    actor: client_actor,
                    index: Some(2)
                },
                EffectKind::CounterChanged { count: 1 },
                EffectKind::ThresholdReached { count: 1, target: 1 },
            ]
        );
    }

    #[test]
    fn test_link_checked_before_guard() {
        let f = fixture(4);
        assert!(f.world.link_grant(f.counter, "counter").is_ok());
        assert!(matches!(
            f.world.link_grant(f.gate, "counter"),
            Err(Error::TypeError { expected: "counter", got: "gate", .. })
        ));

        let mut mirror = World::new(CLIENT, StaticScene::new());
        mirror.spawn(f.counter, &SpawnSpec::counter(4)).unwrap();
        assert_eq!(
            mirror.link_grant(f.counter, "counter"),
            Err(Error::AuthorityViolation {
                peer: CLIENT,
                entity: f.counter,
                role: Role::State
            })
        );
    }

    #[test]
    fn test_wrong_kind_and_index() {
        let mut f = fixture(4);
        let on_counter = mutate(CLIENT, f.client_actor, f.counter, 1);
        assert!(matches!(
            execute(&mut f.world, &on_counter, 1),
            Err(Error::TypeError { expected: "paintable", .. })
        ));

        let out_of_range = mutate(CLIENT, f.client_actor, f.paintables[2], 9);
        assert!(matches!(
            execute(&mut f.world, &out_of_range, 1),
            Err(Error::InvalidIndex { index: 9, .. })
        ));
        assert_eq!(SharedCounter::count(f.world.store(), f.counter), Some(0));
    }
}
