//! Co-op session walkthrough
//!
//! Two peers share one level over a simulated network with jittered latency:
//! - both players race to paint the same tile, then paint the rest
//! - the client presses a switch that raises a bridge
//! - the client pushes a crate until it hits a wall
//! - a countdown runs in the background
//!
//! Run with `RUST_LOG=debug` to see every rejected request.

use duet_core::{EffectKind, EntityId, InputFrame, IntentKind, ModeTag, PeerId, Tick};
use duet_motion::{StaticScene, SurfaceTag};
use duet_netcode::Transform;
use duet_session::{Presentation, ScriptedInput, Session, SessionConfig, SpawnSpec};
use glam::Vec3;
use std::path::Path;
use tracing_subscriber::EnvFilter;

const HOST: PeerId = PeerId::HOST;
const CLIENT: PeerId = PeerId(1);

/// Frames of 1/60 s plus a few long ones to exercise catch-up
const FRAMES: usize = 240;

/// Prints what a peer would show its player
#[derive(Default)]
struct ConsolePresentation {
    peer: Option<PeerId>,
    frames: u64,
}

impl ConsolePresentation {
    fn label(&self) -> String {
        self.peer.map_or_else(|| "?".to_string(), |peer| peer.to_string())
    }
}

impl Presentation for ConsolePresentation {
    fn mode_changed(&mut self, actor: EntityId, from: ModeTag, to: ModeTag) {
        println!("[{}] {actor}: {from} -> {to}", self.label());
    }

    fn effect(&mut self, effect: &duet_core::Effect) {
        match effect.kind {
            EffectKind::ThresholdReached { count, target } => {
                println!("[{}] *** every tile painted ({count}/{target}) ***", self.label())
            }
            EffectKind::TimeExpired => println!("[{}] *** time is up ***", self.label()),
            kind => println!("[{}] {} on {}: {kind:?}", self.label(), kind.name(), effect.target),
        }
    }

    fn counter_changed(&mut self, counter: EntityId, count: i64, target: i64) {
        println!("[{}] {counter} shows {count}/{target}", self.label());
    }

    fn gate_changed(&mut self, gate: EntityId, open: bool) {
        let state = if open { "raised" } else { "lowered" };
        println!("[{}] bridge {gate} {state}", self.label());
    }

    fn transform(&mut self, _entity: EntityId, _transform: Transform) {
        self.frames += 1;
    }
}

fn load_config() -> Result<SessionConfig, Box<dyn std::error::Error>> {
    let paths = [
        "demos/coop_session/data/session.ron",
        "data/session.ron",
        "../data/session.ron",
    ];
    for path in &paths {
        if Path::new(path).exists() {
            tracing::info!(path, "loading config");
            return Ok(SessionConfig::load(path)?);
        }
    }
    tracing::info!("no config file found, using defaults");
    Ok(SessionConfig::default())
}

fn level() -> StaticScene {
    StaticScene::new()
        // floor
        .with_box(
            Vec3::new(-20.0, -1.0, -20.0),
            Vec3::new(20.0, 0.0, 20.0),
            SurfaceTag::Ground,
        )
        // wall stopping the crate
        .with_box(
            Vec3::new(4.0, 0.0, 4.2),
            Vec3::new(8.0, 2.0, 4.6),
            SurfaceTag::Wall,
        )
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = load_config()?;
    let mut session: Session<ConsolePresentation> = Session::new(config, level())?;
    session.join(CLIENT)?;
    for peer in [HOST, CLIENT] {
        session.peer_mut(peer)?.presentation_mut().peer = Some(peer);
    }

    println!("=== Spawning level ===");
    let host_actor = session.spawn(SpawnSpec::actor(HOST, Vec3::new(-3.0, 0.0, 0.0)))?;
    let client_actor = session.spawn(SpawnSpec::actor(CLIENT, Vec3::new(6.0, 0.0, 0.0)))?;
    let counter = session.spawn(SpawnSpec::counter(3))?;
    let tiles: Vec<EntityId> = (0..3)
        .map(|i| session.spawn(SpawnSpec::paintable(Vec3::new(-4.0 + i as f32, 0.5, 6.0), Some(counter))))
        .collect::<Result<_, _>>()?;
    let bridge = session.spawn(SpawnSpec::gate(
        Vec3::new(-10.0, 0.0, 10.0),
        Vec3::new(1.0, 0.1, 3.0),
    ))?;
    let switch = session.spawn(SpawnSpec::switch(Vec3::new(-8.0, 0.5, 2.0), Some(bridge)))?;
    session.spawn(SpawnSpec::carryable(Vec3::new(6.0, 0.5, 1.5)))?;
    let timer = session.spawn(SpawnSpec::timer(3.0))?;
    println!("{} entities on {} peers", session.spawned().count(), session.peers().count());

    println!("\n=== Racing for the first tile ===");
    session.issue(CLIENT, client_actor, tiles[0], IntentKind::RequestMutate { index: 3 })?;
    session.issue(HOST, host_actor, tiles[0], IntentKind::RequestMutate { index: 1 })?;
    session.issue(HOST, host_actor, tiles[1], IntentKind::RequestMutate { index: 2 })?;
    session.issue(CLIENT, client_actor, tiles[2], IntentKind::RequestMutate { index: 0 })?;
    session.issue(CLIENT, client_actor, switch, IntentKind::PressSwitch)?;

    println!("\n=== Pushing the crate ===");
    let mut script = ScriptedInput::new()
        .hold(client_actor, 10..11, InputFrame::neutral().with_interact())
        .hold(client_actor, 11..120, InputFrame::neutral().with_move(0.0, 1.0))
        .hold(host_actor, 30..31, InputFrame::neutral().with_jump());

    let mut ticks: Tick = 0;
    for frame in 0..FRAMES {
        let frame_dt = if frame % 60 == 59 { 0.1 } else { 1.0 / 60.0 };
        ticks += Tick::from(session.frame(frame_dt, &mut script)?);
    }

    println!("\n=== Summary after {ticks} ticks ===");
    for peer in session.peers() {
        let store = peer.world().store();
        let painted: Vec<String> = tiles
            .iter()
            .map(|tile| {
                store
                    .get_int(*tile, "state_index")
                    .filter(|index| *index >= 0)
                    .map_or_else(|| "-".to_string(), |index| index.to_string())
            })
            .collect();
        println!(
            "{}: tiles [{}], count {:?}, bridge open {:?}, time left {:?}, {} transforms rendered",
            peer.id(),
            painted.join(", "),
            store.get_int(counter, "count"),
            store.get_bool(bridge, "open"),
            store.get_float(timer, "remaining"),
            peer.presentation().frames,
        );
    }
    let stats = session.network().stats();
    println!(
        "network: {} sent, {} delivered, {} bytes",
        stats.sent, stats.delivered, stats.bytes
    );

    Ok(())
}
