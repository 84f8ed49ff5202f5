//! Duet Session - the networked game loop of a two-player co-op level
//!
//! This crate ties the model, the netcode and locomotion together:
//!
//! - **World**: one peer's entities, authority, replicated fields and scene
//! - **Objects**: paintable tiles, the shared counter, switches and gates,
//!   carryable crates and the countdown timer
//! - **Interaction**: the intent/effect protocol run by State Authorities
//! - **Peer**: the fixed tick loop and the render pass of one participant
//! - **Session**: every peer of one game over an in-memory network
//!
//! # Authority
//!
//! Every entity has exactly one State Authority, the only peer allowed to
//! write its fields. Actors additionally have an Input Authority: the peer
//! whose player drives them. That peer runs the actor's locomotion and
//! reports the resulting pose; the State Authority publishes it.
//!
//! # Example
//!
//! ```
//! use duet_core::{EffectKind, PeerId};
//! use duet_motion::{StaticScene, SurfaceTag};
//! use duet_session::{RecordingPresentation, Session, SessionConfig, SpawnSpec, NeutralInput};
//! use glam::Vec3;
//!
//! let scene = StaticScene::new().with_box(
//!     Vec3::new(-10.0, -1.0, -10.0),
//!     Vec3::new(10.0, 0.0, 10.0),
//!     SurfaceTag::Ground,
//! );
//! let mut session: Session<RecordingPresentation> =
//!     Session::new(SessionConfig::default(), scene).unwrap();
//! session.join(PeerId::new(1)).unwrap();
//! session.spawn(SpawnSpec::timer(0.25)).unwrap();
//!
//! session.run_ticks(30, &mut NeutralInput).unwrap();
//! for peer in session.peers() {
//!     let expired = peer
//!         .presentation()
//!         .count_effects(|kind| matches!(kind, EffectKind::TimeExpired));
//!     assert_eq!(expired, 1);
//! }
//! ```

mod actor;
mod config;
mod error;
mod input;
pub mod interaction;
pub mod objects;
mod peer;
mod presentation;
mod session;
mod spawn;
mod world;

pub use actor::{ActorController, ActorStep};
pub use config::{CarryConfig, SessionConfig};
pub use error::{Error, Result};
pub use input::{InputSource, NeutralInput, ScriptedInput};
pub use peer::Peer;
pub use presentation::{
    Notification, NullPresentation, Presentation, Reconciler, RecordingPresentation,
};
pub use session::Session;
pub use spawn::{EntityKind, SpawnSpec, DEFAULT_MAX_INDEX};
pub use world::{World, WorldObject};
