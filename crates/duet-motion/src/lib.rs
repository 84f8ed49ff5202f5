//! Duet Motion - actor locomotion for duet sessions
//!
//! This crate drives a single actor from input frames:
//! - `PhysicsQuery`, the raycast/overlap seam, with `StaticScene` as a box-level implementation
//! - `CharacterBody`, a kinematic body with ground snapping and wall blocking
//! - `Locomotion`, the mode state machine (jump, fall, land, ledge grab,
//!   traverse, climb, interact)
//!
//! The machine never talks to the network. Interactions it starts or ends are
//! returned as `MotionRequest`s for the caller to turn into intents.
//!
//! ## Example
//!
//! ```
//! use duet_core::{InputFrame, ModeTag};
//! use duet_motion::{CharacterBody, Locomotion, LocomotionConfig, StaticScene, SurfaceTag};
//! use glam::Vec3;
//!
//! let scene = StaticScene::new().with_box(
//!     Vec3::new(-10.0, -1.0, -10.0),
//!     Vec3::new(10.0, 0.0, 10.0),
//!     SurfaceTag::Ground,
//! );
//! let mut actor = Locomotion::new(LocomotionConfig::default(), CharacterBody::new(Vec3::ZERO));
//! actor.settle(&scene);
//!
//! let out = actor.step(&InputFrame::neutral().with_jump(), &scene, 1.0 / 60.0);
//! assert!(out.changed());
//! assert_eq!(actor.tag(), ModeTag::Jumping);
//! ```

mod body;
mod config;
mod machine;
mod mode;
pub mod physics;
mod probes;

pub use body::{look_rotation, CharacterBody};
pub use config::LocomotionConfig;
pub use machine::{Locomotion, MotionRequest, Rejection, StepOutcome, Transition};
pub use mode::{Axis, Climb, Guards, Interaction, LedgeHold, Mode};
pub use physics::{Collider, LayerMask, Overlap, PhysicsQuery, RayHit, StaticScene, SurfaceTag};
