//! Duet Core - shared model of a peer-authoritative co-op session
//!
//! This crate provides the types every peer agrees on:
//! - Identities (`EntityId`, `PeerId`) and dynamic field values (`Value`)
//! - The authority registry deciding who may write and who may drive an entity
//! - The replicated state store with last-writer-wins ordering
//! - Intent/effect messages of the request-confirm protocol
//! - Input frames, fixed-rate time and a deterministic RNG
//!
//! ## Authority model
//!
//! Each networked entity has one State Authority and at most one Input
//! Authority, fixed at spawn:
//! - `AuthorityRegistry::grant_write` is the only source of a `WriteGrant`
//! - `ReplicatedStore::write` requires a `WriteGrant`
//! - everything else reaches the authority as an `Intent`

mod authority;
mod error;
pub mod fields;
mod identity;
mod input;
mod mode;
mod msg;
pub mod replication;
mod rng;
pub mod time;
mod value;

pub use authority::{AuthorityRegistry, EntityAuthority, Role, WriteGrant};
pub use error::{Error, Result};
pub use identity::{EntityId, PeerId};
pub use input::InputFrame;
pub use mode::ModeTag;
pub use msg::{CarryStopReason, Effect, EffectKind, Intent, IntentKind};
pub use replication::{FieldUpdate, ReplicatedStore, Stamped, Version};
pub use rng::GameRng;
pub use time::{Clock, Tick, TickRate};
pub use value::{Value, ValueMap};
