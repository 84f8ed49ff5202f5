//! Duet Netcode - moving intents, effects and replication between peers
//!
//! This crate provides the network-facing half of a duet session:
//!
//! - **Packets**: the bincode-encoded wire protocol (`Packet`)
//! - **Transport**: the per-peer endpoint seam users implement for their stack
//! - **SimNetwork**: an in-memory transport with bounded, jittered latency
//! - **Input Buffering**: latching frame-rate button presses for fixed ticks
//! - **Interpolation**: smoothing replicated transforms between ticks
//!
//! # Architecture
//!
//! ```text
//! ┌────────────── Peer ──────────────┐        ┌────────────── Peer ──────────────┐
//! │ InputBuffer ─▶ tick ─▶ Packet    │──────▶ │ inbox ─▶ tick ─▶ Interpolator   │
//! │                         encode   │ Transp.│ decode            render         │
//! └──────────────────────────────────┘        └──────────────────────────────────┘
//! ```

mod error;
mod input_buffer;
mod interpolation;
mod sim_network;
mod transport;

pub use error::{Error, Result};
pub use input_buffer::InputBuffer;
pub use interpolation::{Interpolator, Transform};
pub use sim_network::{NetworkConfig, NetworkStats, SimEndpoint, SimNetwork};
pub use transport::{Delivery, Packet, Transport};
