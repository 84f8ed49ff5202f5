//! Session configuration
//!
//! Every section has defaults, so a RON file only needs the values it
//! overrides:
//!
//! ```ron
//! (
//!     tick_rate: (hz: 30),
//!     locomotion: (move_speed: 4.0),
//!     network: (min_latency_ticks: 2, max_latency_ticks: 2),
//! )
//! ```

use crate::error::{Error, Result};
use duet_core::TickRate;
use duet_motion::LocomotionConfig;
use duet_netcode::NetworkConfig;
use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// How a carried object follows its carrier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarryConfig {
    /// Attachment point in the carrier's local frame
    pub hold_offset: Vec3,
    /// Position blend rate per second
    pub position_lerp: f32,
    /// Rotation blend rate per second
    pub rotation_lerp: f32,
    /// Radius of the wall check around the carried object
    pub collision_radius: f32,
}

impl Default for CarryConfig {
    fn default() -> Self {
        Self {
            hold_offset: Vec3::new(0.0, 0.5, 1.0),
            position_lerp: 12.0,
            rotation_lerp: 12.0,
            collision_radius: 0.5,
        }
    }
}

/// Configuration of a whole session
///
/// # Example
///
/// ```
/// use duet_session::SessionConfig;
///
/// let config = SessionConfig::from_ron_str("(tick_rate: (hz: 30))").unwrap();
/// assert_eq!(config.tick_rate.hz, 30);
/// assert_eq!(config.carry.position_lerp, 12.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub tick_rate: TickRate,
    /// Upper bound on ticks run for one rendered frame
    pub max_steps_per_frame: u32,
    pub locomotion: LocomotionConfig,
    pub carry: CarryConfig,
    pub network: NetworkConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate: TickRate::default(),
            max_steps_per_frame: 8,
            locomotion: LocomotionConfig::default(),
            carry: CarryConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Parse and validate a RON document
    pub fn from_ron_str(content: &str) -> Result<Self> {
        let config: SessionConfig = ron::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a RON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        tracing::debug!(path = %path.display(), "loading session config");
        Self::from_ron_str(&content)
    }

    /// Pretty-printed RON
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|err| Error::InvalidConfig(err.to_string()))
    }

    /// Check every section
    pub fn validate(&self) -> Result<()> {
        if self.tick_rate.hz == 0 {
            return Err(Error::InvalidConfig("tick_rate.hz must be positive".into()));
        }
        if self.max_steps_per_frame == 0 {
            return Err(Error::InvalidConfig(
                "max_steps_per_frame must be positive".into(),
            ));
        }
        self.locomotion
            .validate()
            .map_err(|msg| Error::InvalidConfig(format!("locomotion: {msg}")))?;

        let carry = &self.carry;
        if !(carry.position_lerp > 0.0 && carry.rotation_lerp > 0.0) {
            return Err(Error::InvalidConfig(
                "carry: lerp rates must be positive".into(),
            ));
        }
        if !(carry.collision_radius >= 0.0) {
            return Err(Error::InvalidConfig(
                "carry: collision_radius must not be negative".into(),
            ));
        }

        let network = &self.network;
        if network.min_latency_ticks > network.max_latency_ticks {
            return Err(Error::InvalidConfig(format!(
                "network: min_latency_ticks {} exceeds max_latency_ticks {}",
                network.min_latency_ticks, network.max_latency_ticks
            )));
        }
        Ok(())
    }
}
