//! Locomotion tuning
//!
//! Defaults reproduce the tuning the game shipped with. Distances are in
//! metres, speeds in metres per second, durations in seconds.

use crate::physics::LayerMask;
use serde::{Deserialize, Serialize};

/// Tuning of an actor's locomotion state machine
///
/// # Example
///
/// ```
/// use duet_motion::LocomotionConfig;
///
/// let config = LocomotionConfig::default();
/// assert_eq!(config.ray_amount, 5);
/// assert!(config.validate().is_ok());
///
/// let no_ledges = LocomotionConfig::default().without_ledges();
/// assert!(no_ledges.ledge_layer.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    // Ground motion
    pub move_speed: f32,
    pub jump_force: f32,
    pub gravity: f32,
    /// Vertical velocity kept while grounded so the body stays in contact
    pub ground_stick_velocity: f32,
    /// Falling starts once vertical velocity drops below this
    pub fall_velocity_threshold: f32,
    pub land_lock_duration: f32,
    /// Axis magnitude below which input counts as neutral
    pub dead_zone: f32,

    // Ledge detection; `None` disables ledge grabbing
    pub ledge_layer: Option<LayerMask>,
    pub ray_amount: u32,
    pub ray_height: f32,
    pub ray_offset: f32,
    pub ray_length: f32,
    pub grab_height_offset: f32,
    pub grab_forward_offset: f32,
    pub grab_cooldown: f32,

    // Ledge traversal
    pub ledge_move_speed: f32,
    pub lateral_ray_length: f32,
    pub lateral_ray_offset: f32,
    pub ledge_continuity_lateral_offset: f32,

    // Climb
    pub grab_jump_input_delay: f32,
    pub climb_confirm_delay: f32,
    pub climb_jump_cooldown: f32,
    pub climb_height: f32,
    pub climb_forward: f32,
    pub climb_duration: f32,
    pub release_pushback: f32,

    // Interaction; `None` disables interacting
    pub interact_layer: Option<LayerMask>,
    pub interact_distance: f32,
    pub interact_ray_height: f32,
    pub carry_speed_multiplier: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            move_speed: 5.0,
            jump_force: 10.0,
            gravity: -9.81,
            ground_stick_velocity: -1.0,
            fall_velocity_threshold: -1.0,
            land_lock_duration: 0.4,
            dead_zone: 0.1,

            ledge_layer: Some(LayerMask::LEDGE),
            ray_amount: 5,
            ray_height: 1.5,
            ray_offset: 0.15,
            ray_length: 0.8,
            grab_height_offset: 0.1,
            grab_forward_offset: 0.25,
            grab_cooldown: 0.45,

            ledge_move_speed: 2.0,
            lateral_ray_length: 0.5,
            lateral_ray_offset: 0.1,
            ledge_continuity_lateral_offset: 0.25,

            grab_jump_input_delay: 0.3,
            climb_confirm_delay: 0.25,
            climb_jump_cooldown: 0.5,
            climb_height: 1.5,
            climb_forward: 0.5,
            climb_duration: 1.0 / 3.0,
            release_pushback: 0.1,

            interact_layer: Some(LayerMask::INTERACT | LayerMask::CARRYABLE),
            interact_distance: 3.0,
            interact_ray_height: 0.5,
            carry_speed_multiplier: 0.6,
        }
    }
}

impl LocomotionConfig {
    /// Disable ledge grabbing
    pub fn without_ledges(mut self) -> Self {
        self.ledge_layer = None;
        self
    }

    /// Disable interacting
    pub fn without_interaction(mut self) -> Self {
        self.interact_layer = None;
        self
    }

    /// Check the tuning for values the state machine cannot work with
    pub fn validate(&self) -> Result<(), String> {
        let positive = [
            ("move_speed", self.move_speed),
            ("ray_length", self.ray_length),
            ("ledge_move_speed", self.ledge_move_speed),
            ("lateral_ray_length", self.lateral_ray_length),
            ("climb_duration", self.climb_duration),
            ("interact_distance", self.interact_distance),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(format!("{name} must be positive, got {value}"));
            }
        }

        let non_negative = [
            ("land_lock_duration", self.land_lock_duration),
            ("grab_cooldown", self.grab_cooldown),
            ("grab_jump_input_delay", self.grab_jump_input_delay),
            ("climb_confirm_delay", self.climb_confirm_delay),
            ("climb_jump_cooldown", self.climb_jump_cooldown),
            ("dead_zone", self.dead_zone),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(format!("{name} must not be negative, got {value}"));
            }
        }

        if self.gravity >= 0.0 {
            return Err(format!("gravity must point down, got {}", self.gravity));
        }
        if self.fall_velocity_threshold > 0.0 {
            return Err("fall_velocity_threshold must not be positive".to_string());
        }
        if self.ray_amount == 0 && self.ledge_layer.is_some() {
            return Err("ray_amount must be at least 1 when ledges are enabled".to_string());
        }
        if !(0.0..=1.0).contains(&self.carry_speed_multiplier) {
            return Err(format!(
                "carry_speed_multiplier must be within 0..=1, got {}",
                self.carry_speed_multiplier
            ));
        }
        Ok(())
    }
}
