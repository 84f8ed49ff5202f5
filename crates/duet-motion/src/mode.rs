//! Locomotion modes and the timers attached to them
//!
//! Each variant carries exactly the elapsed-time counters it needs, so leaving
//! a mode drops its timers with it. Cross-mode timers (cooldowns that outlive
//! the mode that started them) live in [`Guards`].

use duet_core::{EntityId, ModeTag};
use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// State of an actor hanging from a ledge
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LedgeHold {
    /// Rotation facing the wall, held for the whole grab
    pub rotation: Quat,
    /// Seconds since the grab started
    pub held_for: f32,
    /// Seconds since a climb was requested, while waiting for confirmation
    pub climb_pending: Option<f32>,
}

impl LedgeHold {
    pub fn new(rotation: Quat) -> Self {
        Self {
            rotation,
            held_for: 0.0,
            climb_pending: None,
        }
    }
}

/// Progress of a climb-up
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Climb {
    pub start: Vec3,
    /// Horizontal direction toward the top of the ledge
    pub forward: Vec3,
    pub elapsed: f32,
}

/// World axis an interacting actor is restricted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    X,
    Z,
}

impl Axis {
    pub fn unit(self) -> Vec3 {
        match self {
            Axis::X => Vec3::X,
            Axis::Z => Vec3::Z,
        }
    }
}

/// State of an actor pushing or carrying an object
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub target: EntityId,
    /// Axis locked by the first push; `None` until input leaves neutral
    pub axis: Option<Axis>,
    /// Rotation frozen at the start of the interaction
    pub rotation: Quat,
}

/// Current locomotion mode
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Grounded,
    Falling,
    Landing {
        elapsed: f32,
    },
    Jumping,
    LedgeGrabbed(LedgeHold),
    LedgeTraversing(LedgeHold),
    Climbing(Climb),
    Interacting(Interaction),
}

impl Mode {
    /// The replicated tag of this mode
    pub fn tag(&self) -> ModeTag {
        match self {
            Mode::Grounded => ModeTag::Grounded,
            Mode::Falling => ModeTag::Falling,
            Mode::Landing { .. } => ModeTag::Landing,
            Mode::Jumping => ModeTag::Jumping,
            Mode::LedgeGrabbed(_) => ModeTag::LedgeGrabbed,
            Mode::LedgeTraversing(_) => ModeTag::LedgeTraversing,
            Mode::Climbing(_) => ModeTag::Climbing,
            Mode::Interacting(_) => ModeTag::Interacting,
        }
    }

    /// The ledge hold, if hanging
    pub fn ledge_hold(&self) -> Option<&LedgeHold> {
        match self {
            Mode::LedgeGrabbed(hold) | Mode::LedgeTraversing(hold) => Some(hold),
            _ => None,
        }
    }

    /// The interaction, if interacting
    pub fn interaction(&self) -> Option<&Interaction> {
        match self {
            Mode::Interacting(interaction) => Some(interaction),
            _ => None,
        }
    }
}

/// Cooldowns that survive mode changes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Guards {
    /// Seconds until ledge scanning resumes
    pub grab_cooldown: f32,
    /// Seconds until another climb may be requested
    pub climb_jump_cooldown: f32,
}

impl Guards {
    /// Count all cooldowns down by `dt`
    pub fn tick(&mut self, dt: f32) {
        self.grab_cooldown = (self.grab_cooldown - dt).max(0.0);
        self.climb_jump_cooldown = (self.climb_jump_cooldown - dt).max(0.0);
    }

    pub fn can_grab(&self) -> bool {
        self.grab_cooldown <= 0.0
    }

    pub fn can_climb(&self) -> bool {
        self.climb_jump_cooldown <= 0.0
    }
}
