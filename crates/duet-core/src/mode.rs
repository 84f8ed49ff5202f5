//! Replicated locomotion mode tag
//!
//! The full locomotion state (timers, ledge holds) lives only on the
//! simulating peer. Observers only need to know which mode an actor is in, so
//! the tag is replicated as an integer code.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Discriminant of a locomotion mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ModeTag {
    #[default]
    Grounded,
    Falling,
    Landing,
    Jumping,
    /// Intra-tick ledge probing; never observed at a tick boundary
    LedgeScan,
    LedgeGrabbed,
    LedgeTraversing,
    Climbing,
    Interacting,
}

impl ModeTag {
    /// All tags, in code order
    pub const ALL: [ModeTag; 9] = [
        ModeTag::Grounded,
        ModeTag::Falling,
        ModeTag::Landing,
        ModeTag::Jumping,
        ModeTag::LedgeScan,
        ModeTag::LedgeGrabbed,
        ModeTag::LedgeTraversing,
        ModeTag::Climbing,
        ModeTag::Interacting,
    ];

    /// Integer code used in replicated fields
    pub fn as_code(self) -> i64 {
        self as i64
    }

    /// Decode a replicated integer code
    pub fn from_code(code: i64) -> Option<ModeTag> {
        usize::try_from(code)
            .ok()
            .and_then(|i| Self::ALL.get(i).copied())
    }

    /// Whether the actor is off the ground under gravity
    pub fn is_airborne(self) -> bool {
        matches!(self, ModeTag::Falling | ModeTag::Jumping)
    }

    /// Whether the physical controller is disabled in this mode
    pub fn is_locked(self) -> bool {
        matches!(
            self,
            ModeTag::LedgeGrabbed | ModeTag::LedgeTraversing | ModeTag::Climbing
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            ModeTag::Grounded => "grounded",
            ModeTag::Falling => "falling",
            ModeTag::Landing => "landing",
            ModeTag::Jumping => "jumping",
            ModeTag::LedgeScan => "ledge_scan",
            ModeTag::LedgeGrabbed => "ledge_grabbed",
            ModeTag::LedgeTraversing => "ledge_traversing",
            ModeTag::Climbing => "climbing",
            ModeTag::Interacting => "interacting",
        }
    }
}

impl fmt::Display for ModeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
