//! Per-tick input sampled for an actor

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Input consumed by one fixed tick of an actor's locomotion
///
/// `move_axis.x` is strafe (right positive), `move_axis.y` is forward.
/// Buttons are edge-triggered: true means "pressed since the previous tick".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InputFrame {
    pub move_axis: Vec2,
    pub jump: bool,
    pub interact: bool,
    pub release: bool,
}

impl InputFrame {
    /// No movement, no buttons
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Set the movement axis
    pub fn with_move(mut self, x: f32, y: f32) -> Self {
        self.move_axis = Vec2::new(x, y);
        self
    }

    /// Press jump
    pub fn with_jump(mut self) -> Self {
        self.jump = true;
        self
    }

    /// Press interact
    pub fn with_interact(mut self) -> Self {
        self.interact = true;
        self
    }

    /// Press release
    pub fn with_release(mut self) -> Self {
        self.release = true;
        self
    }

    /// Whether any button is pressed
    pub fn has_buttons(&self) -> bool {
        self.jump || self.interact || self.release
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builders() {
        let frame = InputFrame::neutral().with_move(1.0, 0.0).with_jump();
        assert_eq!(frame.move_axis, Vec2::X);
        assert!(frame.jump);
        assert!(!frame.interact);
        assert!(frame.has_buttons());
        assert!(!InputFrame::neutral().has_buttons());
    }
}
