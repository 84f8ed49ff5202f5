//! Input latching between display frames and fixed ticks
//!
//! Devices are polled once per display frame, but locomotion consumes input
//! once per fixed tick. A press that happens on a frame with no tick must not
//! be lost, and a press must not be seen by two ticks. The buffer ORs button
//! presses until a tick takes them, while the movement axis is simply the
//! latest value.

use duet_core::InputFrame;

/// Latch for one actor's input
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    /// Input accumulated since the last tick
    latched: InputFrame,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one display frame's input
    pub fn record(&mut self, frame: InputFrame) {
        self.latched.move_axis = frame.move_axis;
        self.latched.jump |= frame.jump;
        self.latched.interact |= frame.interact;
        self.latched.release |= frame.release;
    }

    /// Consume the latched input for the next tick
    ///
    /// Buttons are cleared; the movement axis stays until the next record.
    pub fn take(&mut self) -> InputFrame {
        let frame = self.latched;
        self.latched.jump = false;
        self.latched.interact = false;
        self.latched.release = false;
        frame
    }
}
