//! Input sources
//!
//! A session samples one [`InputFrame`] per display frame for every actor a
//! peer drives. Closures `FnMut(EntityId, Tick) -> InputFrame` work as
//! sources too.

use duet_core::{EntityId, InputFrame, Tick};
use std::ops::Range;

/// Where actor input comes from
pub trait InputSource {
    /// Input for `actor` on the frame leading up to `tick`
    fn sample(&mut self, actor: EntityId, tick: Tick) -> InputFrame;
}

impl<F> InputSource for F
where
    F: FnMut(EntityId, Tick) -> InputFrame,
{
    fn sample(&mut self, actor: EntityId, tick: Tick) -> InputFrame {
        self(actor, tick)
    }
}

/// No input, ever
#[derive(Debug, Clone, Copy, Default)]
pub struct NeutralInput;

impl InputSource for NeutralInput {
    fn sample(&mut self, _actor: EntityId, _tick: Tick) -> InputFrame {
        InputFrame::neutral()
    }
}

#[derive(Debug, Clone)]
struct Hold {
    actor: EntityId,
    ticks: Range<Tick>,
    frame: InputFrame,
}

/// Fixed input script, for tests and demos
///
/// # Example
///
/// ```
/// use duet_core::{EntityId, InputFrame};
/// use duet_session::{InputSource, ScriptedInput};
///
/// let actor = EntityId::new(1);
/// let mut script = ScriptedInput::new()
///     .hold(actor, 1..2, InputFrame::neutral().with_interact())
///     .hold(actor, 2..60, InputFrame::neutral().with_move(0.0, 1.0));
///
/// assert!(script.sample(actor, 1).interact);
/// assert_eq!(script.sample(actor, 30).move_axis.y, 1.0);
/// assert_eq!(script.sample(actor, 60), InputFrame::neutral());
/// ```
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    holds: Vec<Hold>,
}

impl ScriptedInput {
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `actor` the input `frame` on every tick in `ticks`
    ///
    /// Earlier holds win where ranges overlap.
    pub fn hold(mut self, actor: EntityId, ticks: Range<Tick>, frame: InputFrame) -> Self {
        self.holds.push(Hold { actor, ticks, frame });
        self
    }
}

impl InputSource for ScriptedInput {
    fn sample(&mut self, actor: EntityId, tick: Tick) -> InputFrame {
        self.holds
            .iter()
            .find(|hold| hold.actor == actor && hold.ticks.contains(&tick))
            .map_or_else(InputFrame::neutral, |hold| hold.frame)
    }
}
