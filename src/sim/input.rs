//! Abstract action-state input.
//!
//! The core only ever sees eight logical actions as held/pressed/released
//! booleans; keyboard, gamepad and touch mapping happen outside the crate.
//! Actions are packed into a byte pair (current + previous frame) so edge
//! detection needs no per-action bookkeeping.

use serde::{Deserialize, Serialize};

/// Logical action bit positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Left,
    Right,
    Down,
    Jump,
    Run,
    Throw,
    Pause,
    Start,
}

impl Action {
    const fn bit(self) -> u8 {
        match self {
            Action::Left => 1 << 0,
            Action::Right => 1 << 1,
            Action::Down => 1 << 2,
            Action::Jump => 1 << 3,
            Action::Run => 1 << 4,
            Action::Throw => 1 << 5,
            Action::Pause => 1 << 6,
            Action::Start => 1 << 7,
        }
    }
}

/// Action state for one frame, with the previous frame retained for edge
/// queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputFrame {
    bits: u8,
    prev: u8,
}

impl InputFrame {
    pub const fn new() -> Self {
        Self { bits: 0, prev: 0 }
    }

    /// Advance to the next frame's action bits, retiring the current ones.
    pub fn step(&mut self, bits: u8) {
        self.prev = self.bits;
        self.bits = bits;
    }

    /// Set or clear a single action on the current frame.
    pub fn set(&mut self, action: Action, held: bool) {
        if held {
            self.bits |= action.bit();
        } else {
            self.bits &= !action.bit();
        }
    }

    /// Build the raw bits for a frame from individual action flags.
    pub fn pack(actions: &[Action]) -> u8 {
        actions.iter().fold(0, |bits, a| bits | a.bit())
    }

    #[inline]
    pub const fn is_down(&self, action: Action) -> bool {
        self.bits & action.bit() != 0
    }

    /// Edge-triggered: down this frame, up the previous frame.
    #[inline]
    pub const fn pressed(&self, action: Action) -> bool {
        self.bits & action.bit() != 0 && self.prev & action.bit() == 0
    }

    /// Edge-triggered: up this frame, down the previous frame.
    #[inline]
    pub const fn released(&self, action: Action) -> bool {
        self.bits & action.bit() == 0 && self.prev & action.bit() != 0
    }

    /// Horizontal axis as -1, 0 or 1; opposite holds cancel out.
    pub const fn horizontal(&self) -> f32 {
        match (self.is_down(Action::Left), self.is_down(Action::Right)) {
            (true, false) => -1.0,
            (false, true) => 1.0,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn held_and_edges() {
        let mut input = InputFrame::new();
        input.step(InputFrame::pack(&[Action::Jump]));
        assert!(input.is_down(Action::Jump));
        assert!(input.pressed(Action::Jump));
        assert!(!input.released(Action::Jump));

        // Held into the next frame: no longer an edge
        input.step(InputFrame::pack(&[Action::Jump]));
        assert!(input.is_down(Action::Jump));
        assert!(!input.pressed(Action::Jump));

        input.step(0);
        assert!(!input.is_down(Action::Jump));
        assert!(input.released(Action::Jump));
    }

    #[test]
    fn horizontal_axis_cancels() {
        let mut input = InputFrame::new();
        assert_eq!(input.horizontal(), 0.0);
        input.step(InputFrame::pack(&[Action::Left]));
        assert_eq!(input.horizontal(), -1.0);
        input.step(InputFrame::pack(&[Action::Left, Action::Right]));
        assert_eq!(input.horizontal(), 0.0);
        input.step(InputFrame::pack(&[Action::Right]));
        assert_eq!(input.horizontal(), 1.0);
    }

    #[test]
    fn set_individual_action() {
        let mut input = InputFrame::new();
        input.step(0);
        input.set(Action::Throw, true);
        assert!(input.is_down(Action::Throw));
        assert!(input.pressed(Action::Throw));
        input.set(Action::Throw, false);
        assert!(!input.is_down(Action::Throw));
    }
}
