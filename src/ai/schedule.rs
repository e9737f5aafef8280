//! Fixed search sweeps
//!
//! While nothing is in view the agent walks a periodic schedule of looks and
//! moves. Each schedule is a list of `(action, repeat)` segments.

use serde::{Deserialize, Serialize};

use crate::control::Action::{
    self, LookDown, LookLeft, LookRight, LookUp, MoveForward, StrafeLeft, StrafeRight,
};

const SWEEP_24: &[(Action, u32)] = &[
    (LookLeft, 3),
    (LookRight, 3),
    (LookUp, 1),
    (LookDown, 1),
    (MoveForward, 7),
    (StrafeLeft, 3),
    (StrafeRight, 6),
];

const SWEEP_20: &[(Action, u32)] = &[
    (LookLeft, 4),
    (LookRight, 4),
    (LookUp, 1),
    (LookDown, 1),
    (MoveForward, 5),
    (StrafeLeft, 2),
    (StrafeRight, 3),
];

const SWEEP_12: &[(Action, u32)] = &[
    (LookLeft, 2),
    (LookRight, 2),
    (MoveForward, 4),
    (StrafeLeft, 2),
    (StrafeRight, 2),
];

const SWEEP_16: &[(Action, u32)] = &[
    (LookLeft, 2),
    (LookRight, 2),
    (MoveForward, 6),
    (StrafeLeft, 2),
    (StrafeRight, 4),
];

/// Periodic search schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchSchedule {
    /// Long-range water search
    Sweep24,
    /// Compact water search
    Sweep20,
    /// Tree search
    Sweep12,
    /// Free exploration
    Sweep16,
}

impl SearchSchedule {
    fn segments(self) -> &'static [(Action, u32)] {
        match self {
            SearchSchedule::Sweep24 => SWEEP_24,
            SearchSchedule::Sweep20 => SWEEP_20,
            SearchSchedule::Sweep12 => SWEEP_12,
            SearchSchedule::Sweep16 => SWEEP_16,
        }
    }

    /// Length of one period in steps
    pub fn cycle(self) -> u32 {
        self.segments().iter().map(|(_, n)| n).sum()
    }

    /// Action for `step`, wrapping around the period
    pub fn action_at(self, step: u32) -> Action {
        let mut pos = step % self.cycle();
        for &(action, repeat) in self.segments() {
            if pos < repeat {
                return action;
            }
            pos -= repeat;
        }
        MoveForward
    }
}
