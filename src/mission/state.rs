//! Per-episode bookkeeping
//!
//! Tracks everything the driver needs between ticks. Owned by one episode
//! and never persisted.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::ai::EpisodePhase;
use crate::control::Action;

/// Number of actions kept in the history ring
pub const HISTORY_CAPACITY: usize = 50;

/// Terminal outcome of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Success,
    PartialSuccess,
    Failure,
}

impl Verdict {
    /// Verdict for an episode that ran out of steps
    pub fn from_max_coverage(max_coverage: f64, success: f64, partial: f64) -> Self {
        if max_coverage > success {
            Verdict::Success
        } else if max_coverage > partial {
            Verdict::PartialSuccess
        } else {
            Verdict::Failure
        }
    }

    pub fn is_failure(&self) -> bool {
        *self == Verdict::Failure
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Success => "SUCCESS",
            Verdict::PartialSuccess => "PARTIAL_SUCCESS",
            Verdict::Failure => "FAILURE",
        })
    }
}

/// Mutable state of a running episode
#[derive(Debug, Clone)]
pub struct EpisodeState {
    /// Index of the current tick
    pub step: u32,
    /// Highest target coverage seen so far
    pub max_coverage: f64,
    /// Phase computed on the latest tick
    pub phase: EpisodePhase,
    history: VecDeque<Action>,
    /// Actions performed, including ones evicted from the history
    pub actions_taken: u32,
    /// Tick of the first detection
    pub first_detection: Option<u32>,
    /// Ticks skipped because capture failed
    pub skipped_ticks: u32,
    /// Actions the actuator could not deliver
    pub failed_actions: u32,
    pub verdict: Option<Verdict>,
}

impl Default for EpisodeState {
    fn default() -> Self {
        Self {
            step: 0,
            max_coverage: 0.0,
            phase: EpisodePhase::Search,
            history: VecDeque::with_capacity(HISTORY_CAPACITY),
            actions_taken: 0,
            first_detection: None,
            skipped_ticks: 0,
            failed_actions: 0,
            verdict: None,
        }
    }
}

impl EpisodeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold a new coverage reading into the running maximum
    pub fn observe(&mut self, coverage: f64) {
        self.max_coverage = self.max_coverage.max(coverage);
    }

    /// Record an action handed to the actuator
    pub fn record_action(&mut self, action: Action, performed: bool) {
        if self.history.len() == HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(action);
        self.actions_taken += 1;
        if !performed {
            self.failed_actions += 1;
        }
    }

    /// The last `n` actions, oldest first
    pub fn recent(&self, n: usize) -> Vec<Action> {
        let skip = self.history.len().saturating_sub(n);
        self.history.iter().skip(skip).copied().collect()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn last_action(&self) -> Option<Action> {
        self.history.back().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_history_is_bounded() {
        let mut state = EpisodeState::new();
        for i in 0..(HISTORY_CAPACITY + 10) {
            let action = if i % 2 == 0 { Action::Jump } else { Action::Wait };
            state.record_action(action, true);
        }
        assert_eq!(state.history_len(), HISTORY_CAPACITY);
        assert_eq!(state.actions_taken, 60);
        assert_eq!(state.last_action(), Some(Action::Wait));
    }

    #[test]
    fn test_recent_is_oldest_first() {
        let mut state = EpisodeState::new();
        state.record_action(Action::LookLeft, true);
        state.record_action(Action::MoveForward, false);
        state.record_action(Action::Mine, true);

        assert_eq!(state.recent(2), vec![Action::MoveForward, Action::Mine]);
        assert_eq!(state.recent(10).len(), 3);
        assert_eq!(state.failed_actions, 1);
    }

    #[test]
    fn test_max_coverage_is_monotonic() {
        let mut state = EpisodeState::new();
        for c in [0.01, 0.2, 0.05] {
            state.observe(c);
        }
        assert_eq!(state.max_coverage, 0.2);
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(Verdict::from_max_coverage(0.16, 0.15, 0.01), Verdict::Success);
        assert_eq!(Verdict::from_max_coverage(0.15, 0.15, 0.01), Verdict::PartialSuccess);
        assert_eq!(Verdict::from_max_coverage(0.01, 0.15, 0.01), Verdict::Failure);
    }
}
