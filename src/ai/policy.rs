//! Action policies
//!
//! A [`Policy`] maps what the agent currently sees to one [`Action`]. The
//! rule tables here are deterministic; see `llm` and `shelter` for the
//! model-driven and randomized ones.

use serde::{Deserialize, Serialize};

use super::phase::EpisodePhase;
use super::schedule::SearchSchedule;
use crate::control::Action;
use crate::vision::{CoverageReport, RegionCoverage};

/// Everything a policy may look at on one tick
#[derive(Debug, Clone, Copy)]
pub struct Observation<'a> {
    pub coverage: &'a CoverageReport,
    /// Category the episode is after
    pub target: &'a str,
    pub phase: EpisodePhase,
    pub step: u32,
    /// Recent actions, oldest first
    pub recent: &'a [Action],
}

impl<'a> Observation<'a> {
    /// Coverage of the target category, zero if the palette lacks it
    pub fn target_coverage(&self) -> RegionCoverage {
        self.coverage.get(self.target).copied().unwrap_or_default()
    }

    /// Global coverage of any category
    pub fn global(&self, category: &str) -> f64 {
        self.coverage.global(category)
    }
}

/// Chooses the next action
pub trait Policy {
    /// Short name for logs
    fn name(&self) -> &str;

    fn select_action(&mut self, observation: &Observation<'_>) -> Action;
}

/// Tuning of a [`RulePolicy`]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RuleProfile {
    /// Sweep used while searching
    pub schedule: SearchSchedule,
    /// Steering happens during the first `steer_burst` steps of every
    /// `steer_period`
    pub steer_period: u32,
    pub steer_burst: u32,
    /// A side must exceed this before the agent strafes toward it
    pub min_side_coverage: f64,
    /// Look down now and then while approaching
    pub probe_down: bool,
    /// Coverage above which the target is prominent
    pub high: f64,
}

impl RuleProfile {
    /// Long-range water search
    pub fn long_range_water() -> Self {
        Self {
            schedule: SearchSchedule::Sweep24,
            steer_period: 8,
            steer_burst: 2,
            min_side_coverage: 0.01,
            probe_down: false,
            high: 0.08,
        }
    }

    /// Compact water search
    pub fn compact_water() -> Self {
        Self {
            schedule: SearchSchedule::Sweep20,
            steer_period: 6,
            probe_down: true,
            ..Self::long_range_water()
        }
    }

    pub fn trees() -> Self {
        Self {
            schedule: SearchSchedule::Sweep12,
            ..Self::long_range_water()
        }
    }
}

impl Default for RuleProfile {
    fn default() -> Self {
        Self::long_range_water()
    }
}

/// Deterministic phase-driven rules
#[derive(Debug, Clone)]
pub struct RulePolicy {
    profile: RuleProfile,
}

impl RulePolicy {
    pub fn new(profile: RuleProfile) -> Self {
        Self { profile }
    }

    pub fn profile(&self) -> &RuleProfile {
        &self.profile
    }

    fn navigate(&self, target: &RegionCoverage, step: u32) -> Action {
        let (left, center, right) = (target.left(), target.center(), target.right());

        // Center wins ties, and so does a left/right tie
        if (center >= left && center >= right) || left == right {
            return Action::MoveForward;
        }

        let (side, toward) = if left > right {
            (left, Action::StrafeLeft)
        } else {
            (right, Action::StrafeRight)
        };

        if side > self.profile.min_side_coverage
            && step % self.profile.steer_period.max(1) < self.profile.steer_burst
        {
            toward
        } else {
            Action::MoveForward
        }
    }

    fn approach(&self, target: &RegionCoverage, step: u32) -> Action {
        if self.profile.probe_down
            && step % 4 == 0
            && target.global() <= self.profile.high
            && target.bottom() > 1.5 * target.middle()
        {
            Action::LookDown
        } else {
            Action::MoveForward
        }
    }
}

impl Policy for RulePolicy {
    fn name(&self) -> &str {
        "rules"
    }

    fn select_action(&mut self, observation: &Observation<'_>) -> Action {
        let target = observation.target_coverage();
        match observation.phase {
            EpisodePhase::Search => self.profile.schedule.action_at(observation.step),
            EpisodePhase::Navigate => self.navigate(&target, observation.step),
            EpisodePhase::Approach => self.approach(&target, observation.step),
        }
    }
}

/// Walks a search schedule regardless of what is seen
#[derive(Debug, Clone)]
pub struct ExplorePolicy {
    schedule: SearchSchedule,
}

impl ExplorePolicy {
    pub fn new(schedule: SearchSchedule) -> Self {
        Self { schedule }
    }
}

impl Default for ExplorePolicy {
    fn default() -> Self {
        Self::new(SearchSchedule::Sweep16)
    }
}

impl Policy for ExplorePolicy {
    fn name(&self) -> &str {
        "explore"
    }

    fn select_action(&mut self, observation: &Observation<'_>) -> Action {
        self.schedule.action_at(observation.step)
    }
}
