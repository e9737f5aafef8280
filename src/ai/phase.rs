//! Episode phase tracking
//!
//! Decides whether the agent is still searching for its target, steering
//! toward a faint sighting, or closing in on a strong one.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Coarse phase of an episode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EpisodePhase {
    /// Nothing seen yet, sweep the surroundings
    Search,
    /// Target visible, steer toward it
    Navigate,
    /// Target prominent, move straight in
    Approach,
}

impl fmt::Display for EpisodePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            EpisodePhase::Search => "SEARCH",
            EpisodePhase::Navigate => "NAVIGATE",
            EpisodePhase::Approach => "APPROACH",
        })
    }
}

/// Coverage thresholds that separate the phases
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhaseThresholds {
    /// Below this the target counts as not visible
    pub low: f64,
    /// Above this the target counts as prominent
    pub high: f64,
    /// Steps after which a blind search gives way to navigation
    pub search_budget: u32,
}

impl Default for PhaseThresholds {
    fn default() -> Self {
        Self {
            low: 0.005,
            high: 0.08,
            search_budget: 80,
        }
    }
}

impl PhaseThresholds {
    pub fn new(low: f64, high: f64, search_budget: u32) -> Self {
        Self {
            low,
            high,
            search_budget,
        }
    }

    /// Phase for the current tick
    ///
    /// Recomputed from scratch every tick. Once `max_seen` passes `high` the
    /// result stays APPROACH for the rest of the episode.
    pub fn determine_phase(&self, coverage: f64, step: u32, max_seen: f64) -> EpisodePhase {
        if coverage < self.low && max_seen < 2.0 * self.low && step < self.search_budget {
            EpisodePhase::Search
        } else if coverage > self.high || max_seen > self.high {
            EpisodePhase::Approach
        } else {
            EpisodePhase::Navigate
        }
    }
}
