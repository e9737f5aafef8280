//! Shelter-building rules
//!
//! Works from the terrain palette: gather wood, then dirt, then start
//! placing blocks. Resource counts are estimates; the agent has no
//! inventory view.

use std::fmt;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::policy::{Observation, Policy};
use crate::control::Action;

/// Wood estimate added per mining action on wood
const WOOD_PER_MINE: f64 = 0.5;
/// Dirt estimate added per mining action on dirt
const DIRT_PER_MINE: f64 = 0.3;
/// Ticks without progress before the agent moves on
const STUCK_LIMIT: u32 = 8;

/// Current step of the building plan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShelterPhase {
    GatheringWood,
    GatheringDirt,
    Building,
}

impl fmt::Display for ShelterPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ShelterPhase::GatheringWood => "gathering_wood",
            ShelterPhase::GatheringDirt => "gathering_dirt",
            ShelterPhase::Building => "building",
        })
    }
}

/// Rule agent that gathers materials and builds
pub struct ShelterPolicy<R: Rng = StdRng> {
    rng: R,
    phase: ShelterPhase,
    /// Estimated wood collected
    wood: f64,
    /// Estimated dirt collected
    dirt: f64,
    target_wood: f64,
    target_dirt: f64,
    /// Consecutive ticks without new wood
    mining_attempts: u32,
    last_wood: f64,
}

impl ShelterPolicy<StdRng> {
    pub fn new() -> Self {
        Self::with_rng(StdRng::from_os_rng())
    }

    /// Deterministic policy for tests and replays
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed))
    }
}

impl Default for ShelterPolicy<StdRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> ShelterPolicy<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            rng,
            phase: ShelterPhase::GatheringWood,
            wood: 0.0,
            dirt: 0.0,
            target_wood: 15.0,
            target_dirt: 20.0,
            mining_attempts: 0,
            last_wood: 0.0,
        }
    }

    pub fn with_targets(mut self, wood: f64, dirt: f64) -> Self {
        self.target_wood = wood;
        self.target_dirt = dirt;
        self
    }

    pub fn phase(&self) -> ShelterPhase {
        self.phase
    }

    pub fn wood(&self) -> f64 {
        self.wood
    }

    pub fn dirt(&self) -> f64 {
        self.dirt
    }

    fn advance_phase(&mut self) {
        let next = match self.phase {
            ShelterPhase::GatheringWood if self.wood >= self.target_wood => {
                ShelterPhase::GatheringDirt
            }
            ShelterPhase::GatheringDirt if self.dirt >= self.target_dirt => ShelterPhase::Building,
            phase => phase,
        };
        if next != self.phase {
            log::info!("Shelter phase: {} -> {}", self.phase, next);
            self.phase = next;
        }
    }

    /// Move forward with probability `p`, otherwise look around
    fn forward_or_look(&mut self, p: f64) -> Action {
        if self.rng.random_bool(p) {
            Action::MoveForward
        } else {
            Action::LookRight
        }
    }

    fn gather_wood(&mut self, observation: &Observation<'_>) -> Action {
        if self.wood == self.last_wood {
            self.mining_attempts += 1;
        } else {
            self.mining_attempts = 0;
            self.last_wood = self.wood;
        }

        if self.mining_attempts > STUCK_LIMIT {
            self.mining_attempts = 0;
            log::debug!("No wood progress, moving on");
            return self.forward_or_look(0.7);
        }

        if observation.global("wood") > 0.02 || observation.global("leaves") > 0.08 {
            self.wood += WOOD_PER_MINE;
            Action::Mine
        } else if observation.global("grass") > 0.1 {
            self.forward_or_look(0.6)
        } else {
            self.forward_or_look(0.7)
        }
    }

    fn gather_dirt(&mut self, observation: &Observation<'_>) -> Action {
        if observation.global("dirt") > 0.03 {
            self.dirt += DIRT_PER_MINE;
            Action::Mine
        } else if observation.global("grass") > 0.15 {
            // dig through the grass layer
            Action::Mine
        } else if self.rng.random_bool(0.5) {
            Action::LookDown
        } else {
            Action::MoveForward
        }
    }
}

impl<R: Rng> Policy for ShelterPolicy<R> {
    fn name(&self) -> &str {
        "shelter"
    }

    fn select_action(&mut self, observation: &Observation<'_>) -> Action {
        self.advance_phase();
        let action = match self.phase {
            ShelterPhase::GatheringWood => self.gather_wood(observation),
            ShelterPhase::GatheringDirt => self.gather_dirt(observation),
            ShelterPhase::Building => Action::Place,
        };
        log::debug!(
            "Phase: {} | Wood: {:.1}/{} | Dirt: {:.1}/{} | Action: {}",
            self.phase,
            self.wood,
            self.target_wood,
            self.dirt,
            self.target_dirt,
            action
        );
        action
    }
}
