//! Decision engine
//!
//! Turns coverage features into actions: phase tracking, fixed search
//! sweeps, rule tables, the model-driven policy and the shelter builder.

pub mod llm;
pub mod phase;
pub mod policy;
pub mod schedule;
pub mod shelter;

pub use llm::{LlmError, LlmPolicy, OllamaClient, TextGenerator};
pub use phase::{EpisodePhase, PhaseThresholds};
pub use policy::{ExplorePolicy, Observation, Policy, RulePolicy, RuleProfile};
pub use schedule::SearchSchedule;
pub use shelter::{ShelterPhase, ShelterPolicy};
