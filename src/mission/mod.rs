//! Missions: episodes, goals and their execution
//!
//! The [`EpisodeDriver`] runs the perception-to-action loop for one target.
//! Goals typed in plain language are parsed by [`GoalParser`] and run by the
//! [`GoalExecutor`], which builds episodes from them.

pub mod cancel;
pub mod driver;
pub mod executor;
pub mod goals;
pub mod parser;
pub mod state;

#[cfg(test)]
pub(crate) mod testing;

pub use cancel::{install_ctrl_c_handler, CancelToken};
pub use driver::{step_budget, EpisodeConfig, EpisodeDriver, EpisodeEvent, EpisodeReport};
pub use executor::{ExecutionResult, ExecutorStatus, GoalExecutor};
pub use goals::{
    Destination, Direction, ExplorePattern, Goal, GoalKind, GoalStatus, Priority, Target,
};
pub use parser::{GoalParser, ParseError};
pub use state::{EpisodeState, Verdict};
