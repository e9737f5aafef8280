//! Goal execution
//!
//! Runs parsed goals against the live vision and input stack. Find goals
//! become search episodes, heading goals are a scripted walk, and explore
//! goals replay the free exploration sweep.

use std::fmt;
use std::thread;
use std::time::{Duration, Instant};

use super::cancel::CancelToken;
use super::driver::{step_budget, EpisodeConfig, EpisodeDriver, EpisodeReport};
use super::goals::{Destination, Direction, Goal, GoalKind, GoalStatus, Target};
use super::parser::GoalParser;
use super::state::Verdict;
use crate::ai::{ExplorePolicy, RulePolicy, RuleProfile};
use crate::control::{Action, Actuator};
use crate::vision::VisionSystem;

/// Step cap of find episodes
pub const FIND_STEP_CAP: u32 = 200;
/// Step cap of explore goals
pub const EXPLORE_STEP_CAP: u32 = 100;
/// Step cap of heading walks
pub const HEADING_STEP_CAP: u32 = 50;
/// Distance walked when a heading goal names none
pub const DEFAULT_HEADING_DISTANCE: u32 = 20;
/// Blocks covered per walking step
const BLOCKS_PER_STEP: u32 = 2;
/// Every n-th walking step corrects the heading
const CORRECTION_STRIDE: u32 = 10;

/// Outcome of one goal
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Description of the goal that ran
    pub goal: String,
    pub success: bool,
    pub message: String,
    pub steps_taken: u32,
    pub status: GoalStatus,
    pub elapsed: Duration,
    /// Episode behind a find or explore goal
    pub report: Option<EpisodeReport>,
}

impl ExecutionResult {
    fn rejected(message: String) -> Self {
        Self {
            goal: String::new(),
            success: false,
            message,
            steps_taken: 0,
            status: GoalStatus::Failed,
            elapsed: Duration::ZERO,
            report: None,
        }
    }
}

/// Summary of what the executor has done so far
#[derive(Debug, Clone, Default)]
pub struct ExecutorStatus {
    pub last_goal: Option<String>,
    pub last_status: Option<GoalStatus>,
    /// Steps taken across all goals
    pub steps_taken: u32,
    /// Best target coverage seen across all goals
    pub max_coverage: f64,
    pub history_count: usize,
    pub last_message: Option<String>,
}

impl fmt::Display for ExecutorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Last goal: {}",
            self.last_goal.as_deref().unwrap_or("none")
        )?;
        if let Some(status) = self.last_status {
            writeln!(f, "Status: {:?}", status)?;
        }
        writeln!(f, "Steps taken: {}", self.steps_taken)?;
        writeln!(f, "Max coverage seen: {:.3}%", self.max_coverage * 100.0)?;
        writeln!(f, "Goals executed: {}", self.history_count)?;
        write!(
            f,
            "Last result: {}",
            self.last_message.as_deref().unwrap_or("none")
        )
    }
}

/// Executes goals, one at a time
pub struct GoalExecutor {
    vision: VisionSystem,
    actuator: Actuator,
    cancel: CancelToken,
    parser: GoalParser,
    /// Thresholds and pacing shared by every episode
    template: EpisodeConfig,
    seconds_per_step: u64,
    history: Vec<ExecutionResult>,
    steps_taken: u32,
    max_coverage: f64,
}

impl GoalExecutor {
    pub fn new(vision: VisionSystem, actuator: Actuator, cancel: CancelToken) -> Self {
        Self {
            vision,
            actuator,
            cancel,
            parser: GoalParser::new(),
            template: EpisodeConfig::new("water"),
            seconds_per_step: 2,
            history: Vec::new(),
            steps_taken: 0,
            max_coverage: 0.0,
        }
    }

    pub fn with_parser(mut self, parser: GoalParser) -> Self {
        self.parser = parser;
        self
    }

    /// Episode settings reused by every goal; target and step budget are
    /// filled in per goal
    pub fn with_template(mut self, template: EpisodeConfig) -> Self {
        self.template = template;
        self
    }

    pub fn with_seconds_per_step(mut self, seconds_per_step: u64) -> Self {
        self.seconds_per_step = seconds_per_step.max(1);
        self
    }

    pub fn vision(&self) -> &VisionSystem {
        &self.vision
    }

    pub fn history(&self) -> &[ExecutionResult] {
        &self.history
    }

    /// Parse a typed command and execute it
    pub fn execute_command(&mut self, command: &str) -> ExecutionResult {
        match self.parser.parse(command) {
            Ok(goal) => self.execute_goal(goal),
            Err(e) => {
                log::warn!("{}", e);
                ExecutionResult::rejected(e.to_string())
            }
        }
    }

    /// Execute a structured goal and record the result
    pub fn execute_goal(&mut self, mut goal: Goal) -> ExecutionResult {
        let started = Instant::now();
        let description = goal.description();
        goal.status = GoalStatus::InProgress;

        log::info!("Starting goal: {}", description);
        log::info!(
            "Priority: {} | Timeout: {}s",
            goal.priority,
            goal.timeout_secs
        );

        let outcome = match goal.kind {
            GoalKind::Find {
                target,
                max_distance,
                preferred_direction,
            } => {
                if max_distance.is_some() || preferred_direction.is_some() {
                    log::debug!(
                        "Search hints: max distance {:?}, direction {:?}",
                        max_distance,
                        preferred_direction
                    );
                }
                self.find(target, goal.timeout_secs)
            }
            GoalKind::Navigate {
                destination: Destination::Target(target),
            } => {
                log::info!("Navigating to {}", target);
                self.find(target, goal.timeout_secs)
            }
            GoalKind::Navigate {
                destination: Destination::Heading { direction, distance },
            } => self.walk(direction, distance.unwrap_or(DEFAULT_HEADING_DISTANCE)),
            GoalKind::Explore { radius, pattern } => {
                log::info!("Exploring area (radius: {}, pattern: {})", radius, pattern);
                self.explore(goal.timeout_secs)
            }
        };

        goal.status = if outcome.interrupted {
            GoalStatus::Cancelled
        } else if outcome.success {
            GoalStatus::Completed
        } else {
            GoalStatus::Failed
        };

        let result = ExecutionResult {
            goal: description,
            success: outcome.success && !outcome.interrupted,
            message: outcome.message,
            steps_taken: outcome.steps_taken,
            status: goal.status,
            elapsed: started.elapsed(),
            report: outcome.report,
        };

        self.steps_taken += result.steps_taken;
        if let Some(report) = &result.report {
            self.max_coverage = self.max_coverage.max(report.max_coverage);
        }

        log::info!(
            "Goal finished: {} | {:?} | {} steps in {:.1}s | {}",
            result.goal,
            result.status,
            result.steps_taken,
            result.elapsed.as_secs_f64(),
            result.message
        );
        self.history.push(result.clone());
        result
    }

    pub fn status(&self) -> ExecutorStatus {
        let last = self.history.last();
        ExecutorStatus {
            last_goal: last.map(|r| r.goal.clone()),
            last_status: last.map(|r| r.status),
            steps_taken: self.steps_taken,
            max_coverage: self.max_coverage,
            history_count: self.history.len(),
            last_message: last.map(|r| r.message.clone()),
        }
    }

    fn episode(&self, target: &str, max_steps: u32) -> EpisodeConfig {
        let mut config = self.template.clone().with_max_steps(max_steps);
        config.target = target.to_string();
        config
    }

    fn find(&mut self, target: Target, timeout_secs: u64) -> Outcome {
        self.vision.set_palette(target.palette());
        let config = self.episode(
            target.category(),
            step_budget(timeout_secs, self.seconds_per_step, FIND_STEP_CAP),
        );
        let profile = match target {
            Target::Tree => RuleProfile::trees(),
            _ => RuleProfile::long_range_water(),
        };
        let mut policy = RulePolicy::new(profile);

        let report = EpisodeDriver::new(&mut self.vision, &mut self.actuator, self.cancel.clone())
            .run(&mut policy, &config);

        Outcome {
            success: report.verdict != Verdict::Failure,
            interrupted: report.interrupted,
            message: report.summary(),
            steps_taken: report.steps_taken,
            report: Some(report),
        }
    }

    /// Scripted walk along a heading; there is no position tracking
    fn walk(&mut self, direction: Direction, distance: u32) -> Outcome {
        log::info!("Moving {}", direction);
        let steps = (distance / BLOCKS_PER_STEP).min(HEADING_STEP_CAP);
        let mut taken = 0;

        for step in 0..steps {
            if self.cancel.is_cancelled() {
                return Outcome {
                    success: false,
                    interrupted: true,
                    message: format!("Moving {} interrupted after {} steps", direction, taken),
                    steps_taken: taken,
                    report: None,
                };
            }
            self.actuator.perform(heading_action(direction, step));
            taken += 1;
            if !self.template.tick_delay.is_zero() {
                thread::sleep(self.template.tick_delay);
            }
        }

        Outcome {
            success: true,
            interrupted: false,
            message: format!("Moved {} for {} steps", direction, taken),
            steps_taken: taken,
            report: None,
        }
    }

    fn explore(&mut self, timeout_secs: u64) -> Outcome {
        let category = self
            .vision
            .palette()
            .names()
            .next()
            .unwrap_or("water")
            .to_string();
        let config = self
            .episode(
                &category,
                step_budget(timeout_secs, self.seconds_per_step, EXPLORE_STEP_CAP),
            )
            .with_stop_on_success(false);
        let mut policy = ExplorePolicy::default();

        let report = EpisodeDriver::new(&mut self.vision, &mut self.actuator, self.cancel.clone())
            .run(&mut policy, &config);

        Outcome {
            success: true,
            interrupted: report.interrupted,
            message: format!("Explored area for {} steps", report.steps_taken),
            steps_taken: report.steps_taken,
            report: Some(report),
        }
    }
}

/// Action for one step of a heading walk
fn heading_action(direction: Direction, step: u32) -> Action {
    if step % CORRECTION_STRIDE != 0 {
        Action::MoveForward
    } else if direction.is_meridional() {
        if step % (2 * CORRECTION_STRIDE) == 0 {
            Action::LookUp
        } else {
            Action::LookDown
        }
    } else if direction.is_westward() {
        Action::LookLeft
    } else {
        Action::LookRight
    }
}

struct Outcome {
    success: bool,
    interrupted: bool,
    message: String,
    steps_taken: u32,
    report: Option<EpisodeReport>,
}
