//! The perception-to-action loop
//!
//! Each tick captures a frame, measures the target, updates the phase,
//! asks the policy for an action and hands it to the actuator. The loop
//! stops on a strong sighting, when the step budget runs out or when the
//! cancel token is set.

use std::thread;
use std::time::{Duration, Instant};

use serde::Serialize;

use super::cancel::CancelToken;
use super::state::{EpisodeState, Verdict};
use crate::ai::{EpisodePhase, Observation, PhaseThresholds, Policy};
use crate::control::Actuator;
use crate::vision::VisionSystem;

/// Actions shown to the policy as recent history
const RECENT_WINDOW: usize = 5;

/// Number of ticks that fit in `timeout_secs`, capped at `cap`
pub fn step_budget(timeout_secs: u64, seconds_per_step: u64, cap: u32) -> u32 {
    let steps = timeout_secs / seconds_per_step.max(1);
    steps.min(cap as u64) as u32
}

/// Parameters of one episode
#[derive(Debug, Clone)]
pub struct EpisodeConfig {
    /// Palette category the episode is after
    pub target: String,
    pub thresholds: PhaseThresholds,
    /// Coverage that ends the episode successfully
    pub success_threshold: f64,
    /// Best coverage needed for a partial success
    pub partial_threshold: f64,
    /// Coverage counted as a first detection
    pub detect_threshold: f64,
    /// Coverage worth reporting
    pub notable_threshold: f64,
    /// Report progress every n ticks
    pub progress_stride: u32,
    pub max_steps: u32,
    /// Pause between ticks
    pub tick_delay: Duration,
    /// End the episode as soon as the success threshold is crossed
    pub stop_on_success: bool,
}

impl EpisodeConfig {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            thresholds: PhaseThresholds::default(),
            success_threshold: 0.15,
            partial_threshold: 0.01,
            detect_threshold: 0.01,
            notable_threshold: 0.05,
            progress_stride: 20,
            max_steps: 200,
            tick_delay: Duration::from_millis(200),
            stop_on_success: true,
        }
    }

    pub fn with_max_steps(mut self, max_steps: u32) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn with_tick_delay(mut self, tick_delay: Duration) -> Self {
        self.tick_delay = tick_delay;
        self
    }

    pub fn with_stop_on_success(mut self, stop_on_success: bool) -> Self {
        self.stop_on_success = stop_on_success;
        self
    }
}

/// Something worth reporting that happened during an episode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EpisodeEvent {
    CaptureFailed { step: u32, error: String },
    Detected { step: u32, coverage: f64 },
    Sighting { step: u32, coverage: f64 },
    Progress {
        step: u32,
        phase: EpisodePhase,
        coverage: f64,
        max_coverage: f64,
    },
    Succeeded { step: u32, coverage: f64 },
    Interrupted { step: u32 },
}

/// Outcome of an episode
#[derive(Debug, Clone, Serialize)]
pub struct EpisodeReport {
    pub target: String,
    pub verdict: Verdict,
    /// Index of the last tick that ran
    pub final_step: u32,
    /// Actions handed to the actuator
    pub steps_taken: u32,
    pub max_coverage: f64,
    pub first_detection: Option<u32>,
    pub interrupted: bool,
    pub skipped_ticks: u32,
    pub failed_actions: u32,
    pub events: Vec<EpisodeEvent>,
    #[serde(skip)]
    pub elapsed: Duration,
}

impl EpisodeReport {
    pub fn is_success(&self) -> bool {
        self.verdict == Verdict::Success
    }

    /// One-line human readable result
    pub fn summary(&self) -> String {
        let mut line = match self.verdict {
            Verdict::Success => format!(
                "Found {} (max coverage {:.3}%)",
                self.target,
                self.max_coverage * 100.0
            ),
            Verdict::PartialSuccess => format!(
                "Located {} (max coverage {:.3}%)",
                self.target,
                self.max_coverage * 100.0
            ),
            Verdict::Failure => format!(
                "Could not find {} after {} steps",
                self.target, self.steps_taken
            ),
        };
        if self.interrupted {
            line.push_str(" [interrupted]");
        }
        line
    }
}

/// Runs episodes against a vision system and an actuator
pub struct EpisodeDriver<'a> {
    vision: &'a mut VisionSystem,
    actuator: &'a mut Actuator,
    cancel: CancelToken,
}

impl<'a> EpisodeDriver<'a> {
    pub fn new(
        vision: &'a mut VisionSystem,
        actuator: &'a mut Actuator,
        cancel: CancelToken,
    ) -> Self {
        Self {
            vision,
            actuator,
            cancel,
        }
    }

    /// Run one episode to completion
    pub fn run(&mut self, policy: &mut dyn Policy, config: &EpisodeConfig) -> EpisodeReport {
        let started = Instant::now();
        let mut state = EpisodeState::new();
        let mut events = Vec::new();
        let mut interrupted = false;
        let stride = config.progress_stride.max(1);

        log::info!(
            "Starting {} episode for {} ({} steps max)",
            policy.name(),
            config.target,
            config.max_steps
        );

        for step in 0..config.max_steps {
            if self.cancel.is_cancelled() {
                interrupted = true;
                events.push(EpisodeEvent::Interrupted { step });
                break;
            }
            state.step = step;

            let coverage = match self.vision.observe(step) {
                Ok(coverage) => coverage,
                Err(e) => {
                    log::warn!("Step {}: capture failed: {}", step, e);
                    state.skipped_ticks += 1;
                    events.push(EpisodeEvent::CaptureFailed {
                        step,
                        error: e.to_string(),
                    });
                    // A failing capture still waits out the tick
                    pause(config.tick_delay);
                    continue;
                }
            };

            let value = coverage.global(&config.target);
            state.observe(value);
            state.phase = config
                .thresholds
                .determine_phase(value, step, state.max_coverage);

            if value > config.detect_threshold && state.first_detection.is_none() {
                state.first_detection = Some(step);
                log::info!("{} detected at step {}", config.target, step);
                events.push(EpisodeEvent::Detected {
                    step,
                    coverage: value,
                });
            }
            if value > config.notable_threshold {
                events.push(EpisodeEvent::Sighting {
                    step,
                    coverage: value,
                });
            }
            if step % stride == 0 || value > config.notable_threshold {
                log::info!(
                    "Step {:3}: {} coverage {:.3}% | max {:.3}% | {}",
                    step + 1,
                    config.target,
                    value * 100.0,
                    state.max_coverage * 100.0,
                    state.phase
                );
                events.push(EpisodeEvent::Progress {
                    step,
                    phase: state.phase,
                    coverage: value,
                    max_coverage: state.max_coverage,
                });
            }

            if config.stop_on_success && value > config.success_threshold {
                log::info!(
                    "Found {} at step {} (coverage {:.3}%)",
                    config.target,
                    step,
                    value * 100.0
                );
                state.verdict = Some(Verdict::Success);
                events.push(EpisodeEvent::Succeeded {
                    step,
                    coverage: value,
                });
                break;
            }

            let recent = state.recent(RECENT_WINDOW);
            let observation = Observation {
                coverage: &coverage,
                target: &config.target,
                phase: state.phase,
                step,
                recent: &recent,
            };
            let action = policy.select_action(&observation);
            let performed = self.actuator.perform(action);
            state.record_action(action, performed);
            log::debug!("Step {}: {} -> {}", step, state.phase, action);

            if self.cancel.is_cancelled() {
                interrupted = true;
                events.push(EpisodeEvent::Interrupted { step });
                break;
            }
            pause(config.tick_delay);
        }

        let verdict = state.verdict.unwrap_or_else(|| {
            Verdict::from_max_coverage(
                state.max_coverage,
                config.success_threshold,
                config.partial_threshold,
            )
        });

        let report = EpisodeReport {
            target: config.target.clone(),
            verdict,
            final_step: state.step,
            steps_taken: state.actions_taken,
            max_coverage: state.max_coverage,
            first_detection: state.first_detection,
            interrupted,
            skipped_ticks: state.skipped_ticks,
            failed_actions: state.failed_actions,
            events,
            elapsed: started.elapsed(),
        };
        log::info!("Episode finished: {} - {}", report.verdict, report.summary());
        report
    }
}

fn pause(delay: Duration) {
    if !delay.is_zero() {
        thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{RulePolicy, RuleProfile};
    use crate::mission::testing::rig;

    fn config(max_steps: u32) -> EpisodeConfig {
        EpisodeConfig::new("water")
            .with_max_steps(max_steps)
            .with_tick_delay(Duration::ZERO)
    }

    #[test]
    fn test_step_budget() {
        assert_eq!(step_budget(300, 2, 200), 150);
        assert_eq!(step_budget(1000, 2, 200), 200);
        assert_eq!(step_budget(300, 2, 100), 100);
        assert_eq!(step_budget(1, 2, 100), 0);
    }

    #[test]
    fn test_nothing_found_is_failure() {
        let (mut vision, mut actuator, _log) = rig(vec![Some(0.005); 50]);
        let mut policy = RulePolicy::new(RuleProfile::long_range_water());
        let report = EpisodeDriver::new(&mut vision, &mut actuator, CancelToken::new())
            .run(&mut policy, &config(50));

        assert_eq!(report.verdict, Verdict::Failure);
        assert_eq!(report.steps_taken, 50);
        assert_eq!(report.final_step, 49);
        assert!(report.first_detection.is_none());
        assert!(!report.interrupted);
    }

    #[test]
    fn test_strong_sighting_ends_episode() {
        let mut trace = vec![Some(0.0); 30];
        trace.push(Some(0.16));
        let (mut vision, mut actuator, log) = rig(trace);
        let mut policy = RulePolicy::new(RuleProfile::long_range_water());
        let report = EpisodeDriver::new(&mut vision, &mut actuator, CancelToken::new())
            .run(&mut policy, &config(100));

        assert_eq!(report.verdict, Verdict::Success);
        assert_eq!(report.final_step, 30);
        assert_eq!(report.steps_taken, 30);
        assert!((report.max_coverage - 0.16).abs() < 1e-9);
        assert!(matches!(
            report.events.last(),
            Some(EpisodeEvent::Succeeded { step: 30, .. })
        ));
        // Every action was a key pulse: one press and one release each
        assert_eq!(log.events().len(), 60);
    }

    #[test]
    fn test_weak_sighting_is_partial() {
        let mut trace = vec![Some(0.0); 5];
        trace.push(Some(0.03));
        trace.extend(vec![Some(0.0); 14]);
        let (mut vision, mut actuator, _log) = rig(trace);
        let mut policy = RulePolicy::new(RuleProfile::long_range_water());
        let report = EpisodeDriver::new(&mut vision, &mut actuator, CancelToken::new())
            .run(&mut policy, &config(20));

        assert_eq!(report.verdict, Verdict::PartialSuccess);
        assert_eq!(report.first_detection, Some(5));
        let detections = report
            .events
            .iter()
            .filter(|e| matches!(e, EpisodeEvent::Detected { .. }))
            .count();
        assert_eq!(detections, 1);
    }

    #[test]
    fn test_capture_failure_skips_tick() {
        let (mut vision, mut actuator, _log) = rig(vec![None, Some(0.0), None, Some(0.0)]);
        let mut policy = RulePolicy::new(RuleProfile::long_range_water());
        let report = EpisodeDriver::new(&mut vision, &mut actuator, CancelToken::new())
            .run(&mut policy, &config(4));

        assert_eq!(report.skipped_ticks, 2);
        assert_eq!(report.steps_taken, 2);
        assert!(matches!(
            report.events[0],
            EpisodeEvent::CaptureFailed { step: 0, .. }
        ));
    }

    #[test]
    fn test_failed_captures_keep_pace() {
        let (mut vision, mut actuator, log) = rig(vec![None; 5]);
        let mut policy = RulePolicy::new(RuleProfile::long_range_water());
        let config = config(5).with_tick_delay(Duration::from_millis(20));
        let report =
            EpisodeDriver::new(&mut vision, &mut actuator, CancelToken::new()).run(&mut policy, &config);

        assert_eq!(report.skipped_ticks, 5);
        assert_eq!(report.steps_taken, 0);
        assert!(log.events().is_empty());
        assert!(report.elapsed >= Duration::from_millis(100));
    }

    #[test]
    fn test_cancelled_before_start() {
        let (mut vision, mut actuator, log) = rig(vec![Some(0.5)]);
        let cancel = CancelToken::new();
        cancel.cancel();
        let mut policy = RulePolicy::new(RuleProfile::long_range_water());
        let report =
            EpisodeDriver::new(&mut vision, &mut actuator, cancel).run(&mut policy, &config(10));

        assert!(report.interrupted);
        assert_eq!(report.steps_taken, 0);
        assert_eq!(report.verdict, Verdict::Failure);
        assert!(log.events().is_empty());
        assert!(report.summary().ends_with("[interrupted]"));
    }

    #[test]
    fn test_progress_reporting() {
        let (mut vision, mut actuator, _log) = rig(vec![Some(0.0); 45]);
        let mut policy = RulePolicy::new(RuleProfile::long_range_water());
        let report = EpisodeDriver::new(&mut vision, &mut actuator, CancelToken::new())
            .run(&mut policy, &config(45));

        let progress: Vec<u32> = report
            .events
            .iter()
            .filter_map(|e| match e {
                EpisodeEvent::Progress { step, .. } => Some(*step),
                _ => None,
            })
            .collect();
        assert_eq!(progress, vec![0, 20, 40]);
    }

    #[test]
    fn test_continue_past_success() {
        let mut trace = vec![Some(0.2)];
        trace.extend(vec![Some(0.0); 9]);
        let (mut vision, mut actuator, _log) = rig(trace);
        let mut policy = RulePolicy::new(RuleProfile::long_range_water());
        let report = EpisodeDriver::new(&mut vision, &mut actuator, CancelToken::new())
            .run(&mut policy, &config(10).with_stop_on_success(false));

        assert_eq!(report.steps_taken, 10);
        assert_eq!(report.verdict, Verdict::Success);
    }
}
