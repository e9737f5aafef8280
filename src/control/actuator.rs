//! Translates actions into timed input pulses

use std::thread;
use std::time::Duration;

use super::action::{Action, InputKind, PulseClass};
use super::focus::WindowFocuser;
use super::input::{InputBackend, KeyBindings};
use super::ControlError;

/// Hold durations per pulse class
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PulseTimings {
    pub movement: Duration,
    pub look: Duration,
    pub tap: Duration,
    pub wait: Duration,
}

impl Default for PulseTimings {
    fn default() -> Self {
        Self {
            movement: Duration::from_millis(500),
            look: Duration::from_millis(300),
            tap: Duration::from_millis(100),
            wait: Duration::from_millis(500),
        }
    }
}

impl PulseTimings {
    /// Zero-length pulses
    pub fn instant() -> Self {
        Self {
            movement: Duration::ZERO,
            look: Duration::ZERO,
            tap: Duration::ZERO,
            wait: Duration::ZERO,
        }
    }

    pub fn for_action(&self, action: Action) -> Duration {
        match action.pulse_class() {
            PulseClass::Movement => self.movement,
            PulseClass::Look => self.look,
            PulseClass::Tap => self.tap,
            PulseClass::Idle => self.wait,
        }
    }
}

/// Sends actions to the target application
pub struct Actuator {
    backend: Box<dyn InputBackend>,
    focuser: Box<dyn WindowFocuser>,
    target_app: String,
    bindings: KeyBindings,
    timings: PulseTimings,
    /// Number of actions that failed to dispatch
    failures: u32,
}

impl Actuator {
    pub fn new(
        backend: Box<dyn InputBackend>,
        focuser: Box<dyn WindowFocuser>,
        target_app: impl Into<String>,
    ) -> Self {
        Self {
            backend,
            focuser,
            target_app: target_app.into(),
            bindings: KeyBindings::default(),
            timings: PulseTimings::default(),
            failures: 0,
        }
    }

    pub fn with_bindings(mut self, bindings: KeyBindings) -> Self {
        self.bindings = bindings;
        self
    }

    pub fn with_timings(mut self, timings: PulseTimings) -> Self {
        self.timings = timings;
        self
    }

    pub fn target_app(&self) -> &str {
        &self.target_app
    }

    pub fn timings(&self) -> &PulseTimings {
        &self.timings
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Perform an action with its configured pulse duration
    pub fn perform(&mut self, action: Action) -> bool {
        let duration = self.timings.for_action(action);
        self.execute(action, duration)
    }

    /// Perform an action, holding keys for `duration`
    ///
    /// Returns false if the input could not be dispatched; the caller treats
    /// that as an ineffective tick, not a failed mission.
    pub fn execute(&mut self, action: Action, duration: Duration) -> bool {
        if !self.focuser.focus(&self.target_app) {
            log::warn!(
                "Could not focus {} - input may not reach it",
                self.target_app
            );
        }

        match self.dispatch(action, duration) {
            Ok(()) => {
                log::debug!("Executed {} for {:?}", action, duration);
                true
            }
            Err(e) => {
                self.failures += 1;
                log::warn!("Failed to execute {}: {}", action, e);
                false
            }
        }
    }

    fn dispatch(&mut self, action: Action, duration: Duration) -> Result<(), ControlError> {
        match action.input_kind() {
            InputKind::KeyPulse => {
                let key = self
                    .bindings
                    .key_for(action)
                    .ok_or(ControlError::Unbound(action))?;
                self.backend.key_down(key)?;
                thread::sleep(duration);
                self.backend.key_up(key)
            }
            InputKind::Click(button) => self.backend.click(button),
            InputKind::Idle => {
                thread::sleep(duration);
                Ok(())
            }
        }
    }
}
