//! The discrete action vocabulary
//!
//! Every policy decides in terms of [`Action`]; the actuator translates an
//! action into a primitive input operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// One discrete input the actuator can emit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    MoveForward,
    MoveBackward,
    StrafeLeft,
    StrafeRight,
    LookLeft,
    LookRight,
    LookUp,
    LookDown,
    CenterView,
    Mine,
    Place,
    Jump,
    Wait,
}

/// How an action reaches the target application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    /// Key held down for the pulse duration
    KeyPulse,
    /// Immediate mouse click
    Click(MouseButton),
    /// No input, just a sleep
    Idle,
}

/// Mouse buttons used by the vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MouseButton {
    Left,
    Right,
}

/// Coarse grouping used to pick a pulse duration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseClass {
    Movement,
    Look,
    Tap,
    Idle,
}

impl Action {
    /// The full vocabulary, in prompt order
    pub const ALL: [Action; 13] = [
        Action::MoveForward,
        Action::MoveBackward,
        Action::StrafeLeft,
        Action::StrafeRight,
        Action::LookLeft,
        Action::LookRight,
        Action::LookUp,
        Action::LookDown,
        Action::CenterView,
        Action::Mine,
        Action::Place,
        Action::Jump,
        Action::Wait,
    ];

    /// Canonical snake_case name
    pub fn name(&self) -> &'static str {
        match self {
            Action::MoveForward => "move_forward",
            Action::MoveBackward => "move_backward",
            Action::StrafeLeft => "strafe_left",
            Action::StrafeRight => "strafe_right",
            Action::LookLeft => "look_left",
            Action::LookRight => "look_right",
            Action::LookUp => "look_up",
            Action::LookDown => "look_down",
            Action::CenterView => "center_view",
            Action::Mine => "mine",
            Action::Place => "place",
            Action::Jump => "jump",
            Action::Wait => "wait",
        }
    }

    /// Short description shown to the decision service
    pub fn describe(&self) -> &'static str {
        match self {
            Action::MoveForward => "walk forward",
            Action::MoveBackward => "walk backward",
            Action::StrafeLeft => "step sideways to the left",
            Action::StrafeRight => "step sideways to the right",
            Action::LookLeft => "turn the camera left",
            Action::LookRight => "turn the camera right",
            Action::LookUp => "tilt the camera up",
            Action::LookDown => "tilt the camera down",
            Action::CenterView => "reset the camera to look straight ahead",
            Action::Mine => "left click to break blocks or attack",
            Action::Place => "right click to place blocks or use items",
            Action::Jump => "jump",
            Action::Wait => "do nothing for one cycle",
        }
    }

    /// Primitive input used to deliver this action
    pub fn input_kind(&self) -> InputKind {
        match self {
            Action::Mine => InputKind::Click(MouseButton::Left),
            Action::Place => InputKind::Click(MouseButton::Right),
            Action::Wait => InputKind::Idle,
            _ => InputKind::KeyPulse,
        }
    }

    /// Pulse class for duration lookup
    pub fn pulse_class(&self) -> PulseClass {
        match self {
            Action::MoveForward
            | Action::MoveBackward
            | Action::StrafeLeft
            | Action::StrafeRight => PulseClass::Movement,
            Action::LookLeft | Action::LookRight | Action::LookUp | Action::LookDown => {
                PulseClass::Look
            }
            Action::CenterView | Action::Jump | Action::Mine | Action::Place => PulseClass::Tap,
            Action::Wait => PulseClass::Idle,
        }
    }

    /// Whether the action moves the character (as opposed to the camera)
    pub fn is_movement(&self) -> bool {
        self.pulse_class() == PulseClass::Movement
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string names no action
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown action: {0}")]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    /// Accepts `move_forward`, `move-forward`, `Move Forward`, `[move_forward]`
    /// and a few aliases the decision service tends to produce.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .trim_matches(|c| matches!(c, '[' | ']' | '`' | '"' | '\'' | '.'))
            .chars()
            .map(|c| match c {
                '-' | ' ' => '_',
                c => c.to_ascii_lowercase(),
            })
            .collect();

        let action = match normalized.as_str() {
            "move_forward" | "forward" | "walk_forward" => Action::MoveForward,
            "move_backward" | "backward" | "move_back" => Action::MoveBackward,
            "strafe_left" | "move_left" | "turn_left" => Action::StrafeLeft,
            "strafe_right" | "move_right" | "turn_right" => Action::StrafeRight,
            "look_left" => Action::LookLeft,
            "look_right" | "look_around" => Action::LookRight,
            "look_up" => Action::LookUp,
            "look_down" => Action::LookDown,
            "center_view" | "center" => Action::CenterView,
            "mine" | "chop" | "attack" => Action::Mine,
            "place" | "use" => Action::Place,
            "jump" => Action::Jump,
            "wait" | "idle" => Action::Wait,
            _ => return Err(UnknownAction(s.to_string())),
        };
        Ok(action)
    }
}
