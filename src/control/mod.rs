//! Input control module
//!
//! Turns decided actions into synthetic keyboard and mouse input aimed at
//! the mirrored game window.

pub mod action;
pub mod actuator;
pub mod focus;
pub mod input;

pub use action::{Action, InputKind, MouseButton};
pub use actuator::{Actuator, PulseTimings};
pub use focus::{AppleScriptFocuser, NoopFocuser, WindowFocuser};
pub use input::{DryRunBackend, EnigoBackend, InputBackend, InputEvent, InputLog, KeyBindings, KeyCode};

/// Input control errors
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("Input system unavailable: {0}")]
    Unavailable(String),
    #[error("Failed to send input: {0}")]
    Dispatch(String),
    #[error("Unknown key name: {0}")]
    UnknownKey(String),
    #[error("No key bound for action {0}")]
    Unbound(Action),
}
