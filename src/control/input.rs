//! Keyboard and mouse synthesis
//!
//! [`InputBackend`] is the narrow seam between the actuator and the
//! operating system. `EnigoBackend` sends real events; `DryRunBackend`
//! records them instead.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use enigo::{Button, Direction, Enigo, Key, Keyboard, Mouse};
use serde::{Deserialize, Serialize};

use super::action::{Action, MouseButton};
use super::ControlError;

/// A key the actuator can hold down
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum KeyCode {
    Char(char),
    Up,
    Down,
    Left,
    Right,
    Enter,
    Space,
    Shift,
}

impl fmt::Display for KeyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyCode::Char(c) => write!(f, "{c}"),
            KeyCode::Up => f.write_str("up"),
            KeyCode::Down => f.write_str("down"),
            KeyCode::Left => f.write_str("left"),
            KeyCode::Right => f.write_str("right"),
            KeyCode::Enter => f.write_str("enter"),
            KeyCode::Space => f.write_str("space"),
            KeyCode::Shift => f.write_str("shift"),
        }
    }
}

impl FromStr for KeyCode {
    type Err = ControlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        let key = match lower.as_str() {
            "up" => KeyCode::Up,
            "down" => KeyCode::Down,
            "left" => KeyCode::Left,
            "right" => KeyCode::Right,
            "enter" | "return" => KeyCode::Enter,
            "space" => KeyCode::Space,
            "shift" => KeyCode::Shift,
            _ => {
                let mut chars = lower.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => KeyCode::Char(c),
                    _ => return Err(ControlError::UnknownKey(s.to_string())),
                }
            }
        };
        Ok(key)
    }
}

impl TryFrom<String> for KeyCode {
    type Error = ControlError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<KeyCode> for String {
    fn from(key: KeyCode) -> Self {
        key.to_string()
    }
}

/// Key bound to each key-pulse action
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyBindings {
    pub move_forward: KeyCode,
    pub move_backward: KeyCode,
    pub strafe_left: KeyCode,
    pub strafe_right: KeyCode,
    pub look_left: KeyCode,
    pub look_right: KeyCode,
    pub look_up: KeyCode,
    pub look_down: KeyCode,
    pub center_view: KeyCode,
    pub jump: KeyCode,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self {
            move_forward: KeyCode::Char('w'),
            move_backward: KeyCode::Char('s'),
            strafe_left: KeyCode::Char('a'),
            strafe_right: KeyCode::Char('d'),
            look_left: KeyCode::Char('j'),
            look_right: KeyCode::Char('l'),
            look_up: KeyCode::Char('i'),
            look_down: KeyCode::Char('k'),
            center_view: KeyCode::Enter,
            jump: KeyCode::Space,
        }
    }
}

impl KeyBindings {
    /// Key for a key-pulse action, `None` for clicks and waits
    pub fn key_for(&self, action: Action) -> Option<KeyCode> {
        match action {
            Action::MoveForward => Some(self.move_forward),
            Action::MoveBackward => Some(self.move_backward),
            Action::StrafeLeft => Some(self.strafe_left),
            Action::StrafeRight => Some(self.strafe_right),
            Action::LookLeft => Some(self.look_left),
            Action::LookRight => Some(self.look_right),
            Action::LookUp => Some(self.look_up),
            Action::LookDown => Some(self.look_down),
            Action::CenterView => Some(self.center_view),
            Action::Jump => Some(self.jump),
            Action::Mine | Action::Place | Action::Wait => None,
        }
    }
}

/// Primitive input operations
pub trait InputBackend {
    fn key_down(&mut self, key: KeyCode) -> Result<(), ControlError>;
    fn key_up(&mut self, key: KeyCode) -> Result<(), ControlError>;
    fn click(&mut self, button: MouseButton) -> Result<(), ControlError>;
}

/// Real input through `enigo`
pub struct EnigoBackend {
    enigo: Enigo,
}

impl EnigoBackend {
    /// Connect to the platform input system
    pub fn new() -> Result<Self, ControlError> {
        let enigo = Enigo::new(&enigo::Settings::default())
            .map_err(|e| ControlError::Unavailable(e.to_string()))?;
        Ok(Self { enigo })
    }
}

fn to_enigo_key(key: KeyCode) -> Key {
    match key {
        KeyCode::Char(c) => Key::Unicode(c),
        KeyCode::Up => Key::UpArrow,
        KeyCode::Down => Key::DownArrow,
        KeyCode::Left => Key::LeftArrow,
        KeyCode::Right => Key::RightArrow,
        KeyCode::Enter => Key::Return,
        KeyCode::Space => Key::Space,
        KeyCode::Shift => Key::Shift,
    }
}

fn to_enigo_button(button: MouseButton) -> Button {
    match button {
        MouseButton::Left => Button::Left,
        MouseButton::Right => Button::Right,
    }
}

impl InputBackend for EnigoBackend {
    fn key_down(&mut self, key: KeyCode) -> Result<(), ControlError> {
        self.enigo
            .key(to_enigo_key(key), Direction::Press)
            .map_err(|e| ControlError::Dispatch(e.to_string()))
    }

    fn key_up(&mut self, key: KeyCode) -> Result<(), ControlError> {
        self.enigo
            .key(to_enigo_key(key), Direction::Release)
            .map_err(|e| ControlError::Dispatch(e.to_string()))
    }

    fn click(&mut self, button: MouseButton) -> Result<(), ControlError> {
        self.enigo
            .button(to_enigo_button(button), Direction::Click)
            .map_err(|e| ControlError::Dispatch(e.to_string()))
    }
}

/// A recorded input operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    KeyDown(KeyCode),
    KeyUp(KeyCode),
    Click(MouseButton),
}

/// Shared handle to the events recorded by a [`DryRunBackend`]
#[derive(Debug, Clone, Default)]
pub struct InputLog(Arc<Mutex<Vec<InputEvent>>>);

impl InputLog {
    fn push(&self, event: InputEvent) {
        match self.0.lock() {
            Ok(mut events) => events.push(event),
            Err(poisoned) => poisoned.into_inner().push(event),
        }
    }

    /// Snapshot of every event recorded so far
    pub fn events(&self) -> Vec<InputEvent> {
        match self.0.lock() {
            Ok(events) => events.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn clear(&self) {
        match self.0.lock() {
            Ok(mut events) => events.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

/// Backend that only records and logs what it would have sent
#[derive(Debug, Default)]
pub struct DryRunBackend {
    log: InputLog,
}

impl DryRunBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle that stays valid after the backend is boxed
    pub fn log(&self) -> InputLog {
        self.log.clone()
    }
}

impl InputBackend for DryRunBackend {
    fn key_down(&mut self, key: KeyCode) -> Result<(), ControlError> {
        log::info!("[dry-run] press key: {}", key);
        self.log.push(InputEvent::KeyDown(key));
        Ok(())
    }

    fn key_up(&mut self, key: KeyCode) -> Result<(), ControlError> {
        log::info!("[dry-run] release key: {}", key);
        self.log.push(InputEvent::KeyUp(key));
        Ok(())
    }

    fn click(&mut self, button: MouseButton) -> Result<(), ControlError> {
        log::info!("[dry-run] click {:?}", button);
        self.log.push(InputEvent::Click(button));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_parsing() {
        assert_eq!("w".parse::<KeyCode>().unwrap(), KeyCode::Char('w'));
        assert_eq!("Enter".parse::<KeyCode>().unwrap(), KeyCode::Enter);
        assert_eq!("up".parse::<KeyCode>().unwrap(), KeyCode::Up);
        assert!("ctrl-alt".parse::<KeyCode>().is_err());
    }

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::default();
        assert_eq!(bindings.key_for(Action::MoveForward), Some(KeyCode::Char('w')));
        assert_eq!(bindings.key_for(Action::LookDown), Some(KeyCode::Char('k')));
        assert_eq!(bindings.key_for(Action::CenterView), Some(KeyCode::Enter));
        assert_eq!(bindings.key_for(Action::Mine), None);
    }

    #[test]
    fn test_bindings_from_yaml() {
        let bindings: KeyBindings = serde_yaml::from_str("move_forward: up\njump: space\n").unwrap();
        assert_eq!(bindings.move_forward, KeyCode::Up);
        assert_eq!(bindings.jump, KeyCode::Space);
        // Unlisted keys keep their defaults
        assert_eq!(bindings.look_left, KeyCode::Char('j'));
    }

    #[test]
    fn test_dry_run_records() {
        let mut backend = DryRunBackend::new();
        let log = backend.log();

        backend.key_down(KeyCode::Char('w')).unwrap();
        backend.key_up(KeyCode::Char('w')).unwrap();
        backend.click(MouseButton::Right).unwrap();

        assert_eq!(
            log.events(),
            vec![
                InputEvent::KeyDown(KeyCode::Char('w')),
                InputEvent::KeyUp(KeyCode::Char('w')),
                InputEvent::Click(MouseButton::Right),
            ]
        );
    }
}
