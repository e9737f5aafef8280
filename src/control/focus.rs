//! Best-effort window focusing

use std::process::Command;
use std::thread;
use std::time::Duration;

/// Brings a named application to the foreground
pub trait WindowFocuser {
    /// Returns whether the application is believed to be focused
    fn focus(&self, app_name: &str) -> bool;
}

/// Focuses applications through `osascript` (macOS)
pub struct AppleScriptFocuser {
    /// Time given to the window manager after activation
    settle: Duration,
}

impl AppleScriptFocuser {
    pub fn new() -> Self {
        Self {
            settle: Duration::from_millis(200),
        }
    }

    pub fn with_settle(mut self, settle: Duration) -> Self {
        self.settle = settle;
        self
    }
}

impl Default for AppleScriptFocuser {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape a name for use inside an AppleScript string literal
fn applescript_quote(name: &str) -> String {
    name.replace('\\', "\\\\").replace('"', "\\\"")
}

impl WindowFocuser for AppleScriptFocuser {
    fn focus(&self, app_name: &str) -> bool {
        let script = format!(
            "tell application \"{}\" to activate",
            applescript_quote(app_name)
        );

        match Command::new("osascript").arg("-e").arg(&script).output() {
            Ok(output) if output.status.success() => {
                thread::sleep(self.settle);
                true
            }
            Ok(output) => {
                log::debug!(
                    "osascript could not activate {}: {}",
                    app_name,
                    String::from_utf8_lossy(&output.stderr).trim()
                );
                false
            }
            Err(e) => {
                log::debug!("Failed to run osascript: {}", e);
                false
            }
        }
    }
}

/// Focuser that does nothing and always reports success
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopFocuser;

impl WindowFocuser for NoopFocuser {
    fn focus(&self, _app_name: &str) -> bool {
        true
    }
}
