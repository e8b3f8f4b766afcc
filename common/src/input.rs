use crate::sync::Throttle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCommand {
    Increment,
    Decrement,
    ToggleMode,
}

impl UserCommand {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "+" | "u" | "up" => Some(Self::Increment),
            "-" | "d" | "down" => Some(Self::Decrement),
            "m" | "ok" | "mode" => Some(Self::ToggleMode),
            _ => None,
        }
    }
}

/// Button edges observed since the previous tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputFrame {
    pub increment: bool,
    pub decrement: bool,
    pub toggle_mode: bool,
}

impl InputFrame {
    pub fn is_empty(&self) -> bool {
        !(self.increment || self.decrement || self.toggle_mode)
    }
}

/// Per-button debounce in front of the engine: edits share one window, the
/// mode button has its own.
#[derive(Debug, Clone)]
pub struct InputDebouncer {
    edit: Throttle,
    toggle: Throttle,
}

impl InputDebouncer {
    pub fn new(edit_debounce_ms: u64, toggle_debounce_ms: u64) -> Self {
        Self {
            edit: Throttle::new(edit_debounce_ms),
            toggle: Throttle::new(toggle_debounce_ms),
        }
    }

    /// Folds one press into `frame`. Returns `false` if it bounced.
    pub fn press(&mut self, frame: &mut InputFrame, command: UserCommand, now_ms: u64) -> bool {
        match command {
            UserCommand::Increment if self.edit.try_acquire(now_ms) => frame.increment = true,
            UserCommand::Decrement if self.edit.try_acquire(now_ms) => frame.decrement = true,
            UserCommand::ToggleMode if self.toggle.try_acquire(now_ms) => frame.toggle_mode = true,
            _ => return false,
        }
        true
    }
}
