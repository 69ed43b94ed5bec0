//! Mapping from blink counts to actuator commands.

use serde::{Deserialize, Serialize};

/// The closed set of actuator commands.
///
/// `None` means "no dispatch": a window without blinks produces no outbound
/// traffic at all.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Command {
    Left,
    Right,
    Up,
    Down,
    Reset,
    None,
}

impl Command {
    /// Deterministic blink-count table. Total over all counts.
    pub fn from_blink_count(count: usize) -> Self {
        match count {
            0 => Command::None,
            1 => Command::Left,
            2 => Command::Right,
            3 => Command::Up,
            4 => Command::Down,
            _ => Command::Reset,
        }
    }

    /// URL path segment on the actuator, or `None` for no dispatch.
    pub fn path(&self) -> Option<&'static str> {
        match self {
            Command::Left => Some("/left"),
            Command::Right => Some("/right"),
            Command::Up => Some("/up"),
            Command::Down => Some("/down"),
            Command::Reset => Some("/reset"),
            Command::None => None,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Command::Left => "left",
            Command::Right => "right",
            Command::Up => "up",
            Command::Down => "down",
            Command::Reset => "reset",
            Command::None => "none",
        };
        f.write_str(name)
    }
}
