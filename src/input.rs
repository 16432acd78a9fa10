//! Keystroke handling for the single-line command input.

use crate::history::{Direction, History};

/// Keys the command line reacts to. Rendering layers translate raw terminal
/// or UI events into these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Backspace,
    Enter,
    Up,
    Down,
}

/// Editable contents of the command line.
#[derive(Debug, Default, Clone)]
pub struct InputLine {
    buffer: String,
}

impl InputLine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.buffer
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    /// Apply one key. Returns the trimmed line when `Enter` submits a
    /// non-blank line; the buffer is cleared on every `Enter`.
    ///
    /// `Up`/`Down` replace the buffer with the recalled entry, or with an
    /// empty line once the cursor is back on the fresh line. A step that
    /// cannot move the cursor changes nothing. Typing after a
    /// recall edits the recalled text in place.
    pub fn apply(&mut self, key: Key, history: &mut History) -> Option<String> {
        match key {
            Key::Char(c) => {
                self.buffer.push(c);
                None
            }
            Key::Backspace => {
                self.buffer.pop();
                None
            }
            Key::Up | Key::Down => {
                if history.is_empty() {
                    return None;
                }
                let direction = if key == Key::Up {
                    Direction::Up
                } else {
                    Direction::Down
                };
                let before = history.index();
                let recalled = history.navigate(direction).unwrap_or_default().to_string();
                // A clamped step leaves the cursor, and the buffer, alone.
                if history.index() != before {
                    self.buffer = recalled;
                }
                None
            }
            Key::Enter => {
                let line = std::mem::take(&mut self.buffer);
                let line = line.trim();
                if line.is_empty() {
                    None
                } else {
                    Some(line.to_string())
                }
            }
        }
    }
}
