//! Submitted command lines and the recall cursor.

/// Direction of a history recall step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Toward older entries.
    Up,
    /// Toward the fresh line.
    Down,
}

/// Append-only list of submitted lines plus a recall cursor.
///
/// The cursor counts back from the newest entry: `None` is the fresh line,
/// `Some(0)` the newest entry, `Some(len - 1)` the oldest. It never leaves
/// that range.
#[derive(Debug, Default, Clone)]
pub struct History {
    entries: Vec<String>,
    cursor: Option<usize>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a submitted line and reset the cursor to the fresh line.
    pub fn push(&mut self, line: impl Into<String>) {
        self.entries.push(line.into());
        self.cursor = None;
    }

    /// Move the cursor one step, clamped at both ends. Returns the selected
    /// line, or `None` for the fresh line. No-op on an empty history.
    pub fn navigate(&mut self, direction: Direction) -> Option<&str> {
        if self.entries.is_empty() {
            return None;
        }
        let oldest = self.entries.len() - 1;
        self.cursor = match (direction, self.cursor) {
            (Direction::Up, None) => Some(0),
            (Direction::Up, Some(i)) => Some((i + 1).min(oldest)),
            (Direction::Down, None | Some(0)) => None,
            (Direction::Down, Some(i)) => Some(i - 1),
        };
        self.selected()
    }

    /// The line under the cursor.
    pub fn selected(&self) -> Option<&str> {
        let back = self.cursor?;
        let index = self.entries.len().checked_sub(back + 1)?;
        self.entries.get(index).map(String::as_str)
    }

    /// Cursor in the console's `-1 .. len` convention (`-1` is the fresh line).
    pub fn index(&self) -> isize {
        self.cursor
            .and_then(|c| isize::try_from(c).ok())
            .unwrap_or(-1)
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
