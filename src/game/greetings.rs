//! Duplicate welcome suppression.

use std::collections::VecDeque;

const GREETING_PREFIX: &str = "Welcome ";

/// Default number of welcome lines remembered.
pub const GREETING_CAPACITY: usize = 20;

/// Most-recent-first window of welcome lines.
#[derive(Debug, Clone)]
pub struct RecentGreetings {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for RecentGreetings {
    fn default() -> Self {
        Self::new(GREETING_CAPACITY)
    }
}

impl RecentGreetings {
    pub fn new(capacity: usize) -> Self {
        Self {
            lines: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Returns `false` for a welcome line already in the window. Every
    /// other line passes; an admitted welcome line is remembered.
    pub fn admit(&mut self, line: &str) -> bool {
        if !line.starts_with(GREETING_PREFIX) {
            return true;
        }
        if self.lines.iter().any(|seen| seen == line) {
            return false;
        }
        self.lines.push_front(line.to_string());
        self.lines.truncate(self.capacity);
        true
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
