//! Fixed-capacity log of the most recent lines, oldest evicted first.

use std::collections::VecDeque;

/// Lines kept for display.
pub const ROLLING_LOG_CAPACITY: usize = 5;

#[derive(Debug, Clone)]
pub struct RollingLog {
    lines: VecDeque<String>,
    capacity: usize,
}

impl Default for RollingLog {
    fn default() -> Self {
        Self::with_capacity(ROLLING_LOG_CAPACITY)
    }
}

impl RollingLog {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            lines: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, line: impl Into<String>) {
        if self.lines.len() == self.capacity {
            self.lines.pop_front();
        }
        self.lines.push_back(line.into());
    }

    /// Oldest first.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.lines.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}
