//! Recent evaluated values
//!
//! Fixed-capacity FIFO of the latest values the engine scored, oldest first.
//! In-memory only; it is lost on restart.

use std::collections::VecDeque;

/// Default number of values kept
pub const DEFAULT_HISTORY_SIZE: usize = 10;

#[derive(Debug, Clone)]
pub struct HistoryWindow {
    values: VecDeque<f64>,
    capacity: usize,
}

impl HistoryWindow {
    pub fn new(capacity: usize) -> Self {
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a value, evicting the oldest beyond capacity
    pub fn push(&mut self, value: f64) {
        self.values.push_back(value);
        while self.values.len() > self.capacity {
            self.values.pop_front();
        }
    }

    pub fn values(&self) -> Vec<f64> {
        self.values.iter().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evicts_oldest_over_capacity() {
        let mut window = HistoryWindow::new(3);
        for v in [1.0, 2.0, 3.0, 4.0] {
            window.push(v);
        }
        assert_eq!(window.values(), vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_default_size_window() {
        let mut window = HistoryWindow::new(DEFAULT_HISTORY_SIZE);
        assert!(window.values().is_empty());
        for v in 0..12 {
            window.push(v as f64);
        }
        assert_eq!(window.values().len(), DEFAULT_HISTORY_SIZE);
        assert_eq!(window.values()[0], 2.0);
    }
}
