//! Persistence tracking
//!
//! Keeps a short ring buffer of signal counts across evaluations so a single
//! noisy reading does not flap the verdict, while a recurring one is flagged
//! as sustained.

use std::collections::VecDeque;

/// Rolling window of per-evaluation signal counts
#[derive(Debug, Clone)]
pub struct PersistenceTracker {
    history: VecDeque<usize>,
    window: usize,
    required: usize,
}

impl PersistenceTracker {
    /// Create a tracker with the given window and required occurrences
    pub fn new(window: usize, required: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(window),
            window,
            required,
        }
    }

    /// Record this evaluation's signal count and report a sustained anomaly
    ///
    /// Returns `false` until the window has filled. Afterwards returns `true`
    /// when at least `required` of the last `window` evaluations fired a
    /// signal.
    pub fn record_and_check(&mut self, signal_count: usize) -> bool {
        self.history.push_back(signal_count);
        while self.history.len() > self.window {
            self.history.pop_front();
        }

        if self.history.len() < self.window {
            return false;
        }

        let occurrences = self.history.iter().filter(|count| **count > 0).count();
        occurrences >= self.required
    }

    /// Clear the history. Clean readings never do this on their own.
    pub fn reset(&mut self) {
        self.history.clear();
    }

    /// Recorded counts, oldest first
    pub fn history(&self) -> Vec<usize> {
        self.history.iter().copied().collect()
    }

    pub fn window(&self) -> usize {
        self.window
    }
}
