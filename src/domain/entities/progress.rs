//! Batch progress accounting

/// Point-in-time view of a batch's progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressSnapshot {
    /// Tasks finished so far, successful or not
    pub completed: usize,
    /// Tasks in the batch
    pub total: usize,
}

impl ProgressSnapshot {
    /// Returns whether every task has been accounted for
    pub fn is_complete(&self) -> bool {
        self.completed >= self.total
    }

    /// Returns the progress percentage (0.0 - 100.0)
    pub fn percentage(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.completed as f64 / self.total as f64) * 100.0
    }
}

/// Counts completed tasks against the batch total.
///
/// Only the orchestrator's draining loop mutates it; workers report
/// through the completion channel instead.
#[derive(Debug)]
pub struct ProgressCounter {
    total: usize,
    completed: usize,
}

impl ProgressCounter {
    /// Creates a counter for `total` tasks
    pub fn new(total: usize) -> Self {
        Self {
            total,
            completed: 0,
        }
    }

    /// Records one finished task and returns the new snapshot.
    ///
    /// Never moves past `total`.
    pub fn increment(&mut self) -> ProgressSnapshot {
        if self.completed < self.total {
            self.completed += 1;
        } else {
            tracing::warn!(total = self.total, "completion reported past batch total");
        }
        self.snapshot()
    }

    /// Returns the current snapshot
    pub fn snapshot(&self) -> ProgressSnapshot {
        ProgressSnapshot {
            completed: self.completed,
            total: self.total,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_is_monotonic_and_bounded() {
        let mut counter = ProgressCounter::new(2);
        assert_eq!(counter.snapshot().completed, 0);
        assert_eq!(counter.increment().completed, 1);
        assert_eq!(counter.increment().completed, 2);
        assert_eq!(counter.increment().completed, 2);
        assert!(counter.snapshot().is_complete());
    }

    #[test]
    fn test_empty_batch_is_complete() {
        let counter = ProgressCounter::new(0);
        assert!(counter.snapshot().is_complete());
        assert_eq!(counter.snapshot().percentage(), 100.0);
    }

    #[test]
    fn test_percentage() {
        let mut counter = ProgressCounter::new(4);
        counter.increment();
        assert_eq!(counter.snapshot().percentage(), 25.0);
    }
}
