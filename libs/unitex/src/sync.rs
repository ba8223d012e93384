// Copyright (c) 2025 Jonathan Fontanez
// SPDX-License-Identifier: BUSL-1.1

//! Fence bookkeeping for deferred (command-list) submission.

use std::time::Duration;

use crate::Result;

/// A GPU timeline the CPU can wait on and the queue can signal.
pub trait GpuFence {
    /// Highest value the GPU has reached.
    fn completed_value(&self) -> u64;

    /// Block until the GPU reaches `value`. `None` waits forever.
    fn wait_for(&self, value: u64, timeout: Option<Duration>) -> Result<()>;

    /// Queue a signal of `value` after all work submitted so far.
    fn signal(&self, value: u64) -> Result<()>;
}

/// Owns the value last signalled on the plugin's fence.
///
/// The command allocator is shared across updates, so it may only be reset
/// once the GPU has reached the value signalled after the previous
/// submission. Every update, whether it recorded a copy or not, signals a
/// new, strictly larger value so the host can sequence later frame work.
#[derive(Debug)]
pub struct FenceTracker {
    value: u64,
    timeout: Option<Duration>,
}

impl FenceTracker {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self { value: 0, timeout }
    }

    /// Last value signalled.
    pub fn value(&self) -> u64 {
        self.value
    }

    /// Wait until the previous submission finished. Returns whether a wait
    /// was needed.
    pub fn wait_idle<F: GpuFence + ?Sized>(&self, fence: &F) -> Result<bool> {
        if fence.completed_value() >= self.value {
            return Ok(false);
        }

        tracing::debug!(
            "Waiting on fence value {} (completed {})",
            self.value,
            fence.completed_value()
        );
        fence.wait_for(self.value, self.timeout)?;
        Ok(true)
    }

    /// Signal the next fence value and return it.
    pub fn advance<F: GpuFence + ?Sized>(&mut self, fence: &F) -> Result<u64> {
        let next = self.value + 1;
        fence.signal(next)?;
        self.value = next;
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct FakeFence {
        completed: Cell<u64>,
        waits: RefCell<Vec<u64>>,
        signals: RefCell<Vec<u64>>,
    }

    impl GpuFence for FakeFence {
        fn completed_value(&self) -> u64 {
            self.completed.get()
        }

        fn wait_for(&self, value: u64, _timeout: Option<Duration>) -> Result<()> {
            self.waits.borrow_mut().push(value);
            self.completed.set(value);
            Ok(())
        }

        fn signal(&self, value: u64) -> Result<()> {
            self.signals.borrow_mut().push(value);
            Ok(())
        }
    }

    #[test]
    fn test_first_update_does_not_wait() {
        let fence = FakeFence::default();
        let tracker = FenceTracker::new(None);
        assert!(!tracker.wait_idle(&fence).unwrap());
        assert!(fence.waits.borrow().is_empty());
    }

    #[test]
    fn test_waits_for_outstanding_value() {
        let fence = FakeFence::default();
        let mut tracker = FenceTracker::new(None);
        tracker.advance(&fence).unwrap();

        assert!(tracker.wait_idle(&fence).unwrap());
        assert_eq!(*fence.waits.borrow(), vec![1]);

        // GPU caught up; no second wait
        assert!(!tracker.wait_idle(&fence).unwrap());
    }

    #[test]
    fn test_advance_is_strictly_increasing() {
        let fence = FakeFence::default();
        let mut tracker = FenceTracker::new(Some(Duration::from_millis(5)));
        for _ in 0..3 {
            tracker.advance(&fence).unwrap();
        }
        assert_eq!(*fence.signals.borrow(), vec![1, 2, 3]);
        assert_eq!(tracker.value(), 3);
    }
}
