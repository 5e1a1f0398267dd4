//! Cooperative cancellation and progress reporting for long scans.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Token polled between steps of a cancellable operation.
pub trait TaskMonitor: Send + Sync {
    fn is_cancelled(&self) -> bool;

    fn set_progress(&self, value: u64);

    /// Expected number of steps; 0 when unknown.
    fn maximum(&self) -> u64 {
        0
    }

    fn initialize(&self, _maximum: u64) {}
}

/// Monitor that is never cancelled and ignores progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMonitor;

impl TaskMonitor for NoopMonitor {
    fn is_cancelled(&self) -> bool {
        false
    }

    fn set_progress(&self, _value: u64) {}
}

/// Shareable cancellation flag with progress counters.
#[derive(Debug, Default)]
pub struct CancelToken {
    cancelled: AtomicBool,
    progress: AtomicU64,
    maximum: AtomicU64,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }

    pub fn progress(&self) -> u64 {
        self.progress.load(Ordering::Acquire)
    }
}

impl TaskMonitor for CancelToken {
    fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn set_progress(&self, value: u64) {
        self.progress.store(value, Ordering::Release);
        // Unknown or underestimated totals grow so progress never runs past the end.
        self.maximum.fetch_max(value, Ordering::AcqRel);
    }

    fn maximum(&self) -> u64 {
        self.maximum.load(Ordering::Acquire)
    }

    fn initialize(&self, maximum: u64) {
        self.maximum.store(maximum, Ordering::Release);
        self.progress.store(0, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancel_token_flags_and_counts() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.initialize(4);
        token.set_progress(2);
        assert_eq!(token.progress(), 2);
        assert_eq!(token.maximum(), 4);
        token.set_progress(9);
        assert_eq!(token.maximum(), 9);
        token.cancel();
        assert!(token.is_cancelled());
    }
}
