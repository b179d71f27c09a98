//! Failed-attempt accounting.

/// Result of recording a failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOutcome {
    /// Below the threshold; `failures` consecutive failures so far
    Counted {
        /// Consecutive failures including this one
        failures: u32,
    },
    /// Threshold reached. The caller runs the lockout and resets afterwards.
    LockoutTriggered,
}

/// Consecutive failed verifications on one node.
///
/// Cleared by a successful verification or at the end of a lockout. Each
/// node keeps its own; nothing synchronises them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryCounter {
    failures: u32,
    threshold: u32,
}

impl RetryCounter {
    /// Counter that triggers a lockout on the `threshold`-th failure.
    pub const fn new(threshold: u32) -> Self {
        Self { failures: 0, threshold }
    }

    /// Count one failure.
    pub fn record_failure(&mut self) -> RetryOutcome {
        self.failures = self.failures.saturating_add(1);
        if self.failures >= self.threshold {
            RetryOutcome::LockoutTriggered
        } else {
            RetryOutcome::Counted { failures: self.failures }
        }
    }

    /// Clear after a success or a finished lockout.
    pub fn reset(&mut self) {
        self.failures = 0;
    }

    /// Consecutive failures so far.
    pub const fn failures(&self) -> u32 {
        self.failures
    }
}
