//! Bounded retry budgets.
//!
//! The protocol layer retries on transport failures and on server-driven
//! corrections (framework resync, application rotation). Both loops draw
//! from a [`RetryBudget`] so neither can spin forever.

/// A fixed number of attempts that can be consumed one at a time.
#[derive(Debug, Clone)]
pub struct RetryBudget {
    max_attempts: u32,
    attempt: u32,
}

impl RetryBudget {
    /// Default number of attempts for transport and correction loops.
    pub const DEFAULT_ATTEMPTS: u32 = 10;

    /// Create a budget allowing `max_attempts` attempts.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            attempt: 0,
        }
    }

    /// Consume one attempt. Returns false once the budget is spent.
    pub fn try_acquire(&mut self) -> bool {
        if self.attempt >= self.max_attempts {
            return false;
        }
        self.attempt += 1;
        true
    }

    /// Attempts consumed so far.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Attempts still available.
    pub fn remaining(&self) -> u32 {
        self.max_attempts.saturating_sub(self.attempt)
    }

    /// Returns true when no attempts remain.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Maximum number of attempts.
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl Default for RetryBudget {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ATTEMPTS)
    }
}
