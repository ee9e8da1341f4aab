//! Mock timer implementation for testing
//!
//! Keeps a simulated microsecond clock. Delays advance the clock instead of
//! blocking, so tests run instantly while still observing elapsed time.

use crate::platform::{traits::TimerInterface, Result};

/// Mock timer implementation
#[derive(Debug, Default)]
pub struct MockTimer {
    now_us: u64,
}

impl MockTimer {
    /// Create a new mock timer starting at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the simulated clock without a delay call
    pub fn advance_us(&mut self, us: u64) {
        self.now_us += us;
    }
}

impl TimerInterface for MockTimer {
    fn delay_us(&mut self, us: u32) -> Result<()> {
        self.now_us += u64::from(us);
        Ok(())
    }

    fn now_us(&self) -> u64 {
        self.now_us
    }
}
