//! Generation-counted debounce primitive.
//!
//! Scheduling replaces any pending deadline and bumps the generation, so a
//! burst of calls collapses into a single fire after the last one. A fire
//! reports the generation that armed it; an older generation never fires.

#[cfg(test)]
#[path = "debounce_test.rs"]
mod debounce_test;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Debouncer {
    generation: u64,
    deadline: Option<i64>,
}

impl Debouncer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) the debouncer to fire `delay_ms` after `now_ms`.
    /// Returns the new generation.
    pub fn schedule(&mut self, now_ms: i64, delay_ms: u64) -> u64 {
        self.generation += 1;
        let delay = i64::try_from(delay_ms).unwrap_or(i64::MAX);
        self.deadline = Some(now_ms.saturating_add(delay));
        self.generation
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<i64> {
        self.deadline
    }

    /// Disarm and return the generation if the deadline has passed.
    pub fn take_due(&mut self, now_ms: i64) -> Option<u64> {
        match self.deadline {
            Some(deadline) if deadline <= now_ms => {
                self.deadline = None;
                Some(self.generation)
            }
            _ => None,
        }
    }

    /// Disarm regardless of the deadline. Returns the generation if something
    /// was pending.
    pub fn flush(&mut self) -> Option<u64> {
        self.deadline.take().map(|_| self.generation)
    }

    /// Disarm without firing. Bumps the generation so the next schedule never
    /// reuses a cancelled one.
    pub fn cancel(&mut self) {
        if self.deadline.take().is_some() {
            self.generation += 1;
        }
    }
}
