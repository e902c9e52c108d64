use super::Scheduler;
use crate::reactor::table::MAX_FD;

/// Builder for configuring and creating a scheduler.
///
/// The only knob is the descriptor bound: the table has one slot per
/// descriptor in `[0, max_fd)` and the bound never changes afterwards.
///
/// # Examples
///
/// ```rust,ignore
/// let scheduler = SchedulerBuilder::new()
///     .max_fd(256)
///     .build();
/// ```
#[derive(Clone, Debug)]
pub struct SchedulerBuilder {
    /// Exclusive upper bound on accepted descriptors.
    max_fd: usize,
}

impl SchedulerBuilder {
    /// Creates a builder using [`MAX_FD`] slots.
    pub fn new() -> Self {
        Self { max_fd: MAX_FD }
    }

    /// Sets the number of descriptor slots.
    ///
    /// # Panics
    ///
    /// Panics if `n == 0`.
    pub fn max_fd(mut self, n: usize) -> Self {
        assert!(n > 0, "max_fd must be > 0");

        self.max_fd = n;
        self
    }

    /// Builds the scheduler with the configured options.
    pub fn build(self) -> Scheduler {
        Scheduler::with_max_fd(self.max_fd)
    }
}

impl Default for SchedulerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
