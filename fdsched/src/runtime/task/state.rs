/// Task is suspended and not scheduled.
///
/// Also the state a task is in while it is being polled, so a wake during
/// its own poll queues it again.
pub(crate) const IDLE: usize = 0;

/// Task sits in the run queue waiting to be polled.
pub(crate) const QUEUED: usize = 1;

/// Task has completed execution.
///
/// The future has returned `Poll::Ready` and further wakes are ignored.
pub(crate) const COMPLETED: usize = 2;
