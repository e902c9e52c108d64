use super::state::{COMPLETED, IDLE, QUEUED};
use crate::runtime::context::CURRENT_HANDLE;
use crate::runtime::queue::RunQueue;

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Identifier of a task: its slot in the scheduler's task slab.
pub type TaskId = usize;

/// The boxed future a task drives.
pub(crate) type TaskFuture = Pin<Box<dyn Future<Output = ()>>>;

/// The part of a task its wakers point at.
///
/// It carries no future, only what a wake needs: the slot to run and the
/// queue to push it on.
pub(crate) struct TaskHeader {
    /// Slot of the task in the scheduler's slab.
    pub(crate) id: TaskId,

    /// Lifecycle state (`IDLE`, `QUEUED`, `COMPLETED`).
    pub(crate) state: AtomicUsize,

    /// Run queue of the owning scheduler.
    queue: Arc<RunQueue>,
}

impl TaskHeader {
    pub(crate) fn new(id: TaskId, queue: Arc<RunQueue>) -> Self {
        Self {
            id,
            state: AtomicUsize::new(IDLE),
            queue,
        }
    }

    /// Resumes the task by queueing it.
    ///
    /// Only an `IDLE` task is queued; waking a task that is already queued
    /// or has completed does nothing.
    pub(crate) fn wake(self: Arc<Self>) {
        if self
            .state
            .compare_exchange(IDLE, QUEUED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            tracing::trace!(task = self.id, "task woken");
            self.queue.push(self.clone());
        }
    }

    /// Marks the task as being polled. Wakes from now on queue it again.
    pub(crate) fn begin_poll(&self) {
        self.state.store(IDLE, Ordering::Release);
    }

    pub(crate) fn complete(&self) {
        self.state.store(COMPLETED, Ordering::Release);
    }
}

/// A spawned task as stored by the scheduler.
pub(crate) struct Task {
    pub(crate) header: Arc<TaskHeader>,

    /// `None` while the future is being polled.
    pub(crate) future: Option<TaskFuture>,
}

/// Spawns a task onto the scheduler running the current task.
///
/// Like [`Handle::spawn`](crate::Handle::spawn), the task runs right away
/// until it first suspends.
///
/// # Panics
///
/// Panics if called outside a task driven by a scheduler.
pub fn spawn<F>(future: F) -> TaskId
where
    F: Future<Output = ()> + 'static,
{
    let handle = CURRENT_HANDLE.with(|cell| {
        cell.borrow()
            .as_ref()
            .expect("spawn must be called from a task running on a scheduler")
            .clone()
    });

    handle.spawn(future)
}
