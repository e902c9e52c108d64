use crate::runtime::task::TaskHeader;

use std::mem;
use std::sync::Arc;
use std::task::{RawWaker, RawWakerVTable, Waker};

/// The vtable shared by every task waker.
///
/// All functions uphold the [`RawWaker`] contract: the data pointer always
/// comes from `Arc::into_raw` on an `Arc<TaskHeader>` and every clone/drop
/// adjusts the reference count exactly once.
static VTABLE: RawWakerVTable = RawWakerVTable::new(clone_raw, wake_raw, wake_by_ref_raw, drop_raw);

/// Creates the continuation handle for a task.
///
/// Waking it queues the task on its scheduler's run queue.
pub(crate) fn make_waker(task: Arc<TaskHeader>) -> Waker {
    unsafe { Waker::from_raw(RawWaker::new(Arc::into_raw(task) as *const (), &VTABLE)) }
}

/// Clones the waker: one more strong reference to the task header.
fn clone_raw(ptr: *const ()) -> RawWaker {
    let arc = unsafe { Arc::<TaskHeader>::from_raw(ptr as *const TaskHeader) };
    let cloned = arc.clone();
    mem::forget(arc);

    RawWaker::new(Arc::into_raw(cloned) as *const (), &VTABLE)
}

/// Wakes the task and consumes the waker's reference.
fn wake_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<TaskHeader>::from_raw(ptr as *const TaskHeader) };
    arc.wake();
}

/// Wakes the task, leaving the waker's reference untouched.
fn wake_by_ref_raw(ptr: *const ()) {
    let arc = unsafe { Arc::<TaskHeader>::from_raw(ptr as *const TaskHeader) };
    arc.clone().wake();
    mem::forget(arc);
}

/// Releases the waker's reference to the task header.
fn drop_raw(ptr: *const ()) {
    drop(unsafe { Arc::<TaskHeader>::from_raw(ptr as *const TaskHeader) });
}
