use crate::runtime::core::Handle;

use std::cell::RefCell;

thread_local! {
    /// Handle to the scheduler polling the current task.
    ///
    /// Set while a task is polled, so I/O requests and spawns issued from
    /// inside a task reach their scheduler without explicit parameters.
    pub(crate) static CURRENT_HANDLE: RefCell<Option<Handle>> =
        const { RefCell::new(None) };
}

/// Runs `f` with `handle` installed as the current scheduler.
///
/// The previous handle is restored afterwards, so a task spawned (and
/// therefore polled) from inside another task sees the right scheduler.
/// It is also restored when `f` unwinds.
pub(crate) fn enter_context<R>(handle: Handle, f: impl FnOnce() -> R) -> R {
    let previous = CURRENT_HANDLE.with(|cell| cell.replace(Some(handle)));
    let _guard = ContextGuard { previous };

    f()
}

/// Puts the previous handle back on drop.
struct ContextGuard {
    previous: Option<Handle>,
}

impl Drop for ContextGuard {
    fn drop(&mut self) {
        let previous = self.previous.take();
        CURRENT_HANDLE.with(|cell| cell.replace(previous));
    }
}
