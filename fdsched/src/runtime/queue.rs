use crate::runtime::task::TaskHeader;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// FIFO of tasks whose continuation has been woken.
///
/// Wakers must be `Send + Sync`, so the queue sits behind a mutex even
/// though only the scheduler thread ever drains it.
pub(crate) struct RunQueue {
    inner: Mutex<VecDeque<Arc<TaskHeader>>>,
}

impl RunQueue {
    pub(crate) fn new() -> Self {
        Self {
            inner: Mutex::new(VecDeque::new()),
        }
    }

    /// Appends a woken task at the back.
    pub(crate) fn push(&self, task: Arc<TaskHeader>) {
        self.inner.lock().unwrap().push_back(task);
    }

    /// Takes the oldest woken task.
    pub(crate) fn pop(&self) -> Option<Arc<TaskHeader>> {
        self.inner.lock().unwrap().pop_front()
    }

    pub(crate) fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}
