//! Task primitives.
//!
//! A task is a boxed future plus a small shared header its wakers point
//! at. Waking queues the task on the scheduler's FIFO run queue; the
//! scheduler polls it on its next pass.

pub(crate) mod state;
pub(crate) mod waker;

pub mod core;

pub(crate) use self::core::{Task, TaskHeader};

pub use self::core::{TaskId, spawn};
