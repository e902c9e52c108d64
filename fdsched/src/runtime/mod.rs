//! Task execution and the event loop.
//!
//! The scheduler is single-threaded and cooperative: tasks only give up
//! control when an I/O request would block, and the only blocking call is
//! the readiness wait inside [`Handle::pump_events`].

mod core;
mod queue;

pub(crate) mod builder;
pub(crate) mod context;

pub mod task;

pub use self::core::{Handle, Scheduler};
