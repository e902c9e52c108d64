//! Readiness polling and the raw system calls behind it.
//!
//! The scheduler only needs POSIX `read`, `write` and `poll`; descriptor
//! provisioning (`pipe2`, `timerfd`) is Linux specific.

pub(crate) mod common;

mod poll;

pub(crate) type Poller = poll::PollPoller;

#[cfg(target_os = "linux")]
pub(crate) mod unix;

#[cfg(target_os = "linux")]
pub(crate) use unix as platform;
