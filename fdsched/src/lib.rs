//! # fdsched
//!
//! **fdsched** is a single-threaded cooperative scheduler that drives
//! tasks whose progress depends on readiness of non-blocking file
//! descriptors.
//!
//! Multiplexing is done directly with `poll(2)`:
//!
//! - a **descriptor table** with one slot per descriptor below a fixed
//!   bound, holding at most one pending operation each,
//! - **operations** that attempt their `read`/`write` immediately and only
//!   suspend the task when the syscall would block,
//! - an **event loop** ([`Handle::pump_events`]) that waits for readiness,
//!   retries the waiting operations and resumes the tasks whose operation
//!   completed, strictly after the readiness scan is over.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use fdsched::{Scheduler, fd, io};
//! use std::os::fd::AsRawFd;
//!
//! let scheduler = Scheduler::new();
//! let pipe = fd::pipe()?;
//! let (reader, writer) = pipe.raw_fds();
//!
//! scheduler.spawn(async move {
//!     let packet = io::read(reader, 64).await;
//!     println!("got {:?}", packet.buffer());
//! });
//!
//! scheduler.spawn(async move {
//!     io::write(writer, "hello").await;
//! });
//! ```
//!
//! ## Modules
//!
//! - [`io`]: read/write requests issued from inside a task
//! - [`fd`]: non-blocking pipes and periodic timers
//! - [`task`]: spawning from inside a task
//! - [`fizzbuzz`]: the three-stream reference scenario
//!
//! Linux only: descriptor provisioning uses `pipe2(O_DIRECT)` and
//! `timerfd`.

mod error;
mod reactor;
mod runtime;
mod utils;

pub mod fd;
pub mod fizzbuzz;
pub mod io;

pub use error::{Error, Result};
pub use reactor::future::IoFuture;
pub use reactor::operation::Completion;
pub use reactor::poller::common::Interest;
pub use reactor::table::MAX_FD;
pub use runtime::builder::SchedulerBuilder;
pub use runtime::task;
pub use runtime::task::spawn;
pub use runtime::{Handle, Scheduler};

pub use fdsched_macros::*;
