//! Descriptor readiness and the operations waiting on it.
//!
//! This module holds the I/O half of the scheduler:
//! - operations: one non-blocking `read`/`write` attempt and its result,
//! - the descriptor table mapping each descriptor to its pending operation,
//! - the `poll(2)` front-end used by the event loop,
//! - the future tasks await to issue requests.

mod event;

pub(crate) mod future;
pub(crate) mod operation;
pub(crate) mod poller;
pub(crate) mod table;
