//! I/O requests issued from inside a task.
//!
//! These are shorthands for the [`Handle`] methods of the same name,
//! called on [`Handle::current`].
//!
//! # Panics
//!
//! Every function panics when called outside a task running on a
//! scheduler, or with a descriptor outside the scheduler's bound.

use crate::error::Result;
use crate::reactor::future::IoFuture;
use crate::reactor::poller::common::Interest;
use crate::runtime::Handle;

use std::os::fd::RawFd;

pub use crate::reactor::operation::Completion;

/// See [`Handle::request_io`].
pub fn request_io(fd: RawFd, buffer: Vec<u8>, interest: Interest) -> IoFuture {
    Handle::current().request_io(fd, buffer, interest)
}

/// See [`Handle::read`].
pub fn read(fd: RawFd, len: usize) -> IoFuture {
    Handle::current().read(fd, len)
}

/// See [`Handle::write`].
pub fn write(fd: RawFd, data: impl Into<Vec<u8>>) -> IoFuture {
    Handle::current().write(fd, data)
}

/// See [`Handle::write_all`].
pub async fn write_all(fd: RawFd, data: impl Into<Vec<u8>>) -> Result<usize> {
    let handle = Handle::current();
    handle.write_all(fd, data).await
}
