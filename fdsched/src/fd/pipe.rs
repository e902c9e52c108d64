use crate::error::{Error, Result};
use crate::reactor::poller::platform::sys_pipe;

use std::os::fd::{AsRawFd, OwnedFd, RawFd};

/// Both ends of a non-blocking packet-mode pipe.
///
/// Each `write` of at most `PIPE_BUF` bytes is delivered as one packet, and
/// each `read` returns at most one packet. Dropping an end closes it.
#[derive(Debug)]
pub struct Pipe {
    pub reader: OwnedFd,
    pub writer: OwnedFd,
}

impl Pipe {
    /// Raw descriptors as `(reader, writer)`.
    pub fn raw_fds(&self) -> (RawFd, RawFd) {
        (self.reader.as_raw_fd(), self.writer.as_raw_fd())
    }
}

/// Creates a [`Pipe`] with `O_DIRECT | O_NONBLOCK | O_CLOEXEC`.
pub fn pipe() -> Result<Pipe> {
    let (reader, writer) = sys_pipe().map_err(|source| Error::Setup {
        what: "pipe",
        source,
    })?;

    tracing::trace!(
        reader = reader.as_raw_fd(),
        writer = writer.as_raw_fd(),
        "pipe created"
    );

    Ok(Pipe { reader, writer })
}
