use libc::{POLLIN, POLLOUT, c_short};

/// The kind of non-blocking operation and the readiness it waits for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Interest {
    /// A `read(2)`; waits for the descriptor to become readable.
    Read,

    /// A `write(2)`; waits for the descriptor to become writable.
    Write,
}

impl Interest {
    /// The `poll(2)` event mask matching this interest.
    pub(crate) fn poll_events(self) -> c_short {
        match self {
            Interest::Read => POLLIN,
            Interest::Write => POLLOUT,
        }
    }
}
