use std::os::fd::RawFd;

/// A readiness report for one descriptor.
///
/// Produced by the poller for every descriptor whose `revents` came back
/// non-zero, in the order the descriptors were submitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Event {
    /// The descriptor that became ready.
    pub(crate) fd: RawFd,

    /// Readable, or the writer side hung up (EOF is pending).
    pub(crate) readable: bool,

    /// Writable, or the reader side went away (so a write fails fast).
    pub(crate) writable: bool,
}
