use std::io;
use std::os::fd::RawFd;

/// Errors surfaced by the scheduler and the tasks it drives.
///
/// Transient interruptions and would-block conditions never show up here;
/// they are absorbed by the operation retry protocol.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The readiness wait (`poll(2)`) failed with something other than `EINTR`.
    #[error("readiness wait failed: {0}")]
    Wait(#[source] io::Error),

    /// Nothing is pending on any descriptor and no task is runnable.
    ///
    /// Waiting in this state would block forever.
    #[error("scheduler is idle: no pending operation and no runnable task")]
    Idle,

    /// Creating or configuring a descriptor failed.
    #[error("failed to set up {what}: {source}")]
    Setup {
        what: &'static str,
        #[source]
        source: io::Error,
    },

    /// A provisioned descriptor does not fit in the scheduler's table.
    #[error("descriptor {fd} is outside the table bound [0, {max_fd})")]
    OutOfBound { fd: RawFd, max_fd: usize },

    /// A completed operation reported an I/O error to its task.
    #[error("I/O error on descriptor {fd}: {source}")]
    Io {
        fd: RawFd,
        #[source]
        source: io::Error,
    },

    /// Writing scenario output to its sink failed.
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
