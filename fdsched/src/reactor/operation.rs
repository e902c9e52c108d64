use crate::error::{Error, Result};
use crate::reactor::poller::common::Interest;
use crate::reactor::poller::platform::{is_would_block, last_errno, sys_read, sys_write};

use std::io;
use std::os::fd::RawFd;
use std::task::Waker;

/// One read or write request bound to a descriptor.
///
/// The issuing future owns the operation; the descriptor table only keeps
/// a weak reference to it while it waits for readiness.
pub(crate) struct Operation {
    /// Descriptor the syscall targets.
    fd: RawFd,

    /// Whether this is a read or a write.
    interest: Interest,

    /// Destination for reads, source for writes.
    buffer: Vec<u8>,

    /// Bytes transferred by the last attempt.
    bytes: usize,

    /// `errno` of the last attempt, 0 on success.
    errno: i32,

    /// Set once an attempt produced a final result.
    completed: bool,

    /// Continuation of the suspended task.
    waker: Option<Waker>,
}

impl Operation {
    pub(crate) fn new(fd: RawFd, interest: Interest, buffer: Vec<u8>) -> Self {
        Self {
            fd,
            interest,
            buffer,
            bytes: 0,
            errno: 0,
            completed: false,
            waker: None,
        }
    }

    pub(crate) fn fd(&self) -> RawFd {
        self.fd
    }

    pub(crate) fn is_completed(&self) -> bool {
        self.completed
    }

    /// Performs one non-blocking syscall.
    ///
    /// Returns `true` when the result is final: any byte count (0 included)
    /// or any error other than would-block. `EINTR` is retried in place.
    pub(crate) fn attempt(&mut self) -> bool {
        loop {
            let n = match self.interest {
                Interest::Read => sys_read(self.fd, &mut self.buffer),
                Interest::Write => sys_write(self.fd, &self.buffer),
            };

            if n >= 0 {
                self.bytes = n as usize;
                self.errno = 0;
                break;
            }

            let errno = last_errno();
            if errno == libc::EINTR {
                continue;
            }

            self.bytes = 0;
            self.errno = errno;
            break;
        }

        self.completed = !is_would_block(self.errno);

        tracing::trace!(
            fd = self.fd,
            interest = ?self.interest,
            bytes = self.bytes,
            errno = self.errno,
            completed = self.completed,
            "attempt"
        );

        self.completed
    }

    /// Readiness the scheduler has to wait for before retrying.
    pub(crate) fn readiness_event(&self) -> Interest {
        self.interest
    }

    /// Attempts again; hands back the continuation once the result is final.
    pub(crate) fn retry(&mut self) -> Option<Waker> {
        if self.attempt() { self.waker.take() } else { None }
    }

    /// Stores (or replaces) the continuation to resume on completion.
    pub(crate) fn set_waker(&mut self, waker: &Waker) {
        match &self.waker {
            Some(current) if current.will_wake(waker) => {}
            _ => self.waker = Some(waker.clone()),
        }
    }

    /// Moves the final result out of the operation.
    ///
    /// # Panics
    ///
    /// Panics if the operation has not completed.
    pub(crate) fn take_completion(&mut self) -> Completion {
        assert!(self.completed, "operation on fd {} is still pending", self.fd);

        let mut buffer = std::mem::take(&mut self.buffer);
        if self.interest == Interest::Read {
            buffer.truncate(self.bytes);
        }

        Completion {
            fd: self.fd,
            interest: self.interest,
            bytes: self.bytes,
            errno: self.errno,
            buffer,
        }
    }
}

/// Final result of a read or write request.
///
/// A completion never carries a would-block code. Callers must look at
/// [`errno`](Self::errno) (or use [`check`](Self::check)) rather than just
/// the byte count: a failed request reports 0 bytes.
#[derive(Debug)]
pub struct Completion {
    fd: RawFd,
    interest: Interest,
    bytes: usize,
    errno: i32,
    buffer: Vec<u8>,
}

impl Completion {
    /// Descriptor the request was issued on.
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Whether the request was a read or a write.
    pub fn interest(&self) -> Interest {
        self.interest
    }

    /// Bytes transferred. 0 with `errno() == 0` on a read means EOF.
    pub fn bytes(&self) -> usize {
        self.bytes
    }

    /// OS error code, 0 on success.
    pub fn errno(&self) -> i32 {
        self.errno
    }

    /// Whether the request succeeded (`errno() == 0`).
    pub fn is_ok(&self) -> bool {
        self.errno == 0
    }

    /// For reads, the bytes that were read. For writes, the submitted
    /// buffer (of which the first [`bytes`](Self::bytes) were written).
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    /// Takes the buffer back, e.g. to reuse it for the next request.
    pub fn into_buffer(self) -> Vec<u8> {
        self.buffer
    }

    /// Converts into the standard I/O result shape.
    pub fn into_result(self) -> io::Result<usize> {
        if self.errno == 0 {
            Ok(self.bytes)
        } else {
            Err(io::Error::from_raw_os_error(self.errno))
        }
    }

    /// Passes a successful completion through, turns a failed one into
    /// [`Error::Io`].
    pub fn check(self) -> Result<Self> {
        if self.errno == 0 {
            Ok(self)
        } else {
            Err(Error::Io {
                fd: self.fd,
                source: io::Error::from_raw_os_error(self.errno),
            })
        }
    }
}
