use crate::error::{Error, Result};
use crate::io;
use crate::reactor::future::IoFuture;
use crate::reactor::poller::platform::sys_timerfd;

use std::os::fd::{AsFd, AsRawFd, BorrowedFd, OwnedFd, RawFd};
use std::time::Duration;

/// Size of a `timerfd` read: the expiration count as a native `u64`.
const EXPIRATIONS_LEN: usize = size_of::<u64>();

/// A periodic readiness source backed by a non-blocking `timerfd`.
///
/// To the scheduler it is an ordinary readable descriptor: it becomes
/// readable once per elapsed interval, and a read returns how many
/// intervals elapsed since the previous read.
#[derive(Debug)]
pub struct Timer {
    fd: OwnedFd,
    interval: Duration,
}

impl Timer {
    /// Creates a timer firing every `interval`, starting one `interval`
    /// from now.
    ///
    /// # Errors
    ///
    /// [`Error::Setup`] if `interval` is zero (which would disarm the
    /// timer) or the kernel refuses the timer.
    pub fn periodic(interval: Duration) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::Setup {
                what: "timer",
                source: std::io::Error::new(
                    std::io::ErrorKind::InvalidInput,
                    "timer interval must be non-zero",
                ),
            });
        }

        let fd = sys_timerfd(interval).map_err(|source| Error::Setup {
            what: "timer",
            source,
        })?;

        Ok(Self { fd, interval })
    }

    /// Period the timer was armed with.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Issues the read of the expiration counter on the current scheduler.
    pub fn read(&self) -> IoFuture {
        io::read(self.fd.as_raw_fd(), EXPIRATIONS_LEN)
    }

    /// Waits for the next expiration and returns how many intervals
    /// elapsed since the previous tick (at least 1).
    pub async fn tick(&self) -> Result<u64> {
        let fd = self.fd.as_raw_fd();
        let completion = self.read().await.check()?;

        Self::expirations(completion.buffer()).ok_or_else(|| Error::Io {
            fd,
            source: std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "short read from timer",
            ),
        })
    }

    /// Decodes the buffer of a timer read.
    pub fn expirations(buffer: &[u8]) -> Option<u64> {
        let bytes: [u8; EXPIRATIONS_LEN] = buffer.try_into().ok()?;
        Some(u64::from_ne_bytes(bytes))
    }
}

impl AsRawFd for Timer {
    fn as_raw_fd(&self) -> RawFd {
        self.fd.as_raw_fd()
    }
}

impl AsFd for Timer {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.fd.as_fd()
    }
}
