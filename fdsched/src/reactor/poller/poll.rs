//! `poll(2)`-based readiness poller.
//!
//! The descriptor table is small and rebuilt on every pump, so a plain
//! `poll` over a freshly filled array is enough. It also keeps the reported
//! order identical to the submitted order (ascending descriptors), which the
//! scheduler relies on.

use super::common::Interest;
use super::platform::sys_poll;
use crate::reactor::event::Event;

use libc::{POLLERR, POLLHUP, POLLIN, POLLNVAL, POLLOUT, pollfd};
use std::io;
use std::os::fd::RawFd;
use std::time::Duration;

/// Reusable `poll(2)` front-end.
pub(crate) struct PollPoller {
    /// Scratch array handed to the kernel.
    fds: Vec<pollfd>,
}

impl PollPoller {
    /// Creates a poller sized for `capacity` descriptors.
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            fds: Vec::with_capacity(capacity),
        }
    }

    /// Waits for readiness on `interests`.
    ///
    /// Blocks until at least one descriptor is ready, or until `timeout`
    /// expires when one is given. A wait interrupted by a signal is
    /// restarted. Ready descriptors are appended to `events` in the order
    /// they appear in `interests`.
    pub(crate) fn poll(
        &mut self,
        interests: &[(RawFd, Interest)],
        events: &mut Vec<Event>,
        timeout: Option<Duration>,
    ) -> io::Result<()> {
        self.fds.clear();
        self.fds.extend(interests.iter().map(|&(fd, interest)| pollfd {
            fd,
            events: interest.poll_events(),
            revents: 0,
        }));

        events.clear();

        loop {
            match sys_poll(&mut self.fds, timeout) {
                Ok(_) => break,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            }
        }

        for entry in &self.fds {
            if entry.revents == 0 {
                continue;
            }

            let readable = entry.revents & (POLLIN | POLLHUP | POLLERR | POLLNVAL) != 0;
            let writable = entry.revents & (POLLOUT | POLLERR | POLLNVAL) != 0;

            events.push(Event {
                fd: entry.fd,
                readable,
                writable,
            });
        }

        Ok(())
    }
}
