//! Descriptor provisioning.
//!
//! The scheduler itself never opens descriptors or changes their mode; it
//! expects non-blocking descriptors below its bound. These helpers create
//! the two kinds the reference scenario needs:
//! - packet-mode pipes ([`pipe`]),
//! - periodic timers ([`Timer`]).

mod pipe;
mod timer;

pub use pipe::{Pipe, pipe};
pub use timer::Timer;

use crate::error::{Error, Result};
use crate::reactor::poller::platform::sys_set_nonblocking;

use std::os::fd::{AsFd, AsRawFd};

/// Puts an existing descriptor in non-blocking mode.
pub fn set_nonblocking(fd: impl AsFd) -> Result<()> {
    sys_set_nonblocking(fd.as_fd().as_raw_fd()).map_err(|source| Error::Setup {
        what: "non-blocking mode",
        source,
    })
}
