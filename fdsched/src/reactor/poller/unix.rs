use libc::{
    CLOCK_MONOTONIC, F_GETFL, F_SETFL, O_CLOEXEC, O_DIRECT, O_NONBLOCK, TFD_CLOEXEC, TFD_NONBLOCK,
    c_int, fcntl, itimerspec, nfds_t, pipe2, poll, pollfd, read, timerfd_create, timerfd_settime,
    timespec, write,
};
use std::io;
use std::os::fd::{FromRawFd, OwnedFd, RawFd};
use std::time::Duration;

/// Reads from a file descriptor into the given buffer.
///
/// Returns the number of bytes read, or a negative value on error.
/// The file descriptor **must** be non-blocking.
pub(crate) fn sys_read(fd: RawFd, buffer: &mut [u8]) -> isize {
    unsafe { read(fd, buffer.as_mut_ptr() as *mut _, buffer.len()) }
}

/// Writes the buffer to a file descriptor.
///
/// Returns the number of bytes written, or a negative value on error.
/// The file descriptor **must** be non-blocking.
pub(crate) fn sys_write(fd: RawFd, buffer: &[u8]) -> isize {
    unsafe { write(fd, buffer.as_ptr() as *const _, buffer.len()) }
}

/// Returns the calling thread's current `errno`.
pub(crate) fn last_errno() -> i32 {
    io::Error::last_os_error().raw_os_error().unwrap_or(0)
}

/// Returns `true` for the codes signalling "try again once ready".
pub(crate) fn is_would_block(errno: i32) -> bool {
    errno == libc::EAGAIN || errno == libc::EWOULDBLOCK
}

/// Sets a file descriptor to non-blocking mode.
pub(crate) fn sys_set_nonblocking(fd: RawFd) -> io::Result<()> {
    let flags = unsafe { fcntl(fd, F_GETFL) };
    if flags < 0 {
        return Err(io::Error::last_os_error());
    }

    let rc = unsafe { fcntl(fd, F_SETFL, flags | O_NONBLOCK) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(())
}

/// Creates a non-blocking packet-mode pipe.
///
/// With `O_DIRECT` every `write` up to `PIPE_BUF` bytes becomes one packet
/// and every `read` consumes at most one packet.
///
/// Returns `(reader, writer)`.
pub(crate) fn sys_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds: [c_int; 2] = [-1; 2];

    let rc = unsafe { pipe2(fds.as_mut_ptr(), O_DIRECT | O_NONBLOCK | O_CLOEXEC) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    let reader = unsafe { OwnedFd::from_raw_fd(fds[0]) };
    let writer = unsafe { OwnedFd::from_raw_fd(fds[1]) };

    Ok((reader, writer))
}

/// Creates a non-blocking monotonic `timerfd` armed to fire every `interval`.
///
/// The first expiration happens one `interval` after creation.
pub(crate) fn sys_timerfd(interval: Duration) -> io::Result<OwnedFd> {
    let raw = unsafe { timerfd_create(CLOCK_MONOTONIC, TFD_NONBLOCK | TFD_CLOEXEC) };
    if raw < 0 {
        return Err(io::Error::last_os_error());
    }

    let fd = unsafe { OwnedFd::from_raw_fd(raw) };

    let period = timespec {
        tv_sec: interval.as_secs() as _,
        tv_nsec: interval.subsec_nanos() as _,
    };
    let spec = itimerspec {
        it_interval: period,
        it_value: period,
    };

    let rc = unsafe { timerfd_settime(raw, 0, &spec, std::ptr::null_mut()) };
    if rc < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(fd)
}

/// Waits on the given descriptors with `poll(2)`.
///
/// `None` blocks indefinitely. Returns the number of entries with
/// non-zero `revents`; `EINTR` is reported as an error for the caller to
/// retry.
pub(crate) fn sys_poll(fds: &mut [pollfd], timeout: Option<Duration>) -> io::Result<usize> {
    let timeout_ms = timeout
        .map(|t| t.as_millis().min(c_int::MAX as u128) as c_int)
        .unwrap_or(-1);

    let n = unsafe { poll(fds.as_mut_ptr(), fds.len() as nfds_t, timeout_ms) };
    if n < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(n as usize)
}

/// Signal delivery to a single thread, for exercising `EINTR` paths.
#[cfg(test)]
pub(crate) mod interrupt {
    use std::sync::Once;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread::{self, JoinHandle};
    use std::time::Duration;

    static DELIVERED: AtomicUsize = AtomicUsize::new(0);
    static INSTALL: Once = Once::new();

    extern "C" fn on_signal(_: libc::c_int) {
        DELIVERED.fetch_add(1, Ordering::SeqCst);
    }

    /// Installs a no-op `SIGUSR1` handler without `SA_RESTART`, so blocking
    /// syscalls it interrupts fail with `EINTR`.
    fn install() {
        INSTALL.call_once(|| unsafe {
            let mut action: libc::sigaction = std::mem::zeroed();
            action.sa_sigaction = on_signal as extern "C" fn(libc::c_int) as libc::sighandler_t;
            action.sa_flags = 0;
            libc::sigemptyset(&mut action.sa_mask);

            assert_eq!(
                libc::sigaction(libc::SIGUSR1, &action, std::ptr::null_mut()),
                0
            );
        });
    }

    /// Number of signals handled so far, process wide.
    pub(crate) fn delivered() -> usize {
        DELIVERED.load(Ordering::SeqCst)
    }

    /// Sends `SIGUSR1` to the calling thread after `delay`, then runs
    /// `then` on the helper thread once the same delay has passed again.
    pub(crate) fn interrupt_then<F>(delay: Duration, then: F) -> JoinHandle<()>
    where
        F: FnOnce() + Send + 'static,
    {
        install();

        let target = unsafe { libc::pthread_self() };

        thread::spawn(move || {
            thread::sleep(delay);
            unsafe { libc::pthread_kill(target, libc::SIGUSR1) };

            thread::sleep(delay);
            then();
        })
    }
}

/// Creates a pipe in blocking mode.
#[cfg(test)]
pub(crate) fn blocking_pipe() -> io::Result<(OwnedFd, OwnedFd)> {
    let mut fds: [c_int; 2] = [-1; 2];

    if unsafe { libc::pipe(fds.as_mut_ptr()) } < 0 {
        return Err(io::Error::last_os_error());
    }

    Ok(unsafe { (OwnedFd::from_raw_fd(fds[0]), OwnedFd::from_raw_fd(fds[1])) })
}
