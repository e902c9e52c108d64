use crate::reactor::operation::{Completion, Operation};
use crate::runtime::Handle;

use std::cell::RefCell;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Not polled yet: the syscall has not been attempted.
    Idle,

    /// Would have blocked; the operation holds the descriptor's table slot.
    Registered,

    /// The completion has been handed out.
    Done,
}

/// A read or write request on a non-blocking descriptor.
///
/// Created by [`Handle::request_io`] and its shorthands. The first poll
/// attempts the syscall; if that completes the future is ready right
/// away. Otherwise it registers with the scheduler and resolves once a
/// pump has retried the syscall successfully.
///
/// The descriptor **must** be in non-blocking mode.
#[must_use = "I/O requests do nothing unless awaited"]
pub struct IoFuture {
    handle: Handle,
    operation: Rc<RefCell<Operation>>,
    state: State,
}

impl IoFuture {
    pub(crate) fn new(handle: Handle, operation: Operation) -> Self {
        Self {
            handle,
            operation: Rc::new(RefCell::new(operation)),
            state: State::Idle,
        }
    }
}

impl Future for IoFuture {
    type Output = Completion;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Completion> {
        let this = self.get_mut();

        match this.state {
            State::Idle => {
                let mut operation = this.operation.borrow_mut();

                if operation.attempt() {
                    this.state = State::Done;
                    return Poll::Ready(operation.take_completion());
                }

                let fd = operation.fd();
                operation.set_waker(cx.waker());
                drop(operation);

                this.handle.register(fd, &this.operation);
                this.state = State::Registered;

                tracing::trace!(fd, "suspended on descriptor");

                Poll::Pending
            }

            State::Registered => {
                let mut operation = this.operation.borrow_mut();

                if operation.is_completed() {
                    this.state = State::Done;

                    tracing::trace!(fd = operation.fd(), "resumed");

                    return Poll::Ready(operation.take_completion());
                }

                // Woken by something other than readiness; keep waiting.
                operation.set_waker(cx.waker());

                Poll::Pending
            }

            State::Done => panic!("IoFuture polled after completion"),
        }
    }
}

impl Drop for IoFuture {
    fn drop(&mut self) {
        if self.state != State::Registered {
            return;
        }

        let fd = self.operation.borrow().fd();
        self.handle.deregister(fd, &self.operation);
    }
}
