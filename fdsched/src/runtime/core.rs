use crate::error::{Error, Result};
use crate::reactor::future::IoFuture;
use crate::reactor::operation::Operation;
use crate::reactor::poller::Poller;
use crate::reactor::poller::common::Interest;
use crate::reactor::table::DescriptorTable;
use crate::runtime::builder::SchedulerBuilder;
use crate::runtime::context::{CURRENT_HANDLE, enter_context};
use crate::runtime::queue::RunQueue;
use crate::runtime::task::waker::make_waker;
use crate::runtime::task::{Task, TaskHeader, TaskId};
use crate::utils::Slab;

use std::cell::RefCell;
use std::future::Future;
use std::io;
use std::ops::Deref;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

/// State shared by a scheduler and all of its handles.
struct Shared {
    /// Descriptor to pending operation.
    table: RefCell<DescriptorTable>,

    /// Readiness wait front-end.
    poller: RefCell<Poller>,

    /// Every live task, keyed by [`TaskId`].
    tasks: RefCell<Slab<Task>>,

    /// Tasks whose continuation has been woken, in wake order.
    queue: Arc<RunQueue>,
}

/// A cloneable reference to a scheduler.
///
/// Tasks receive one implicitly (see [`Handle::current`]); the driver gets
/// one through [`Scheduler`]'s `Deref`. All methods must be called from the
/// scheduler's own thread; the type is `!Send`.
#[derive(Clone)]
pub struct Handle {
    shared: Rc<Shared>,
}

impl Handle {
    fn new(max_fd: usize) -> Self {
        Self {
            shared: Rc::new(Shared {
                table: RefCell::new(DescriptorTable::new(max_fd)),
                poller: RefCell::new(Poller::new(max_fd)),
                tasks: RefCell::new(Slab::new(8)),
                queue: Arc::new(RunQueue::new()),
            }),
        }
    }

    /// The handle of the scheduler polling the current task.
    ///
    /// # Panics
    ///
    /// Panics if called outside a task driven by a scheduler.
    pub fn current() -> Self {
        Self::try_current().expect("no scheduler in context: call from inside a spawned task")
    }

    /// Like [`current`](Self::current), but returns `None` outside a task.
    pub fn try_current() -> Option<Self> {
        CURRENT_HANDLE.with(|cell| cell.borrow().clone())
    }

    /// Exclusive upper bound on descriptors this scheduler accepts.
    pub fn max_fd(&self) -> usize {
        self.shared.table.borrow().capacity()
    }

    /// Launches a task.
    ///
    /// The future is polled immediately and runs until its first
    /// suspension point before `spawn` returns.
    pub fn spawn<F>(&self, future: F) -> TaskId
    where
        F: Future<Output = ()> + 'static,
    {
        let header = {
            let mut tasks = self.shared.tasks.borrow_mut();

            let id = tasks.vacant_key();
            let header = Arc::new(TaskHeader::new(id, self.shared.queue.clone()));

            let inserted = tasks.insert(Task {
                header: header.clone(),
                future: Some(Box::pin(future)),
            });
            debug_assert_eq!(inserted, id);

            header
        };

        tracing::debug!(task = header.id, "task spawned");

        let id = header.id;
        self.run_task(header);
        id
    }

    /// Issues a non-blocking read or write on `fd`.
    ///
    /// The syscall is attempted when the returned future is first polled.
    /// If it completes, the future resolves on that same poll and nothing
    /// is registered. Otherwise the operation takes the descriptor's table
    /// slot and the task suspends until a pump sees `fd` ready and the
    /// retried syscall completes.
    ///
    /// For reads `buffer` is the destination and its length the maximum
    /// read size; for writes it holds the bytes to write.
    ///
    /// # Panics
    ///
    /// Panics if `fd` is outside `[0, max_fd)`. Polling the future panics
    /// if another operation is already pending on `fd`.
    pub fn request_io(&self, fd: RawFd, buffer: Vec<u8>, interest: Interest) -> IoFuture {
        self.shared.table.borrow().check_bound(fd);

        IoFuture::new(self.clone(), Operation::new(fd, interest, buffer))
    }

    /// Reads at most `len` bytes from `fd`.
    pub fn read(&self, fd: RawFd, len: usize) -> IoFuture {
        self.request_io(fd, vec![0; len], Interest::Read)
    }

    /// Writes `data` to `fd` with a single `write(2)`, which may be partial.
    pub fn write(&self, fd: RawFd, data: impl Into<Vec<u8>>) -> IoFuture {
        self.request_io(fd, data.into(), Interest::Write)
    }

    /// Writes all of `data`, issuing further writes after partial ones.
    ///
    /// Resolves with the total byte count, or the first error as
    /// [`Error::Io`].
    pub async fn write_all(&self, fd: RawFd, data: impl Into<Vec<u8>>) -> Result<usize> {
        let mut rest = data.into();
        let mut written = 0;

        while !rest.is_empty() {
            let completion = self.write(fd, rest).await.check()?;
            let n = completion.bytes();

            if n == 0 {
                return Err(Error::Io {
                    fd,
                    source: io::ErrorKind::WriteZero.into(),
                });
            }

            written += n;
            rest = completion.into_buffer();
            rest.drain(..n);
        }

        Ok(written)
    }

    /// Descriptors currently holding a pending operation, ascending.
    pub fn pending(&self) -> Vec<RawFd> {
        self.shared.table.borrow().pending()
    }

    /// Whether `fd` currently holds a pending operation.
    pub fn is_pending(&self, fd: RawFd) -> bool {
        self.shared.table.borrow().contains(fd)
    }

    /// Whether any descriptor holds a pending operation.
    pub fn has_pending(&self) -> bool {
        !self.pending().is_empty()
    }

    /// Number of tasks that have not completed yet.
    pub fn task_count(&self) -> usize {
        self.shared.tasks.borrow().len()
    }

    /// Runs one iteration of the event loop.
    ///
    /// 1. Polls tasks woken outside of readiness, if any.
    /// 2. Waits (without timeout) until at least one descriptor with a
    ///    pending operation is ready. `EINTR` restarts the wait.
    /// 3. Retries the operation of every ready descriptor in ascending
    ///    order; completed ones leave the table and their continuation is
    ///    collected, the others stay registered.
    /// 4. Once the scan is over, resumes the collected continuations in
    ///    collection order.
    ///
    /// Returns the number of tasks polled.
    ///
    /// # Errors
    ///
    /// [`Error::Wait`] if `poll(2)` fails, [`Error::Idle`] if there is
    /// nothing to wait for and nothing ran.
    ///
    /// # Panics
    ///
    /// Panics when called from inside a task of this scheduler.
    pub fn pump_events(&self) -> Result<usize> {
        let nested = CURRENT_HANDLE.with(|cell| {
            cell.borrow()
                .as_ref()
                .is_some_and(|current| Rc::ptr_eq(&current.shared, &self.shared))
        });
        assert!(!nested, "pump_events called from inside a task");

        let mut resumed = self.run_queued();

        let interests = self.shared.table.borrow_mut().interests();
        if interests.is_empty() {
            return if resumed > 0 { Ok(resumed) } else { Err(Error::Idle) };
        }

        // Tasks that woke themselves must not wait behind a blocking poll.
        let timeout = if self.shared.queue.is_empty() {
            None
        } else {
            Some(Duration::ZERO)
        };

        let mut events = Vec::with_capacity(interests.len());
        self.shared
            .poller
            .borrow_mut()
            .poll(&interests, &mut events, timeout)
            .map_err(Error::Wait)?;

        let mut ready = Vec::with_capacity(events.len());
        {
            let mut table = self.shared.table.borrow_mut();

            for event in &events {
                let Some(operation) = table.get(event.fd) else {
                    continue;
                };

                let waker = operation.borrow_mut().retry();

                match waker {
                    Some(waker) => {
                        table.remove(event.fd);
                        ready.push(waker);
                    }
                    None => tracing::trace!(
                        fd = event.fd,
                        readable = event.readable,
                        writable = event.writable,
                        "spurious readiness, operation stays pending"
                    ),
                }
            }
        }

        tracing::debug!(
            polled = interests.len(),
            ready = events.len(),
            completed = ready.len(),
            "pump"
        );

        for waker in ready {
            waker.wake();
        }

        resumed += self.run_queued();

        Ok(resumed)
    }

    /// Pumps until `done` returns `true`. `done` is checked before every pump.
    pub fn run_until(&self, mut done: impl FnMut() -> bool) -> Result<()> {
        while !done() {
            self.pump_events()?;
        }

        Ok(())
    }

    /// Spawns `future` and pumps until it has produced its output.
    ///
    /// # Errors
    ///
    /// Fails with the first pump error, e.g. [`Error::Idle`] when the
    /// future can never make progress.
    pub fn block_on<F>(&self, future: F) -> Result<F::Output>
    where
        F: Future + 'static,
    {
        let output = Rc::new(RefCell::new(None));
        let slot = output.clone();

        self.spawn(async move {
            let value = future.await;
            *slot.borrow_mut() = Some(value);
        });

        self.run_until(|| output.borrow().is_some())?;

        let value = output.borrow_mut().take();
        value.ok_or(Error::Idle)
    }

    /// Records `operation` as pending on `fd`.
    pub(crate) fn register(&self, fd: RawFd, operation: &Rc<RefCell<Operation>>) {
        self.shared.table.borrow_mut().register(fd, operation);
    }

    /// Releases the slot of `fd` if `operation` still holds it.
    pub(crate) fn deregister(&self, fd: RawFd, operation: &Rc<RefCell<Operation>>) {
        if self.shared.table.borrow_mut().remove_if(fd, operation) {
            tracing::trace!(fd, "pending operation dropped");
        }
    }

    /// Polls the tasks queued so far, in queue order.
    ///
    /// Tasks woken while this runs wait for the next call.
    fn run_queued(&self) -> usize {
        let queued = self.shared.queue.len();
        let mut count = 0;

        while count < queued {
            let Some(header) = self.shared.queue.pop() else {
                break;
            };

            self.run_task(header);
            count += 1;
        }

        count
    }

    /// Polls one task up to its next suspension point.
    fn run_task(&self, header: Arc<TaskHeader>) {
        let future = {
            let mut tasks = self.shared.tasks.borrow_mut();

            match tasks.get_mut(header.id) {
                Some(task) if Arc::ptr_eq(&task.header, &header) => task.future.take(),
                _ => None,
            }
        };

        // Completed, or already being polled further up the stack.
        let Some(mut future) = future else {
            return;
        };

        header.begin_poll();

        let waker = make_waker(header.clone());
        let mut cx = Context::from_waker(&waker);

        let poll = enter_context(self.clone(), || future.as_mut().poll(&mut cx));

        match poll {
            Poll::Ready(()) => {
                header.complete();
                self.shared.tasks.borrow_mut().remove(header.id);
                drop(future);

                tracing::debug!(task = header.id, "task completed");
            }
            Poll::Pending => {
                if let Some(task) = self.shared.tasks.borrow_mut().get_mut(header.id) {
                    task.future = Some(future);
                }
            }
        }
    }
}

/// Owner of a scheduler.
///
/// Dereferences to its [`Handle`]. Dropping it drops every task that has
/// not completed, which releases any descriptor slot they still hold.
///
/// # Examples
///
/// ```rust,ignore
/// let scheduler = Scheduler::new();
/// let n = scheduler.block_on(async {
///     let completion = fdsched::io::read(fd, 64).await;
///     completion.bytes()
/// })?;
/// ```
pub struct Scheduler {
    handle: Handle,
}

impl Scheduler {
    /// Creates a scheduler with the default descriptor bound
    /// ([`MAX_FD`](crate::MAX_FD)).
    pub fn new() -> Self {
        SchedulerBuilder::new().build()
    }

    /// Returns a [`SchedulerBuilder`] to configure the descriptor bound.
    pub fn builder() -> SchedulerBuilder {
        SchedulerBuilder::new()
    }

    pub(crate) fn with_max_fd(max_fd: usize) -> Self {
        Self {
            handle: Handle::new(max_fd),
        }
    }

    /// A cloneable handle to this scheduler.
    pub fn handle(&self) -> Handle {
        self.handle.clone()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Deref for Scheduler {
    type Target = Handle;

    fn deref(&self) -> &Handle {
        &self.handle
    }
}

impl Drop for Scheduler {
    /// Drops the remaining tasks.
    ///
    /// Tasks hold handles to the shared state that stores them, so they
    /// are taken out explicitly to break the cycle.
    fn drop(&mut self) {
        let tasks = self.handle.shared.tasks.borrow_mut().drain();

        if !tasks.is_empty() {
            tracing::debug!(tasks = tasks.len(), "dropping unfinished tasks");
        }

        drop(tasks);

        while self.handle.shared.queue.pop().is_some() {}
    }
}
