use fdsched::{Error, Handle, Scheduler, SchedulerBuilder, fd, io};
use std::cell::{Cell, RefCell};
use std::os::fd::{AsRawFd, FromRawFd, OwnedFd};
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::time::Duration;

const TEST_MAX_FD: usize = 1 << 16;

fn scheduler() -> Scheduler {
    SchedulerBuilder::new().max_fd(TEST_MAX_FD).build()
}

#[test]
fn test_pump_with_nothing_pending_is_idle() {
    let scheduler = scheduler();
    assert!(matches!(scheduler.pump_events(), Err(Error::Idle)));
}

#[test]
fn test_ready_tasks_resume_in_descriptor_order() {
    let scheduler = scheduler();
    let first = fd::pipe().unwrap();
    let second = fd::pipe().unwrap();

    let (low, high) = {
        let a = first.raw_fds();
        let b = second.raw_fds();
        if a.0 < b.0 { (a, b) } else { (b, a) }
    };

    let order = Rc::new(RefCell::new(Vec::new()));

    // Spawned in the opposite order of their descriptors.
    for (reader, _) in [high, low] {
        let order = order.clone();
        scheduler.spawn(async move {
            io::read(reader, 8).await;
            order.borrow_mut().push(reader);
        });
    }

    assert_eq!(scheduler.pending(), vec![low.0, high.0]);

    for (_, writer) in [high, low] {
        scheduler.spawn(async move {
            io::write(writer, "Fizz").await;
        });
    }

    assert_eq!(scheduler.pump_events().unwrap(), 2);
    assert_eq!(*order.borrow(), vec![low.0, high.0]);
    assert!(!scheduler.has_pending());
}

#[test]
fn test_ready_descriptor_that_still_blocks_stays_pending() {
    let scheduler = scheduler();
    let pipe = fd::pipe().unwrap();
    let (reader, writer) = pipe.raw_fds();

    // A second descriptor on the same read end: both report readable for
    // one packet, but only the first retry gets it.
    let duplicate = unsafe { OwnedFd::from_raw_fd(libc::dup(reader)) };
    let (low, high) = if reader < duplicate.as_raw_fd() {
        (reader, duplicate.as_raw_fd())
    } else {
        (duplicate.as_raw_fd(), reader)
    };

    let log = Rc::new(RefCell::new(Vec::new()));

    for fd in [high, low] {
        let log = log.clone();
        scheduler.spawn(async move {
            let completion = io::read(fd, 64).await;
            log.borrow_mut().push((fd, completion.bytes()));
        });
    }
    assert_eq!(scheduler.pending(), vec![low, high]);

    scheduler.spawn(async move {
        io::write(writer, "x").await;
    });

    assert_eq!(scheduler.pump_events().unwrap(), 1);
    assert_eq!(*log.borrow(), vec![(low, 1)]);
    assert_eq!(scheduler.pending(), vec![high]);

    scheduler.spawn(async move {
        io::write(writer, "yz").await;
    });

    assert_eq!(scheduler.pump_events().unwrap(), 1);
    assert_eq!(*log.borrow(), vec![(low, 1), (high, 2)]);
    assert!(!scheduler.has_pending());
}

#[test]
fn test_full_pipe_suspends_writer_until_drained() {
    let scheduler = scheduler();
    let fd::Pipe { reader, writer } = fd::pipe().unwrap();
    let (reader_fd, writer_fd) = (reader.as_raw_fd(), writer.as_raw_fd());

    let written = Rc::new(Cell::new(0usize));
    let stopped = Rc::new(Cell::new(false));

    let w = written.clone();
    let s = stopped.clone();
    scheduler.spawn(async move {
        loop {
            let completion = io::write(writer_fd, "Tick1").await;
            if completion.errno() == libc::EPIPE {
                break;
            }
            assert_eq!(completion.bytes(), 5);
            w.set(w.get() + 1);
        }
        drop(writer);
        s.set(true);
    });

    let filled = written.get();
    assert!(filled > 0);
    assert_eq!(scheduler.pending(), vec![writer_fd]);

    // One packet out makes room for exactly one packet in.
    let packet = scheduler
        .block_on(async move { io::read(reader_fd, 64).await.into_buffer() })
        .unwrap();
    assert_eq!(packet, b"Tick1");

    scheduler.pump_events().unwrap();
    assert_eq!(written.get(), filled + 1);
    assert_eq!(scheduler.pending(), vec![writer_fd]);

    drop(reader);
    scheduler.run_until(|| stopped.get()).unwrap();

    assert_eq!(written.get(), filled + 1);
    assert!(!scheduler.has_pending());
    assert_eq!(scheduler.task_count(), 0);
}

#[test]
fn test_write_all_crosses_suspensions() {
    let scheduler = scheduler();
    let pipe = fd::pipe().unwrap();
    let (reader, writer) = pipe.raw_fds();

    // Larger than the pipe capacity.
    let data: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
    let expected = data.clone();

    let received = Rc::new(RefCell::new(Vec::new()));
    let sent = Rc::new(Cell::new(None));

    let s = sent.clone();
    scheduler.spawn(async move {
        s.set(Some(io::write_all(writer, data).await.unwrap()));
    });
    assert!(sent.get().is_none());
    assert!(scheduler.is_pending(writer));

    let r = received.clone();
    let total = expected.len();
    scheduler.spawn(async move {
        while r.borrow().len() < total {
            let completion = io::read(reader, 64 * 1024).await;
            assert!(completion.is_ok());
            r.borrow_mut().extend_from_slice(completion.buffer());
        }
    });

    scheduler
        .run_until(|| sent.get().is_some() && received.borrow().len() == total)
        .unwrap();

    assert_eq!(sent.get(), Some(total));
    assert_eq!(*received.borrow(), expected);
    assert!(!scheduler.has_pending());
}

#[test]
fn test_write_all_reports_closed_reader() {
    let scheduler = scheduler();
    let fd::Pipe { reader, writer } = fd::pipe().unwrap();
    drop(reader);

    let result = scheduler
        .block_on(async move {
            io::write_all(writer.as_raw_fd(), "Buzz").await
        })
        .unwrap();

    assert!(
        matches!(result, Err(Error::Io { source, .. }) if source.raw_os_error() == Some(libc::EPIPE))
    );
}

#[test]
fn test_block_on_returns_future_output() {
    let scheduler = scheduler();
    let pipe = fd::pipe().unwrap();
    let (reader, writer) = pipe.raw_fds();

    scheduler.spawn(async move {
        let timer = fd::Timer::periodic(Duration::from_millis(5)).unwrap();
        timer.tick().await.unwrap();
        io::write(writer, "Fizz").await;
    });

    let text = scheduler
        .block_on(async move {
            let completion = io::read(reader, 64).await;
            String::from_utf8(completion.into_buffer()).unwrap()
        })
        .unwrap();

    assert_eq!(text, "Fizz");
}

#[test]
fn test_block_on_future_that_never_registers_is_idle() {
    let scheduler = scheduler();
    let result = scheduler.block_on(std::future::pending::<()>());
    assert!(matches!(result, Err(Error::Idle)));
}

#[test]
fn test_self_woken_task_runs_on_next_pump() {
    let scheduler = scheduler();
    let polls = Rc::new(Cell::new(0));

    let p = polls.clone();
    scheduler.spawn(std::future::poll_fn(move |cx| {
        p.set(p.get() + 1);
        if p.get() < 3 {
            cx.waker().wake_by_ref();
            std::task::Poll::Pending
        } else {
            std::task::Poll::Ready(())
        }
    }));

    assert_eq!(polls.get(), 1);
    assert_eq!(scheduler.pump_events().unwrap(), 1);
    assert_eq!(polls.get(), 2);
    assert_eq!(scheduler.pump_events().unwrap(), 1);
    assert_eq!(polls.get(), 3);
    assert_eq!(scheduler.task_count(), 0);
    assert!(matches!(scheduler.pump_events(), Err(Error::Idle)));
}

#[test]
fn test_nested_spawn_runs_before_returning() {
    let scheduler = scheduler();
    let log = Rc::new(RefCell::new(Vec::new()));

    let l = log.clone();
    scheduler.spawn(async move {
        l.borrow_mut().push("outer");
        let inner = l.clone();
        fdsched::spawn(async move {
            inner.borrow_mut().push("inner");
        });
        l.borrow_mut().push("outer done");
    });

    assert_eq!(*log.borrow(), vec!["outer", "inner", "outer done"]);
    assert_eq!(scheduler.task_count(), 0);
}

#[test]
#[should_panic(expected = "pump_events called from inside a task")]
fn test_pump_from_inside_a_task_panics() {
    let scheduler = scheduler();
    scheduler.spawn(async {
        let _ = Handle::current().pump_events();
    });
}

#[test]
fn test_panicking_task_leaves_no_current_handle() {
    let scheduler = scheduler();

    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        scheduler.spawn(async {
            panic!("task failed");
        });
    }));

    assert!(result.is_err());
    assert!(Handle::try_current().is_none());
}

#[test]
#[should_panic(expected = "no scheduler in context")]
fn test_request_after_panicking_task_still_needs_a_task() {
    let scheduler = scheduler();
    let pipe = fd::pipe().unwrap();
    let (reader, _) = pipe.raw_fds();

    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        scheduler.spawn(async {
            panic!("task failed");
        });
    }));

    let _ = io::read(reader, 8);
}

#[test]
fn test_handle_is_only_available_inside_tasks() {
    let scheduler = scheduler();
    assert!(Handle::try_current().is_none());

    let max_fd = scheduler
        .block_on(async { Handle::current().max_fd() })
        .unwrap();

    assert_eq!(max_fd, TEST_MAX_FD);
    assert!(Handle::try_current().is_none());
}
