//! Three-stream multiplexing scenario.
//!
//! Two producers write fixed strings cyclically into two packet pipes,
//! until each pipe is full and their next write suspends. A consumer wakes
//! on a periodic timer and, for every elapsed interval, drains one packet
//! from each pipe. A 4-byte packet (`Fizz` or `Buzz`) is printed; when
//! neither packet was one, the iteration number is printed instead. After
//! `ticks` iterations the consumer sets the completion flag and returns,
//! closing the read ends, which in turn ends both producers with `EPIPE`.
//!
//! With one expiration per timer read the output is the classic FizzBuzz
//! sequence: the fizz cycle has length 3 and the buzz cycle length 5.

use crate::error::{Error, Result};
use crate::fd::{self, Timer};
use crate::io;
use crate::runtime::builder::SchedulerBuilder;

use std::cell::{Cell, RefCell};
use std::io::Write;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::rc::Rc;
use std::time::Duration;

/// Messages of the fizz producer, repeated forever.
pub const FIZZ_MESSAGES: &[&[u8]] = &[b"Tick1", b"Tick1", b"Fizz"];

/// Messages of the buzz producer, repeated forever.
pub const BUZZ_MESSAGES: &[&[u8]] = &[b"Tock1", b"Tock2", b"Tock3", b"Tock4", b"Buzz"];

/// Read size for one packet; larger than any message.
const PACKET_LEN: usize = 64;

/// Length of the messages that get printed.
const MARKER_LEN: usize = 4;

/// Scenario parameters.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FizzBuzzConfig {
    /// Consumer iterations before the completion flag is set.
    pub ticks: u64,

    /// Timer period.
    pub interval: Duration,
}

impl Default for FizzBuzzConfig {
    fn default() -> Self {
        Self {
            ticks: 20,
            interval: Duration::from_millis(100),
        }
    }
}

/// What a finished run observed.
#[derive(Debug, Default)]
pub struct Report {
    /// Consumer iterations; equals the configured tick count.
    pub iterations: u64,

    /// Timer expirations consumed. Larger than `iterations` when the
    /// consumer fell behind and a single read reported several.
    pub expirations: u64,

    /// One entry per iteration, without the newline.
    pub lines: Vec<String>,

    /// Packets the fizz producer wrote before its reader closed.
    pub fizz_written: usize,

    /// Packets the buzz producer wrote before its reader closed.
    pub buzz_written: usize,

    /// Descriptors still pending when the run returned.
    pub pending: Vec<RawFd>,
}

/// State the tasks share with the driver.
#[derive(Default)]
struct Progress {
    done: Cell<bool>,
    iterations: Cell<u64>,
    expirations: Cell<u64>,
    lines: RefCell<Vec<String>>,
    fizz_written: Cell<usize>,
    buzz_written: Cell<usize>,
    failure: RefCell<Option<Error>>,
}

impl Progress {
    /// Records the first task failure and stops the driver loop.
    fn fail(&self, task: &'static str, err: Error) {
        tracing::error!(task, error = %err, "task failed");

        let mut failure = self.failure.borrow_mut();
        if failure.is_none() {
            *failure = Some(err);
        }

        self.done.set(true);
    }
}

/// Writes `messages` to `writer` in a cycle, one `write` per message.
///
/// Suspends whenever the pipe is full. Returns the number of messages
/// written once the read end is closed (`EPIPE`); any other write error
/// ends the producer with [`Error::Io`].
pub async fn produce(
    name: &'static str,
    writer: OwnedFd,
    messages: &'static [&'static [u8]],
) -> Result<usize> {
    let fd = writer.as_raw_fd();
    let mut cycle = messages.iter().cycle();
    let mut written = 0;

    while let Some(&message) = cycle.next() {
        let completion = io::write(fd, message).await;

        if completion.errno() == libc::EPIPE {
            tracing::debug!(producer = name, written, "reader closed, stopping");
            break;
        }

        completion.check()?;
        written += 1;
    }

    Ok(written)
}

/// Reads the timer, then one packet per pipe for every expiration.
async fn consume<W: Write>(
    fizz: OwnedFd,
    buzz: OwnedFd,
    timer: Timer,
    ticks: u64,
    progress: &Progress,
    out: &mut W,
) -> Result<()> {
    let streams = [fizz.as_raw_fd(), buzz.as_raw_fd()];
    let mut iteration = 1;

    while iteration <= ticks {
        let expirations = timer.tick().await?;
        progress.expirations.set(progress.expirations.get() + expirations);

        let mut line = String::new();

        for _ in 0..expirations {
            let mut marked = false;

            for fd in streams {
                let packet = io::read(fd, PACKET_LEN).await.check()?;

                if packet.bytes() == MARKER_LEN {
                    marked = true;
                    line.push_str(&String::from_utf8_lossy(packet.buffer()));
                }
            }

            if !marked {
                line.push_str(&iteration.to_string());
            }
        }

        writeln!(out, "{line}").map_err(Error::Output)?;
        out.flush().map_err(Error::Output)?;

        tracing::debug!(iteration, expirations, line = %line, "iteration");

        progress.lines.borrow_mut().push(line);
        progress.iterations.set(iteration);

        iteration += 1;
    }

    progress.done.set(true);

    Ok(())
}

/// Runs the scenario on a scheduler built from `builder`, printing one
/// line per iteration to `out`.
///
/// Returns once the consumer has finished and both producers have
/// observed the closed pipes, so nothing is left pending.
///
/// # Errors
///
/// Descriptor setup failures, descriptors beyond the scheduler's bound,
/// pump failures, and the first task failure.
pub fn run<W>(config: &FizzBuzzConfig, builder: SchedulerBuilder, out: W) -> Result<Report>
where
    W: Write + 'static,
{
    let scheduler = builder.build();

    let fd::Pipe {
        reader: fizz_reader,
        writer: fizz_writer,
    } = fd::pipe()?;
    let fd::Pipe {
        reader: buzz_reader,
        writer: buzz_writer,
    } = fd::pipe()?;
    let timer = Timer::periodic(config.interval)?;

    let max_fd = scheduler.max_fd();
    for fd in [
        fizz_reader.as_raw_fd(),
        fizz_writer.as_raw_fd(),
        buzz_reader.as_raw_fd(),
        buzz_writer.as_raw_fd(),
        timer.as_raw_fd(),
    ] {
        if fd < 0 || fd as usize >= max_fd {
            return Err(Error::OutOfBound { fd, max_fd });
        }
    }

    tracing::info!(
        ticks = config.ticks,
        interval_ms = config.interval.as_millis() as u64,
        max_fd,
        "starting fizzbuzz"
    );

    let progress = Rc::new(Progress::default());

    let p = progress.clone();
    scheduler.spawn(async move {
        match produce("fizz", fizz_writer, FIZZ_MESSAGES).await {
            Ok(written) => p.fizz_written.set(written),
            Err(err) => p.fail("fizz", err),
        }
    });

    let p = progress.clone();
    scheduler.spawn(async move {
        match produce("buzz", buzz_writer, BUZZ_MESSAGES).await {
            Ok(written) => p.buzz_written.set(written),
            Err(err) => p.fail("buzz", err),
        }
    });

    let p = progress.clone();
    let ticks = config.ticks;
    let mut out = out;
    scheduler.spawn(async move {
        if let Err(err) = consume(fizz_reader, buzz_reader, timer, ticks, &p, &mut out).await {
            p.fail("consumer", err);
        }
    });

    scheduler.run_until(|| progress.done.get())?;

    if let Some(err) = progress.failure.borrow_mut().take() {
        return Err(err);
    }

    // The read ends closed with the consumer; the producers' pending
    // writes now fail with EPIPE.
    while scheduler.has_pending() {
        scheduler.pump_events()?;
    }

    let report = Report {
        iterations: progress.iterations.get(),
        expirations: progress.expirations.get(),
        lines: progress.lines.take(),
        fizz_written: progress.fizz_written.get(),
        buzz_written: progress.buzz_written.get(),
        pending: scheduler.pending(),
    };

    tracing::info!(
        iterations = report.iterations,
        expirations = report.expirations,
        fizz_written = report.fizz_written,
        buzz_written = report.buzz_written,
        "fizzbuzz finished"
    );

    Ok(report)
}
