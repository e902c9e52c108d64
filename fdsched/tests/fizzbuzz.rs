use fdsched::fizzbuzz::{self, FizzBuzzConfig};
use fdsched::{Error, SchedulerBuilder};
use std::cell::RefCell;
use std::io::{self, Write};
use std::rc::Rc;
use std::time::Duration;

const TEST_MAX_FD: usize = 1 << 16;

fn classic(n: u64) -> Vec<String> {
    (1..=n)
        .map(|i| match (i % 3, i % 5) {
            (0, 0) => "FizzBuzz".to_string(),
            (0, _) => "Fizz".to_string(),
            (_, 0) => "Buzz".to_string(),
            _ => i.to_string(),
        })
        .collect()
}

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct BrokenSink;

impl Write for BrokenSink {
    fn write(&mut self, _: &[u8]) -> io::Result<usize> {
        Err(io::ErrorKind::BrokenPipe.into())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn config(ticks: u64) -> FizzBuzzConfig {
    FizzBuzzConfig {
        ticks,
        interval: Duration::from_millis(5),
    }
}

#[test]
fn test_run_completes_configured_iterations() {
    let report = fizzbuzz::run(
        &config(20),
        SchedulerBuilder::new().max_fd(TEST_MAX_FD),
        io::sink(),
    )
    .unwrap();

    assert_eq!(report.iterations, 20);
    assert_eq!(report.lines.len(), 20);
    assert!(report.expirations >= 20);
    assert!(report.pending.is_empty());
    assert!(report.fizz_written > 0);
    assert!(report.buzz_written > 0);

    if report.expirations == report.iterations {
        assert_eq!(report.lines, classic(20));
    }
}

#[test]
fn test_run_prints_one_line_per_iteration() {
    let out = SharedBuffer::default();

    let report = fizzbuzz::run(
        &config(6),
        SchedulerBuilder::new().max_fd(TEST_MAX_FD),
        out.clone(),
    )
    .unwrap();

    let text = String::from_utf8(out.0.borrow().clone()).unwrap();
    let printed: Vec<&str> = text.lines().collect();

    assert_eq!(printed, report.lines);
    assert!(text.ends_with('\n'));
}

#[test]
fn test_run_with_zero_ticks_prints_nothing() {
    let out = SharedBuffer::default();

    let report = fizzbuzz::run(
        &config(0),
        SchedulerBuilder::new().max_fd(TEST_MAX_FD),
        out.clone(),
    )
    .unwrap();

    assert_eq!(report.iterations, 0);
    assert_eq!(report.expirations, 0);
    assert!(report.lines.is_empty());
    assert!(report.pending.is_empty());
    assert!(out.0.borrow().is_empty());
}

#[test]
fn test_descriptors_beyond_bound_are_rejected() {
    // 0, 1 and 2 are taken by stdio, so no pipe fits.
    let result = fizzbuzz::run(&config(1), SchedulerBuilder::new().max_fd(3), io::sink());

    assert!(matches!(result, Err(Error::OutOfBound { max_fd: 3, .. })));
}

#[test]
fn test_output_failure_stops_the_run() {
    let result = fizzbuzz::run(
        &config(5),
        SchedulerBuilder::new().max_fd(TEST_MAX_FD),
        BrokenSink,
    );

    assert!(matches!(result, Err(Error::Output(_))));
}
