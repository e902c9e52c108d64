use fdsched::fd::{self, Timer};
use fdsched::{Handle, io};
use std::time::{Duration, Instant};

#[fdsched::test]
async fn test_default_bound() {
    assert_eq!(Handle::current().max_fd(), fdsched::MAX_FD);
}

#[fdsched::test(max_fd = 65536)]
async fn test_custom_bound() {
    assert_eq!(Handle::current().max_fd(), 65536);
}

#[fdsched::test(max_fd = 65536)]
async fn test_pipe_round_trip() {
    let pipe = fd::pipe().unwrap();
    let (reader, writer) = pipe.raw_fds();

    let written = io::write(writer, "Tock1").await;
    assert_eq!(written.bytes(), 5);

    let read = io::read(reader, 64).await;
    assert_eq!(read.buffer(), b"Tock1");
}

#[fdsched::test(max_fd = 65536)]
async fn test_timer_tick_waits_one_interval() {
    let timer = Timer::periodic(Duration::from_millis(20)).unwrap();
    let start = Instant::now();

    let expirations = timer.tick().await.unwrap();

    assert!(expirations >= 1);
    assert!(start.elapsed() >= Duration::from_millis(20));
}

#[fdsched::test(max_fd = 65536)]
async fn test_spawned_writer_wakes_blocked_reader() {
    let pipe = fd::pipe().unwrap();
    let (reader, writer) = pipe.raw_fds();

    fdsched::spawn(async move {
        let timer = Timer::periodic(Duration::from_millis(5)).unwrap();
        timer.tick().await.unwrap();
        io::write(writer, "Buzz").await;
    });

    let read = io::read(reader, 64).await;
    assert_eq!(read.buffer(), b"Buzz");
}
