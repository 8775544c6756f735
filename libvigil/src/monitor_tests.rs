// libvigil/src/monitor_tests.rs
//
// Behavioral coverage for the debounced monitor: what reaches the
// consumer, what gets suppressed, and when.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use super::config::Config;
use super::inotify::Timeout;
use super::monitor::Monitor;

fn quick_config() -> Config {
    Config {
        settle: Duration::from_millis(150),
        ..Config::default()
    }
}

fn monitor(root: &Path, config: Config) -> Monitor {
    Monitor::new(&[root.to_path_buf()], config).unwrap()
}

/// Polls until at least one path is ready or `patience` runs out.
fn poll_until_ready(monitor: &mut Monitor, patience: Duration) -> Vec<PathBuf> {
    let deadline = Instant::now() + patience;
    while Instant::now() < deadline {
        let ready = monitor
            .poll(Timeout::Bounded(Duration::from_millis(50)))
            .unwrap();
        if !ready.is_empty() {
            return ready;
        }
    }
    Vec::new()
}

/// Polls for the whole of `window`, collecting everything that turns up.
fn poll_window(monitor: &mut Monitor, window: Duration) -> Vec<PathBuf> {
    let deadline = Instant::now() + window;
    let mut all = Vec::new();
    while Instant::now() < deadline {
        let ready = monitor
            .poll(Timeout::Bounded(Duration::from_millis(50)))
            .unwrap();
        all.extend(ready);
    }
    all
}

#[test]
fn preexisting_files_are_ready_immediately() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("seed.txt"), b"seed").unwrap();

    let mut m = monitor(dir.path(), quick_config());
    let ready = m.poll(Timeout::Poll).unwrap();
    assert_eq!(ready, vec![dir.path().join("seed.txt")]);
}

#[test]
fn close_write_makes_a_file_ready() {
    let dir = tempfile::tempdir().unwrap();
    let mut m = monitor(dir.path(), quick_config());

    fs::write(dir.path().join("fresh.txt"), b"content").unwrap();
    let ready = poll_until_ready(&mut m, Duration::from_secs(5));
    assert_eq!(ready, vec![dir.path().join("fresh.txt")]);
}

#[test]
fn a_file_is_reported_once_per_change() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("once.txt");
    let mut m = monitor(dir.path(), quick_config());

    fs::write(&file, b"v1").unwrap();
    let ready = poll_until_ready(&mut m, Duration::from_secs(5));
    assert_eq!(ready, vec![file.clone()]);
    m.note_handled(&file);

    // No further changes: nothing else may surface, even after a settle
    // period has passed.
    assert!(poll_window(&mut m, Duration::from_millis(400)).is_empty());
}

#[test]
fn modifications_settle_after_a_quiet_period() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("log.txt");
    fs::write(&file, b"").unwrap();

    let mut m = monitor(dir.path(), quick_config());
    let ready = m.poll(Timeout::Poll).unwrap();
    assert_eq!(ready, vec![file.clone()]);
    m.note_handled(&file);

    // Keep the handle open: modify events only, no close-write.
    let mut handle = OpenOptions::new().append(true).open(&file).unwrap();
    handle.write_all(b"line one\n").unwrap();
    handle.flush().unwrap();

    let start = Instant::now();
    let ready = poll_until_ready(&mut m, Duration::from_secs(5));
    assert_eq!(ready, vec![file.clone()]);
    assert!(
        start.elapsed() >= Duration::from_millis(150),
        "settled before the quiet period elapsed"
    );
    assert_eq!(m.pending_count(), 0);
    m.note_handled(&file);

    // Closing the handle afterwards re-announces the same bytes; the
    // suppressor recognizes them.
    drop(handle);
    assert!(poll_window(&mut m, Duration::from_millis(400)).is_empty());
}

#[test]
fn handler_echo_does_not_retrigger() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("job.txt");
    let mut m = monitor(dir.path(), quick_config());

    fs::write(&file, b"input").unwrap();
    let ready = poll_until_ready(&mut m, Duration::from_secs(5));
    assert_eq!(ready, vec![file.clone()]);

    // The consumer rewrites the file it was handed, then reports done.
    fs::write(&file, b"processed output").unwrap();
    m.note_handled(&file);

    assert!(
        poll_window(&mut m, Duration::from_millis(500)).is_empty(),
        "the consumer's own rewrite echoed back"
    );

    // A genuine third-party edit still gets through.
    fs::write(&file, b"someone else was here").unwrap();
    let ready = poll_until_ready(&mut m, Duration::from_secs(5));
    assert_eq!(ready, vec![file.clone()]);
}

#[test]
fn empty_files_can_be_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("marker");
    fs::write(&file, b"").unwrap();

    let config = Config {
        skip_empty: true,
        ..quick_config()
    };
    let mut m = monitor(dir.path(), config);
    assert!(m.poll(Timeout::Poll).unwrap().is_empty());

    fs::write(&file, b"now it counts").unwrap();
    let ready = poll_until_ready(&mut m, Duration::from_secs(5));
    assert_eq!(ready, vec![file]);
}

#[test]
fn modify_tracking_can_be_disabled() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("stream.log");
    fs::write(&file, b"").unwrap();

    let config = Config {
        track_modify: false,
        ..quick_config()
    };
    let mut m = monitor(dir.path(), config);
    m.poll(Timeout::Poll).unwrap();
    m.note_handled(&file);

    let mut handle = OpenOptions::new().append(true).open(&file).unwrap();
    handle.write_all(b"chunk").unwrap();
    handle.flush().unwrap();

    // Modify events alone do nothing now.
    assert!(poll_window(&mut m, Duration::from_millis(400)).is_empty());
    assert_eq!(m.pending_count(), 0);

    // The close-write still triggers.
    drop(handle);
    let ready = poll_until_ready(&mut m, Duration::from_secs(5));
    assert_eq!(ready, vec![file]);
}

#[test]
fn excluded_names_never_become_ready() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config {
        exclude: Some(r"^\.".to_string()),
        ..quick_config()
    };
    let mut m = monitor(dir.path(), config);

    fs::write(dir.path().join(".swapfile"), b"tmp").unwrap();
    fs::write(dir.path().join("real.txt"), b"data").unwrap();

    let ready = poll_until_ready(&mut m, Duration::from_secs(5));
    assert_eq!(ready, vec![dir.path().join("real.txt")]);
}

#[test]
fn deleting_a_pending_file_forgets_it() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("doomed.txt");
    fs::write(&file, b"").unwrap();

    // Long settle: the entry could only leave the queue via the delete.
    let config = Config {
        settle: Duration::from_secs(30),
        ..Config::default()
    };
    let mut m = monitor(dir.path(), config);
    m.poll(Timeout::Poll).unwrap();
    m.note_handled(&file);

    let mut handle = OpenOptions::new().append(true).open(&file).unwrap();
    handle.write_all(b"half-written").unwrap();
    handle.flush().unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while m.pending_count() == 0 && Instant::now() < deadline {
        m.poll(Timeout::Bounded(Duration::from_millis(50))).unwrap();
    }
    assert_eq!(m.pending_count(), 1);

    drop(handle);
    fs::remove_file(&file).unwrap();

    let deadline = Instant::now() + Duration::from_secs(5);
    while m.pending_count() != 0 && Instant::now() < deadline {
        assert!(m
            .poll(Timeout::Bounded(Duration::from_millis(50)))
            .unwrap()
            .is_empty());
    }
    assert_eq!(m.pending_count(), 0);
}

#[test]
fn subdirectory_files_are_covered() {
    let dir = tempfile::tempdir().unwrap();
    let mut m = monitor(dir.path(), quick_config());

    fs::create_dir(dir.path().join("nested")).unwrap();
    let file = dir.path().join("nested/deep.txt");
    fs::write(&file, b"deep content").unwrap();

    let ready = poll_until_ready(&mut m, Duration::from_secs(5));
    assert_eq!(ready, vec![file]);
}
