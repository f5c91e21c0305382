//! Test lifecycle listeners.
//!
//! [`LogListener`] turns lifecycle events into log artifacts under a log directory:
//! either one file per test invocation or one file for the whole suite run.

use std::{
    collections::HashMap,
    fs, io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use chrono::Local;
use clap::ValueEnum;
use parking_lot::Mutex;
use tracing::Level;

use crate::{
    result::{TestResult, TestStatus},
    suite::SuiteSummary,
};

pub mod log_file;
pub mod record;

use log_file::{FILE_TIMESTAMP, LogHandle, MAX_FILE_BYTES};

/// Observer of suite and test lifecycle events. All hooks default to no-ops.
pub trait TestListener: Send + Sync {
    fn on_suite_start(&self, _suite: &str) {}

    fn on_suite_finish(&self, _suite: &str, _summary: &SuiteSummary) {}

    fn on_test_start(&self, _result: &TestResult) {}

    fn on_test_success(&self, _result: &TestResult) {}

    fn on_test_failure(&self, _result: &TestResult) {}

    fn on_test_skipped(&self, _result: &TestResult) {}
}

/// How many log files a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Granularity {
    /// `<test identifier>_<timestamp>.log` per invocation.
    #[default]
    PerTest,
    /// A single `test-execution_<timestamp>.log` for the run.
    PerSuite,
}

#[derive(Debug, Clone)]
pub struct ListenerConfig {
    pub log_dir: PathBuf,
    pub granularity: Granularity,
    /// Echo INFO-and-above records to stderr.
    pub console: bool,
    pub max_file_bytes: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            granularity: Granularity::default(),
            console: true,
            max_file_bytes: MAX_FILE_BYTES,
        }
    }
}

const SUITE_KEY: &str = "test-execution";

/// Writes per-test (or per-suite) log files.
///
/// Holds at most one open handle per key. Handles are released at the terminal
/// event of their test (per-test) or at suite end (per-suite); whatever is still
/// open at suite end is released then, leaving the map empty.
#[derive(Debug)]
pub struct LogListener {
    config: ListenerConfig,
    handles: Mutex<HashMap<String, Arc<LogHandle>>>,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

impl LogListener {
    pub fn new(config: ListenerConfig) -> Self {
        Self {
            config,
            handles: Mutex::new(HashMap::new()),
            opened: AtomicUsize::new(0),
            closed: AtomicUsize::new(0),
        }
    }

    pub fn open_handles(&self) -> usize {
        self.handles.lock().len()
    }

    pub fn handles_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn handles_closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    fn key_for(&self, result: &TestResult) -> String {
        match self.config.granularity {
            Granularity::PerTest => result.identifier(),
            Granularity::PerSuite => SUITE_KEY.to_string(),
        }
    }

    fn open(&self, key: &str) -> io::Result<Arc<LogHandle>> {
        if !self.config.log_dir.exists() {
            fs::create_dir_all(&self.config.log_dir)?;
        }
        let file_name = format!("{key}_{}.log", Local::now().format(FILE_TIMESTAMP));
        let handle = Arc::new(LogHandle::open(
            self.config.log_dir.join(file_name),
            self.config.max_file_bytes,
            self.config.console,
        )?);
        self.opened.fetch_add(1, Ordering::SeqCst);

        let previous = self.handles.lock().insert(key.to_string(), Arc::clone(&handle));
        if let Some(previous) = previous {
            tracing::warn!(key, "log handle replaced while still open");
            self.close_handle(&previous);
        }
        Ok(handle)
    }

    fn handle(&self, key: &str) -> Option<Arc<LogHandle>> {
        self.handles.lock().get(key).cloned()
    }

    fn release(&self, key: &str) {
        let removed = self.handles.lock().remove(key);
        if let Some(handle) = removed {
            self.close_handle(&handle);
        }
    }

    fn close_handle(&self, handle: &LogHandle) {
        if handle.close() {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn log_outcome(&self, result: &TestResult, level: Level) {
        let key = self.key_for(result);
        let Some(handle) = self.handle(&key) else {
            tracing::error!(test = %result.name(), "Logger not found for test");
            return;
        };

        handle.log(level, &record::outcome_record(result));

        let failure = result.failure.as_ref().filter(|_| result.status == TestStatus::Failed);
        if let Some(failure) = failure {
            handle.log_with_detail(
                Level::ERROR,
                &format!("Failure Details: {}", failure.message),
                &failure.causes,
            );
            handle.log(Level::DEBUG, &format!("Stack trace:\n{}", failure.trace));
        }

        if self.config.granularity == Granularity::PerTest {
            self.release(&key);
        }
    }
}

impl TestListener for LogListener {
    fn on_suite_start(&self, suite: &str) {
        clean_log_dir(&self.config.log_dir);

        if self.config.granularity == Granularity::PerSuite {
            match self.open(SUITE_KEY) {
                Ok(handle) => handle.log(Level::INFO, &format!("=== Starting Suite: {suite} ===")),
                Err(e) => tracing::error!(error = %e, "failed to create suite log file"),
            }
        }
    }

    fn on_suite_finish(&self, suite: &str, summary: &SuiteSummary) {
        if let Some(handle) = self.handle(SUITE_KEY) {
            handle.log(Level::INFO, &format!("=== Finished Suite: {suite} ({summary}) ==="));
        }

        let drained: Vec<_> = self.handles.lock().drain().collect();
        for (key, handle) in drained {
            if self.config.granularity == Granularity::PerTest {
                tracing::warn!(key = %key, "test log still open at suite end");
            }
            self.close_handle(&handle);
        }
    }

    fn on_test_start(&self, result: &TestResult) {
        let key = self.key_for(result);
        let handle = match self.config.granularity {
            Granularity::PerTest => self.open(&key),
            Granularity::PerSuite => self
                .handle(&key)
                .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "suite log is not open")),
        };

        match handle {
            Ok(handle) => handle.log(
                Level::INFO,
                &format!("=== Starting Test: {} [{}] ===", result.name(), result.groups.join(", ")),
            ),
            Err(e) => tracing::error!(test = %result.name(), error = %e, "Failed to create logger for test"),
        }
    }

    fn on_test_success(&self, result: &TestResult) {
        self.log_outcome(result, Level::INFO);
    }

    fn on_test_failure(&self, result: &TestResult) {
        self.log_outcome(result, Level::ERROR);
    }

    fn on_test_skipped(&self, result: &TestResult) {
        self.log_outcome(result, Level::WARN);
    }
}

/// Empties `dir` (creating it when absent). Entries that cannot be removed are
/// reported and left in place.
pub fn clean_log_dir(dir: &Path) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            if let Err(e) = fs::create_dir_all(dir) {
                tracing::error!(dir = %dir.display(), error = %e, "failed to create log directory");
            }
            return;
        }
        Err(e) => {
            tracing::error!(dir = %dir.display(), error = %e, "failed to list log directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        let removed = if path.is_dir() { fs::remove_dir(&path) } else { fs::remove_file(&path) };
        if let Err(e) = removed {
            tracing::error!(file = %path.display(), error = %e, "Failed to delete file");
        }
    }
}
