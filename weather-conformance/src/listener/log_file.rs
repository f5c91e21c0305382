use std::{
    fs::{File, OpenOptions},
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Local};
use parking_lot::Mutex;
use tracing::Level;

/// Timestamp printed at the start of every log line.
pub const LINE_TIMESTAMP: &str = "%Y-%m-%d %H:%M:%S%.3f";
/// Timestamp embedded in log file names.
pub const FILE_TIMESTAMP: &str = "%Y-%m-%d_%H-%M-%S";
/// Size cap of a single log file; reaching it truncates the file (one generation kept).
pub const MAX_FILE_BYTES: u64 = 5 * 1024 * 1024;

/// `2026-10-16 09:14:03.512 [INFO] message`, plus nested error detail when present.
pub fn format_line(at: DateTime<Local>, level: Level, message: &str, detail: &[String]) -> String {
    let mut line = format!("{} [{}] {}\n", at.format(LINE_TIMESTAMP), level, message);
    if !detail.is_empty() {
        line.push_str("Exception details: \n");
        for cause in detail {
            line.push_str(cause);
            line.push('\n');
        }
    }
    line
}

struct CappedFile {
    path: PathBuf,
    writer: BufWriter<File>,
    written: u64,
    limit: u64,
}

impl CappedFile {
    fn create(path: &Path, limit: u64) -> io::Result<Self> {
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(truncate_open(path)?),
            written: 0,
            limit,
        })
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        let len = line.len() as u64;
        if self.written > 0 && self.written + len > self.limit {
            self.writer.flush()?;
            self.writer = BufWriter::new(truncate_open(&self.path)?);
            self.written = 0;
        }
        self.writer.write_all(line.as_bytes())?;
        self.writer.flush()?;
        self.written += len;
        Ok(())
    }
}

fn truncate_open(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).write(true).truncate(true).open(path)
}

/// An open log sink for one test (or the whole suite): a size-capped file plus an
/// optional console echo on stderr.
///
/// The file receives every level; the console only INFO and above.
pub struct LogHandle {
    path: PathBuf,
    file: Mutex<Option<CappedFile>>,
    console: bool,
}

impl std::fmt::Debug for LogHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogHandle")
            .field("path", &self.path)
            .field("console", &self.console)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl LogHandle {
    /// Create (or truncate) the file at `path`.
    pub fn open(path: impl AsRef<Path>, limit: u64, console: bool) -> io::Result<Self> {
        let path = path.as_ref();
        let file = CappedFile::create(path, limit)?;
        Ok(Self { path: path.to_path_buf(), file: Mutex::new(Some(file)), console })
    }

    pub fn log(&self, level: Level, message: &str) {
        self.log_with_detail(level, message, &[]);
    }

    pub fn log_with_detail(&self, level: Level, message: &str, detail: &[String]) {
        let line = format_line(Local::now(), level, message, detail);

        if self.console && level <= Level::INFO {
            eprint!("{line}");
        }

        let mut guard = self.file.lock();
        let Some(file) = guard.as_mut() else {
            tracing::warn!(path = %self.path.display(), "write to closed log handle dropped");
            return;
        };
        if let Err(e) = file.write_line(&line) {
            tracing::error!(path = %self.path.display(), error = %e, "failed to write log record");
        }
    }

    /// Flush and release the file. Returns `false` if the handle was already closed.
    pub fn close(&self) -> bool {
        let Some(mut file) = self.file.lock().take() else {
            return false;
        };
        if let Err(e) = file.writer.flush() {
            tracing::error!(path = %self.path.display(), error = %e, "failed to flush log file");
        }
        true
    }

    pub fn is_closed(&self) -> bool {
        self.file.lock().is_none()
    }
}
