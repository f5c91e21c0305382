use std::{fmt, time::Duration};

use chrono::{DateTime, Local};

use crate::assertions::AssertionError;

/// One data-provider value passed to a test invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param {
    Text(String),
    Count(u32),
}

impl Param {
    /// Type tag printed next to the value in log records.
    pub fn type_name(&self) -> &'static str {
        match self {
            Param::Text(_) => "String",
            Param::Count(_) => "u32",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Param::Text(s) => Some(s),
            Param::Count(_) => None,
        }
    }

    pub fn as_count(&self) -> Option<u32> {
        match self {
            Param::Count(n) => Some(*n),
            Param::Text(_) => None,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Text(s) => f.write_str(s),
            Param::Count(n) => write!(f, "{n}"),
        }
    }
}

impl From<&str> for Param {
    fn from(value: &str) -> Self {
        Param::Text(value.to_string())
    }
}

impl From<u32> for Param {
    fn from(value: u32) -> Self {
        Param::Count(value)
    }
}

/// Lifecycle of one test invocation: `Created -> Running -> {Passed | Failed | Skipped}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestStatus {
    Created,
    Running,
    Passed,
    Failed,
    Skipped,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Created => "CREATED",
            TestStatus::Running => "RUNNING",
            TestStatus::Passed => "PASSED",
            TestStatus::Failed => "FAILED",
            TestStatus::Skipped => "SKIPPED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, TestStatus::Passed | TestStatus::Failed | TestStatus::Skipped)
    }

    fn can_become(&self, next: TestStatus) -> bool {
        match self {
            TestStatus::Created => next == TestStatus::Running,
            TestStatus::Running => next.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for TestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an invocation failed or was skipped.
#[derive(Debug, Clone)]
pub struct Failure {
    /// Top-level error message.
    pub message: String,
    /// Source chain, outermost cause first, excluding `message`.
    pub causes: Vec<String>,
    /// Debug rendering of the error (includes a backtrace when one was captured).
    pub trace: String,
    /// Whether the error was raised by a hard or soft assertion.
    pub assertion: bool,
}

impl Failure {
    pub fn from_error(err: &anyhow::Error) -> Self {
        Self {
            message: err.to_string(),
            causes: err.chain().skip(1).map(ToString::to_string).collect(),
            trace: format!("{err:?}"),
            assertion: err.downcast_ref::<AssertionError>().is_some(),
        }
    }
}

/// Everything the listener needs to know about one test invocation.
#[derive(Debug, Clone)]
pub struct TestResult {
    pub suite: String,
    pub method: &'static str,
    pub description: &'static str,
    pub groups: &'static [&'static str],
    pub params: Vec<Param>,
    pub status: TestStatus,
    pub started_at: DateTime<Local>,
    pub duration: Duration,
    pub failure: Option<Failure>,
}

impl TestResult {
    pub fn new(
        suite: impl Into<String>,
        method: &'static str,
        description: &'static str,
        groups: &'static [&'static str],
        params: Vec<Param>,
    ) -> Self {
        Self {
            suite: suite.into(),
            method,
            description,
            groups,
            params,
            status: TestStatus::Created,
            started_at: Local::now(),
            duration: Duration::ZERO,
            failure: None,
        }
    }

    /// Method name plus parameters, joined by `_`, with whitespace and path separators replaced.
    pub fn identifier(&self) -> String {
        let mut identifier = self.method.to_string();
        for param in &self.params {
            identifier.push('_');
            identifier.push_str(&sanitize(&param.to_string()));
        }
        identifier
    }

    /// Display name with parameters, e.g. `current_weather(London, United Kingdom)`.
    pub fn name(&self) -> String {
        let params: Vec<String> = self.params.iter().map(ToString::to_string).collect();
        format!("{}({})", self.method, params.join(", "))
    }

    pub fn transition(&mut self, next: TestStatus) -> bool {
        if !self.status.can_become(next) {
            tracing::warn!(test = %self.identifier(), from = %self.status, to = %next, "ignoring illegal status transition");
            return false;
        }
        if next == TestStatus::Running {
            self.started_at = Local::now();
        }
        self.status = next;
        true
    }
}

fn sanitize(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_whitespace = false;
    for c in value.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;
        out.push(if matches!(c, '/' | '\\' | ':') { '_' } else { c });
    }
    out
}
