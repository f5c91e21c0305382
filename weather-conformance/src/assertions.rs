//! Hard and soft assertions for test bodies.
//!
//! Hard assertions return `Err` right away so `?` aborts the test. Soft assertions
//! are collected in a [`SoftAssertions`] accumulator and reported together by
//! [`SoftAssertions::assert_all`].

use std::fmt::Display;

use thiserror::Error;
use weather_core::JsonBody;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssertionError {
    #[error("{0}")]
    Hard(String),

    #[error("The following asserts failed:\n\t{}", .0.join(",\n\t"))]
    Soft(Vec<String>),
}

impl AssertionError {
    pub fn hard(message: impl Into<String>) -> Self {
        AssertionError::Hard(message.into())
    }

    /// The individual failure messages carried by this error.
    pub fn messages(&self) -> Vec<&str> {
        match self {
            AssertionError::Hard(m) => vec![m.as_str()],
            AssertionError::Soft(ms) => ms.iter().map(String::as_str).collect(),
        }
    }
}

pub fn ensure(condition: bool, message: impl Into<String>) -> Result<(), AssertionError> {
    if condition { Ok(()) } else { Err(AssertionError::hard(message)) }
}

/// Hard equality check; the message gets `expected [..] but found [..]` appended.
pub fn ensure_eq<T>(actual: T, expected: T, message: impl Display) -> Result<(), AssertionError>
where
    T: PartialEq + Display,
{
    if actual == expected {
        return Ok(());
    }
    Err(AssertionError::hard(format!("{message} expected [{expected}] but found [{actual}]")))
}

/// Accumulator for checks that must not stop the remaining checks of a test.
#[derive(Debug, Default)]
pub struct SoftAssertions {
    failures: Vec<String>,
}

impl SoftAssertions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, condition: bool, message: impl Into<String>) {
        if !condition {
            self.failures.push(message.into());
        }
    }

    pub fn present(&mut self, body: &JsonBody, path: &str, message: &str) {
        self.check(body.contains(path), format!("{message} expected [not null] but found [null]"));
    }

    pub fn absent(&mut self, body: &JsonBody, path: &str, message: &str) {
        if let Some(value) = body.get(path) {
            self.failures.push(format!("{message} expected [null] but found [{}]", preview(value)));
        }
    }

    pub fn failures(&self) -> &[String] {
        &self.failures
    }

    /// Fails with every collected message, or succeeds when nothing was recorded.
    pub fn assert_all(self) -> Result<(), AssertionError> {
        if self.failures.is_empty() { Ok(()) } else { Err(AssertionError::Soft(self.failures)) }
    }
}

fn preview(value: &serde_json::Value) -> String {
    const MAX: usize = 80;
    let text = value.to_string();
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text,
    }
}
