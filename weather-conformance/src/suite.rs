use std::{fmt, sync::Arc, time::Instant};

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use thiserror::Error;
use weather_core::WeatherApi;

use crate::{
    listener::TestListener,
    result::{Failure, Param, TestResult, TestStatus},
};

/// A parametrized conformance check: metadata, its data-provider rows and the body.
#[async_trait]
pub trait ConformanceTest: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn groups(&self) -> &'static [&'static str];

    /// One invocation per row.
    fn rows(&self) -> Vec<Vec<Param>>;

    async fn run(&self, api: &dyn WeatherApi, params: &[Param]) -> anyhow::Result<()>;
}

/// Returned from a test body to record the invocation as SKIPPED instead of FAILED.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct Skip(pub String);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SuiteSummary {
    pub run: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl SuiteSummary {
    fn record(&mut self, status: TestStatus) {
        self.run += 1;
        match status {
            TestStatus::Passed => self.passed += 1,
            TestStatus::Failed => self.failed += 1,
            TestStatus::Skipped => self.skipped += 1,
            TestStatus::Created | TestStatus::Running => {}
        }
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }
}

impl fmt::Display for SuiteSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Total tests run: {}, Passes: {}, Failures: {}, Skips: {}",
            self.run, self.passed, self.failed, self.skipped
        )
    }
}

/// Runs every row of every selected test and reports lifecycle events to the listeners.
pub struct Suite {
    name: String,
    tests: Vec<Arc<dyn ConformanceTest>>,
    listeners: Vec<Arc<dyn TestListener>>,
    parallelism: usize,
    groups: Vec<String>,
}

impl fmt::Debug for Suite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tests: Vec<_> = self.tests.iter().map(|t| t.name()).collect();
        f.debug_struct("Suite")
            .field("name", &self.name)
            .field("tests", &tests)
            .field("listeners", &self.listeners.len())
            .field("parallelism", &self.parallelism)
            .field("groups", &self.groups)
            .finish()
    }
}

impl Suite {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            tests: Vec::new(),
            listeners: Vec::new(),
            parallelism: 1,
            groups: Vec::new(),
        }
    }

    pub fn with_test(mut self, test: impl ConformanceTest + 'static) -> Self {
        self.tests.push(Arc::new(test));
        self
    }

    pub fn with_tests(mut self, tests: impl IntoIterator<Item = Arc<dyn ConformanceTest>>) -> Self {
        self.tests.extend(tests);
        self
    }

    pub fn with_listener(mut self, listener: Arc<dyn TestListener>) -> Self {
        self.listeners.push(listener);
        self
    }

    /// Maximum number of invocations in flight; `1` runs them one after another.
    pub fn parallelism(mut self, n: usize) -> Self {
        self.parallelism = n.max(1);
        self
    }

    /// Restrict the run to tests in at least one of `groups`. Empty means no filter.
    pub fn include_groups(mut self, groups: Vec<String>) -> Self {
        self.groups = groups;
        self
    }

    fn selected(&self) -> impl Iterator<Item = &Arc<dyn ConformanceTest>> {
        self.tests.iter().filter(|t| {
            self.groups.is_empty() || t.groups().iter().any(|g| self.groups.iter().any(|s| s == g))
        })
    }

    fn notify(&self, event: impl Fn(&dyn TestListener)) {
        for listener in &self.listeners {
            event(listener.as_ref());
        }
    }

    /// Run the suite. When `setup` failed every invocation is reported as SKIPPED.
    pub async fn run(&self, setup: anyhow::Result<Arc<dyn WeatherApi>>) -> SuiteSummary {
        let setup = setup.map_err(|e| {
            tracing::error!(error = %e, "suite setup failed, skipping all tests");
            Failure::from_error(&e)
        });

        let invocations: Vec<(Arc<dyn ConformanceTest>, Vec<Param>)> = self
            .selected()
            .flat_map(|test| test.rows().into_iter().map(move |row| (Arc::clone(test), row)))
            .collect();

        tracing::info!(suite = %self.name, invocations = invocations.len(), parallelism = self.parallelism, "starting suite");
        self.notify(|l| l.on_suite_start(&self.name));

        let statuses: Vec<TestStatus> = stream::iter(invocations)
            .map(|(test, params)| self.invoke(test, params, &setup))
            .buffer_unordered(self.parallelism)
            .collect()
            .await;

        let mut summary = SuiteSummary::default();
        for status in statuses {
            summary.record(status);
        }

        self.notify(|l| l.on_suite_finish(&self.name, &summary));
        tracing::info!(suite = %self.name, %summary, "suite finished");
        summary
    }

    async fn invoke(
        &self,
        test: Arc<dyn ConformanceTest>,
        params: Vec<Param>,
        setup: &Result<Arc<dyn WeatherApi>, Failure>,
    ) -> TestStatus {
        let mut result =
            TestResult::new(&self.name, test.name(), test.description(), test.groups(), params);
        result.transition(TestStatus::Running);
        self.notify(|l| l.on_test_start(&result));

        let started = Instant::now();
        let outcome = match setup {
            Ok(api) => test.run(api.as_ref(), &result.params).await.map_err(|e| {
                let skipped = e.downcast_ref::<Skip>().is_some();
                (Failure::from_error(&e), skipped)
            }),
            Err(reason) => Err((reason.clone(), true)),
        };
        result.duration = started.elapsed();

        match outcome {
            Ok(()) => {
                result.transition(TestStatus::Passed);
                self.notify(|l| l.on_test_success(&result));
            }
            Err((failure, true)) => {
                result.failure = Some(failure);
                result.transition(TestStatus::Skipped);
                self.notify(|l| l.on_test_skipped(&result));
            }
            Err((failure, false)) => {
                tracing::debug!(test = %result.name(), error = %failure.message, "test failed");
                result.failure = Some(failure);
                result.transition(TestStatus::Failed);
                self.notify(|l| l.on_test_failure(&result));
            }
        }

        result.status
    }
}
