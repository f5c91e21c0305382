use std::{collections::HashSet, fmt::Write};

use crate::result::{TestResult, TestStatus};

/// Parameter values that appear verbatim in the assertion message of a failed test.
///
/// This is a substring heuristic, not attribution: a short value such as `3` can
/// match unrelated digits in the message, and a value rendered differently in the
/// message is missed. Non-assertion failures (transport errors etc.) never mark
/// parameters.
pub fn failed_param_values(result: &TestResult) -> HashSet<String> {
    let mut values = HashSet::new();
    if result.status != TestStatus::Failed {
        return values;
    }
    let Some(failure) = result.failure.as_ref().filter(|f| f.assertion) else {
        return values;
    };
    if failure.message.is_empty() {
        return values;
    }
    for param in &result.params {
        let value = param.to_string();
        if failure.message.contains(&value) {
            values.insert(value);
        }
    }
    values
}

/// Multi-line outcome record written at the terminal event of a test.
pub fn outcome_record(result: &TestResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\tTest {}: {}", result.status, result.name());
    let _ = writeln!(out, "\tDuration: {}ms", result.duration.as_millis());
    if !result.description.is_empty() {
        let _ = writeln!(out, "\tDescription: {}", result.description);
    }
    let _ = writeln!(out, "\tSuite: {}", result.suite);
    if !result.groups.is_empty() {
        let _ = writeln!(out, "\tGroups: {}", result.groups.join(", "));
    }

    if !result.params.is_empty() {
        out.push_str("Test Parameters:\n");
        let failed = failed_param_values(result);
        for (i, param) in result.params.iter().enumerate() {
            let value = param.to_string();
            let marker = if failed.contains(&value) { " [FAILED]" } else { "" };
            let _ = writeln!(out, "  {}. [{}] {}{}", i + 1, param.type_name(), value, marker);
        }
    }

    if let Some(failure) = &result.failure {
        match result.status {
            TestStatus::Failed => {
                out.push_str("\nFailure Details:\n");
                out.push_str(&failure.message);
                out.push('\n');
            }
            TestStatus::Skipped => {
                let _ = writeln!(out, "\tSkip Reason: {}", failure.message);
            }
            _ => {}
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assertions::AssertionError,
        result::{Failure, Param},
    };
    use std::time::Duration;

    fn failed(params: Vec<Param>, err: anyhow::Error) -> TestResult {
        let mut r = TestResult::new(
            "weather-api-backend",
            "current_weather",
            "Verify the current weather response",
            &["smoke", "critical"],
            params,
        );
        r.transition(TestStatus::Running);
        r.transition(TestStatus::Failed);
        r.duration = Duration::from_millis(412);
        r.failure = Some(Failure::from_error(&err));
        r
    }

    #[test]
    fn assertion_message_marks_matching_params() {
        let err = anyhow::Error::new(AssertionError::hard(
            "Country should match expected value. Expected: United Kingdom, Actual: France",
        ));
        let r = failed(vec!["London".into(), "United Kingdom".into()], err);

        let marked = failed_param_values(&r);
        assert!(marked.contains("United Kingdom"));
        assert!(!marked.contains("London"));

        let record = outcome_record(&r);
        assert!(record.contains("  1. [String] London\n"));
        assert!(record.contains("  2. [String] United Kingdom [FAILED]\n"));
        assert!(record.contains("\tTest FAILED: current_weather(London, United Kingdom)\n"));
        assert!(record.contains("\tDuration: 412ms\n"));
        assert!(record.contains("\tGroups: smoke, critical\n"));
        assert!(record.contains("\nFailure Details:\nCountry should match"));
    }

    #[test]
    fn transport_errors_never_mark_params() {
        let err = anyhow::anyhow!("error sending request for url (http://x/?q=London)");
        let r = failed(vec!["London".into()], err);

        assert!(failed_param_values(&r).is_empty());
        assert!(!outcome_record(&r).contains("[FAILED]"));
    }

    #[test]
    fn passed_record_has_no_failure_section() {
        let mut r = TestResult::new("s", "weather_forecast", "", &[], vec![Param::Count(3)]);
        r.transition(TestStatus::Running);
        r.transition(TestStatus::Passed);

        let record = outcome_record(&r);
        assert!(record.contains("  1. [u32] 3\n"));
        assert!(!record.contains("Description"));
        assert!(!record.contains("Failure Details"));
    }
}
