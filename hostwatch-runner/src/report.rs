// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Finalized test results and the ordered report they are collected into.

use crate::events::{ExceptionInfo, TestIdentity};
use chrono::{DateTime, FixedOffset};
use hostwatch_metadata::{ResultKindSummary, ResultSummary};
use std::time::Duration;

/// The outcome of a test.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum ResultType {
    /// The test passed.
    Passed,

    /// The test failed, was interrupted by an assertion dialog, or the host timed out.
    Failed,

    /// The test was ignored by the host.
    Ignored,

    /// A failure generated by hostwatch itself that couldn't be attributed to a test.
    SystemGeneratedFailure,
}

impl ResultType {
    /// Returns true if this outcome counts as a failure of the run.
    pub fn is_failure(self) -> bool {
        matches!(self, ResultType::Failed | ResultType::SystemGeneratedFailure)
    }

    pub(crate) fn to_summary(self) -> ResultKindSummary {
        match self {
            ResultType::Passed => ResultKindSummary::Passed,
            ResultType::Failed => ResultKindSummary::Failed,
            ResultType::Ignored => ResultKindSummary::Ignored,
            ResultType::SystemGeneratedFailure => ResultKindSummary::SystemGeneratedFailure,
        }
    }
}

/// A single finalized result. Immutable once constructed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestCaseResult {
    result_type: ResultType,
    identity: Option<TestIdentity>,
    started: Option<DateTime<FixedOffset>>,
    finished: Option<DateTime<FixedOffset>>,
    exception: Option<ExceptionInfo>,
    other_info: Option<String>,
}

impl TestCaseResult {
    pub(crate) fn passed(
        identity: TestIdentity,
        started: DateTime<FixedOffset>,
        finished: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            result_type: ResultType::Passed,
            identity: Some(identity),
            started: Some(started),
            finished: Some(finished),
            exception: None,
            other_info: None,
        }
    }

    pub(crate) fn failed(
        identity: TestIdentity,
        started: DateTime<FixedOffset>,
        finished: DateTime<FixedOffset>,
        exception: Option<ExceptionInfo>,
    ) -> Self {
        Self {
            result_type: ResultType::Failed,
            identity: Some(identity),
            started: Some(started),
            finished: Some(finished),
            exception,
            other_info: None,
        }
    }

    pub(crate) fn ignored(identity: Option<TestIdentity>, message: String) -> Self {
        Self {
            result_type: ResultType::Ignored,
            identity,
            started: None,
            finished: None,
            exception: None,
            other_info: Some(message),
        }
    }

    /// A failure synthesized from an assertion dialog.
    pub(crate) fn dialog_assertion(
        identity: TestIdentity,
        message: String,
        detected_at: DateTime<FixedOffset>,
    ) -> Self {
        Self {
            result_type: ResultType::Failed,
            identity: Some(identity),
            started: None,
            finished: Some(detected_at),
            exception: None,
            other_info: Some(message),
        }
    }

    pub(crate) fn message_box(message: String, detected_at: DateTime<FixedOffset>) -> Self {
        Self {
            result_type: ResultType::SystemGeneratedFailure,
            identity: Some(TestIdentity::unattributable()),
            started: None,
            finished: Some(detected_at),
            exception: None,
            other_info: Some(message),
        }
    }

    pub(crate) fn host_timeout(message: String) -> Self {
        Self {
            result_type: ResultType::Failed,
            identity: None,
            started: None,
            finished: None,
            exception: None,
            other_info: Some(message),
        }
    }

    /// The outcome.
    pub fn result_type(&self) -> ResultType {
        self.result_type
    }

    /// The test this result belongs to, if known.
    pub fn identity(&self) -> Option<&TestIdentity> {
        self.identity.as_ref()
    }

    /// When the test started, if known.
    pub fn started(&self) -> Option<DateTime<FixedOffset>> {
        self.started
    }

    /// When the test finished, if known.
    pub fn finished(&self) -> Option<DateTime<FixedOffset>> {
        self.finished
    }

    /// The exception that failed the test, if any.
    pub fn exception(&self) -> Option<&ExceptionInfo> {
        self.exception.as_ref()
    }

    /// Additional context: dialog text, timeout messages or ignore reasons.
    pub fn other_info(&self) -> Option<&str> {
        self.other_info.as_deref()
    }

    /// The time the test took, if both timestamps are known and ordered.
    pub fn time_taken(&self) -> Option<Duration> {
        let (started, finished) = (self.started?, self.finished?);
        (finished - started).to_std().ok()
    }

    /// Converts this result into its machine-readable form.
    pub fn to_summary(&self) -> ResultSummary {
        ResultSummary {
            result: self.result_type.to_summary(),
            method: self.identity.as_ref().map(TestIdentity::to_summary),
            started: self.started,
            finished: self.finished,
            exception: self.exception.as_ref().map(ExceptionInfo::to_summary),
            other_info: self.other_info.clone(),
        }
    }
}

/// The ordered collection of results for one run.
///
/// Results appear in the order in which they were resolved, which is not necessarily the order
/// in which tests started. A `TestReport` obtained from
/// [`Aggregator::report`](crate::aggregator::Aggregator::report) is a snapshot.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct TestReport {
    results: Vec<TestCaseResult>,
}

impl TestReport {
    /// Creates a new, empty report.
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, result: TestCaseResult) {
        self.results.push(result);
    }

    /// Returns the results in resolution order.
    pub fn results(&self) -> &[TestCaseResult] {
        &self.results
    }

    /// Returns the number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Returns true if no results have been reported.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Computes statistics over the report.
    pub fn stats(&self) -> RunStats {
        let mut stats = RunStats::default();
        for result in &self.results {
            stats.on_result(result);
        }
        stats
    }

    /// Returns true if the report is non-empty and contains no failures.
    pub fn is_success(&self) -> bool {
        self.stats().is_success()
    }
}

/// Counts of results by outcome.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct RunStats {
    /// The number of passing tests.
    pub passed: usize,

    /// The number of failing tests, including dialog and timeout failures.
    pub failed: usize,

    /// The number of ignored tests.
    pub ignored: usize,

    /// The number of unattributable, harness-generated failures.
    pub system_failures: usize,
}

impl RunStats {
    pub(crate) fn on_result(&mut self, result: &TestCaseResult) {
        match result.result_type() {
            ResultType::Passed => self.passed += 1,
            ResultType::Failed => self.failed += 1,
            ResultType::Ignored => self.ignored += 1,
            ResultType::SystemGeneratedFailure => self.system_failures += 1,
        }
    }

    /// The total number of results counted.
    pub fn total(&self) -> usize {
        self.passed + self.failed + self.ignored + self.system_failures
    }

    /// The number of results that count as failures.
    pub fn failure_count(&self) -> usize {
        self.failed + self.system_failures
    }

    /// Returns true if at least one result was counted and none of them failed.
    pub fn is_success(&self) -> bool {
        self.total() > 0 && self.failure_count() == 0
    }
}
