// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! JUnit XML output.

use crate::{
    config::JunitConfig,
    errors::WriteReportError,
    report::{ResultType, TestCaseResult, TestReport},
};
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use quick_junit::{NonSuccessKind, Report, TestCase, TestCaseStatus, TestSuite};
use std::fs::File;

/// Suite used for results that aren't attributed to any test, such as host timeouts.
const HOST_SUITE: &str = "hostwatch";

/// Serializes a [`TestReport`] into a JUnit XML file.
///
/// Results are grouped into one test suite per `namespace.class`, in the order each suite first
/// appears in the report.
#[derive(Clone, Debug)]
pub struct JunitWriter {
    path: Utf8PathBuf,
    report_name: String,
}

impl JunitWriter {
    /// Creates a new writer for the given file and report name.
    pub fn new(path: impl Into<Utf8PathBuf>, report_name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            report_name: report_name.into(),
        }
    }

    /// Creates a new writer from a profile's JUnit configuration.
    pub fn from_config(config: &JunitConfig<'_>) -> Self {
        Self::new(config.path(), config.report_name())
    }

    /// Returns the path the report is written to.
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    /// Converts `report` into its JUnit representation.
    pub fn to_junit(&self, report: &TestReport) -> Report {
        let mut test_suites: IndexMap<String, TestSuite> = IndexMap::new();
        for result in report.results() {
            let suite_name = result
                .identity()
                .map_or_else(|| HOST_SUITE.to_owned(), |identity| identity.suite_name());
            let testcase = to_testcase(&suite_name, result);
            test_suites
                .entry(suite_name)
                .or_insert_with_key(|name| TestSuite::new(name.as_str()))
                .add_test_case(testcase);
        }

        let mut junit = Report::new(self.report_name.as_str());
        if let Some(timestamp) = report.results().iter().filter_map(|r| r.started()).min() {
            junit.set_timestamp(timestamp);
        }
        junit.add_test_suites(test_suites.into_values());
        junit
    }

    /// Writes `report` to the configured path, creating parent directories as needed.
    pub fn write(&self, report: &TestReport) -> Result<(), WriteReportError> {
        let junit = self.to_junit(report);

        if let Some(junit_dir) = self.path.parent() {
            std::fs::create_dir_all(junit_dir).map_err(|error| WriteReportError::Fs {
                file: junit_dir.to_path_buf(),
                error,
            })?;
        }

        let f = File::create(&self.path).map_err(|error| WriteReportError::Fs {
            file: self.path.clone(),
            error,
        })?;
        junit
            .serialize(f)
            .map_err(|error| WriteReportError::Junit {
                file: self.path.clone(),
                error,
            })
    }
}

fn to_testcase(suite_name: &str, result: &TestCaseResult) -> TestCase {
    let status = match result.result_type() {
        ResultType::Passed => TestCaseStatus::success(),
        ResultType::Ignored => {
            let mut status = TestCaseStatus::skipped();
            if let Some(message) = result.other_info() {
                status.set_message(message);
            }
            status
        }
        ResultType::Failed => match result.exception() {
            Some(exception) => {
                let mut status = TestCaseStatus::non_success(NonSuccessKind::Failure);
                status
                    .set_type(
                        exception
                            .full_type_name
                            .as_deref()
                            .unwrap_or("test failure"),
                    )
                    .set_message(exception.message.as_str());
                if let Some(stack_trace) = &exception.stack_trace {
                    status.set_description(stack_trace.as_str());
                }
                status
            }
            None if result.identity().is_none() => {
                failure_status(NonSuccessKind::Error, "host timeout", result.other_info())
            }
            None => failure_status(
                NonSuccessKind::Failure,
                "assertion dialog",
                result.other_info(),
            ),
        },
        ResultType::SystemGeneratedFailure => {
            failure_status(NonSuccessKind::Error, "message box", result.other_info())
        }
    };

    let name = result
        .identity()
        .map_or("(no test)", |identity| identity.method_name());
    let mut testcase = TestCase::new(name, status);
    testcase.set_classname(suite_name);
    if let Some(started) = result.started() {
        testcase.set_timestamp(started);
    }
    if let Some(time_taken) = result.time_taken() {
        testcase.set_time(time_taken);
    }
    testcase
}

fn failure_status(kind: NonSuccessKind, ty: &str, other_info: Option<&str>) -> TestCaseStatus {
    let mut status = TestCaseStatus::non_success(kind);
    status.set_type(ty);
    if let Some(other_info) = other_info {
        // The first line is a useful one-line summary; the full text goes into the description.
        status
            .set_message(other_info.lines().next().unwrap_or_default())
            .set_description(other_info);
    }
    status
}
