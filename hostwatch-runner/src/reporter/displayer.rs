// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prints out results as they arrive, and a summary at the end of the run.

use super::{FinalStatusLevel, StatusLevel, Styles};
use crate::{
    aggregator::{PendingKeys, ResultSubscriber},
    errors::WriteReportError,
    events::TestIdentity,
    helpers::{DisplayTestIdentity, StatusDuration, plural},
    report::{ResultType, TestCaseResult, TestReport},
};
use owo_colors::OwoColorize;
use std::{io, io::Write, time::Duration};
use tracing::warn;

/// Builder for a [`DisplayReporter`].
#[derive(Debug, Default)]
pub struct DisplayReporterBuilder {
    status_level: Option<StatusLevel>,
    final_status_level: Option<FinalStatusLevel>,
    should_colorize: bool,
}

impl DisplayReporterBuilder {
    /// Sets the kinds of statuses to output as results arrive.
    pub fn set_status_level(&mut self, status_level: StatusLevel) -> &mut Self {
        self.status_level = Some(status_level);
        self
    }

    /// Sets the kinds of statuses to output at the end of the run.
    pub fn set_final_status_level(&mut self, final_status_level: FinalStatusLevel) -> &mut Self {
        self.final_status_level = Some(final_status_level);
        self
    }

    /// Sets whether output should be colorized.
    pub fn set_colorize(&mut self, should_colorize: bool) -> &mut Self {
        self.should_colorize = should_colorize;
        self
    }

    /// Creates a new reporter writing to `writer`.
    ///
    /// The builder can be reused: the console reporter is typically built once as a subscriber
    /// and once more to write the summary after the run.
    pub fn build<W: Write>(&self, writer: W) -> DisplayReporter<W> {
        let mut styles = Box::new(Styles::default());
        if self.should_colorize {
            styles.colorize();
        }

        DisplayReporter {
            status_level: self.status_level.unwrap_or(StatusLevel::Pass),
            final_status_level: self.final_status_level.unwrap_or(FinalStatusLevel::Fail),
            styles,
            writer,
            write_failed: false,
        }
    }
}

/// Writes human-readable status lines for results.
#[derive(Debug)]
pub struct DisplayReporter<W> {
    status_level: StatusLevel,
    final_status_level: FinalStatusLevel,
    styles: Box<Styles>,
    writer: W,
    write_failed: bool,
}

impl<W: Write> DisplayReporter<W> {
    /// Writes the status line for `result`, if the status level permits it.
    pub fn write_result(&mut self, result: &TestCaseResult) -> io::Result<()> {
        if self.status_level < StatusLevel::for_result(result.result_type()) {
            return Ok(());
        }
        self.write_status_line(result)?;
        self.write_details(result)
    }

    /// Writes the summary for a finished run.
    ///
    /// `unmatched` lists tests whose begin or completion never found its counterpart.
    pub fn write_summary(
        &mut self,
        report: &TestReport,
        unmatched: &PendingKeys<TestIdentity>,
    ) -> Result<(), WriteReportError> {
        self.write_summary_impl(report, unmatched)
            .map_err(WriteReportError::Io)
    }

    /// Consumes the reporter, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }

    // ---
    // Helper methods
    // ---

    fn write_status_line(&mut self, result: &TestCaseResult) -> io::Result<()> {
        let style = self.styles.for_result(result.result_type());
        write!(
            self.writer,
            "{:>12} {} ",
            status_str(result.result_type()).style(style),
            StatusDuration(result.time_taken()),
        )?;
        match result.identity() {
            Some(identity) => writeln!(
                self.writer,
                "{}",
                DisplayTestIdentity::new(identity, &self.styles)
            ),
            None => writeln!(self.writer, "{}", "(no test)".style(self.styles.detail)),
        }
    }

    fn write_details(&mut self, result: &TestCaseResult) -> io::Result<()> {
        if let Some(exception) = result.exception() {
            let header = match &exception.full_type_name {
                Some(ty) => format!("{ty}: {}", exception.message),
                None => exception.message.clone(),
            };
            self.write_indented(&header)?;
            if let Some(stack_trace) = &exception.stack_trace {
                self.write_indented(stack_trace)?;
            }
        }
        if let Some(other_info) = result.other_info() {
            self.write_indented(other_info)?;
        }
        Ok(())
    }

    fn write_indented(&mut self, text: &str) -> io::Result<()> {
        for line in text.lines() {
            writeln!(self.writer, "    {}", line.style(self.styles.detail))?;
        }
        Ok(())
    }

    fn write_summary_impl(
        &mut self,
        report: &TestReport,
        unmatched: &PendingKeys<TestIdentity>,
    ) -> io::Result<()> {
        let stats = report.stats();
        let summary_style = if stats.failure_count() > 0 {
            self.styles.fail
        } else {
            self.styles.pass
        };

        writeln!(self.writer, "{}", "------------".style(summary_style))?;
        write!(
            self.writer,
            "{:>12} {} ",
            "Summary".style(summary_style),
            StatusDuration(Some(run_span(report))),
        )?;

        let tests_run = stats.passed + stats.failed;
        write!(
            self.writer,
            "{} {} run: {} passed",
            tests_run.style(self.styles.count),
            plural::tests_str(tests_run),
            stats.passed.style(self.styles.pass),
        )?;
        if stats.failed > 0 {
            write!(
                self.writer,
                ", {} failed",
                stats.failed.style(self.styles.fail)
            )?;
        }
        if stats.system_failures > 0 {
            write!(
                self.writer,
                ", {} system {}",
                stats.system_failures.style(self.styles.sysfail),
                plural::failures_str(stats.system_failures),
            )?;
        }
        writeln!(
            self.writer,
            ", {} ignored",
            stats.ignored.style(self.styles.skip)
        )?;

        for result in report.results() {
            if self.final_status_level >= FinalStatusLevel::for_result(result.result_type()) {
                self.write_status_line(result)?;
            }
        }

        for identity in &unmatched.begins {
            writeln!(
                self.writer,
                "{:>12} {}: began but never completed",
                "UNMATCHED".style(self.styles.fail),
                DisplayTestIdentity::new(identity, &self.styles),
            )?;
        }
        for identity in &unmatched.completions {
            writeln!(
                self.writer,
                "{:>12} {}: completed but never began",
                "UNMATCHED".style(self.styles.fail),
                DisplayTestIdentity::new(identity, &self.styles),
            )?;
        }

        Ok(())
    }
}

impl<W: Write + Send> ResultSubscriber for DisplayReporter<W> {
    fn on_result(&mut self, result: &TestCaseResult) {
        if let Err(error) = self.write_result(result) {
            // Keep receiving results: the report itself is unaffected.
            if !self.write_failed {
                warn!("failed to write status line: {error}");
                self.write_failed = true;
            }
        }
    }
}

fn status_str(result_type: ResultType) -> &'static str {
    match result_type {
        ResultType::Passed => "PASS",
        ResultType::Failed => "FAIL",
        ResultType::Ignored => "IGNORE",
        ResultType::SystemGeneratedFailure => "SYSFAIL",
    }
}

/// The time between the earliest known start and the latest known finish.
fn run_span(report: &TestReport) -> Duration {
    let started = report.results().iter().filter_map(|r| r.started()).min();
    let finished = report.results().iter().filter_map(|r| r.finished()).max();
    match (started, finished) {
        (Some(started), Some(finished)) => (finished - started).to_std().unwrap_or_default(),
        _ => Duration::ZERO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ExceptionInfo;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn ts(secs: i64) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .expect("valid offset")
            .timestamp_opt(secs, 0)
            .single()
            .expect("valid timestamp")
    }

    fn sample_report() -> TestReport {
        let mut report = TestReport::new();
        report.push(TestCaseResult::passed(
            TestIdentity::new("Ns", "Class", "Passes"),
            ts(0),
            ts(1),
        ));
        let mut exception = ExceptionInfo::new("expected 1, got 2");
        exception.full_type_name = Some("AssertFailedException".to_owned());
        report.push(TestCaseResult::failed(
            TestIdentity::new("Ns", "Class", "Fails"),
            ts(1),
            ts(3),
            Some(exception),
        ));
        report.push(TestCaseResult::ignored(None, "not today".to_owned()));
        report
    }

    fn write_all(builder: &DisplayReporterBuilder, report: &TestReport) -> String {
        let mut reporter = builder.build(Vec::new());
        for result in report.results() {
            reporter.write_result(result).expect("writing to a Vec succeeds");
        }
        String::from_utf8(reporter.into_inner()).expect("output is UTF-8")
    }

    #[test]
    fn status_lines_at_pass() {
        let mut builder = DisplayReporterBuilder::default();
        builder.set_status_level(StatusLevel::Pass);

        assert_eq!(
            write_all(&builder, &sample_report()),
            "        PASS [   1.000s] Ns.Class Passes\n\
            \x20       FAIL [   2.000s] Ns.Class Fails\n\
            \x20   AssertFailedException: expected 1, got 2\n"
        );
    }

    #[test]
    fn status_lines_at_all() {
        let mut builder = DisplayReporterBuilder::default();
        builder.set_status_level(StatusLevel::All);

        let output = write_all(&builder, &sample_report());
        assert!(output.ends_with("      IGNORE [         ] (no test)\n    not today\n"));
    }

    #[test]
    fn status_lines_at_none() {
        let mut builder = DisplayReporterBuilder::default();
        builder.set_status_level(StatusLevel::None);
        assert_eq!(write_all(&builder, &sample_report()), "");
    }

    #[test]
    fn summary() {
        let mut reporter = DisplayReporterBuilder::default().build(Vec::new());
        let unmatched = PendingKeys {
            begins: vec![TestIdentity::new("Ns", "Class", "Hangs")],
            completions: vec![],
        };
        reporter
            .write_summary(&sample_report(), &unmatched)
            .expect("writing to a Vec succeeds");

        let output = String::from_utf8(reporter.into_inner()).expect("output is UTF-8");
        assert_eq!(
            output,
            indoc! {"
                ------------
                     Summary [   3.000s] 2 tests run: 1 passed, 1 failed, 1 ignored
                        FAIL [   2.000s] Ns.Class Fails
                   UNMATCHED Ns.Class Hangs: began but never completed
            "}
        );
    }

    #[test]
    fn summary_for_empty_report() {
        let mut reporter = DisplayReporterBuilder::default().build(Vec::new());
        reporter
            .write_summary(&TestReport::new(), &PendingKeys::default())
            .expect("writing to a Vec succeeds");

        let output = String::from_utf8(reporter.into_inner()).expect("output is UTF-8");
        assert_eq!(
            output,
            indoc! {"
                ------------
                     Summary [   0.000s] 0 tests run: 0 passed, 0 ignored
            "}
        );
    }
}
