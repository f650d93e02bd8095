// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Machine-readable output: one JSON object per result, one result per line.

use crate::{
    aggregator::ResultSubscriber,
    errors::{DisplayErrorChain, WriteReportError},
    report::TestCaseResult,
};
use std::io::Write;
use tracing::warn;

/// Writes each result as a line of JSON, in the
/// [`ResultSummary`](hostwatch_metadata::ResultSummary) format.
#[derive(Debug)]
pub struct StructuredReporter<W> {
    writer: W,
    write_failed: bool,
}

impl<W: Write> StructuredReporter<W> {
    /// Creates a new reporter writing to `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            write_failed: false,
        }
    }

    /// Writes a single result.
    pub fn write_result(&mut self, result: &TestCaseResult) -> Result<(), WriteReportError> {
        serde_json::to_writer(&mut self.writer, &result.to_summary())
            .map_err(WriteReportError::Json)?;
        self.writer.write_all(b"\n").map_err(WriteReportError::Io)?;
        // CI tooling tails this output, so don't hold lines back.
        self.writer.flush().map_err(WriteReportError::Io)
    }

    /// Consumes the reporter, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write + Send> ResultSubscriber for StructuredReporter<W> {
    fn on_result(&mut self, result: &TestCaseResult) {
        if let Err(error) = self.write_result(result) {
            if !self.write_failed {
                warn!(
                    "failed to write structured result: {}",
                    DisplayErrorChain::new(&error)
                );
                self.write_failed = true;
            }
        }
    }
}
