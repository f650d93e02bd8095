// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::{ExceptionSummary, MethodSummary};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A finalized test result, as emitted in machine-readable output.
///
/// One of these is written per line, in the order results were resolved.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ResultSummary {
    /// The outcome.
    pub result: ResultKindSummary,

    /// The test method, if the result could be attributed to one.
    pub method: Option<MethodSummary>,

    /// When the test started, if known.
    pub started: Option<DateTime<FixedOffset>>,

    /// When the test finished, if known.
    pub finished: Option<DateTime<FixedOffset>>,

    /// The exception that caused a failure, if any.
    pub exception: Option<ExceptionSummary>,

    /// Additional context: dialog text, timeout messages or ignore reasons.
    pub other_info: Option<String>,
}

/// The outcome tag of a [`ResultSummary`].
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResultKindSummary {
    /// The test passed.
    Passed,

    /// The test failed.
    Failed,

    /// The test was ignored.
    Ignored,

    /// A failure that the harness generated and could not attribute to a test.
    SystemGeneratedFailure,
}
