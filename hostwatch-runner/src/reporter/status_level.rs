// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status levels: filters for which results are displayed.
//!
//! Status levels play a role that's similar to log levels in typical loggers.

use crate::{errors::StatusLevelParseError, report::ResultType};
use serde::Deserialize;
use std::{fmt, str::FromStr};

/// Status level to show in the reporter output as results arrive.
///
/// Status levels are incremental: each level causes all the statuses listed above it to be
/// output. For example, [`Pass`](Self::Pass) implies [`Fail`](Self::Fail).
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Deserialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum StatusLevel {
    /// No output.
    None,

    /// Only output failures, including dialog and host-timeout failures.
    Fail,

    /// Output passing tests in addition to all variants above.
    Pass,

    /// Output ignored tests in addition to all variants above.
    Skip,

    /// Currently has the same meaning as [`Skip`](Self::Skip).
    All,
}

impl StatusLevel {
    /// Returns string representations of all known variants.
    pub fn variants() -> &'static [&'static str] {
        &["none", "fail", "pass", "skip", "all"]
    }

    /// The lowest status level at which a result of this type is displayed.
    pub(crate) fn for_result(result_type: ResultType) -> Self {
        match result_type {
            ResultType::Failed | ResultType::SystemGeneratedFailure => StatusLevel::Fail,
            ResultType::Passed => StatusLevel::Pass,
            ResultType::Ignored => StatusLevel::Skip,
        }
    }
}

impl FromStr for StatusLevel {
    type Err = StatusLevelParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let val = match s {
            "none" => StatusLevel::None,
            "fail" => StatusLevel::Fail,
            "pass" => StatusLevel::Pass,
            "skip" => StatusLevel::Skip,
            "all" => StatusLevel::All,
            other => return Err(StatusLevelParseError::new(other)),
        };
        Ok(val)
    }
}

impl fmt::Display for StatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusLevel::None => write!(f, "none"),
            StatusLevel::Fail => write!(f, "fail"),
            StatusLevel::Pass => write!(f, "pass"),
            StatusLevel::Skip => write!(f, "skip"),
            StatusLevel::All => write!(f, "all"),
        }
    }
}

/// Status level to show at the end of a run in the reporter output.
///
/// Status levels are incremental. This differs from [`StatusLevel`] in its ordering: ignored tests
/// are prioritized over passing ones.
#[derive(Copy, Clone, Debug, Eq, Ord, PartialEq, PartialOrd, Deserialize)]
#[cfg_attr(test, derive(test_strategy::Arbitrary))]
#[serde(rename_all = "kebab-case")]
#[non_exhaustive]
pub enum FinalStatusLevel {
    /// No output.
    None,

    /// Only output failures.
    Fail,

    /// Output ignored tests in addition to all variants above.
    Skip,

    /// Output passing tests in addition to all variants above.
    Pass,

    /// Currently has the same meaning as [`Pass`](Self::Pass).
    All,
}

impl fmt::Display for FinalStatusLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FinalStatusLevel::None => write!(f, "none"),
            FinalStatusLevel::Fail => write!(f, "fail"),
            FinalStatusLevel::Skip => write!(f, "skip"),
            FinalStatusLevel::Pass => write!(f, "pass"),
            FinalStatusLevel::All => write!(f, "all"),
        }
    }
}

impl FinalStatusLevel {
    pub(crate) fn for_result(result_type: ResultType) -> Self {
        match result_type {
            ResultType::Failed | ResultType::SystemGeneratedFailure => FinalStatusLevel::Fail,
            ResultType::Ignored => FinalStatusLevel::Skip,
            ResultType::Passed => FinalStatusLevel::Pass,
        }
    }
}
