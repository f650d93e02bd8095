// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! General support code for hostwatch-runner.

use crate::{events::TestIdentity, reporter::Styles};
use owo_colors::OwoColorize;
use std::{fmt, time::Duration};

/// Utilities for pluralizing various words based on count or plurality.
pub mod plural {
    /// Returns "test" if `count` is 1, otherwise "tests".
    pub fn tests_str(count: usize) -> &'static str {
        if count == 1 { "test" } else { "tests" }
    }

    /// Returns "failure" if `count` is 1, otherwise "failures".
    pub fn failures_str(count: usize) -> &'static str {
        if count == 1 { "failure" } else { "failures" }
    }
}

/// Displays a test identity as `namespace.class method`, with styling.
pub(crate) struct DisplayTestIdentity<'a> {
    identity: &'a TestIdentity,
    styles: &'a Styles,
}

impl<'a> DisplayTestIdentity<'a> {
    pub(crate) fn new(identity: &'a TestIdentity, styles: &'a Styles) -> Self {
        Self { identity, styles }
    }
}

impl fmt::Display for DisplayTestIdentity<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}",
            self.identity.suite_name().style(self.styles.suite),
            self.identity.method_name().style(self.styles.method),
        )
    }
}

/// Formats a duration in the fixed-width style used by status lines.
#[derive(Debug)]
pub(crate) struct StatusDuration(pub(crate) Option<Duration>);

impl fmt::Display for StatusDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            // * > means right-align.
            // * 8 is the number of characters to pad to.
            // * .3 means print three digits after the decimal point.
            Some(duration) => write!(f, "[{:>8.3}s]", duration.as_secs_f64()),
            None => write!(f, "[{:>9}]", ""),
        }
    }
}
