// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::output::{NO_HEADING, StderrStyles};
use camino::Utf8PathBuf;
use hostwatch_metadata::HostwatchExitCode;
use hostwatch_runner::errors::*;
use owo_colors::OwoColorize;
use std::error::Error;
use thiserror::Error;
use tracing::{error, info};

pub(crate) type Result<T, E = ExpectedError> = std::result::Result<T, E>;

// Note that the #[error()] strings are mostly placeholder messages -- the expected way to print out
// errors is with the display_to_stderr method, which colorizes errors.

/// An expected failure, reported to the user with a documented exit code.
#[derive(Debug, Error)]
#[doc(hidden)]
pub enum ExpectedError {
    #[error("could not determine current directory")]
    CurrentDirFailed {
        #[source]
        err: std::io::Error,
    },
    #[error("current directory is not valid UTF-8")]
    CurrentDirInvalidUtf8 { path: std::path::PathBuf },
    #[error("profile not found")]
    ProfileNotFound {
        #[from]
        err: ProfileNotFound,
    },
    #[error("config parse error")]
    ConfigParseError {
        #[from]
        err: ConfigParseError,
    },
    #[error("failed to open event stream")]
    EventStreamOpenFailed {
        path: Utf8PathBuf,
        #[source]
        err: std::io::Error,
    },
    #[error("failed to decode event stream")]
    EventDecodeFailed {
        source_name: String,
        #[source]
        err: EventDecodeError,
    },
    #[error("failed to write report")]
    WriteReportError {
        #[from]
        err: WriteReportError,
    },
    #[error("failed to select a port")]
    PortSelectionFailed {
        #[from]
        err: PortSelectionError,
    },
    #[error("test run failed")]
    TestRunFailed,
    #[error("no tests were run")]
    NoTestsRun,
    #[error("test run incomplete")]
    IncompleteRun { unmatched: usize },
}

impl ExpectedError {
    pub(crate) fn event_stream_open_failed(path: Utf8PathBuf, err: std::io::Error) -> Self {
        Self::EventStreamOpenFailed { path, err }
    }

    pub(crate) fn event_decode_failed(
        source_name: impl Into<String>,
        err: EventDecodeError,
    ) -> Self {
        Self::EventDecodeFailed {
            source_name: source_name.into(),
            err,
        }
    }

    /// Returns the exit code for the process.
    pub fn process_exit_code(&self) -> i32 {
        match self {
            Self::CurrentDirFailed { .. }
            | Self::CurrentDirInvalidUtf8 { .. }
            | Self::ProfileNotFound { .. }
            | Self::ConfigParseError { .. } => HostwatchExitCode::SETUP_ERROR,
            Self::EventStreamOpenFailed { .. } | Self::EventDecodeFailed { .. } => {
                HostwatchExitCode::INVALID_EVENT_STREAM
            }
            Self::WriteReportError { .. } => HostwatchExitCode::WRITE_OUTPUT_ERROR,
            Self::PortSelectionFailed { .. } => HostwatchExitCode::PORT_SELECTION_FAILED,
            Self::TestRunFailed => HostwatchExitCode::TEST_RUN_FAILED,
            Self::NoTestsRun => HostwatchExitCode::NO_TESTS_RUN,
            Self::IncompleteRun { .. } => HostwatchExitCode::INCOMPLETE_RUN,
        }
    }

    /// Displays this error to stderr.
    pub fn display_to_stderr(&self, styles: &StderrStyles) {
        let mut next_error = match &self {
            Self::CurrentDirFailed { err } => {
                error!("could not determine current directory");
                Some(err as &dyn Error)
            }
            Self::CurrentDirInvalidUtf8 { path } => {
                error!(
                    "current directory `{}` is not valid UTF-8",
                    path.display().style(styles.bold)
                );
                None
            }
            Self::ProfileNotFound { err } => {
                error!("{err}");
                err.source()
            }
            Self::ConfigParseError { err } => {
                error!(
                    "failed to parse hostwatch config at `{}`",
                    err.config_file().style(styles.bold)
                );
                err.source()
            }
            Self::EventStreamOpenFailed { path, err } => {
                error!("failed to open event stream `{}`", path.style(styles.bold));
                Some(err as &dyn Error)
            }
            Self::EventDecodeFailed { source_name, err } => {
                error!("in `{}`: {err}", source_name.style(styles.bold));
                err.source()
            }
            Self::WriteReportError { err } => {
                error!("failed to write report");
                Some(err as &dyn Error)
            }
            Self::PortSelectionFailed { err } => {
                error!("{err}");
                err.source()
            }
            Self::TestRunFailed => {
                error!("test run failed");
                None
            }
            Self::NoTestsRun => {
                error!("no tests were run");
                None
            }
            Self::IncompleteRun { unmatched } => {
                error!(
                    "test run incomplete: {} {} began or completed without a matching event",
                    unmatched.style(styles.warning_text),
                    hostwatch_runner::plural::tests_str(*unmatched),
                );
                info!(
                    target: NO_HEADING,
                    "(the test host may have stopped responding: check for a host timeout above)"
                );
                None
            }
        };

        while let Some(err) = next_error {
            error!(target: NO_HEADING, "\nCaused by:\n  {}", err);
            next_error = err.source();
        }
    }
}
