// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Errors produced by hostwatch.
//!
//! None of these are produced by [`Aggregator::handle`](crate::aggregator::Aggregator::handle):
//! domain conditions such as dialogs and host timeouts are report entries, not errors.

use camino::Utf8PathBuf;
use config::ConfigError;
use std::{error, fmt};
use thiserror::Error;

/// An error that occurred while parsing the config.
#[derive(Debug, Error)]
#[error("failed to parse hostwatch config at `{config_file}`")]
#[non_exhaustive]
pub struct ConfigParseError {
    config_file: Utf8PathBuf,
    #[source]
    err: ConfigError,
}

impl ConfigParseError {
    pub(crate) fn new(config_file: impl Into<Utf8PathBuf>, err: ConfigError) -> Self {
        Self {
            config_file: config_file.into(),
            err,
        }
    }

    /// Returns the config file that failed to parse.
    pub fn config_file(&self) -> &Utf8PathBuf {
        &self.config_file
    }
}

/// An error which indicates that a profile was requested but not known to hostwatch.
#[derive(Clone, Debug, Error)]
#[error("profile `{profile}` not found (known profiles: {})", .all_profiles.join(", "))]
pub struct ProfileNotFound {
    profile: String,
    all_profiles: Vec<String>,
}

impl ProfileNotFound {
    pub(crate) fn new(
        profile: impl Into<String>,
        all_profiles: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let mut all_profiles: Vec<_> = all_profiles.into_iter().map(|s| s.into()).collect();
        all_profiles.sort_unstable();
        Self {
            profile: profile.into(),
            all_profiles,
        }
    }
}

/// Error returned while parsing a [`StatusLevel`](crate::reporter::StatusLevel) value from a
/// string.
#[derive(Clone, Debug, Error)]
#[error(
    "unrecognized value for status-level: {input}\n(known values: {})",
    crate::reporter::StatusLevel::variants().join(", "),
)]
pub struct StatusLevelParseError {
    input: String,
}

impl StatusLevelParseError {
    pub(crate) fn new(input: impl Into<String>) -> Self {
        Self {
            input: input.into(),
        }
    }
}

/// An event payload was rejected at the ingress boundary.
#[derive(Debug)]
pub struct EventDecodeError {
    line: Option<usize>,
    kind: EventDecodeErrorKind,
}

impl EventDecodeError {
    pub(crate) fn new(kind: EventDecodeErrorKind) -> Self {
        Self { line: None, kind }
    }

    pub(crate) fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    /// The 1-based line number of the payload, if it came from a line-oriented stream.
    pub fn line(&self) -> Option<usize> {
        self.line
    }

    /// The kind of error.
    pub fn kind(&self) -> &EventDecodeErrorKind {
        &self.kind
    }
}

impl fmt::Display for EventDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "invalid event on line {line}"),
            None => write!(f, "invalid event"),
        }
    }
}

impl error::Error for EventDecodeError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        Some(&self.kind)
    }
}

/// The reason an event payload was rejected.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EventDecodeErrorKind {
    /// Reading from the underlying stream failed.
    #[error("error reading event stream")]
    Read(#[source] std::io::Error),

    /// The payload wasn't valid JSON, or didn't match any known event kind.
    #[error("payload did not match the event format")]
    Json(#[source] serde_json::Error),

    /// A test identity had an empty field.
    #[error("`{kind}` event has an empty `{field}` in its method")]
    EmptyIdentityField {
        /// The event kind.
        kind: &'static str,
        /// The empty field.
        field: &'static str,
    },

    /// A completion reported finishing before it started.
    #[error("`{kind}` event for `{method}` finished before it started")]
    FinishedBeforeStarted {
        /// The event kind.
        kind: &'static str,
        /// The test method, as `namespace.class.method`.
        method: String,
    },
}

/// An error that occurs while writing a report to disk or to an output stream.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WriteReportError {
    /// An error occurred while writing to an output stream.
    #[error("error writing to output")]
    Io(#[source] std::io::Error),

    /// An error occurred while operating on the file system.
    #[error("error operating on path {file}")]
    Fs {
        /// The file being operated on.
        file: Utf8PathBuf,
        /// The underlying IO error.
        #[source]
        error: std::io::Error,
    },

    /// An error occurred while serializing JUnit output.
    #[error("error writing JUnit output to {file}")]
    Junit {
        /// The output file.
        file: Utf8PathBuf,
        /// The underlying error.
        #[source]
        error: quick_junit::SerializeError,
    },

    /// An error occurred while serializing a result as JSON.
    #[error("error serializing result as JSON")]
    Json(#[source] serde_json::Error),
}

/// An error returned by a [`DialogProbe`](crate::dialog::DialogProbe).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DialogProbeError {
    /// The monitored host process isn't known yet, or has exited.
    #[error("host process is not available")]
    HostUnavailable,

    /// The platform's accessibility API returned an error.
    #[error("accessibility query failed: {message}")]
    Query {
        /// A description of the failure.
        message: String,
    },

    /// The dialog could not be dismissed.
    #[error("failed to dismiss dialog `{title}`")]
    Dismiss {
        /// The dialog title.
        title: String,
    },
}

/// No free TCP port was found for the harness server.
#[derive(Debug, Error)]
#[error("no free port found in range {start}..={end}")]
pub struct PortSelectionError {
    start: u16,
    end: u16,
    #[source]
    last_error: Option<std::io::Error>,
}

impl PortSelectionError {
    pub(crate) fn new(start: u16, end: u16, last_error: Option<std::io::Error>) -> Self {
        Self {
            start,
            end,
            last_error,
        }
    }
}

/// Displays an error along with its chain of sources.
pub struct DisplayErrorChain<E> {
    error: E,
}

impl<E: error::Error> DisplayErrorChain<E> {
    /// Creates a new `DisplayErrorChain`.
    pub fn new(error: E) -> Self {
        Self { error }
    }
}

impl<E: error::Error> fmt::Display for DisplayErrorChain<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        let mut source = self.error.source();
        while let Some(err) = source {
            write!(f, "\n  caused by:\n  - {err}")?;
            source = err.source();
        }

        Ok(())
    }
}
