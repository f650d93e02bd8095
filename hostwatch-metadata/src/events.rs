// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// A single telemetry payload, as posted by the test host or the dialog watchdog.
///
/// Payloads are JSON objects tagged by a `kind` field. For example:
///
/// ```json
/// {"kind":"method-begin","method":{"namespace":"N","class-name":"C","method-name":"M"},"timestamp":"2024-01-01T00:00:00Z"}
/// ```
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum EventPayload {
    /// A test method started executing.
    MethodBegin {
        /// The test method.
        method: MethodSummary,

        /// When the method started.
        timestamp: DateTime<FixedOffset>,
    },

    /// A test method passed.
    MethodPassed {
        /// The test method.
        method: MethodSummary,

        /// When the method started.
        started: DateTime<FixedOffset>,

        /// When the method finished.
        finished: DateTime<FixedOffset>,
    },

    /// A test method failed.
    MethodFailed {
        /// The test method.
        method: MethodSummary,

        /// When the method started.
        started: DateTime<FixedOffset>,

        /// When the method finished.
        finished: DateTime<FixedOffset>,

        /// The exception that caused the failure, if the host captured one.
        #[serde(default)]
        exception: Option<ExceptionSummary>,
    },

    /// A test method was ignored by the host.
    MethodIgnored {
        /// The test method, if the host knows it.
        #[serde(default)]
        method: Option<MethodSummary>,

        /// The message supplied by the host.
        message: String,
    },

    /// Free-form trace output from the host.
    Trace {
        /// The trace message.
        message: String,
    },

    /// A modal dialog was detected and dismissed in the host process.
    DialogRaised {
        /// The kind of dialog.
        dialog: DialogKindSummary,

        /// The dialog's text, as captured before it was dismissed.
        message: String,

        /// When the dialog was detected.
        timestamp: DateTime<FixedOffset>,
    },

    /// Contact with the test host was lost.
    HostTimeout {
        /// A description of the timeout.
        message: String,
    },
}

/// Identifies a test method on the wire.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct MethodSummary {
    /// The namespace containing the test class.
    pub namespace: String,

    /// The test class name.
    pub class_name: String,

    /// The test method name.
    pub method_name: String,
}

/// Information about an exception thrown by a failing test.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ExceptionSummary {
    /// The fully-qualified type name of the exception.
    #[serde(default)]
    pub full_type_name: Option<String>,

    /// The exception message.
    pub message: String,

    /// The stack trace, if captured.
    #[serde(default)]
    pub stack_trace: Option<String>,
}

/// The kind of dialog reported by the dialog watchdog.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DialogKindSummary {
    /// A dialog raised by failed in-process assertion machinery.
    Assert,

    /// A plain message box.
    MessageBox,
}
