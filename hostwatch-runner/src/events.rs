// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Typed events delivered to the [`Aggregator`](crate::aggregator::Aggregator).
//!
//! Events are produced from wire payloads by the [`ingress`](crate::ingress) module, or directly
//! by in-process producers such as the [dialog watchdog](crate::dialog::DialogWatchdog).

use chrono::{DateTime, FixedOffset};
use hostwatch_metadata::{DialogKindSummary, ExceptionSummary, MethodSummary};
use std::fmt;

/// The identity of a single test method: the correlation key used throughout hostwatch.
///
/// Two identities are equal iff all three fields match.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TestIdentity {
    namespace: String,
    class_name: String,
    method_name: String,
}

impl TestIdentity {
    const UNATTRIBUTABLE_NAMESPACE: &'static str = "[hostwatch]";
    const UNATTRIBUTABLE_CLASS: &'static str = "[CannotFigureItOut]";
    const UNATTRIBUTABLE_METHOD: &'static str = "[NotEnoughContext]";

    /// Creates a new identity.
    pub fn new(
        namespace: impl Into<String>,
        class_name: impl Into<String>,
        method_name: impl Into<String>,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            class_name: class_name.into(),
            method_name: method_name.into(),
        }
    }

    /// Returns the sentinel identity used for failures that can't be tied to any test.
    pub fn unattributable() -> Self {
        Self::new(
            Self::UNATTRIBUTABLE_NAMESPACE,
            Self::UNATTRIBUTABLE_CLASS,
            Self::UNATTRIBUTABLE_METHOD,
        )
    }

    /// Returns true if this is the [unattributable](Self::unattributable) sentinel.
    pub fn is_unattributable(&self) -> bool {
        self.namespace == Self::UNATTRIBUTABLE_NAMESPACE
            && self.class_name == Self::UNATTRIBUTABLE_CLASS
            && self.method_name == Self::UNATTRIBUTABLE_METHOD
    }

    /// The namespace containing the test class.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The test class name.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// The test method name.
    pub fn method_name(&self) -> &str {
        &self.method_name
    }

    /// Returns `namespace.class`, used to group results into suites.
    pub fn suite_name(&self) -> String {
        format!("{}.{}", self.namespace, self.class_name)
    }

    pub(crate) fn to_summary(&self) -> MethodSummary {
        MethodSummary {
            namespace: self.namespace.clone(),
            class_name: self.class_name.clone(),
            method_name: self.method_name.clone(),
        }
    }
}

impl From<MethodSummary> for TestIdentity {
    fn from(summary: MethodSummary) -> Self {
        Self::new(summary.namespace, summary.class_name, summary.method_name)
    }
}

impl fmt::Display for TestIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.namespace, self.class_name, self.method_name
        )
    }
}

/// An event delivered to the aggregator.
///
/// This is a closed set: every event the test host or the dialog watchdog can produce is one of
/// these variants.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum HostEvent {
    /// A test method started executing.
    MethodBegin {
        /// The test that began.
        identity: TestIdentity,
        /// When it began.
        timestamp: DateTime<FixedOffset>,
    },

    /// A test method passed.
    MethodPassed {
        /// The test that passed.
        identity: TestIdentity,
        /// When it started.
        started: DateTime<FixedOffset>,
        /// When it finished.
        finished: DateTime<FixedOffset>,
    },

    /// A test method failed.
    MethodFailed {
        /// The test that failed.
        identity: TestIdentity,
        /// When it started.
        started: DateTime<FixedOffset>,
        /// When it finished.
        finished: DateTime<FixedOffset>,
        /// The exception, if the host captured one.
        exception: Option<ExceptionInfo>,
    },

    /// A test method was ignored. Ignored tests are not paired with a begin.
    MethodIgnored {
        /// The test, if the host reported it.
        identity: Option<TestIdentity>,
        /// The ignore message.
        message: String,
    },

    /// Trace output from the host. Not reflected in the report.
    Trace {
        /// The trace message.
        message: String,
    },

    /// A modal dialog was detected and dismissed. Dialogs carry no test identity.
    DialogRaised {
        /// The kind of dialog.
        kind: DialogKind,
        /// The dialog text.
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

impl HostEvent {
    /// Returns a short, static description of the event kind, for logging.
    pub fn kind_str(&self) -> &'static str {
        match self {
            HostEvent::MethodBegin { .. } => "method-begin",
            HostEvent::MethodPassed { .. } => "method-passed",
            HostEvent::MethodFailed { .. } => "method-failed",
            HostEvent::MethodIgnored { .. } => "method-ignored",
            HostEvent::Trace { .. } => "trace",
            HostEvent::DialogRaised { .. } => "dialog-raised",
            HostEvent::HostTimeout { .. } => "host-timeout",
        }
    }
}

/// The kind of a dismissed dialog.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum DialogKind {
    /// Raised by failed assertion machinery inside the host.
    Assert,

    /// A plain message box, which can't be tied to a test.
    MessageBox,
}

impl From<DialogKindSummary> for DialogKind {
    fn from(summary: DialogKindSummary) -> Self {
        match summary {
            DialogKindSummary::Assert => DialogKind::Assert,
            DialogKindSummary::MessageBox => DialogKind::MessageBox,
        }
    }
}

impl From<DialogKind> for DialogKindSummary {
    fn from(kind: DialogKind) -> Self {
        match kind {
            DialogKind::Assert => DialogKindSummary::Assert,
            DialogKind::MessageBox => DialogKindSummary::MessageBox,
        }
    }
}

/// Information about the exception that failed a test.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExceptionInfo {
    /// The fully-qualified exception type, if known.
    pub full_type_name: Option<String>,

    /// The exception message.
    pub message: String,

    /// The stack trace, if captured.
    pub stack_trace: Option<String>,
}

impl ExceptionInfo {
    /// Creates exception info with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            full_type_name: None,
            message: message.into(),
            stack_trace: None,
        }
    }

    pub(crate) fn to_summary(&self) -> ExceptionSummary {
        ExceptionSummary {
            full_type_name: self.full_type_name.clone(),
            message: self.message.clone(),
            stack_trace: self.stack_trace.clone(),
        }
    }
}

impl From<ExceptionSummary> for ExceptionInfo {
    fn from(summary: ExceptionSummary) -> Self {
        Self {
            full_type_name: summary.full_type_name,
            message: summary.message,
            stack_trace: summary.stack_trace,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_equality_uses_all_fields() {
        let a = TestIdentity::new("N", "C", "M");
        assert_eq!(a, TestIdentity::new("N", "C", "M"));
        assert_ne!(a, TestIdentity::new("N2", "C", "M"));
        assert_ne!(a, TestIdentity::new("N", "C2", "M"));
        assert_ne!(a, TestIdentity::new("N", "C", "M2"));
    }

    #[test]
    fn unattributable_sentinel() {
        let sentinel = TestIdentity::unattributable();
        assert!(sentinel.is_unattributable());
        assert!(!TestIdentity::new("N", "C", "M").is_unattributable());
        assert_eq!(
            sentinel.to_string(),
            "[hostwatch].[CannotFigureItOut].[NotEnoughContext]"
        );
    }
}
