// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use chrono::{DateTime, FixedOffset, TimeZone};
use hostwatch_runner::{
    aggregator::{Aggregator, AggregatorBuilder},
    events::{DialogKind, ExceptionInfo, HostEvent, TestIdentity},
    report::{ResultType, TestCaseResult},
};
use std::sync::{Arc, Mutex};

pub(crate) fn ts(secs: i64) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .expect("valid offset")
        .timestamp_opt(secs, 0)
        .single()
        .expect("valid timestamp")
}

/// An identity in the fixture namespace and class.
pub(crate) fn id(method: &str) -> TestIdentity {
    TestIdentity::new("Fixtures", "Tests", method)
}

pub(crate) fn begin(method: &str) -> HostEvent {
    HostEvent::MethodBegin {
        identity: id(method),
        timestamp: ts(0),
    }
}

pub(crate) fn passed(method: &str) -> HostEvent {
    HostEvent::MethodPassed {
        identity: id(method),
        started: ts(0),
        finished: ts(1),
    }
}

pub(crate) fn failed(method: &str, message: &str) -> HostEvent {
    HostEvent::MethodFailed {
        identity: id(method),
        started: ts(0),
        finished: ts(2),
        exception: Some(ExceptionInfo::new(message)),
    }
}

pub(crate) fn assert_dialog(message: &str) -> HostEvent {
    HostEvent::DialogRaised {
        kind: DialogKind::Assert,
        message: message.to_owned(),
        timestamp: ts(5),
    }
}

pub(crate) fn message_box(message: &str) -> HostEvent {
    HostEvent::DialogRaised {
        kind: DialogKind::MessageBox,
        message: message.to_owned(),
        timestamp: ts(5),
    }
}

/// Results seen by a subscriber, shared with the test.
#[derive(Clone, Debug, Default)]
pub(crate) struct Recorded(Arc<Mutex<Vec<TestCaseResult>>>);

impl Recorded {
    pub(crate) fn results(&self) -> Vec<TestCaseResult> {
        self.0.lock().expect("not poisoned").clone()
    }
}

/// Builds an aggregator whose only subscriber records every result it's sent.
pub(crate) fn recording_aggregator() -> (Aggregator, Recorded) {
    let recorded = Recorded::default();
    let sink = recorded.0.clone();
    let mut builder = AggregatorBuilder::new();
    builder.add_subscriber(move |result: &TestCaseResult| {
        sink.lock().expect("not poisoned").push(result.clone());
    });
    (builder.build(), recorded)
}

/// A compact view of a result, for comparisons: the outcome, the method name if any, and the
/// free-text note if any.
pub(crate) type Outline = (ResultType, Option<String>, Option<String>);

pub(crate) fn outline(result: &TestCaseResult) -> Outline {
    (
        result.result_type(),
        result
            .identity()
            .map(|identity| identity.method_name().to_owned()),
        result.other_info().map(str::to_owned),
    )
}

pub(crate) fn outlines(results: &[TestCaseResult]) -> Vec<Outline> {
    results.iter().map(outline).collect()
}
