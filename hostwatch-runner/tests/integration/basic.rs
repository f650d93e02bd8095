// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use hostwatch_runner::{
    aggregator::{Aggregator, PendingKeys},
    events::{HostEvent, TestIdentity},
    report::ResultType,
};
use pretty_assertions::assert_eq;
use test_case::test_case;

fn run(events: Vec<HostEvent>) -> Aggregator {
    let aggregator = Aggregator::new();
    for event in events {
        aggregator.handle(event);
    }
    aggregator
}

fn o(result_type: ResultType, method: &str, info: Option<&str>) -> Outline {
    (
        result_type,
        Some(method.to_owned()),
        info.map(str::to_owned),
    )
}

#[test_case(vec![begin("a"), passed("a")] ; "begin then pass")]
#[test_case(vec![passed("a"), begin("a")] ; "pass then begin")]
fn pairing_is_order_independent(events: Vec<HostEvent>) {
    let aggregator = run(events);
    let report = aggregator.report();
    assert_eq!(
        outlines(report.results()),
        vec![o(ResultType::Passed, "a", None)]
    );
    assert!(aggregator.unmatched().is_empty());
}

#[test]
fn failure_before_begin() {
    let aggregator = run(vec![failed("x", "expected 1, got 2"), begin("x")]);
    let report = aggregator.report();
    assert_eq!(report.len(), 1);
    let result = &report.results()[0];
    assert_eq!(result.result_type(), ResultType::Failed);
    assert_eq!(result.identity(), Some(&id("x")));
    assert_eq!(
        result.exception().map(|exception| exception.message.as_str()),
        Some("expected 1, got 2")
    );
    assert!(aggregator.unmatched().is_empty(), "matcher table is empty");
}

#[test]
fn assertion_dialog_suppresses_later_pass() {
    let aggregator = run(vec![
        begin("a"),
        begin("b"),
        passed("a"),
        assert_dialog("boom"),
        passed("b"),
    ]);
    assert_eq!(
        outlines(aggregator.report().results()),
        vec![
            o(ResultType::Passed, "a", None),
            o(ResultType::Failed, "b", Some("boom")),
        ]
    );
}

#[test]
fn suppression_is_consumed_once() {
    // Suppression applies to one completion only. A redelivered completion is treated like any
    // other completion, and waits for a begin.
    let aggregator = run(vec![
        begin("a"),
        assert_dialog("boom"),
        passed("a"),
        passed("a"),
    ]);
    assert_eq!(
        outlines(aggregator.report().results()),
        vec![o(ResultType::Failed, "a", Some("boom"))]
    );
    assert_eq!(
        aggregator.unmatched(),
        PendingKeys {
            begins: vec![],
            completions: vec![id("a")],
        },
        "the begin was already consumed, so the second completion waits"
    );
}

#[test]
fn pending_dialog_attributed_to_previous_test() {
    let aggregator = run(vec![
        begin("a"),
        passed("a"),
        assert_dialog("late"),
        begin("b"),
        passed("b"),
    ]);
    assert_eq!(
        outlines(aggregator.report().results()),
        vec![
            o(ResultType::Passed, "a", None),
            o(ResultType::Failed, "a", Some("late")),
            o(ResultType::Passed, "b", None),
        ]
    );
}

#[test]
fn second_dialog_for_same_test_fails_it_again() {
    // The first dialog resolves `a`, so the second one waits for a begin. It's then attributed
    // to the test that began before `b`, which is `a` again.
    let aggregator = run(vec![
        begin("a"),
        assert_dialog("first"),
        assert_dialog("second"),
        passed("a"),
        begin("b"),
        passed("b"),
    ]);
    assert_eq!(
        outlines(aggregator.report().results()),
        vec![
            o(ResultType::Failed, "a", Some("first")),
            o(ResultType::Failed, "a", Some("second")),
            o(ResultType::Passed, "b", None),
        ]
    );
    assert!(aggregator.unmatched().is_empty());
}

#[test]
fn pending_dialog_before_any_begin() {
    let aggregator = run(vec![
        assert_dialog("early"),
        begin("a"),
        passed("a"),
        begin("b"),
        passed("b"),
    ]);
    assert_eq!(
        outlines(aggregator.report().results()),
        vec![
            o(ResultType::Failed, "a", Some("early")),
            o(ResultType::Passed, "b", None),
        ]
    );
}

#[test]
fn message_box_is_unattributable() {
    let aggregator = run(vec![begin("a"), message_box("Hello"), passed("a")]);
    let report = aggregator.report();
    assert_eq!(report.len(), 2);

    let system = &report.results()[0];
    assert_eq!(system.result_type(), ResultType::SystemGeneratedFailure);
    assert!(
        system
            .identity()
            .is_some_and(TestIdentity::is_unattributable)
    );
    assert_eq!(system.other_info(), Some("Hello"));

    // A message box doesn't affect the running test.
    assert_eq!(report.results()[1].result_type(), ResultType::Passed);
    assert_eq!(report.results()[1].identity(), Some(&id("a")));
}

#[test]
fn host_timeout_alone() {
    let aggregator = run(vec![HostEvent::HostTimeout {
        message: "lost connection".to_owned(),
    }]);
    assert_eq!(
        outlines(aggregator.report().results()),
        vec![(ResultType::Failed, None, Some("lost connection".to_owned()))]
    );
}

#[test]
fn ignored_bypasses_matching() {
    let aggregator = run(vec![
        begin("a"),
        HostEvent::MethodIgnored {
            identity: Some(id("a")),
            message: "not today".to_owned(),
        },
        HostEvent::MethodIgnored {
            identity: None,
            message: "anonymous".to_owned(),
        },
    ]);
    assert_eq!(
        outlines(aggregator.report().results()),
        vec![
            o(ResultType::Ignored, "a", Some("not today")),
            (ResultType::Ignored, None, Some("anonymous".to_owned())),
        ]
    );
    assert_eq!(aggregator.unmatched().begins, vec![id("a")]);
}

#[test]
fn trace_is_not_reported() {
    let aggregator = run(vec![HostEvent::Trace {
        message: "hello".to_owned(),
    }]);
    assert!(aggregator.report().is_empty());
}

#[test]
fn redelivered_begin_is_noop() {
    let aggregator = run(vec![begin("a"), begin("a"), passed("a")]);
    assert_eq!(
        outlines(aggregator.report().results()),
        vec![o(ResultType::Passed, "a", None)]
    );
    assert!(aggregator.unmatched().is_empty());
}

#[test]
fn duplicate_waiting_completion_replaces() {
    let aggregator = run(vec![
        failed("a", "first"),
        failed("a", "second"),
        begin("a"),
    ]);
    let report = aggregator.report();
    assert_eq!(report.len(), 1, "only one completion fires");
    assert_eq!(
        report.results()[0]
            .exception()
            .map(|exception| exception.message.as_str()),
        Some("second")
    );
}

#[test]
fn unmatched_lists_both_directions() {
    let aggregator = run(vec![begin("b"), begin("a"), passed("c")]);
    assert_eq!(
        aggregator.unmatched(),
        PendingKeys {
            begins: vec![id("a"), id("b")],
            completions: vec![id("c")],
        }
    );
    assert!(aggregator.report().is_empty());
}

#[test]
fn subscribers_see_report_order() {
    let (aggregator, recorded) = recording_aggregator();
    for event in [
        begin("a"),
        passed("b"),
        message_box("popup"),
        begin("b"),
        failed("a", "nope"),
        HostEvent::MethodIgnored {
            identity: Some(id("c")),
            message: "skipped".to_owned(),
        },
    ] {
        aggregator.handle(event);
    }

    let report = aggregator.report();
    assert_eq!(report.len(), 4);
    assert_eq!(recorded.results(), report.results());
    assert_eq!(
        report
            .results()
            .iter()
            .map(|result| result.result_type())
            .collect::<Vec<_>>(),
        [
            ResultType::SystemGeneratedFailure,
            ResultType::Passed,
            ResultType::Failed,
            ResultType::Ignored,
        ]
    );
}

#[test]
fn report_is_a_snapshot() {
    let aggregator = run(vec![begin("a"), passed("a")]);
    let snapshot = aggregator.report();
    aggregator.handle(begin("b"));
    aggregator.handle(passed("b"));
    assert_eq!(snapshot.len(), 1);
    assert_eq!(aggregator.report().len(), 2);
}
