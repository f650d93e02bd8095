// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Replays a recorded event stream end to end: decode, correlate, report.

use camino_tempfile::Utf8TempDir;
use hostwatch_runner::{
    aggregator::Aggregator,
    ingress::EventStream,
    report::ResultType,
    reporter::{DisplayReporterBuilder, JunitWriter},
};
use indoc::indoc;
use pretty_assertions::assert_eq;

static RECORDED_RUN: &str = indoc! {r#"
    {"kind":"method-begin","method":{"namespace":"Shop","class-name":"CartTests","method-name":"AddsItem"},"timestamp":"2024-05-01T10:00:00Z"}
    {"kind":"trace","message":"cart created"}
    {"kind":"method-passed","method":{"namespace":"Shop","class-name":"CartTests","method-name":"AddsItem"},"started":"2024-05-01T10:00:00Z","finished":"2024-05-01T10:00:01.250Z"}

    {"kind":"method-failed","method":{"namespace":"Shop","class-name":"CartTests","method-name":"RemovesItem"},"started":"2024-05-01T10:00:02Z","finished":"2024-05-01T10:00:03Z","exception":{"full-type-name":"System.InvalidOperationException","message":"cart is empty"}}
    {"kind":"method-begin","method":{"namespace":"Shop","class-name":"CartTests","method-name":"RemovesItem"},"timestamp":"2024-05-01T10:00:02Z"}
    {"kind":"method-begin","method":{"namespace":"Shop","class-name":"CheckoutTests","method-name":"Pays"},"timestamp":"2024-05-01T10:00:04Z"}
    {"kind":"dialog-raised","dialog":"assert","message":"Debug.Assert(total > 0)","timestamp":"2024-05-01T10:00:05Z"}
    {"kind":"method-passed","method":{"namespace":"Shop","class-name":"CheckoutTests","method-name":"Pays"},"started":"2024-05-01T10:00:04Z","finished":"2024-05-01T10:00:06Z"}
    {"kind":"method-ignored","method":{"namespace":"Shop","class-name":"CheckoutTests","method-name":"Refunds"},"message":"flaky on CI"}
    {"kind":"dialog-raised","dialog":"message-box","message":"Are you sure?","timestamp":"2024-05-01T10:00:07Z"}
    {"kind":"method-begin","method":{"namespace":"Shop","class-name":"CheckoutTests","method-name":"Ships"},"timestamp":"2024-05-01T10:00:08Z"}
"#};

fn replay(input: &str) -> Aggregator {
    let aggregator = Aggregator::new();
    for event in EventStream::new(input.as_bytes()) {
        aggregator.handle(event.expect("recorded events are valid"));
    }
    aggregator
}

#[test]
fn replay_recorded_run() {
    let aggregator = replay(RECORDED_RUN);
    let report = aggregator.report();

    assert_eq!(
        report
            .results()
            .iter()
            .map(|result| result.result_type())
            .collect::<Vec<_>>(),
        [
            ResultType::Passed,
            ResultType::Failed,
            ResultType::Failed,
            ResultType::Ignored,
            ResultType::SystemGeneratedFailure,
        ]
    );
    assert_eq!(
        report.results()[2].other_info(),
        Some("Debug.Assert(total > 0)"),
        "dialog failure stands and the later pass is discarded"
    );

    let stats = report.stats();
    assert_eq!(stats.failure_count(), 3);
    assert!(!report.is_success());

    let unmatched = aggregator.unmatched();
    assert!(unmatched.completions.is_empty());
    assert_eq!(unmatched.begins.len(), 1);
    assert_eq!(unmatched.begins[0].method_name(), "Ships");
}

#[test]
fn replay_to_junit() {
    let report = replay(RECORDED_RUN).report();

    let temp_dir = Utf8TempDir::new().expect("created temp dir");
    let path = temp_dir.path().join("junit/report.xml");
    let writer = JunitWriter::new(path.clone(), "recorded");
    writer.write(&report).expect("wrote JUnit report");

    let xml = std::fs::read_to_string(&path).expect("read JUnit report");
    assert!(xml.contains(r#"<testsuites name="recorded" tests="5""#), "{xml}");
    assert!(xml.contains(r#"<testsuite name="Shop.CartTests" tests="2""#), "{xml}");
    assert!(xml.contains(r#"<testsuite name="Shop.CheckoutTests" tests="2""#), "{xml}");
    assert!(xml.contains("System.InvalidOperationException"), "{xml}");
}

#[test]
fn replay_summary() {
    let aggregator = replay(RECORDED_RUN);
    let report = aggregator.report();

    let mut reporter = DisplayReporterBuilder::default().build(Vec::new());
    for result in report.results() {
        reporter.write_result(result).expect("writing to a Vec succeeds");
    }
    reporter
        .write_summary(&report, &aggregator.unmatched())
        .expect("writing to a Vec succeeds");

    let output = String::from_utf8(reporter.into_inner()).expect("output is UTF-8");
    assert!(
        output.contains("3 tests run: 1 passed, 2 failed, 1 system failure, 1 ignored"),
        "{output}"
    );
    assert!(
        output.contains("Shop.CheckoutTests Ships: began but never completed"),
        "{output}"
    );
}
