// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::fixtures::*;
use hostwatch_runner::{aggregator::Aggregator, events::HostEvent, report::ResultType};
use std::{collections::BTreeMap, thread};

const TEST_COUNT: usize = 64;

fn method(n: usize) -> String {
    format!("test_{n:03}")
}

/// Delivers `events` from `threads` threads, each taking every `threads`th event.
fn deliver_concurrently(aggregator: &Aggregator, events: &[HostEvent], threads: usize) {
    thread::scope(|scope| {
        for offset in 0..threads {
            scope.spawn(move || {
                for event in events.iter().skip(offset).step_by(threads) {
                    aggregator.handle(event.clone());
                }
            });
        }
    });
}

#[test]
fn every_pair_fires_exactly_once() {
    let (aggregator, recorded) = recording_aggregator();

    // Completions first for even tests, begins first for odd ones, spread over threads so that
    // halves of the same pair race each other.
    let mut events = Vec::new();
    for n in 0..TEST_COUNT {
        let name = method(n);
        if n % 2 == 0 {
            events.push(passed(&name));
            events.push(begin(&name));
        } else {
            events.push(begin(&name));
            events.push(passed(&name));
        }
    }
    deliver_concurrently(&aggregator, &events, 8);

    let report = aggregator.report();
    assert_eq!(report.len(), TEST_COUNT);
    assert!(aggregator.unmatched().is_empty());

    let mut counts = BTreeMap::new();
    for result in report.results() {
        assert_eq!(result.result_type(), ResultType::Passed);
        let identity = result.identity().expect("passing results have an identity");
        *counts.entry(identity.method_name().to_owned()).or_insert(0) += 1;
    }
    assert_eq!(counts.len(), TEST_COUNT);
    assert!(counts.values().all(|&count| count == 1), "{counts:?}");

    assert_eq!(recorded.results(), report.results(), "broadcast order matches report");
}

#[test]
fn duplicate_deliveries_never_double_fire() {
    let aggregator = Aggregator::new();

    let mut events = Vec::new();
    for n in 0..TEST_COUNT {
        let name = method(n);
        events.push(begin(&name));
        events.push(passed(&name));
        events.push(begin(&name));
        events.push(passed(&name));
    }
    deliver_concurrently(&aggregator, &events, 4);

    let report = aggregator.report();
    assert_eq!(report.len(), TEST_COUNT, "one result per test");
    assert_eq!(report.stats().passed, TEST_COUNT);
}
