// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{
    correlator::DialogAssertionCorrelator,
    matcher::{BeginCompletionMatcher, MatchOutcome, PendingKeys},
};
use crate::{
    events::{DialogKind, HostEvent, TestIdentity},
    report::{TestCaseResult, TestReport},
};
use debug_ignore::DebugIgnore;
use std::{
    collections::HashSet,
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};
use tracing::{debug, trace};

/// Receives every finalized result, in the order results enter the report.
///
/// Subscribers are called synchronously while the report is locked, so they should be quick and
/// must not call back into the [`Aggregator`].
pub trait ResultSubscriber: Send {
    /// Called once per finalized result.
    fn on_result(&mut self, result: &TestCaseResult);
}

impl<F> ResultSubscriber for F
where
    F: FnMut(&TestCaseResult) + Send,
{
    fn on_result(&mut self, result: &TestCaseResult) {
        self(result)
    }
}

/// Receives trace output from the host.
///
/// Trace events are never part of the report. This hook exists so that consumers of trace
/// output can be added without changing the event contract.
pub trait TraceSink: Send + Sync {
    /// Called once per trace event.
    fn on_trace(&self, message: &str);
}

/// Builder for an [`Aggregator`].
#[derive(Debug, Default)]
pub struct AggregatorBuilder {
    subscribers: DebugIgnore<Vec<Box<dyn ResultSubscriber>>>,
    trace_sink: DebugIgnore<Option<Box<dyn TraceSink>>>,
}

impl AggregatorBuilder {
    /// Creates a new builder with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a subscriber that receives every finalized result.
    pub fn add_subscriber(&mut self, subscriber: impl ResultSubscriber + 'static) -> &mut Self {
        self.subscribers.push(Box::new(subscriber));
        self
    }

    /// Sets the sink for trace events.
    pub fn set_trace_sink(&mut self, sink: impl TraceSink + 'static) -> &mut Self {
        *self.trace_sink = Some(Box::new(sink));
        self
    }

    /// Builds the aggregator.
    pub fn build(self) -> Aggregator {
        let AggregatorBuilder {
            subscribers,
            trace_sink,
        } = self;
        Aggregator {
            seen_begins: Mutex::new(HashSet::new()),
            matcher: BeginCompletionMatcher::new(),
            shared: Arc::new(Shared {
                correlator: DialogAssertionCorrelator::new(),
                sink: Mutex::new(ReportSink {
                    report: TestReport::new(),
                    subscribers: subscribers.0,
                }),
            }),
            trace_sink: trace_sink.0,
        }
    }
}

type CompletionAction = Box<dyn FnOnce() + Send>;

/// Correlates host events into a [`TestReport`].
///
/// The aggregator is the single entry point for events: call [`handle`](Self::handle) with each
/// event as it arrives. It is `Send + Sync`, and `handle` may be called concurrently from any
/// number of delivery contexts (inbound requests, the dialog watchdog).
///
/// Every result enters the report through one path, which broadcasts it to subscribers and then
/// appends it, both while holding the report lock. Subscribers therefore see results exactly once
/// and in report order.
pub struct Aggregator {
    seen_begins: Mutex<HashSet<TestIdentity>>,
    matcher: BeginCompletionMatcher<TestIdentity, CompletionAction>,
    shared: Arc<Shared>,
    trace_sink: Option<Box<dyn TraceSink>>,
}

/// State reachable from completion actions stored in the matcher.
struct Shared {
    correlator: DialogAssertionCorrelator,
    sink: Mutex<ReportSink>,
}

struct ReportSink {
    report: TestReport,
    subscribers: Vec<Box<dyn ResultSubscriber>>,
}

impl Aggregator {
    /// Creates an aggregator with no subscribers.
    pub fn new() -> Self {
        AggregatorBuilder::new().build()
    }

    /// Handles a single event.
    ///
    /// Never fails: dialogs, timeouts and ignored tests are all recorded as report entries.
    pub fn handle(&self, event: HostEvent) {
        trace!("handling {} event", event.kind_str());
        match event {
            HostEvent::MethodBegin { identity, .. } => self.on_begin(identity),
            HostEvent::MethodPassed {
                identity,
                started,
                finished,
            } => {
                let result = TestCaseResult::passed(identity.clone(), started, finished);
                self.on_completion(identity, result);
            }
            HostEvent::MethodFailed {
                identity,
                started,
                finished,
                exception,
            } => {
                let result = TestCaseResult::failed(identity.clone(), started, finished, exception);
                self.on_completion(identity, result);
            }
            HostEvent::MethodIgnored { identity, message } => {
                self.shared
                    .report_it(TestCaseResult::ignored(identity, message));
            }
            HostEvent::Trace { message } => {
                // Reserved: trace output is never part of the report.
                if let Some(sink) = &self.trace_sink {
                    sink.on_trace(&message);
                }
            }
            HostEvent::DialogRaised {
                kind: DialogKind::Assert,
                message,
                timestamp,
            } => {
                if let Some(result) = self.shared.correlator.on_assert_dialog(message, timestamp) {
                    self.shared.report_it(result);
                }
            }
            HostEvent::DialogRaised {
                kind: DialogKind::MessageBox,
                message,
                timestamp,
            } => {
                let result = self
                    .shared
                    .correlator
                    .on_message_box_dialog(message, timestamp);
                self.shared.report_it(result);
            }
            HostEvent::HostTimeout { message } => {
                self.shared.report_it(TestCaseResult::host_timeout(message));
            }
        }
    }

    /// Returns a snapshot of the report so far.
    pub fn report(&self) -> TestReport {
        self.shared.lock_sink().report.clone()
    }

    /// Returns the tests that are still waiting for a counterpart.
    ///
    /// A well-formed run leaves nothing here. Anything left over after the run ended indicates a
    /// test that began and never completed (or vice versa).
    pub fn unmatched(&self) -> PendingKeys<TestIdentity> {
        self.matcher.pending_keys()
    }

    fn on_begin(&self, identity: TestIdentity) {
        {
            let mut seen = self
                .seen_begins
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !seen.insert(identity.clone()) {
                debug!("ignoring redelivered begin for {identity}");
                return;
            }
        }

        // The correlator must see the begin before the matcher does: a completion waiting in the
        // matcher resolves the test, and the correlator has to know the test was active first.
        for result in self.shared.correlator.on_begin(&identity) {
            self.shared.report_it(result);
        }
        self.matcher.on_begin(identity);
    }

    fn on_completion(&self, identity: TestIdentity, result: TestCaseResult) {
        let shared = self.shared.clone();
        let key = identity.clone();
        let action: CompletionAction = Box::new(move || {
            shared.correlator.on_resolved(&identity);
            if shared.correlator.take_suppression(&identity) {
                debug!(
                    "discarding {:?} completion for {identity}: already failed by a dialog",
                    result.result_type(),
                );
                return;
            }
            shared.report_it(result);
        });

        if self.matcher.on_completion(key, action) == MatchOutcome::Replaced {
            debug!("completion replaced an earlier one still waiting for its begin");
        }
    }
}

impl Default for Aggregator {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Aggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Aggregator")
            .field("matcher", &self.matcher)
            .field("correlator", &self.shared.correlator)
            .field("report_len", &self.shared.lock_sink().report.len())
            .finish_non_exhaustive()
    }
}

impl Shared {
    /// The single mutation point for the report.
    fn report_it(&self, result: TestCaseResult) {
        let mut sink = self.lock_sink();
        let ReportSink {
            report,
            subscribers,
        } = &mut *sink;
        for subscriber in subscribers.iter_mut() {
            subscriber.on_result(&result);
        }
        report.push(result);
    }

    fn lock_sink(&self) -> MutexGuard<'_, ReportSink> {
        self.sink.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
