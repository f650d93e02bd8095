// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use super::{DialogMonitor, DialogMonitorResult, DialogProbe};
use crate::{
    aggregator::Aggregator,
    errors::DialogProbeError,
    events::{DialogKind, HostEvent},
};
use chrono::Local;
use std::time::Duration;
use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, warn};

/// Polls the host for dialogs of one kind, and reports each dismissed dialog to an
/// [`Aggregator`].
#[derive(Debug)]
pub struct DialogWatchdog<P> {
    monitor: DialogMonitor<P>,
    poll_interval: Duration,
}

/// Counters describing a finished [`DialogWatchdog::run`].
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct WatchdogSummary {
    /// The number of times the probe was polled.
    pub polls: usize,

    /// The number of dialogs dismissed and reported.
    pub dismissed: usize,

    /// The number of polls that failed.
    pub errors: usize,
}

impl<P: DialogProbe> DialogWatchdog<P> {
    /// Creates a new watchdog polling `probe` every `poll_interval`.
    pub fn new(probe: P, kind: DialogKind, poll_interval: Duration) -> Self {
        Self {
            monitor: DialogMonitor::new(probe, kind),
            poll_interval,
        }
    }

    /// The kind of dialog this watchdog dismisses.
    pub fn kind(&self) -> DialogKind {
        self.monitor.kind()
    }

    /// How long the watchdog waits between polls.
    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Polls until `shutdown` becomes true or its sender is dropped.
    ///
    /// Errors from the probe are logged and polling continues: a flaky accessibility query must
    /// not stop dialogs from being dismissed later on.
    pub async fn run(
        mut self,
        aggregator: &Aggregator,
        mut shutdown: watch::Receiver<bool>,
    ) -> WatchdogSummary {
        let mut summary = WatchdogSummary::default();
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        debug!(
            "{:?} dialog watchdog started (polling every {:?})",
            self.monitor.kind(),
            self.poll_interval,
        );

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            tokio::select! {
                biased;

                res = shutdown.changed() => {
                    if res.is_err() {
                        // The sender was dropped: nobody can stop us any more, so stop now.
                        break;
                    }
                }
                _ = ticker.tick() => {
                    self.poll_once(aggregator, &mut summary);
                }
            }
        }

        debug!("{:?} dialog watchdog stopped: {summary:?}", self.monitor.kind());
        summary
    }

    fn poll_once(&mut self, aggregator: &Aggregator, summary: &mut WatchdogSummary) {
        summary.polls += 1;
        match self.monitor.slap_down() {
            Ok(DialogMonitorResult::NoAction) => {}
            Ok(DialogMonitorResult::Dismissed { message }) => {
                summary.dismissed += 1;
                aggregator.handle(HostEvent::DialogRaised {
                    kind: self.monitor.kind(),
                    message,
                    timestamp: Local::now().fixed_offset(),
                });
            }
            Err(DialogProbeError::HostUnavailable) => {
                summary.errors += 1;
                debug!("dialog watchdog: host process not available yet");
            }
            Err(error) => {
                summary.errors += 1;
                warn!("dialog watchdog: {error}");
            }
        }
    }
}
