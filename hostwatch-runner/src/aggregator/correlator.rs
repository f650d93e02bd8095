// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Attributes dialogs, which carry no test identity, to the test that was running.

use crate::{events::TestIdentity, report::TestCaseResult};
use chrono::{DateTime, FixedOffset};
use std::{
    collections::HashSet,
    sync::{Mutex, MutexGuard, PoisonError},
};
use tracing::debug;

/// Attributes assertion dialogs to the test that was executing when they appeared.
///
/// The dialog watchdog polls the host process, so a dialog is always detected some time after it
/// was raised. The correlator makes a best-effort, deterministic choice:
///
/// * If a test is active when the dialog is reported, the dialog belongs to that test.
/// * If no test is active, the dialog is held until the next test begins, and is then attributed
///   to the test that began *before* that one (the one that was most likely running when the
///   dialog appeared). If no test has begun at all, it is attributed to the new test.
///
/// This is an approximation: if a new test begins between the dialog appearing and the watchdog
/// detecting it, the dialog is attributed to the new test.
///
/// Identities failed because of an assertion dialog are remembered, so that the genuine
/// completion event that may follow (typically a pass, since the dialog was dismissed) can be
/// suppressed.
#[derive(Debug, Default)]
pub struct DialogAssertionCorrelator {
    state: Mutex<CorrelatorState>,
}

#[derive(Debug, Default)]
struct CorrelatorState {
    /// The most recently begun test that has not been resolved.
    active: Option<TestIdentity>,
    /// The most recently begun test, resolved or not.
    last_begun: Option<TestIdentity>,
    /// Assertion dialogs reported while no test was active.
    pending: Vec<PendingAssertion>,
    resolved_by_dialog: HashSet<TestIdentity>,
}

/// An assertion dialog waiting for the next begin to be attributed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PendingAssertion {
    /// The dialog text.
    pub message: String,

    /// When the dialog was detected.
    pub timestamp: DateTime<FixedOffset>,
}

impl DialogAssertionCorrelator {
    /// Creates a new correlator with no active test.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records that `identity` began executing.
    ///
    /// Returns failures for any assertion dialogs that were waiting for a begin.
    pub fn on_begin(&self, identity: &TestIdentity) -> Vec<TestCaseResult> {
        let mut state = self.lock();
        let previous = state.last_begun.replace(identity.clone());
        state.active = Some(identity.clone());

        if state.pending.is_empty() {
            return Vec::new();
        }

        let (target, outstanding) = match previous {
            Some(previous) => (previous, false),
            None => (identity.clone(), true),
        };
        debug!(
            "attributing {} pending assertion dialog(s) to {target}",
            state.pending.len(),
        );

        if outstanding {
            // The new test's own completion is still to come: it must not override the dialog.
            state.resolved_by_dialog.insert(target.clone());
            state.active = None;
        }

        std::mem::take(&mut state.pending)
            .into_iter()
            .map(|pending| {
                TestCaseResult::dialog_assertion(target.clone(), pending.message, pending.timestamp)
            })
            .collect()
    }

    /// Records that an assertion dialog was detected and dismissed.
    ///
    /// If a test is active, returns the failure for it and marks it as resolved by the dialog.
    /// Otherwise the dialog is held until the next begin, and `None` is returned.
    pub fn on_assert_dialog(
        &self,
        message: String,
        timestamp: DateTime<FixedOffset>,
    ) -> Option<TestCaseResult> {
        let mut state = self.lock();
        match state.active.take() {
            Some(identity) => {
                debug!("assertion dialog attributed to active test {identity}");
                state.resolved_by_dialog.insert(identity.clone());
                Some(TestCaseResult::dialog_assertion(identity, message, timestamp))
            }
            None => {
                debug!("assertion dialog with no active test: waiting for the next begin");
                state.pending.push(PendingAssertion { message, timestamp });
                None
            }
        }
    }

    /// Produces the failure for a message box.
    ///
    /// A message box isn't raised by assertion machinery and can't be tied to a test, so the
    /// result always carries the [unattributable](TestIdentity::unattributable) identity.
    pub fn on_message_box_dialog(
        &self,
        message: String,
        timestamp: DateTime<FixedOffset>,
    ) -> TestCaseResult {
        TestCaseResult::message_box(message, timestamp)
    }

    /// Returns true if `identity` was already failed by an assertion dialog, in which case its
    /// completion must be discarded. The identity is forgotten afterwards.
    pub fn take_suppression(&self, identity: &TestIdentity) -> bool {
        self.lock().resolved_by_dialog.remove(identity)
    }

    /// Records that `identity` was resolved by its completion event.
    pub fn on_resolved(&self, identity: &TestIdentity) {
        let mut state = self.lock();
        if state.active.as_ref() == Some(identity) {
            state.active = None;
        }
    }

    /// Returns the currently active test, if any.
    pub fn active(&self) -> Option<TestIdentity> {
        self.lock().active.clone()
    }

    /// Returns the assertion dialogs waiting for the next begin.
    pub fn pending(&self) -> Vec<PendingAssertion> {
        self.lock().pending.clone()
    }

    fn lock(&self) -> MutexGuard<'_, CorrelatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
