// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Core functionality for hostwatch, a harness that turns telemetry from an out-of-process test
//! host into an ordered test report.
//!
//! The host reports test lifecycle events over an unordered, possibly concurrent channel. A
//! separate watchdog dismisses modal dialogs the host raises, and reports those too. The
//! [`Aggregator`](aggregator::Aggregator) correlates all of these into a single
//! [`TestReport`](report::TestReport):
//!
//! * a test's begin and completion are paired regardless of which arrives first;
//! * an assertion dialog, which carries no test identity, is attributed to the test that was
//!   running when it appeared;
//! * every finalized result is broadcast to subscribers in the order it enters the report.

pub mod aggregator;
pub mod config;
pub mod dialog;
pub mod errors;
pub mod events;
mod helpers;
pub mod ingress;
pub mod report;
pub mod reporter;
pub mod server_location;

pub use helpers::plural;
