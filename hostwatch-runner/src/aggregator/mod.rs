// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Correlates the asynchronous event stream from the test host into an ordered report.
//!
//! The main type here is [`Aggregator`], which routes each [`HostEvent`](crate::events::HostEvent)
//! to:
//!
//! * a [`BeginCompletionMatcher`], which pairs each test's begin with its completion regardless
//!   of arrival order, and
//! * a [`DialogAssertionCorrelator`], which attributes identity-less dialog events to the test
//!   that was running.

mod correlator;
mod imp;
mod matcher;

pub use correlator::*;
pub use imp::*;
pub use matcher::*;
