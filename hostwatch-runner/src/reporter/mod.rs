// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Report the results of a run in human and machine-readable formats.
//!
//! [`DisplayReporter`] and [`StructuredReporter`] are
//! [`ResultSubscriber`](crate::aggregator::ResultSubscriber)s that write each result as it enters
//! the report. [`JunitWriter`] serializes a finished [`TestReport`](crate::report::TestReport).

mod displayer;
mod helpers;
mod junit;
mod status_level;
mod structured;

pub use displayer::*;
pub(crate) use helpers::Styles;
pub use junit::*;
pub use status_level::*;
pub use structured::*;
