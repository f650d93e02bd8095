// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Command-line front end for hostwatch.
//!
//! hostwatch correlates telemetry from a browser-hosted test runtime into a deterministic test
//! report. The core logic lives in `hostwatch-runner`; this crate parses arguments, sets up
//! logging and maps failures to documented exit codes.

#![warn(missing_docs)]

mod dispatch;
mod errors;
mod output;

#[doc(hidden)]
pub use dispatch::*;
#[doc(hidden)]
pub use errors::*;
