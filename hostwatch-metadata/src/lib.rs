// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

#![warn(missing_docs)]

//! Machine-readable formats shared between hostwatch and the browser-hosted test runtime.
//!
//! This crate contains:
//! * the JSON wire format for telemetry emitted by the test host ([`EventPayload`]),
//! * the JSON format for finalized results produced by `hostwatch replay --message-format json`
//!   ([`ResultSummary`]),
//! * documented process exit codes ([`HostwatchExitCode`]).
//!
//! These types are deliberately free of correlation logic: they describe what goes over the wire,
//! nothing more. Validation happens in `hostwatch-runner`.

mod events;
mod exit_codes;
mod results;

pub use events::*;
pub use exit_codes::*;
pub use results::*;
