// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

/// Documented exit codes for `hostwatch` failures.
///
/// `hostwatch` runs may fail for a variety of reasons. This structure documents the exit codes
/// that may occur in case of expected failures.
///
/// Unknown/unexpected failures will always result in exit code 1.
pub enum HostwatchExitCode {}

impl HostwatchExitCode {
    /// No errors occurred and hostwatch exited normally.
    pub const OK: i32 = 0;

    /// The event stream contained no test results, but no other errors occurred.
    pub const NO_TESTS_RUN: i32 = 4;

    /// One or more tests failed, including failures synthesized from dialogs or host timeouts.
    pub const TEST_RUN_FAILED: i32 = 100;

    /// No reported test failed, but at least one begin or completion was never matched.
    pub const INCOMPLETE_RUN: i32 = 106;

    /// Writing data to stdout, stderr or a report file produced an error.
    pub const WRITE_OUTPUT_ERROR: i32 = 110;

    /// A user issue happened while setting up a hostwatch invocation.
    pub const SETUP_ERROR: i32 = 96;

    /// The event stream could not be read, or contained a malformed event.
    pub const INVALID_EVENT_STREAM: i32 = 97;

    /// No free port could be found for the harness server.
    pub const PORT_SELECTION_FAILED: i32 = 98;
}
