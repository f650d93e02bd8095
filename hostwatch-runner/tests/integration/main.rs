// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod basic;
mod concurrency;
mod fixtures;
mod replay;
