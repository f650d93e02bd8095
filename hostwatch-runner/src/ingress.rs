// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Decoding of wire payloads into [`HostEvent`]s.
//!
//! Malformed payloads are rejected here, before they reach the
//! [`Aggregator`](crate::aggregator::Aggregator): the core assumes every event it sees is
//! well-formed.

use crate::{
    errors::{EventDecodeError, EventDecodeErrorKind},
    events::{ExceptionInfo, HostEvent, TestIdentity},
};
use chrono::{DateTime, FixedOffset};
use hostwatch_metadata::{EventPayload, MethodSummary};
use std::io::BufRead;

/// Decodes a single JSON payload into a [`HostEvent`].
pub fn decode_event(input: &str) -> Result<HostEvent, EventDecodeError> {
    let payload: EventPayload = serde_json::from_str(input)
        .map_err(|err| EventDecodeError::new(EventDecodeErrorKind::Json(err)))?;
    payload_to_event(payload).map_err(EventDecodeError::new)
}

/// Validates an already-deserialized payload and converts it into a [`HostEvent`].
pub fn payload_to_event(payload: EventPayload) -> Result<HostEvent, EventDecodeErrorKind> {
    let event = match payload {
        EventPayload::MethodBegin { method, timestamp } => HostEvent::MethodBegin {
            identity: identity("method-begin", method)?,
            timestamp,
        },
        EventPayload::MethodPassed {
            method,
            started,
            finished,
        } => {
            let identity = identity("method-passed", method)?;
            check_order("method-passed", &identity, started, finished)?;
            HostEvent::MethodPassed {
                identity,
                started,
                finished,
            }
        }
        EventPayload::MethodFailed {
            method,
            started,
            finished,
            exception,
        } => {
            let identity = identity("method-failed", method)?;
            check_order("method-failed", &identity, started, finished)?;
            HostEvent::MethodFailed {
                identity,
                started,
                finished,
                exception: exception.map(ExceptionInfo::from),
            }
        }
        EventPayload::MethodIgnored { method, message } => HostEvent::MethodIgnored {
            identity: method
                .map(|method| identity("method-ignored", method))
                .transpose()?,
            message,
        },
        EventPayload::Trace { message } => HostEvent::Trace { message },
        EventPayload::DialogRaised {
            dialog,
            message,
            timestamp,
        } => HostEvent::DialogRaised {
            kind: dialog.into(),
            message,
            timestamp,
        },
        EventPayload::HostTimeout { message } => HostEvent::HostTimeout { message },
    };
    Ok(event)
}

fn identity(
    kind: &'static str,
    method: MethodSummary,
) -> Result<TestIdentity, EventDecodeErrorKind> {
    let empty_field = if method.namespace.is_empty() {
        Some("namespace")
    } else if method.class_name.is_empty() {
        Some("class-name")
    } else if method.method_name.is_empty() {
        Some("method-name")
    } else {
        None
    };

    match empty_field {
        Some(field) => Err(EventDecodeErrorKind::EmptyIdentityField { kind, field }),
        None => Ok(method.into()),
    }
}

fn check_order(
    kind: &'static str,
    identity: &TestIdentity,
    started: DateTime<FixedOffset>,
    finished: DateTime<FixedOffset>,
) -> Result<(), EventDecodeErrorKind> {
    if finished < started {
        return Err(EventDecodeErrorKind::FinishedBeforeStarted {
            kind,
            method: identity.to_string(),
        });
    }
    Ok(())
}

/// An iterator over events in a JSON-lines source, one payload per line.
///
/// Blank lines are skipped. Errors carry the 1-based line number of the offending payload. After a
/// read error the stream is exhausted.
#[derive(Debug)]
pub struct EventStream<R> {
    reader: R,
    line_number: usize,
    buf: String,
    done: bool,
}

impl<R: BufRead> EventStream<R> {
    /// Creates a new stream over `reader`.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line_number: 0,
            buf: String::new(),
            done: false,
        }
    }

    /// The number of lines consumed so far.
    pub fn line_number(&self) -> usize {
        self.line_number
    }
}

impl<R: BufRead> Iterator for EventStream<R> {
    type Item = Result<HostEvent, EventDecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            self.buf.clear();
            match self.reader.read_line(&mut self.buf) {
                Ok(0) => self.done = true,
                Ok(_) => {
                    self.line_number += 1;
                    let line = self.buf.trim();
                    if line.is_empty() {
                        continue;
                    }
                    return Some(decode_event(line).map_err(|err| err.with_line(self.line_number)));
                }
                Err(err) => {
                    self.done = true;
                    return Some(Err(EventDecodeError::new(EventDecodeErrorKind::Read(err))
                        .with_line(self.line_number + 1)));
                }
            }
        }
        None
    }
}
