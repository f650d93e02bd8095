// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Detection and dismissal of modal dialogs raised by the test host.
//!
//! A modal dialog blocks the host until someone closes it, so hostwatch polls for dialogs,
//! dismisses them, and reports them to the [`Aggregator`](crate::aggregator::Aggregator) as
//! [`HostEvent::DialogRaised`](crate::events::HostEvent::DialogRaised). Finding and clicking on
//! dialogs uses platform accessibility APIs, which are abstracted behind [`DialogProbe`].

mod watchdog;

pub use watchdog::*;

use crate::{errors::DialogProbeError, events::DialogKind};
use tracing::debug;

/// A platform-specific view of the host's top-level dialogs.
pub trait DialogProbe {
    /// Returns the first dialog owned by the host process, if any.
    fn find_dialog(&mut self) -> Result<Option<DialogSnapshot>, DialogProbeError>;

    /// Dismisses `dialog` by clicking its OK button.
    fn dismiss(&mut self, dialog: &DialogSnapshot) -> Result<(), DialogProbeError>;
}

impl<P: DialogProbe + ?Sized> DialogProbe for Box<P> {
    fn find_dialog(&mut self) -> Result<Option<DialogSnapshot>, DialogProbeError> {
        (**self).find_dialog()
    }

    fn dismiss(&mut self, dialog: &DialogSnapshot) -> Result<(), DialogProbeError> {
        (**self).dismiss(dialog)
    }
}

/// What a [`DialogProbe`] saw of a dialog.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct DialogSnapshot {
    /// The window title.
    pub title: String,

    /// The dialog's caption text.
    pub caption: String,

    /// The dialog's body text.
    pub text: String,

    /// Whether the dialog has an OK button that can be used to dismiss it.
    pub has_ok_button: bool,
}

/// The result of a single [`DialogMonitor::slap_down`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DialogMonitorResult {
    /// No dialog of the monitored kind was found, or it couldn't be dismissed.
    NoAction,

    /// A dialog was dismissed.
    Dismissed {
        /// A description of the dialog, used as the failure message.
        message: String,
    },
}

/// Looks for one kind of dialog and dismisses it.
#[derive(Debug)]
pub struct DialogMonitor<P> {
    probe: P,
    kind: DialogKind,
}

impl<P: DialogProbe> DialogMonitor<P> {
    /// Title fragment that identifies dialogs raised by failed assertions.
    pub const ASSERTION_TITLE: &'static str = "Assertion Failed";

    /// Creates a new monitor for dialogs of the given kind.
    pub fn new(probe: P, kind: DialogKind) -> Self {
        Self { probe, kind }
    }

    /// The kind of dialog this monitor handles.
    pub fn kind(&self) -> DialogKind {
        self.kind
    }

    /// Looks for a dialog once, and dismisses it if it's of the monitored kind.
    ///
    /// Message-box monitors leave assertion dialogs alone, and vice versa.
    pub fn slap_down(&mut self) -> Result<DialogMonitorResult, DialogProbeError> {
        let Some(dialog) = self.probe.find_dialog()? else {
            return Ok(DialogMonitorResult::NoAction);
        };

        let is_assertion = dialog.title.contains(Self::ASSERTION_TITLE);
        let message = match (self.kind, is_assertion) {
            (DialogKind::MessageBox, false) => format!(
                "A MessageBox dialog was automatically closed.\n\
                 Caption: {}\n\
                 Dialog Message:\n\
                 {}",
                dialog.caption, dialog.text,
            ),
            (DialogKind::Assert, true) => dialog.text.clone(),
            (DialogKind::MessageBox, true) | (DialogKind::Assert, false) => {
                return Ok(DialogMonitorResult::NoAction);
            }
        };

        if !dialog.has_ok_button {
            debug!("dialog `{}` has no OK button, leaving it", dialog.title);
            return Ok(DialogMonitorResult::NoAction);
        }

        debug!("clicking OK on dialog `{}` ({:?})", dialog.title, self.kind);
        self.probe.dismiss(&dialog)?;
        Ok(DialogMonitorResult::Dismissed { message })
    }
}
