// Copyright (c) The hostwatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use crate::report::ResultType;
use owo_colors::Style;

#[derive(Clone, Debug, Default)]
pub(crate) struct Styles {
    pub(crate) count: Style,
    pub(crate) pass: Style,
    pub(crate) fail: Style,
    pub(crate) skip: Style,
    pub(crate) sysfail: Style,
    pub(crate) suite: Style,
    pub(crate) method: Style,
    pub(crate) detail: Style,
}

impl Styles {
    pub(crate) fn colorize(&mut self) {
        self.count = Style::new().bold();
        self.pass = Style::new().green().bold();
        self.fail = Style::new().red().bold();
        self.skip = Style::new().yellow().bold();
        self.sysfail = Style::new().magenta().bold();
        self.suite = Style::new().magenta().bold();
        self.method = Style::new().blue().bold();
        self.detail = Style::new().dimmed();
    }

    pub(crate) fn for_result(&self, result_type: ResultType) -> Style {
        match result_type {
            ResultType::Passed => self.pass,
            ResultType::Failed => self.fail,
            ResultType::Ignored => self.skip,
            ResultType::SystemGeneratedFailure => self.sysfail,
        }
    }
}
