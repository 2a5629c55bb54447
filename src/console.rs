// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Terminal rendering for toasts and the request status line.

use std::io::{self, IsTerminal, Write};

use colored::Colorize;
use h72_kit::busy::SPINNER_MARKUP;
use h72_kit::{ElementHost, ElementId, RenderSurface, Severity, Toast, ToastId};
use log::debug;

/// Selector under which the status line is published.
pub const STATUS_SELECTOR: &str = "#status";

const STATUS_ID: ElementId = ElementId(0);

/// Writes toasts to stderr, one line each.
#[derive(Debug)]
pub struct TerminalSurface {
    color: bool,
}

impl TerminalSurface {
    pub fn new() -> Self {
        Self {
            color: io::stderr().is_terminal() && std::env::var_os("NO_COLOR").is_none(),
        }
    }

    fn render(&self, toast: &Toast) -> String {
        let glyph = glyph(toast.severity);
        if self.color {
            let (r, g, b) = toast.severity.rgb();
            format!("{} {}", glyph.truecolor(r, g, b), toast.message)
        } else {
            format!("{glyph} {}", toast.message)
        }
    }
}

impl Default for TerminalSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSurface for TerminalSurface {
    fn create_container(&self) {
        debug!("Toasts attached to stderr");
    }

    fn append(&self, toast: &Toast) {
        eprintln!("{}", self.render(toast));
    }

    fn begin_exit(&self, id: ToastId) {
        debug!("Toast {} dismissing", id);
    }

    fn remove(&self, id: ToastId) {
        debug!("Toast {} removed", id);
    }
}

fn glyph(severity: Severity) -> &'static str {
    match severity {
        Severity::Success => "✔",
        Severity::Error => "✖",
        Severity::Warning => "⚠",
        Severity::Info => "ℹ",
    }
}

/// Single-element host backing the `#status` line on stderr.
///
/// While busy the line shows a spinner glyph next to the label it replaced;
/// restoring the label clears the line again.
#[derive(Debug)]
pub struct StatusLine {
    content: String,
    disabled: bool,
    interactive: bool,
}

impl StatusLine {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            content: label.into(),
            disabled: false,
            interactive: io::stderr().is_terminal(),
        }
    }

    #[cfg(test)]
    fn detached(label: &str) -> Self {
        Self {
            content: label.to_string(),
            disabled: false,
            interactive: false,
        }
    }

    fn draw(&self, previous: &str) {
        if !self.interactive {
            return;
        }
        let mut stderr = io::stderr().lock();
        let _ = if self.content == SPINNER_MARKUP {
            write!(stderr, "\r⠿ {previous}")
        } else {
            write!(stderr, "\r\x1b[2K")
        };
        let _ = stderr.flush();
    }
}

impl ElementHost for StatusLine {
    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        (selector.trim() == STATUS_SELECTOR).then_some(STATUS_ID)
    }

    fn content(&self, id: ElementId) -> Option<String> {
        (id == STATUS_ID).then(|| self.content.clone())
    }

    fn set_content(&mut self, id: ElementId, content: &str) {
        if id != STATUS_ID {
            return;
        }
        let previous = std::mem::replace(&mut self.content, content.to_string());
        self.draw(&previous);
    }

    fn set_disabled(&mut self, id: ElementId, disabled: bool) {
        if id == STATUS_ID {
            self.disabled = disabled;
        }
    }
}
