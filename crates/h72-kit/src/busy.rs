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

//! Busy-state toggling for UI elements.
//!
//! [`BusyIndicator::show`] swaps an element's content for a spinner and
//! disables it; [`BusyIndicator::hide`] puts the original content back. The
//! saved content lives in a side-table keyed by element identity rather
//! than on the element, which lets a second `show` on a busy element be
//! refused instead of overwriting what was saved.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, warn};

/// Markup that replaces an element's content while it is busy.
pub const SPINNER_MARKUP: &str = r#"<div class="spinner"></div>"#;

/// Opaque identity of an element in an [`ElementHost`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// Access to the elements the indicator mutates.
pub trait ElementHost {
    /// Resolve a selector to an element.
    fn query_selector(&self, selector: &str) -> Option<ElementId>;

    /// Current rendered content, or `None` if the element no longer exists.
    fn content(&self, id: ElementId) -> Option<String>;

    fn set_content(&mut self, id: ElementId, content: &str);

    fn set_disabled(&mut self, id: ElementId, disabled: bool);
}

/// An element given directly or by selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target<'a> {
    Element(ElementId),
    Selector(&'a str),
}

impl From<ElementId> for Target<'_> {
    fn from(id: ElementId) -> Self {
        Target::Element(id)
    }
}

impl<'a> From<&'a str> for Target<'a> {
    fn from(selector: &'a str) -> Self {
        Target::Selector(selector)
    }
}

/// What a `show` or `hide` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyOutcome {
    /// The element was switched.
    Applied,
    /// The target did not resolve to an element; nothing changed.
    NotFound,
    /// `show` on an element that is already busy; nothing changed.
    AlreadyBusy,
    /// `hide` on an element with no saved content; nothing changed.
    NotBusy,
}

/// Marks elements busy and restores them.
#[derive(Debug, Default)]
pub struct BusyIndicator {
    saved: Mutex<HashMap<ElementId, String>>,
}

impl BusyIndicator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the target's content with a spinner and disable it.
    pub fn show<'a, H>(&self, host: &mut H, target: impl Into<Target<'a>>) -> BusyOutcome
    where
        H: ElementHost + ?Sized,
    {
        let Some(id) = resolve(host, target.into()) else {
            return BusyOutcome::NotFound;
        };
        let Some(content) = host.content(id) else {
            return BusyOutcome::NotFound;
        };

        let mut saved = self.saved();
        if saved.contains_key(&id) {
            warn!("Element {:?} is already busy, keeping its saved content", id);
            return BusyOutcome::AlreadyBusy;
        }
        saved.insert(id, content);
        drop(saved);

        host.set_content(id, SPINNER_MARKUP);
        host.set_disabled(id, true);
        debug!("Element {:?} marked busy", id);
        BusyOutcome::Applied
    }

    /// Restore the target's saved content and re-enable it.
    pub fn hide<'a, H>(&self, host: &mut H, target: impl Into<Target<'a>>) -> BusyOutcome
    where
        H: ElementHost + ?Sized,
    {
        let Some(id) = resolve(host, target.into()) else {
            return BusyOutcome::NotFound;
        };
        if host.content(id).is_none() {
            self.forget(id);
            return BusyOutcome::NotFound;
        }

        let Some(original) = self.saved().remove(&id) else {
            return BusyOutcome::NotBusy;
        };

        host.set_content(id, &original);
        host.set_disabled(id, false);
        debug!("Element {:?} restored", id);
        BusyOutcome::Applied
    }

    #[must_use]
    pub fn is_busy(&self, id: ElementId) -> bool {
        self.saved().contains_key(&id)
    }

    /// Number of elements currently marked busy.
    #[must_use]
    pub fn busy_count(&self) -> usize {
        self.saved().len()
    }

    /// Drop saved content for an element that went away while busy.
    pub fn forget(&self, id: ElementId) -> Option<String> {
        self.saved().remove(&id)
    }

    fn saved(&self) -> MutexGuard<'_, HashMap<ElementId, String>> {
        self.saved.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn resolve<H: ElementHost + ?Sized>(host: &H, target: Target<'_>) -> Option<ElementId> {
    match target {
        Target::Element(id) => Some(id),
        Target::Selector(selector) => host.query_selector(selector),
    }
}

/// Element stored in a [`MemoryDocument`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryElement {
    /// DOM-style id, matched by `#id` selectors.
    pub dom_id: String,
    pub content: String,
    pub disabled: bool,
}

/// In-memory element host.
///
/// Only `#id` selectors are understood.
#[derive(Debug, Clone, Default)]
pub struct MemoryDocument {
    elements: BTreeMap<ElementId, MemoryElement>,
    next_id: u64,
}

impl MemoryDocument {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an element and return its identity.
    pub fn insert(&mut self, dom_id: impl Into<String>, content: impl Into<String>) -> ElementId {
        let id = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(
            id,
            MemoryElement {
                dom_id: dom_id.into(),
                content: content.into(),
                disabled: false,
            },
        );
        id
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&MemoryElement> {
        self.elements.get(&id)
    }

    pub fn remove(&mut self, id: ElementId) -> Option<MemoryElement> {
        self.elements.remove(&id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl ElementHost for MemoryDocument {
    fn query_selector(&self, selector: &str) -> Option<ElementId> {
        let wanted = selector.trim().strip_prefix('#')?;
        self.elements
            .iter()
            .find(|(_, e)| e.dom_id == wanted)
            .map(|(id, _)| *id)
    }

    fn content(&self, id: ElementId) -> Option<String> {
        self.elements.get(&id).map(|e| e.content.clone())
    }

    fn set_content(&mut self, id: ElementId, content: &str) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.content = content.to_string();
        }
    }

    fn set_disabled(&mut self, id: ElementId, disabled: bool) {
        if let Some(element) = self.elements.get_mut(&id) {
            element.disabled = disabled;
        }
    }
}
