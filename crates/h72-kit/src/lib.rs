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

//! Client-side toolkit for the Hyehwa72 office tools.
//!
//! The crate bundles four independent pieces that the office front ends use:
//!
//! - **Remote layer** ([`remote`]): JSON-over-HTTPS calls to the workflow
//!   gateway and the RAG service, plus health checks
//! - **Notifications** ([`notify`]): transient toasts rendered through an
//!   injected [`RenderSurface`]
//! - **Busy indicator** ([`busy`]): spinner swap for a single element, with
//!   the saved content kept in a side-table
//! - **Time formatting** ([`datetime`]): fixed-pattern formatting and coarse
//!   relative time
//!
//! None of the pieces depend on each other. [`Services`] builds one of each
//! at start-up so they can be handed to the UI layer explicitly.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use h72_kit::{Endpoints, RenderSurface, Services, Toast, ToastId};
//!
//! #[derive(Debug)]
//! struct Stdout;
//!
//! impl RenderSurface for Stdout {
//!     fn create_container(&self) {}
//!     fn append(&self, toast: &Toast) {
//!         println!("{}: {}", toast.severity, toast.message);
//!     }
//!     fn begin_exit(&self, _id: ToastId) {}
//!     fn remove(&self, _id: ToastId) {}
//! }
//!
//! #[tokio::main]
//! async fn main() {
//!     let services = Services::new(Endpoints::default(), Arc::new(Stdout));
//!
//!     match services.remote.call_workflow("/economy-script", &serde_json::json!({})).await {
//!         Ok(_) => services.notifications.success("script requested"),
//!         Err(e) => services.notifications.error(e.to_string()),
//!     };
//! }
//! ```

pub mod busy;
pub mod datetime;
pub mod notify;
pub mod remote;

use std::sync::Arc;

pub use busy::{BusyIndicator, BusyOutcome, ElementHost, ElementId, MemoryDocument, Target};
pub use datetime::{format, relative, TimeError};
pub use notify::{
    NotificationCenter, NotifyConfig, RenderSurface, Severity, Toast, ToastId, ToastPhase,
    UnknownSeverity,
};
pub use remote::{Endpoints, RemoteClient, RemoteError, RequestOptions, Service, UnknownService};

/// One instance of each stateful helper, built once and passed to consumers.
#[derive(Debug)]
pub struct Services {
    /// Client for the workflow gateway and the RAG service.
    pub remote: RemoteClient,
    /// Toast notifications.
    pub notifications: NotificationCenter,
    /// Busy-state bookkeeping for UI elements.
    pub busy: BusyIndicator,
}

impl Services {
    /// Build the helpers with default notification timing.
    #[must_use]
    pub fn new(endpoints: Endpoints, surface: Arc<dyn RenderSurface>) -> Self {
        Self::with_notify_config(endpoints, surface, NotifyConfig::default())
    }

    /// Build the helpers with custom notification timing.
    #[must_use]
    pub fn with_notify_config(
        endpoints: Endpoints,
        surface: Arc<dyn RenderSurface>,
        notify: NotifyConfig,
    ) -> Self {
        Self {
            remote: RemoteClient::new(endpoints),
            notifications: NotificationCenter::with_config(surface, notify),
            busy: BusyIndicator::new(),
        }
    }
}
