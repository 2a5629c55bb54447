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

//! Transient toast notifications.
//!
//! Toasts are appended to a shared container as soon as they are shown and
//! are never queued or rate limited. Each one is timed on its own: after
//! its display duration it starts the exit animation, and a fixed delay
//! later it is removed from the surface.
//!
//! Rendering is delegated to a [`RenderSurface`], so the center works the
//! same against a terminal, a GUI toolkit or a test recorder.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;
use uuid::Uuid;

/// How long a toast stays visible unless told otherwise.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(3000);

/// Length of the exit animation before a toast is removed.
pub const EXIT_ANIMATION: Duration = Duration::from_millis(300);

/// Identity of a single toast.
pub type ToastId = Uuid;

/// Severity text outside the known table.
#[derive(Debug, Error)]
#[error("unknown severity '{0}'")]
pub struct UnknownSeverity(pub String);

/// Toast severity, which selects the icon and accent colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    Success,
    Error,
    Warning,
    #[default]
    Info,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Success,
        Severity::Error,
        Severity::Warning,
        Severity::Info,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Success => "success",
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        }
    }

    /// Font Awesome icon class
    #[must_use]
    pub fn icon(&self) -> &'static str {
        match self {
            Severity::Success => "fa-check-circle",
            Severity::Error => "fa-times-circle",
            Severity::Warning => "fa-exclamation-triangle",
            Severity::Info => "fa-info-circle",
        }
    }

    /// Accent colour as a CSS hex string
    #[must_use]
    pub fn color(&self) -> &'static str {
        match self {
            Severity::Success => "#22c55e",
            Severity::Error => "#ef4444",
            Severity::Warning => "#f59e0b",
            Severity::Info => "#3b82f6",
        }
    }

    /// Accent colour as RGB channels, matching [`Severity::color`]
    #[must_use]
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Severity::Success => (0x22, 0xc5, 0x5e),
            Severity::Error => (0xef, 0x44, 0x44),
            Severity::Warning => (0xf5, 0x9e, 0x0b),
            Severity::Info => (0x3b, 0x82, 0xf6),
        }
    }

    /// Parse severity text, falling back to [`Severity::Info`] for unknown values.
    #[must_use]
    pub fn parse_or_info(text: &str) -> Self {
        text.parse().unwrap_or_else(|e: UnknownSeverity| {
            warn!("{}, showing as info", e);
            Severity::Info
        })
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = UnknownSeverity;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "success" => Ok(Severity::Success),
            "error" => Ok(Severity::Error),
            "warning" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            _ => Err(UnknownSeverity(s.to_string())),
        }
    }
}

/// A toast as handed to the render surface.
#[derive(Debug, Clone, PartialEq)]
pub struct Toast {
    pub id: ToastId,
    pub message: String,
    pub severity: Severity,
    pub duration: Duration,
}

impl Toast {
    #[must_use]
    pub fn icon(&self) -> &'static str {
        self.severity.icon()
    }

    #[must_use]
    pub fn color(&self) -> &'static str {
        self.severity.color()
    }
}

/// Where a live toast is in its lifecycle.
///
/// Removed toasts are no longer tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastPhase {
    Visible,
    Exiting,
}

/// Output side of the notification center.
///
/// `create_container` is called at most once per center, before the first
/// `append`. The remaining calls arrive in lifecycle order per toast, but
/// calls for different toasts interleave freely.
pub trait RenderSurface: Send + Sync {
    /// Create the shared container toasts are appended to.
    fn create_container(&self);

    /// Show a new toast.
    fn append(&self, toast: &Toast);

    /// Start the exit animation for a toast.
    fn begin_exit(&self, id: ToastId);

    /// Remove a toast from the container.
    fn remove(&self, id: ToastId);
}

/// Timing configuration for the notification center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotifyConfig {
    /// Display duration used by the convenience methods.
    pub default_duration: Duration,
    /// Delay between the start of the exit animation and removal.
    pub exit_delay: Duration,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            default_duration: DEFAULT_DURATION,
            exit_delay: EXIT_ANIMATION,
        }
    }
}

type PhaseTable = Arc<Mutex<HashMap<ToastId, ToastPhase>>>;

/// Shows toasts on a [`RenderSurface`] and dismisses them on a timer.
///
/// Dismissal timers are spawned on the current Tokio runtime, so `show` and
/// its wrappers must be called from within one.
pub struct NotificationCenter {
    surface: Arc<dyn RenderSurface>,
    container: OnceLock<()>,
    phases: PhaseTable,
    config: NotifyConfig,
}

impl fmt::Debug for NotificationCenter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationCenter")
            .field("config", &self.config)
            .field("active", &self.active_count())
            .finish_non_exhaustive()
    }
}

impl NotificationCenter {
    #[must_use]
    pub fn new(surface: Arc<dyn RenderSurface>) -> Self {
        Self::with_config(surface, NotifyConfig::default())
    }

    #[must_use]
    pub fn with_config(surface: Arc<dyn RenderSurface>, config: NotifyConfig) -> Self {
        Self {
            surface,
            container: OnceLock::new(),
            phases: Arc::new(Mutex::new(HashMap::new())),
            config,
        }
    }

    #[must_use]
    pub fn config(&self) -> NotifyConfig {
        self.config
    }

    /// Show a toast for `duration`, then animate it out and remove it.
    pub fn show_for(
        &self,
        message: impl Into<String>,
        severity: Severity,
        duration: Duration,
    ) -> ToastId {
        self.container.get_or_init(|| {
            debug!("Creating toast container");
            self.surface.create_container();
        });

        let toast = Toast {
            id: Uuid::new_v4(),
            message: message.into(),
            severity,
            duration,
        };
        let id = toast.id;

        self.surface.append(&toast);
        set_phase(&self.phases, id, Some(ToastPhase::Visible));

        let surface = Arc::clone(&self.surface);
        let phases = Arc::clone(&self.phases);
        let exit_delay = self.config.exit_delay;

        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            surface.begin_exit(id);
            set_phase(&phases, id, Some(ToastPhase::Exiting));

            tokio::time::sleep(exit_delay).await;
            surface.remove(id);
            set_phase(&phases, id, None);
        });

        id
    }

    /// Show a toast for the configured default duration.
    pub fn show(&self, message: impl Into<String>, severity: Severity) -> ToastId {
        self.show_for(message, severity, self.config.default_duration)
    }

    /// Show a toast whose severity arrives as text, e.g. from a server payload.
    ///
    /// Unknown severities are shown as info.
    pub fn show_raw(&self, message: impl Into<String>, severity: &str) -> ToastId {
        self.show(message, Severity::parse_or_info(severity))
    }

    pub fn success(&self, message: impl Into<String>) -> ToastId {
        self.show(message, Severity::Success)
    }

    pub fn error(&self, message: impl Into<String>) -> ToastId {
        self.show(message, Severity::Error)
    }

    pub fn warning(&self, message: impl Into<String>) -> ToastId {
        self.show(message, Severity::Warning)
    }

    pub fn info(&self, message: impl Into<String>) -> ToastId {
        self.show(message, Severity::Info)
    }

    /// Current phase of a toast, or `None` once it has been removed.
    #[must_use]
    pub fn phase(&self, id: ToastId) -> Option<ToastPhase> {
        self.phases.lock().ok().and_then(|p| p.get(&id).copied())
    }

    /// Number of toasts not yet removed.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.phases.lock().map(|p| p.len()).unwrap_or(0)
    }
}

fn set_phase(phases: &PhaseTable, id: ToastId, phase: Option<ToastPhase>) {
    if let Ok(mut phases) = phases.lock() {
        match phase {
            Some(phase) => {
                phases.insert(id, phase);
            }
            None => {
                phases.remove(&id);
            }
        }
    }
}
