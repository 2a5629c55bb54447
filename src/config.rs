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

//! Application configuration management.
//!
//! Configuration is stored in TOML format through `confy`. Service base URLs
//! can be overridden per shell with environment variables, which take
//! precedence over the file.

use std::time::Duration;

use h72_kit::remote::{DEFAULT_RAG_BASE_URL, DEFAULT_WORKFLOW_BASE_URL};
use h72_kit::{Endpoints, NotifyConfig};
use serde::{Deserialize, Serialize};

const APP_NAME: &str = "h72-office";
const CONFIG_NAME: &str = "config";

/// Environment variable overriding the workflow gateway base URL
pub const WORKFLOW_URL_ENV: &str = "H72_WORKFLOW_BASE_URL";

/// Environment variable overriding the RAG service base URL
pub const RAG_URL_ENV: &str = "H72_RAG_BASE_URL";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Base URL of the workflow (n8n webhook) gateway
    #[serde(default = "default_workflow_base_url")]
    pub workflow_base_url: String,

    /// Base URL of the RAG service
    #[serde(default = "default_rag_base_url")]
    pub rag_base_url: String,

    /// How long toasts stay on screen, in milliseconds
    #[serde(default = "default_toast_duration_ms")]
    pub toast_duration_ms: u64,
}

fn default_config_version() -> u32 {
    1
}

fn default_workflow_base_url() -> String {
    DEFAULT_WORKFLOW_BASE_URL.to_string()
}

fn default_rag_base_url() -> String {
    DEFAULT_RAG_BASE_URL.to_string()
}

fn default_toast_duration_ms() -> u64 {
    3000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            workflow_base_url: default_workflow_base_url(),
            rag_base_url: default_rag_base_url(),
            toast_duration_ms: default_toast_duration_ms(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, creating it with defaults if missing
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Save configuration to disk
    pub fn save(&self) -> Result<(), confy::ConfyError> {
        confy::store(APP_NAME, CONFIG_NAME, self)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Service endpoints with environment overrides applied
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            workflow_base_url: resolve_url(std::env::var(WORKFLOW_URL_ENV).ok(), &self.workflow_base_url),
            rag_base_url: resolve_url(std::env::var(RAG_URL_ENV).ok(), &self.rag_base_url),
        }
    }

    /// Toast timing derived from the configured duration
    pub fn notify_config(&self) -> NotifyConfig {
        NotifyConfig {
            default_duration: Duration::from_millis(self.toast_duration_ms),
            ..NotifyConfig::default()
        }
    }
}

/// Pick the environment value when set and non-empty, else the configured one.
/// Trailing slashes are dropped so paths can be appended directly.
fn resolve_url(env_value: Option<String>, config_value: &str) -> String {
    let url = env_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| config_value.trim().to_string());
    url.trim_end_matches('/').to_string()
}
