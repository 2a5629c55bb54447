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

//! Command-line interface definition.

use clap::{Parser, Subcommand};
use h72_kit::datetime::DEFAULT_PATTERN;
use h72_kit::Service;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use serde_json::Value;

#[derive(Debug, Parser)]
#[command(name = "h72-office")]
#[command(about = "Hyehwa72 office tools: workflow gateway, RAG service and time helpers")]
#[command(version)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Check whether the remote services answer their health endpoint
    Health {
        /// Service to check (workflow or rag); both when omitted
        service: Option<Service>,
    },
    /// Trigger a workflow webhook with a JSON payload
    Workflow {
        /// Webhook path, e.g. /economy-script
        path: String,
        /// JSON payload
        #[arg(short, long, default_value = "{}", value_parser = parse_json)]
        data: Value,
    },
    /// Send a request to the RAG service
    Rag {
        /// API path, e.g. /search
        path: String,
        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET", value_parser = parse_method)]
        method: Method,
        /// Raw request body
        #[arg(short, long)]
        body: Option<String>,
        /// Request header as `Name: value`; replaces the default headers
        #[arg(short = 'H', long = "header", value_parser = parse_header)]
        headers: Vec<(HeaderName, HeaderValue)>,
    },
    /// Timestamp helpers
    Time {
        #[command(subcommand)]
        command: TimeCommand,
    },
    /// Inspect or edit the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Debug, Subcommand)]
pub enum TimeCommand {
    /// Format a timestamp with a YYYY/MM/DD/HH/mm pattern
    Format {
        /// Epoch milliseconds, RFC 3339, or `YYYY-MM-DD[ HH:MM[:SS]]`
        input: String,
        #[arg(short, long, default_value = DEFAULT_PATTERN)]
        pattern: String,
    },
    /// Describe how long ago a timestamp was
    Relative {
        /// Epoch milliseconds, RFC 3339, or `YYYY-MM-DD[ HH:MM[:SS]]`
        input: String,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Show,
    /// Set the base URL of a service
    SetUrl { service: Service, url: String },
}

fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("invalid JSON: {e}"))
}

fn parse_method(s: &str) -> Result<Method, String> {
    Method::from_bytes(s.trim().to_ascii_uppercase().as_bytes())
        .map_err(|e| format!("invalid method '{s}': {e}"))
}

fn parse_header(s: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (name, value) = s
        .split_once(':')
        .ok_or_else(|| format!("expected 'Name: value', got '{s}'"))?;
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .map_err(|e| format!("invalid header name '{}': {e}", name.trim()))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|e| format!("invalid header value for '{name}': {e}"))?;
    Ok((name, value))
}
