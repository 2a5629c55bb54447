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

mod cli;
mod config;
mod console;

use std::error::Error;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use h72_kit::{datetime, RemoteError, RequestOptions, Service, Services};
use log::{error, info, warn};
use serde_json::Value;

use cli::{Cli, Command, ConfigCommand, TimeCommand};
use config::AppConfig;
use console::{StatusLine, TerminalSurface, STATUS_SELECTOR};

type CliResult = Result<ExitCode, Box<dyn Error + Send + Sync>>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

fn load_config() -> AppConfig {
    AppConfig::load().unwrap_or_else(|e| {
        warn!("Could not load configuration, using defaults: {}", e);
        AppConfig::default()
    })
}

async fn run(cli: Cli) -> CliResult {
    match cli.command {
        Command::Health { service } => run_health(&connect(), service).await,
        Command::Workflow { path, data } => {
            let services = connect();
            let mut status = StatusLine::new(format!("workflow {path}"));
            services.busy.show(&mut status, STATUS_SELECTOR);
            let result = services.remote.call_workflow(&path, &data).await;
            services.busy.hide(&mut status, STATUS_SELECTOR);
            report(&services, &path, result)
        }
        Command::Rag { path, method, body, headers } => {
            let mut options = RequestOptions::new().with_method(method);
            for (name, value) in headers {
                options = options.with_header(name, value);
            }
            if let Some(body) = body {
                options = options.with_body(body);
            }

            let services = connect();
            let mut status = StatusLine::new(format!("rag {path}"));
            services.busy.show(&mut status, STATUS_SELECTOR);
            let result = services.remote.call_rag(&path, options).await;
            services.busy.hide(&mut status, STATUS_SELECTOR);
            report(&services, &path, result)
        }
        Command::Time { command } => run_time(command),
        Command::Config { command } => run_config(command),
    }
}

fn connect() -> Services {
    let config = load_config();
    Services::with_notify_config(
        config.endpoints(),
        Arc::new(TerminalSurface::new()),
        config.notify_config(),
    )
}

async fn run_health(services: &Services, service: Option<Service>) -> CliResult {
    let results = match service {
        Some(service) => vec![(service, services.remote.check_health(service).await)],
        None => services.remote.check_all().await,
    };

    let mut healthy = true;
    for (service, ok) in results {
        let url = services.remote.base_url(service);
        if ok {
            services.notifications.success(format!("{service} is healthy ({url})"));
        } else {
            healthy = false;
            services.notifications.error(format!("{service} is unreachable ({url})"));
        }
    }
    Ok(if healthy { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

fn report(services: &Services, path: &str, result: Result<Value, RemoteError>) -> CliResult {
    match result {
        Ok(value) => {
            println!("{}", serde_json::to_string_pretty(&value)?);
            services.notifications.success(format!("{path} completed"));
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            services.notifications.error(format!("{path} failed: {e}"));
            Ok(ExitCode::FAILURE)
        }
    }
}

fn run_time(command: TimeCommand) -> CliResult {
    match command {
        TimeCommand::Format { input, pattern } => {
            let date = datetime::parse(&input)?;
            println!("{}", datetime::format(&date, &pattern));
        }
        TimeCommand::Relative { input } => {
            let date = datetime::parse(&input)?;
            println!("{}", datetime::relative(&date));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn run_config(command: ConfigCommand) -> CliResult {
    match command {
        ConfigCommand::Path => {
            println!("{}", AppConfig::get_config_path()?.display());
        }
        ConfigCommand::Show => {
            let config = load_config();
            println!("{}", serde_json::to_string_pretty(&config)?);
            let endpoints = config.endpoints();
            if endpoints.workflow_base_url != config.workflow_base_url
                || endpoints.rag_base_url != config.rag_base_url
            {
                info!(
                    "Environment overrides in effect: workflow={}, rag={}",
                    endpoints.workflow_base_url, endpoints.rag_base_url
                );
            }
        }
        ConfigCommand::SetUrl { service, url } => {
            let mut config = load_config();
            match service {
                Service::Workflow => config.workflow_base_url = url,
                Service::Rag => config.rag_base_url = url,
            }
            config.save()?;
            info!("Saved {} base URL to {}", service, AppConfig::get_config_path()?.display());
        }
    }
    Ok(ExitCode::SUCCESS)
}
