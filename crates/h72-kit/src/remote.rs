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

//! JSON client for the workflow gateway and the RAG service.
//!
//! Every call is independent: there are no retries, no caching and no
//! ordering between concurrent calls. Failures are logged and then returned
//! to the caller unchanged. [`RemoteClient::check_health`] is the exception
//! and folds every failure into `false`.

use std::fmt;
use std::str::FromStr;

use hyper::ext::ReasonPhrase;
use log::{debug, error};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Default base URL of the workflow (n8n webhook) gateway.
pub const DEFAULT_WORKFLOW_BASE_URL: &str = "https://n8n.hyehwa72.org/webhook";

/// Default base URL of the RAG service.
pub const DEFAULT_RAG_BASE_URL: &str = "https://rag.hyehwa72.org";

const HEALTH_PATH: &str = "/health";
const JSON_CONTENT_TYPE: &str = "application/json";

/// Errors returned by [`RemoteClient`] calls.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Name resolution, connection, TLS or body transfer failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success status from the workflow gateway.
    #[error("HTTP {status}: {status_text}")]
    HttpStatus { status: u16, status_text: String },

    /// The response body was not valid JSON.
    #[error("invalid JSON response: {0}")]
    Parse(#[source] serde_json::Error),

    /// The request payload could not be serialized.
    #[error("could not encode request payload: {0}")]
    Encode(#[source] serde_json::Error),
}

impl RemoteError {
    /// HTTP status code carried by the error, if any.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            Self::Parse(_) | Self::Encode(_) => None,
        }
    }
}

/// Service name that could not be parsed.
#[derive(Debug, Error)]
#[error("unknown service '{0}' (expected 'workflow' or 'rag')")]
pub struct UnknownService(pub String);

/// The two remote services this client talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    /// Webhook-style workflow automation gateway.
    Workflow,
    /// Retrieval-augmented generation API.
    Rag,
}

impl Service {
    pub const ALL: [Service; 2] = [Service::Workflow, Service::Rag];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Workflow => "workflow",
            Service::Rag => "rag",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = UnknownService;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "workflow" | "n8n" => Ok(Service::Workflow),
            "rag" => Ok(Service::Rag),
            _ => Err(UnknownService(s.to_string())),
        }
    }
}

/// Base URLs of the two services.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub workflow_base_url: String,
    pub rag_base_url: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            workflow_base_url: DEFAULT_WORKFLOW_BASE_URL.to_string(),
            rag_base_url: DEFAULT_RAG_BASE_URL.to_string(),
        }
    }
}

/// Per-call overrides for [`RemoteClient::call_rag`].
///
/// Fields left unset keep the defaults (GET, `Content-Type:
/// application/json`, no body). A header set, once given, replaces the
/// default headers as a whole rather than being merged into them.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    pub method: Option<Method>,
    pub headers: Option<HeaderMap>,
    pub body: Option<String>,
}

impl RequestOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder method to set the HTTP method
    #[must_use]
    pub fn with_method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    /// Builder method to add a header to the caller-supplied header set
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers
            .get_or_insert_with(HeaderMap::new)
            .insert(name, value);
        self
    }

    /// Builder method to set a raw request body
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Builder method to set a JSON request body
    pub fn with_json_body<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, RemoteError> {
        self.body = Some(serde_json::to_string(body).map_err(RemoteError::Encode)?);
        Ok(self)
    }
}

fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE));
    headers
}

/// Thin JSON client over the workflow gateway and the RAG service.
#[derive(Debug, Clone)]
pub struct RemoteClient {
    endpoints: Endpoints,
    http: reqwest::Client,
}

impl RemoteClient {
    #[must_use]
    pub fn new(endpoints: Endpoints) -> Self {
        Self::with_http_client(endpoints, reqwest::Client::new())
    }

    /// Use a preconfigured HTTP client (proxies, TLS roots, timeouts).
    #[must_use]
    pub fn with_http_client(endpoints: Endpoints, http: reqwest::Client) -> Self {
        Self { endpoints, http }
    }

    #[must_use]
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// Base URL used for the given service.
    #[must_use]
    pub fn base_url(&self, service: Service) -> &str {
        match service {
            Service::Workflow => &self.endpoints.workflow_base_url,
            Service::Rag => &self.endpoints.rag_base_url,
        }
    }

    /// POST `payload` as JSON to the workflow gateway at `path`.
    ///
    /// Non-success statuses are errors; the body of a successful response
    /// is parsed as JSON.
    pub async fn call_workflow<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Value, RemoteError> {
        let result = self.post_workflow(path, payload).await;
        if let Err(e) = &result {
            error!("Workflow call to {} failed: {}", path, e);
        }
        result
    }

    async fn post_workflow<T: Serialize + ?Sized>(
        &self,
        path: &str,
        payload: &T,
    ) -> Result<Value, RemoteError> {
        let url = format!("{}{}", self.endpoints.workflow_base_url, path);
        let body = serde_json::to_vec(payload).map_err(RemoteError::Encode)?;

        let response = self
            .http
            .post(&url)
            .header(CONTENT_TYPE, JSON_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let status = response.status();
        debug!("POST {} -> {}", url, status);
        if !status.is_success() {
            return Err(RemoteError::HttpStatus {
                status: status.as_u16(),
                status_text: status_text(&response),
            });
        }

        read_json(response).await
    }

    /// Send a request to the RAG service at `path`.
    ///
    /// The response body is parsed as JSON whatever the status code, so
    /// error payloads from the service come back as `Ok` values.
    pub async fn call_rag(&self, path: &str, options: RequestOptions) -> Result<Value, RemoteError> {
        let result = self.send_rag(path, options).await;
        if let Err(e) = &result {
            error!("RAG call to {} failed: {}", path, e);
        }
        result
    }

    async fn send_rag(&self, path: &str, options: RequestOptions) -> Result<Value, RemoteError> {
        let url = format!("{}{}", self.endpoints.rag_base_url, path);
        let method = options.method.unwrap_or(Method::GET);
        let headers = options.headers.unwrap_or_else(default_headers);

        let mut request = self.http.request(method.clone(), &url).headers(headers);
        if let Some(body) = options.body {
            request = request.body(body);
        }

        let response = request.send().await?;
        debug!("{} {} -> {}", method, url, response.status());
        read_json(response).await
    }

    /// GET `{base}/health` and report whether the service answered 2xx.
    ///
    /// Never fails: transport errors and non-success statuses both read as
    /// unhealthy.
    pub async fn check_health(&self, service: Service) -> bool {
        let url = format!("{}{}", self.base_url(service), HEALTH_PATH);
        match self.http.get(&url).send().await {
            Ok(response) => {
                debug!("Health check {} -> {}", url, response.status());
                response.status().is_success()
            }
            Err(e) => {
                debug!("Health check {} failed: {}", url, e);
                false
            }
        }
    }

    /// Check both services concurrently.
    pub async fn check_all(&self) -> Vec<(Service, bool)> {
        let (workflow, rag) = tokio::join!(
            self.check_health(Service::Workflow),
            self.check_health(Service::Rag)
        );
        vec![(Service::Workflow, workflow), (Service::Rag, rag)]
    }
}

/// Reason phrase the server sent, or the canonical one for the status.
fn status_text(response: &Response) -> String {
    response
        .extensions()
        .get::<ReasonPhrase>()
        .map(|reason| String::from_utf8_lossy(reason.as_bytes()).into_owned())
        .or_else(|| response.status().canonical_reason().map(str::to_string))
        .unwrap_or_default()
}

async fn read_json(response: Response) -> Result<Value, RemoteError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(RemoteError::Parse)
}

#[cfg(test)]
mod tests {
    use super::*;

    use axum::http::{HeaderMap as StubHeaders, Method as StubMethod, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::Mutex;

    use log::{Level, LevelFilter, Log, Metadata, Record};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Keeps every log line emitted by the test binary.
    struct LogRecorder {
        lines: Mutex<Vec<(Level, String)>>,
    }

    impl Log for LogRecorder {
        fn enabled(&self, _metadata: &Metadata<'_>) -> bool {
            true
        }

        fn log(&self, record: &Record<'_>) {
            if let Ok(mut lines) = self.lines.lock() {
                lines.push((record.level(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static LOGS: LogRecorder = LogRecorder {
        lines: Mutex::new(Vec::new()),
    };

    fn capture_logs() {
        if log::set_logger(&LOGS).is_ok() {
            log::set_max_level(LevelFilter::Trace);
        }
    }

    fn logged_errors(needle: &str) -> Vec<String> {
        LOGS.lines
            .lock()
            .unwrap()
            .iter()
            .filter(|(level, line)| *level == Level::Error && line.contains(needle))
            .map(|(_, line)| line.clone())
            .collect()
    }

    /// Answer a single request with a hand-written status line.
    async fn spawn_raw_stub(status_line: &'static str) -> Endpoints {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request_complete(&request) {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let response =
                format!("{status_line}\r\ncontent-length: 0\r\nconnection: close\r\n\r\n");
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        Endpoints {
            workflow_base_url: format!("http://{addr}/webhook"),
            rag_base_url: format!("http://{addr}/rag"),
        }
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(end) = text.find("\r\n\r\n") else {
            return false;
        };
        let length = text[..end]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                if name.trim().eq_ignore_ascii_case("content-length") {
                    value.trim().parse::<usize>().ok()
                } else {
                    None
                }
            })
            .unwrap_or(0);
        request.len() >= end + 4 + length
    }

    async fn spawn_stub(workflow_health: StatusCode, rag_health: StatusCode) -> Endpoints {
        let app = Router::new()
            .route("/webhook/ok", post(|| async { Json(json!({"ok": true})) }))
            .route(
                "/webhook/fail",
                post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
            )
            .route(
                "/webhook/echo",
                post(|headers: StubHeaders, Json(body): Json<Value>| async move {
                    let content_type = headers
                        .get("content-type")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    Json(json!({"content_type": content_type, "body": body}))
                }),
            )
            .route("/webhook/text", post(|| async { "not json" }))
            .route("/webhook/health", get(move || async move { workflow_health }))
            .route("/rag/text", get(|| async { "not json" }))
            .route("/rag/search", get(|| async { Json(json!({"hits": [1, 2]})) }))
            .route(
                "/rag/missing",
                get(|| async { (StatusCode::NOT_FOUND, Json(json!({"detail": "missing"}))) }),
            )
            .route(
                "/rag/query",
                post(|method: StubMethod, headers: StubHeaders, body: String| async move {
                    let header = |name: &str| {
                        headers
                            .get(name)
                            .and_then(|v| v.to_str().ok())
                            .map(str::to_string)
                    };
                    Json(json!({
                        "method": method.as_str(),
                        "content_type": header("content-type"),
                        "trace": header("x-trace"),
                        "body": body,
                    }))
                }),
            )
            .route("/rag/health", get(move || async move { rag_health }));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Endpoints {
            workflow_base_url: format!("http://{addr}/webhook"),
            rag_base_url: format!("http://{addr}/rag"),
        }
    }

    async fn unreachable_endpoints() -> Endpoints {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        Endpoints {
            workflow_base_url: format!("http://{addr}/webhook"),
            rag_base_url: format!("http://{addr}/rag"),
        }
    }

    #[test]
    fn test_service_parsing() {
        assert_eq!("workflow".parse::<Service>().unwrap(), Service::Workflow);
        assert_eq!("n8n".parse::<Service>().unwrap(), Service::Workflow);
        assert_eq!(" RAG ".parse::<Service>().unwrap(), Service::Rag);
        assert!("search".parse::<Service>().is_err());
    }

    #[test]
    fn test_default_endpoints() {
        let client = RemoteClient::new(Endpoints::default());
        assert_eq!(client.base_url(Service::Workflow), DEFAULT_WORKFLOW_BASE_URL);
        assert_eq!(client.base_url(Service::Rag), DEFAULT_RAG_BASE_URL);
    }

    #[tokio::test]
    async fn test_workflow_success() {
        let client = RemoteClient::new(spawn_stub(StatusCode::OK, StatusCode::OK).await);
        let value = client.call_workflow("/ok", &json!({"topic": "rates"})).await.unwrap();
        assert_eq!(value, json!({"ok": true}));
    }

    #[tokio::test]
    async fn test_workflow_sends_json_body() {
        let client = RemoteClient::new(spawn_stub(StatusCode::OK, StatusCode::OK).await);
        let value = client
            .call_workflow("/echo", &json!({"topic": "rates", "count": 3}))
            .await
            .unwrap();
        assert_eq!(value["content_type"], json!("application/json"));
        assert_eq!(value["body"], json!({"topic": "rates", "count": 3}));
    }

    #[tokio::test]
    async fn test_workflow_error_status() {
        let client = RemoteClient::new(spawn_stub(StatusCode::OK, StatusCode::OK).await);
        let err = client.call_workflow("/fail", &json!({})).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "HTTP 500: Internal Server Error");
    }

    #[tokio::test]
    async fn test_workflow_invalid_json() {
        let client = RemoteClient::new(spawn_stub(StatusCode::OK, StatusCode::OK).await);
        let err = client.call_workflow("/text", &json!({})).await.unwrap_err();
        assert!(matches!(err, RemoteError::Parse(_)));
    }

    #[tokio::test]
    async fn test_workflow_unreachable() {
        let client = RemoteClient::new(unreachable_endpoints().await);
        let err = client.call_workflow("/ok", &json!({})).await.unwrap_err();
        assert!(matches!(err, RemoteError::Transport(_)));
    }

    #[tokio::test]
    async fn test_rag_defaults_to_get() {
        let client = RemoteClient::new(spawn_stub(StatusCode::OK, StatusCode::OK).await);
        let value = client.call_rag("/search", RequestOptions::new()).await.unwrap();
        assert_eq!(value, json!({"hits": [1, 2]}));
    }

    #[tokio::test]
    async fn test_rag_ignores_status() {
        let client = RemoteClient::new(spawn_stub(StatusCode::OK, StatusCode::OK).await);
        let value = client.call_rag("/missing", RequestOptions::new()).await.unwrap();
        assert_eq!(value, json!({"detail": "missing"}));
    }

    #[tokio::test]
    async fn test_rag_default_content_type() {
        let client = RemoteClient::new(spawn_stub(StatusCode::OK, StatusCode::OK).await);
        let options = RequestOptions::new()
            .with_method(Method::POST)
            .with_json_body(&json!({"q": "lease"}))
            .unwrap();
        let value = client.call_rag("/query", options).await.unwrap();
        assert_eq!(value["method"], json!("POST"));
        assert_eq!(value["content_type"], json!("application/json"));
        assert_eq!(value["body"], json!(r#"{"q":"lease"}"#));
    }

    #[tokio::test]
    async fn test_rag_headers_replace_defaults() {
        let client = RemoteClient::new(spawn_stub(StatusCode::OK, StatusCode::OK).await);
        let options = RequestOptions::new()
            .with_method(Method::POST)
            .with_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("abc"))
            .with_body("plain");
        let value = client.call_rag("/query", options).await.unwrap();
        assert_eq!(value["trace"], json!("abc"));
        assert!(value["content_type"].is_null());
        assert_eq!(value["body"], json!("plain"));
    }

    #[tokio::test]
    async fn test_health_checks() {
        let client = RemoteClient::new(
            spawn_stub(StatusCode::OK, StatusCode::SERVICE_UNAVAILABLE).await,
        );
        assert!(client.check_health(Service::Workflow).await);
        assert!(!client.check_health(Service::Rag).await);
        assert_eq!(
            client.check_all().await,
            vec![(Service::Workflow, true), (Service::Rag, false)]
        );
    }

    #[tokio::test]
    async fn test_health_unreachable() {
        let client = RemoteClient::new(unreachable_endpoints().await);
        assert!(!client.check_health(Service::Workflow).await);
        assert!(!client.check_health(Service::Rag).await);
    }

    #[tokio::test]
    async fn test_workflow_keeps_server_reason_phrase() {
        let client = RemoteClient::new(spawn_raw_stub("HTTP/1.1 500 Workflow Exploded").await);
        let err = client.call_workflow("/ok", &json!({})).await.unwrap_err();
        assert_eq!(err.status(), Some(500));
        assert_eq!(err.to_string(), "HTTP 500: Workflow Exploded");
    }

    #[tokio::test]
    async fn test_workflow_canonical_reason_phrase() {
        let client = RemoteClient::new(spawn_raw_stub("HTTP/1.1 503 Service Unavailable").await);
        let err = client.call_workflow("/ok", &json!({})).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP 503: Service Unavailable");
    }

    #[tokio::test]
    async fn test_rag_invalid_json() {
        let client = RemoteClient::new(spawn_stub(StatusCode::OK, StatusCode::OK).await);
        let err = client.call_rag("/text", RequestOptions::new()).await.unwrap_err();
        assert!(matches!(err, RemoteError::Parse(_)));
    }

    #[tokio::test]
    async fn test_rag_unreachable() {
        let client = RemoteClient::new(unreachable_endpoints().await);
        let err = client.call_rag("/search", RequestOptions::new()).await.unwrap_err();
        assert!(matches!(err, RemoteError::Transport(_)));
    }

    #[tokio::test]
    async fn test_failures_are_logged() {
        capture_logs();
        let client = RemoteClient::new(spawn_stub(StatusCode::OK, StatusCode::OK).await);

        client
            .call_workflow("/fail?from=logging", &json!({}))
            .await
            .unwrap_err();
        let lines = logged_errors("/fail?from=logging");
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("HTTP 500"));

        client
            .call_rag("/text?from=logging", RequestOptions::new())
            .await
            .unwrap_err();
        assert_eq!(logged_errors("RAG call to /text?from=logging failed").len(), 1);

        client
            .call_rag("/search?from=logging", RequestOptions::new())
            .await
            .unwrap();
        assert!(logged_errors("/search?from=logging").is_empty());
    }
}
