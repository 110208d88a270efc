//! Client for the OneView appliance REST API

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::{json, Map, Value};
use tracing::{debug, info};

use oneview_common::{Error, ManagedSan, Result};

use crate::config::{ApplianceConfig, Credentials, TaskConfig};
use crate::resources::ManagedSanClient;

pub const MANAGED_SANS_URI: &str = "/rest/fc-sans/managed-sans";
pub const LOGIN_SESSIONS_URI: &str = "/rest/login-sessions";

/// Task states that mean the appliance is still working
const TASK_PENDING_STATES: [&str; 6] = ["New", "Starting", "Pending", "Running", "Suspended", "Stopping"];
const TASK_ERROR_STATES: [&str; 3] = ["Error", "Terminated", "Killed"];

/// Authenticated session against one appliance
pub struct OneViewClient {
    http: reqwest::Client,
    base_url: String,
    api_version: u32,
    validate_etag: bool,
    tasks: TaskConfig,
    session_id: Option<String>,
}

/// A decoded appliance response
struct ApiResponse {
    status: StatusCode,
    location: Option<String>,
    body: Value,
}

impl OneViewClient {
    /// Connect and log in
    pub async fn connect(config: &ApplianceConfig) -> Result<Self> {
        config.validate()?;

        let mut builder = reqwest::Client::builder()
            .user_agent(format!("oneview-managed-san/{}", oneview_common::VERSION));
        builder = match &config.ssl_certificate {
            Some(path) => {
                let pem = std::fs::read(path)?;
                let cert = reqwest::Certificate::from_pem(&pem).map_err(http_error)?;
                builder.add_root_certificate(cert)
            }
            None => builder.danger_accept_invalid_certs(true),
        };

        let mut client = Self {
            http: builder.build().map_err(http_error)?,
            base_url: config.base_url()?,
            api_version: config.api_version,
            validate_etag: config.validate_etag,
            tasks: config.tasks.clone(),
            session_id: None,
        };
        client.login(&config.credentials).await?;
        Ok(client)
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    async fn login(&mut self, credentials: &Credentials) -> Result<()> {
        let mut body = json!({
            "userName": credentials.username.clone().unwrap_or_default(),
            "password": credentials.password.clone().unwrap_or_default(),
        });
        if let Some(domain) = &credentials.auth_login_domain {
            body["authLoginDomain"] = Value::String(domain.clone());
        }

        info!("Logging in to OneView at {}", self.base_url);
        let response = self
            .request(Method::POST, LOGIN_SESSIONS_URI)
            .json(&body)
            .send()
            .await
            .map_err(http_error)?;

        let response = match decode(response).await {
            Ok(response) => response,
            Err(Error::Api { message, .. }) => return Err(Error::Authentication(message)),
            Err(e) => return Err(e),
        };

        let session_id = response
            .body
            .get("sessionID")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::Authentication("no sessionID in login response".into()))?;
        self.session_id = Some(session_id.to_string());
        Ok(())
    }

    /// End the login session
    pub async fn logout(&mut self) -> Result<()> {
        if self.session_id.is_none() {
            return Ok(());
        }
        let response = self
            .request(Method::DELETE, LOGIN_SESSIONS_URI)
            .send()
            .await
            .map_err(http_error)?;
        decode(response).await?;
        self.session_id = None;
        Ok(())
    }

    fn url(&self, uri: &str) -> String {
        if uri.starts_with("http://") || uri.starts_with("https://") {
            uri.to_string()
        } else {
            format!("{}{}", self.base_url, uri)
        }
    }

    fn request(&self, method: Method, uri: &str) -> reqwest::RequestBuilder {
        let mutating = method != Method::GET;
        let mut req = self
            .http
            .request(method, self.url(uri))
            .header("X-API-Version", self.api_version.to_string())
            .header("Accept-Language", "en_US");
        if let Some(session_id) = &self.session_id {
            req = req.header("Auth", session_id);
        }
        if mutating && !self.validate_etag {
            req = req.header("If-Match", "*");
        }
        req
    }

    async fn get(&self, uri: &str) -> Result<Value> {
        debug!("GET {}", uri);
        let response = self
            .request(Method::GET, uri)
            .send()
            .await
            .map_err(http_error)?;
        Ok(decode(response).await?.body)
    }

    async fn send_json(&self, method: Method, uri: &str, body: &Value) -> Result<ApiResponse> {
        debug!("{} {}", method, uri);
        let response = self
            .request(method, uri)
            .json(body)
            .send()
            .await
            .map_err(http_error)?;
        decode(response).await
    }

    /// The task behind a response, if the appliance answered with one
    async fn task_from(&self, response: &ApiResponse) -> Result<Option<Value>> {
        if response.status == StatusCode::ACCEPTED {
            if let Some(location) = &response.location {
                return Ok(Some(self.get(location).await?));
            }
        }
        if is_task(&response.body) {
            return Ok(Some(response.body.clone()));
        }
        Ok(None)
    }

    /// Poll a task until it leaves the pending states
    async fn wait_for_task(&self, mut task: Value) -> Result<Value> {
        let uri = task
            .get("uri")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| Error::MalformedResource("task without uri".into()))?;
        let started = Instant::now();
        let timeout = self.tasks.timeout_secs.map(Duration::from_secs);

        while is_pending(task_state(&task)) {
            if let Some(limit) = timeout {
                if started.elapsed() >= limit {
                    return Err(Error::Timeout {
                        seconds: limit.as_secs(),
                    });
                }
            }
            debug!("Task {} is {}", uri, task_state(&task));
            tokio::time::sleep(Duration::from_millis(self.tasks.poll_interval_ms)).await;
            task = self.get(&uri).await?;
        }

        let state = task_state(&task);
        if TASK_ERROR_STATES.iter().any(|s| *s == state) {
            return Err(Error::TaskFailed {
                uri,
                state: state.to_string(),
                message: task_error_message(&task),
            });
        }
        Ok(task)
    }

    /// Send a mutation and resolve it to the affected resource
    async fn mutate(&self, method: Method, uri: &str, body: &Value) -> Result<Value> {
        let response = self.send_json(method, uri, body).await?;
        match self.task_from(&response).await? {
            Some(task) => {
                let task = self.wait_for_task(task).await?;
                self.associated_resource(task).await
            }
            None => Ok(response.body),
        }
    }

    async fn associated_resource(&self, task: Value) -> Result<Value> {
        let resource_uri = task
            .pointer("/associatedResource/resourceUri")
            .and_then(Value::as_str)
            .filter(|uri| !uri.is_empty())
            .map(str::to_string);
        match resource_uri {
            Some(uri) => self.get(&uri).await,
            None => Ok(task),
        }
    }
}

#[async_trait]
impl ManagedSanClient for OneViewClient {
    async fn get_by_name(&self, name: &str) -> Result<Option<ManagedSan>> {
        let filter = format!("\"name='{}'\"", name);
        let mut url = reqwest::Url::parse(&self.url(MANAGED_SANS_URI))
            .map_err(|e| Error::InvalidConfig(format!("invalid appliance URL: {}", e)))?;
        url.query_pairs_mut()
            .append_pair("start", "0")
            .append_pair("count", "-1")
            .append_pair("filter", &filter);

        let mut members = Vec::new();
        let mut next = Some(url.to_string());
        while let Some(page_uri) = next.take() {
            let page = self.get(&page_uri).await?;
            if let Some(Value::Array(items)) = page.get("members") {
                members.extend(items.iter().cloned());
            }
            next = page
                .get("nextPageUri")
                .and_then(Value::as_str)
                .filter(|uri| !uri.is_empty() && self.url(uri) != self.url(&page_uri))
                .map(str::to_string);
        }

        // The appliance filter is not always honoured; match again locally.
        let wanted = name.to_lowercase();
        members
            .into_iter()
            .find(|member| {
                member
                    .get("name")
                    .and_then(Value::as_str)
                    .map_or(false, |n| n.to_lowercase() == wanted)
            })
            .map(ManagedSan::from_value)
            .transpose()
    }

    async fn update(&self, uri: &str, data: &Map<String, Value>) -> Result<Value> {
        let uri = build_uri(uri);
        self.mutate(Method::PUT, &uri, &Value::Object(data.clone())).await
    }

    async fn create_endpoints_csv_file(&self, uri: &str) -> Result<Value> {
        let uri = format!("{}/endpoints/", build_uri(uri));
        self.mutate(Method::POST, &uri, &json!({})).await
    }

    async fn create_issues_report(&self, uri: &str) -> Result<Value> {
        let uri = format!("{}/issues/", build_uri(uri));
        let response = self.send_json(Method::POST, &uri, &json!({})).await?;
        let task = self.task_from(&response).await?.ok_or_else(|| {
            Error::MalformedResource(format!("expected a task from POST {}", uri))
        })?;
        let task = self.wait_for_task(task).await?;
        Ok(task.get("taskOutput").cloned().unwrap_or(Value::Null))
    }
}

/// Accept either a full Managed SAN URI or a bare id.
pub fn build_uri(id_or_uri: &str) -> String {
    if id_or_uri.starts_with(MANAGED_SANS_URI) {
        id_or_uri.trim_end_matches('/').to_string()
    } else {
        format!("{}/{}", MANAGED_SANS_URI, id_or_uri.trim_matches('/'))
    }
}

fn is_task(body: &Value) -> bool {
    body.get("category").and_then(Value::as_str) == Some("tasks")
}

fn is_pending(state: &str) -> bool {
    TASK_PENDING_STATES.iter().any(|s| *s == state)
}

fn task_state(task: &Value) -> &str {
    task.get("taskState").and_then(Value::as_str).unwrap_or("")
}

fn task_error_message(task: &Value) -> String {
    let first_error = task
        .get("taskErrors")
        .and_then(Value::as_array)
        .and_then(|errors| errors.first());
    first_error
        .and_then(|e| e.get("message").or_else(|| e.get("errorCode")))
        .or_else(|| task.get("taskStatus"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown error")
        .to_string()
}

fn http_error(e: reqwest::Error) -> Error {
    Error::Http(e.to_string())
}

async fn decode(response: reqwest::Response) -> Result<ApiResponse> {
    let status = response.status();
    let location = response
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let text = response.text().await.map_err(http_error)?;
    let body: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(&text).unwrap_or(Value::String(text))
    };

    if !status.is_success() {
        let error_code = body
            .get("errorCode")
            .and_then(Value::as_str)
            .unwrap_or("UNKNOWN")
            .to_string();
        let message = match &body {
            Value::String(s) => s.clone(),
            other => other
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed"))
                .to_string(),
        };
        return Err(Error::Api {
            status: status.as_u16(),
            error_code,
            message,
        });
    }

    Ok(ApiResponse {
        status,
        location,
        body,
    })
}
