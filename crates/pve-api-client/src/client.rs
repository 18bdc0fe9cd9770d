//! Proxmox VE API client
//!
//! Thin HTTP client for `/api2/json`, authenticated with an API token

use async_trait::async_trait;
use reqwest::{Client, Method, Response, StatusCode};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

pub const API_PREFIX: &str = "/api2/json";

/// API client errors
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Authentication failed")]
    Authentication,

    #[error("API returned error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Response parsing failed: {0}")]
    ParseError(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Http(err) => err.status().map(|status| status.as_u16()),
            ApiError::Authentication => Some(StatusCode::UNAUTHORIZED.as_u16()),
            _ => None,
        }
    }
}

/// HTTP request representation
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub path: String,
    pub query_params: HashMap<String, String>,
    pub body: Option<Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query_params: HashMap::new(),
            body: None,
        }
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// HTTP response representation
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    /// The `data` member of the response envelope
    pub fn data(&self) -> &Value {
        self.body.get("data").unwrap_or(&Value::Null)
    }
}

/// Trait for Proxmox VE API communication
#[async_trait]
pub trait PveApiClient: Send + Sync {
    async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError>;
}

/// HTTP-based API client implementation
pub struct HttpApiClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

impl HttpApiClient {
    pub fn new(base_url: &str, timeout: Duration, verify_tls: bool) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/');
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ApiError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .danger_accept_invalid_certs(!verify_tls)
            .build()?;

        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            auth_token: None,
        }
    }

    /// Authenticate with an API token (`user@realm!tokenid` and its secret)
    pub fn with_api_token(mut self, token_id: &str, secret: &str) -> Self {
        self.auth_token = Some(format!("PVEAPIToken={}={}", token_id, secret));
        self
    }

    fn build_url(
        &self,
        path: &str,
        query_params: &HashMap<String, String>,
    ) -> Result<String, ApiError> {
        if !path.starts_with('/') {
            return Err(ApiError::InvalidUrl(path.to_string()));
        }

        let mut url = format!("{}{}{}", self.base_url, API_PREFIX, path);

        if !query_params.is_empty() {
            url.push('?');
            let query_string: Vec<String> = query_params
                .iter()
                .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
                .collect();
            url.push_str(&query_string.join("&"));
        }

        Ok(url)
    }

    async fn execute_request(&self, request: &ApiRequest) -> Result<Response, ApiError> {
        let url = self.build_url(&request.path, &request.query_params)?;

        let mut req_builder = self.client.request(request.method.clone(), &url);

        if let Some(ref token) = self.auth_token {
            req_builder = req_builder.header("Authorization", token);
        }

        if let Some(ref body) = request.body {
            req_builder = req_builder.json(body);
        }

        let response = req_builder.send().await?;
        Ok(response)
    }
}

#[async_trait]
impl PveApiClient for HttpApiClient {
    async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        log::debug!("Calling PVE API: {} {}", request.method, request.path);

        let response = self.execute_request(request).await?;
        let status = response.status();

        if status == StatusCode::UNAUTHORIZED {
            return Err(ApiError::Authentication);
        }

        let body_text = response.text().await?;
        let body: Value = if body_text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&body_text)
                .map_err(|e| ApiError::ParseError(format!("JSON parse error: {}", e)))?
        };

        if !status.is_success() {
            return Err(ApiError::Api {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        log::debug!(
            "PVE API response: status={}, body_size={}",
            status.as_u16(),
            body_text.len()
        );

        Ok(ApiResponse {
            status: status.as_u16(),
            body,
        })
    }
}

/// Best description of a failed call: the `message` member, then the
/// per-parameter `errors`, then the status reason
fn error_message(status: StatusCode, body: &Value) -> String {
    if let Some(message) = body.get("message").and_then(|m| m.as_str()) {
        return message.trim().to_string();
    }

    if let Some(errors) = body.get("errors").and_then(|e| e.as_object()) {
        let mut parts: Vec<String> = errors
            .iter()
            .map(|(param, reason)| match reason.as_str() {
                Some(reason) => format!("{}: {}", param, reason.trim()),
                None => format!("{}: {}", param, reason),
            })
            .collect();
        parts.sort();
        if !parts.is_empty() {
            return parts.join("; ");
        }
    }

    status
        .canonical_reason()
        .unwrap_or("Unknown error")
        .to_string()
}

/// Canned-response API client
pub struct MockApiClient {
    responses: HashMap<String, Result<ApiResponse, (u16, String)>>,
    requests: std::sync::Mutex<Vec<ApiRequest>>,
}

impl MockApiClient {
    pub fn new() -> Self {
        Self {
            responses: HashMap::new(),
            requests: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn add_response(&mut self, method_path: &str, body: Value) {
        self.responses.insert(
            method_path.to_string(),
            Ok(ApiResponse { status: 200, body }),
        );
    }

    pub fn add_error(&mut self, method_path: &str, status: u16, message: &str) {
        self.responses
            .insert(method_path.to_string(), Err((status, message.to_string())));
    }

    /// Requests seen so far, oldest first
    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    fn make_key(&self, request: &ApiRequest) -> String {
        format!("{} {}", request.method, request.path)
    }
}

impl Default for MockApiClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PveApiClient for MockApiClient {
    async fn call(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }

        let key = self.make_key(request);
        match self.responses.get(&key) {
            Some(Ok(response)) => Ok(response.clone()),
            Some(Err((status, message))) => Err(ApiError::Api {
                status: *status,
                message: message.clone(),
            }),
            None => Err(ApiError::Api {
                status: 404,
                message: format!("Mock response not found for: {}", key),
            }),
        }
    }
}
