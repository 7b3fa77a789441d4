//! HTTP client for the QA Sphere API.

use std::time::Duration;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde_json::Value;

use crate::types::config::Config;
use crate::{QaSphereError, QaSphereResult};

/// Path prefix of the public API.
pub const API_PREFIX: &str = "/api/public/v0";

/// Ordered query parameters. Array parameters repeat the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a parameter.
    pub fn push(&mut self, key: &str, value: impl ToString) -> &mut Self {
        self.pairs.push((key.to_string(), value.to_string()));
        self
    }

    /// Appends a parameter when the value is present.
    pub fn push_opt<T: ToString>(&mut self, key: &str, value: Option<T>) -> &mut Self {
        if let Some(v) = value {
            self.push(key, v);
        }
        self
    }

    /// Appends one `key=value` pair per item.
    pub fn push_all<I, T>(&mut self, key: &str, values: Option<I>) -> &mut Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        for v in values.into_iter().flatten() {
            self.push(key, v);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// The collected pairs, in insertion order.
    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

/// Client for the QA Sphere public API.
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    tenant_url: String,
    api_key: String,
}

impl ApiClient {
    /// Creates a client from configuration.
    pub fn new(config: &Config) -> QaSphereResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.general.timeout_secs))
            .user_agent(concat!("qasphere-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| QaSphereError::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http,
            tenant_url: config.api.tenant_url.clone(),
            api_key: config.api.api_key.clone(),
        })
    }

    /// Normalized tenant URL (no trailing slash).
    pub fn tenant_url(&self) -> &str {
        &self.tenant_url
    }

    /// Full URL for an API path such as `/project/BDI`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.tenant_url, API_PREFIX, path)
    }

    /// GET request returning the decoded JSON body.
    pub async fn get(&self, path: &str, query: &QueryParams) -> QaSphereResult<Value> {
        let mut request = self.request(Method::GET, path);
        if !query.is_empty() {
            request = request.query(query.pairs());
        }
        self.send(Method::GET, path, request).await
    }

    /// POST request with a JSON body.
    pub async fn post(&self, path: &str, body: &Value) -> QaSphereResult<Value> {
        let request = self.request(Method::POST, path).json(body);
        self.send(Method::POST, path, request).await
    }

    /// PATCH request with a JSON body.
    pub async fn patch(&self, path: &str, body: &Value) -> QaSphereResult<Value> {
        let request = self.request(Method::PATCH, path).json(body);
        self.send(Method::PATCH, path, request).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header(AUTHORIZATION, format!("ApiKey {}", self.api_key))
            .header(CONTENT_TYPE, "application/json")
    }

    async fn send(&self, method: Method, path: &str, request: RequestBuilder) -> QaSphereResult<Value> {
        tracing::debug!(method = %method, path = path, "Calling QA Sphere API");

        let response = request.send().await.map_err(|e| {
            tracing::warn!(method = %method, path = path, error = %e, "API request failed");
            QaSphereError::from(e)
        })?;

        let status = response.status();
        let bytes = response.bytes().await?;

        tracing::debug!(
            method = %method,
            path = path,
            status = status.as_u16(),
            bytes = bytes.len(),
            "API responded"
        );

        if !status.is_success() {
            let server_message = serde_json::from_slice::<Value>(&bytes)
                .ok()
                .and_then(|body| {
                    body.get("message")
                        .and_then(Value::as_str)
                        .filter(|m| !m.is_empty())
                        .map(str::to_string)
                });
            let message = server_message
                .clone()
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));

            return Err(QaSphereError::Api {
                status: Some(status.as_u16()),
                message,
                server_message,
            });
        }

        if bytes.is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_slice(&bytes).map_err(|e| {
            QaSphereError::invalid_response(format!("Invalid response: body is not valid JSON ({})", e))
        })
    }
}
