//! Thin HTTP client for the backend REST API
//!
//! One request per call, no retries. Non-2xx responses become
//! [`AgentError::Server`] carrying the backend's `detail` message.

pub mod ai;
pub mod analytics;
pub mod lenient;
pub mod records;
pub mod search;
pub mod types;

use reqwest::multipart::Form;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::ApiConfig;
use crate::error::{AgentError, Result};

/// Path prefix shared by all versioned routes
pub const API_PREFIX: &str = "/api/v1";

/// Client for the backend REST API
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    client: reqwest::Client,
}

impl ApiClient {
    /// Create a client for `base_url` with the HTTP client's default timeouts
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: normalize_base(base_url.into()),
            client: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &ApiConfig) -> Result<Self> {
        url::Url::parse(&config.base_url)
            .map_err(|e| AgentError::Config(format!("invalid api.base_url: {}", e)))?;

        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.request_timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            base_url: normalize_base(config.base_url.clone()),
            client: builder.build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a versioned route
    fn url(&self, path: &str) -> String {
        format!("{}{}{}", self.base_url, API_PREFIX, path)
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = self.url(path);
        debug!("{} {}", method, url);
        self.client.request(method, url)
    }

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let response = self.request(Method::GET, path).query(query).send().await?;
        decode(response).await
    }

    pub(crate) async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.request(Method::POST, path).json(body).send().await?;
        decode(response).await
    }

    pub(crate) async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let response = self.request(Method::PUT, path).json(body).send().await?;
        decode(response).await
    }

    pub(crate) async fn post_multipart<T: DeserializeOwned>(&self, path: &str, form: Form) -> Result<T> {
        let response = self.request(Method::POST, path).multipart(form).send().await?;
        decode(response).await
    }

    pub(crate) async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let response = self.request(Method::DELETE, path).send().await?;
        decode(response).await
    }

    /// Unversioned route (e.g. `/health`)
    pub(crate) async fn get_root<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        decode(response).await
    }
}

fn normalize_base(mut base: String) -> String {
    while base.ends_with('/') {
        base.pop();
    }
    base
}

/// Turn a response into `T`, mapping error statuses and `{"error": ...}` bodies.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let message = error_detail(&body).unwrap_or(body);
        warn!("Request failed with status {}: {}", status, message);
        return Err(AgentError::Server {
            status: status.as_u16(),
            message,
        });
    }

    let value: Value = serde_json::from_str(&body)?;
    if let Some(message) = error_only(&value) {
        warn!("Backend reported an error: {}", message);
        return Err(AgentError::Server {
            status: status.as_u16(),
            message,
        });
    }

    Ok(serde_json::from_value(value)?)
}

/// FastAPI puts its error text in `detail`
fn error_detail(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// A 2xx body that carries nothing but an `error` field
fn error_only(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    if object.len() != 1 {
        return None;
    }
    object.get("error")?.as_str().map(str::to_string)
}
