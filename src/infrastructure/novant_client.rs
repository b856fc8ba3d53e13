// Novant API client implementation
use crate::application::novant_api::{ApiConnector, NovantApi};
use crate::domain::error::{DatasourceError, Result};
use crate::domain::point::JsonObject;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct NovantClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl NovantClient {
    pub fn new(http: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn build_url(&self, operation: &str) -> String {
        format!("{}/{}", self.base_url, operation)
    }
}

/// `application/x-www-form-urlencoded` body, in the order given
pub fn encode_form(params: &[(&str, String)]) -> String {
    params
        .iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

pub fn build_http_client(timeout: Duration) -> anyhow::Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

#[async_trait]
impl NovantApi for NovantClient {
    async fn call(&self, operation: &str, params: &[(&str, String)]) -> Result<JsonObject> {
        let url = self.build_url(operation);
        tracing::debug!(%url, "novant request");

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.api_key, None::<&str>)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(encode_form(params))
            .send()
            .await
            .map_err(|e| DatasourceError::Transport(e.to_string()))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| DatasourceError::Transport(e.to_string()))?;

        if !status.is_success() {
            let err: Value = serde_json::from_slice(&body)?;
            let message = err
                .get("err_msg")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("{} failed with status {}", operation, status));
            return Err(DatasourceError::Upstream(message));
        }

        match serde_json::from_slice(&body)? {
            Value::Object(obj) => Ok(obj),
            _ => Err(DatasourceError::Decode(format!(
                "{} response is not a JSON object",
                operation
            ))),
        }
    }
}

/// Shares one connection pool across every instance key
#[derive(Debug, Clone)]
pub struct NovantConnector {
    http: reqwest::Client,
    base_url: String,
}

impl NovantConnector {
    pub fn new(http: reqwest::Client, base_url: String) -> Self {
        Self { http, base_url }
    }
}

impl ApiConnector for NovantConnector {
    fn connect(&self, api_key: &str) -> Arc<dyn NovantApi> {
        Arc::new(NovantClient::new(self.http.clone(), &self.base_url, api_key))
    }
}
