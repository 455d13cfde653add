use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use reqwest::{
    header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE},
    Client, Method,
};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error};

use shared_config::AppConfig;

/// HTTP client for the booking backend's REST API.
///
/// Plain request/response: no retries, no caching. Timeouts come from
/// configuration and surface as ordinary request errors.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    auth_token: Option<String>,
}

/// Non-2xx answer from the backend.
#[derive(Error, Debug, Clone)]
#[error("API error ({status}): {body}")]
pub struct ApiStatusError {
    pub status: u16,
    pub body: String,
}

impl ApiClient {
    pub fn new(config: &AppConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.booking_api_url.clone(),
            auth_token: config.booking_api_token.clone(),
        })
    }

    fn get_headers(&self) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        if let Some(token) = &self.auth_token {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| anyhow!("API token contains invalid header characters"))?;
            headers.insert(AUTHORIZATION, value);
        }

        Ok(headers)
    }

    /// Send a request and return the decoded JSON body.
    ///
    /// Non-2xx statuses come back as an [`ApiStatusError`] inside the
    /// `anyhow::Error` so callers can downcast for the status code.
    pub async fn request<B>(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, String)]>,
        body: Option<&B>,
    ) -> Result<Value>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);
        debug!("Making {} request to {}", method, url);

        let mut req = self
            .client
            .request(method, &url)
            .headers(self.get_headers()?);

        if let Some(params) = query {
            req = req.query(params);
        }

        if let Some(body_data) = body {
            req = req.json(body_data);
        }

        let response = req.send().await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("API error ({}): {}", status, error_text);

            return Err(ApiStatusError {
                status: status.as_u16(),
                body: error_text,
            }
            .into());
        }

        let data = response
            .json::<Value>()
            .await
            .context("response body is not valid JSON")?;
        Ok(data)
    }

    pub async fn get(&self, path: &str, query: Option<&[(&str, String)]>) -> Result<Value> {
        self.request::<Value>(Method::GET, path, query, None).await
    }
}
