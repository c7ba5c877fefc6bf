use crate::config::HttpConfig;
use crate::Result;
use reqwest::Proxy;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;

use super::TransportError;

/// Thin JSON-over-HTTP client used for every completion call.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(config: &HttpConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .pool_idle_timeout(Some(Duration::from_secs(90)));

        if let Some(proxy_url) = &config.proxy_url {
            let proxy = Proxy::all(proxy_url).map_err(|e| TransportError::Other(e.to_string()))?;
            builder = builder.proxy(proxy);
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Other(e.to_string()))?;

        Ok(Self { client })
    }

    /// POST a JSON body and decode the JSON answer.
    ///
    /// A non-success status is returned as [`crate::Error::Backend`] with the
    /// raw response body; it is never retried here.
    pub async fn post_json(
        &self,
        url: &str,
        headers: &HashMap<String, String>,
        body: &Value,
    ) -> Result<Value> {
        let mut request = self.client.post(url).json(body);
        for (k, v) in headers {
            request = request.header(k, v);
        }

        let response = request.send().await.map_err(TransportError::Http)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!(status = status.as_u16(), %body, "completion backend returned an error");
            return Err(crate::Error::Backend {
                status: status.as_u16(),
                body,
            });
        }

        let json = response.json().await.map_err(TransportError::Http)?;
        Ok(json)
    }
}
