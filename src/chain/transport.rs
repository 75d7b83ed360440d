use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use crate::error::WalletError;

/// JSON-over-HTTP access to a node.
///
/// Every non-2xx status is reported as [`WalletError::Network`].
#[async_trait]
pub trait NodeTransport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, WalletError>;

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, WalletError>;
}

#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, WalletError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| WalletError::Internal(format!("HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    async fn read(response: reqwest::Response, url: &str) -> Result<Value, WalletError> {
        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(WalletError::Network(format!(
                "{} returned {}: {}",
                url, status, error_text
            )));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| WalletError::Network(format!("{}: invalid JSON: {}", url, e)))
    }
}

#[async_trait]
impl NodeTransport for HttpTransport {
    async fn get_json(&self, url: &str) -> Result<Value, WalletError> {
        log::debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        Self::read(response, url).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value, WalletError> {
        log::debug!("POST {}", url);
        let response = self
            .client
            .post(url)
            .header("Accept", "application/json")
            .json(body)
            .send()
            .await?;
        Self::read(response, url).await
    }
}
