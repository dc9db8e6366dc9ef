use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::api::ApiError;

/// Where assets come from when they are not cached.
#[async_trait]
pub trait AssetSource: Send + Sync {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>>;
}

/// Fetches assets from the origin serving the web app.
pub struct HttpAssetSource {
    client: Client,
    origin: String,
}

impl HttpAssetSource {
    pub fn new(origin: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            origin: origin.into().trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl AssetSource for HttpAssetSource {
    async fn fetch(&self, path: &str) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.origin, path);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Failed to fetch asset {}", url))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::from_status(status, &body))
                .with_context(|| format!("Failed to fetch asset {}", url));
        }

        let bytes = response
            .bytes()
            .await
            .with_context(|| format!("Failed to read asset {}", url))?;
        Ok(bytes.to_vec())
    }
}
