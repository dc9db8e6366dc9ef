//! API client for communicating with the FindWarranty REST API.
//!
//! This module provides the `ApiClient` struct, the `reqwest`-backed
//! implementation of [`WarrantyApi`].

use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{header, Client};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::models::{Credentials, Receipt, ReceiptForm, ReceiptId, User, UserId};

use super::{ApiError, WarrantyApi};

// ============================================================================
// Constants
// ============================================================================

/// Base URL used when neither config nor environment provides one
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// HTTP request timeout in seconds.
pub const REQUEST_TIMEOUT_SECS: u64 = 30;

const LOGIN_PATH: &str = "/api/auth/login";
const REGISTER_PATH: &str = "/api/auth/register";
const RECEIPTS_PATH: &str = "/api/receipts";

/// API client for the FindWarranty backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client with the default request timeout
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(base_url, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn receipt_url(&self, id: ReceiptId) -> String {
        format!("{}{}/{}", self.base_url, RECEIPTS_PATH, id)
    }

    fn user_receipts_url(&self, user_id: UserId) -> String {
        format!("{}{}/user/{}", self.base_url, RECEIPTS_PATH, user_id)
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn parse_json<T: DeserializeOwned>(
        response: reqwest::Response,
        what: &str,
    ) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse {}: {}", what, e)))
    }

    async fn authenticate(&self, path: &str, credentials: &Credentials) -> Result<User, ApiError> {
        let url = self.url(path);
        debug!(url = %url, username = %credentials.username, "Sending credentials");

        let response = self
            .client
            .post(&url)
            .header(header::ACCEPT, "application/json")
            .json(credentials)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response, "user response").await
    }

    /// Build the multipart body shared by create and update.
    fn receipt_form(form: &ReceiptForm, user_id: Option<UserId>) -> Result<Form, ApiError> {
        let mut multipart = Form::new();
        for (name, value) in form.text_fields(user_id) {
            multipart = multipart.text(name, value);
        }

        if let Some(ref attachment) = form.attachment {
            let part = Part::bytes(attachment.bytes.clone())
                .file_name(attachment.file_name.clone())
                .mime_str(&attachment.mime_type)
                .map_err(|e| {
                    ApiError::InvalidRequest(format!(
                        "Invalid attachment type {}: {}",
                        attachment.mime_type, e
                    ))
                })?;
            multipart = multipart.part("file", part);
        }

        Ok(multipart)
    }
}

#[async_trait]
impl WarrantyApi for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        self.authenticate(LOGIN_PATH, credentials).await
    }

    async fn register(&self, credentials: &Credentials) -> Result<User, ApiError> {
        self.authenticate(REGISTER_PATH, credentials).await
    }

    async fn fetch_receipts(&self, user_id: UserId) -> Result<Vec<Receipt>, ApiError> {
        let url = self.user_receipts_url(user_id);
        let response = self
            .client
            .get(&url)
            .header(header::ACCEPT, "application/json")
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        let receipts: Vec<Receipt> = Self::parse_json(response, "receipts response").await?;
        debug!(count = receipts.len(), user_id, "Fetched receipts");
        Ok(receipts)
    }

    async fn create_receipt(&self, user_id: UserId, form: &ReceiptForm) -> Result<Receipt, ApiError> {
        let body = Self::receipt_form(form, Some(user_id))?;
        let response = self
            .client
            .post(self.url(RECEIPTS_PATH))
            .multipart(body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response, "created receipt").await
    }

    async fn update_receipt(
        &self,
        id: ReceiptId,
        user_id: Option<UserId>,
        form: &ReceiptForm,
    ) -> Result<Receipt, ApiError> {
        let body = Self::receipt_form(form, user_id)?;
        let response = self
            .client
            .put(self.receipt_url(id))
            .multipart(body)
            .send()
            .await?;

        let response = Self::check_response(response).await?;
        Self::parse_json(response, "updated receipt").await
    }

    async fn delete_receipt(&self, id: ReceiptId) -> Result<(), ApiError> {
        let response = self.client.delete(self.receipt_url(id)).send().await?;
        Self::check_response(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Attachment;
    use chrono::NaiveDate;

    fn form_with_attachment(mime: &str) -> ReceiptForm {
        ReceiptForm {
            store_name: "Acme".to_string(),
            product_name: "Kettle".to_string(),
            purchase_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
            price: 20.0,
            category: "Kitchen".to_string(),
            warranty_duration: "1 Year".to_string(),
            attachment: Some(Attachment::new("kettle.pdf", mime, vec![1, 2, 3])),
        }
    }

    #[test]
    fn test_urls() {
        let client = ApiClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
        assert_eq!(client.url(LOGIN_PATH), "http://localhost:8080/api/auth/login");
        assert_eq!(client.user_receipts_url(4), "http://localhost:8080/api/receipts/user/4");
        assert_eq!(client.receipt_url(7), "http://localhost:8080/api/receipts/7");
    }

    #[test]
    fn test_receipt_form_accepts_valid_attachment() {
        assert!(ApiClient::receipt_form(&form_with_attachment("application/pdf"), Some(1)).is_ok());
    }

    #[test]
    fn test_receipt_form_rejects_bad_mime() {
        let result = ApiClient::receipt_form(&form_with_attachment("not a mime"), Some(1));
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transport_error() {
        // Port 9 (discard) on localhost is closed on test machines
        let client = ApiClient::with_timeout("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = client.delete_receipt(1).await.unwrap_err();
        assert!(err.is_transport());
    }
}
