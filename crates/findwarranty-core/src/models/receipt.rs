use std::path::Path;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::user::UserId;
use super::warranty::{WarrantyDuration, WarrantyStatus};

pub type ReceiptId = i64;

/// A stored receipt as returned by the receipts endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct Receipt {
    pub id: ReceiptId,
    // The server never serializes the owner, but a client-side copy may carry it
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(rename = "storeName", default)]
    pub store_name: String,
    #[serde(rename = "productName", default)]
    pub product_name: String,
    #[serde(rename = "purchaseDate", default)]
    pub purchase_date: Option<NaiveDate>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub category: String,
    #[serde(rename = "warrantyDuration", default)]
    pub warranty_duration: Option<String>,
    #[serde(rename = "warrantyExpiryDate", default)]
    pub warranty_expiry_date: Option<NaiveDate>,
    /// Base64-encoded attachment bytes
    #[serde(rename = "pdfData", default, skip_serializing_if = "Option::is_none")]
    pub pdf_data: Option<String>,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts", ts(skip))]
    pub extra: Map<String, Value>,
}

impl Receipt {
    pub fn has_attachment(&self) -> bool {
        self.pdf_data.as_deref().is_some_and(|data| !data.is_empty())
    }

    /// The server-computed expiry, or one derived from the duration label
    /// when the server did not provide it.
    pub fn expiry_date(&self) -> Option<NaiveDate> {
        self.warranty_expiry_date.or_else(|| {
            let duration = WarrantyDuration::parse(self.warranty_duration.as_deref()?)?;
            duration.expiry_from(self.purchase_date?)
        })
    }

    pub fn warranty_status(&self, today: NaiveDate) -> WarrantyStatus {
        WarrantyStatus::for_expiry(self.expiry_date(), today)
    }

    pub fn display_price(&self) -> String {
        match self.price {
            Some(price) => format!("{:.2}", price),
            None => "-".to_string(),
        }
    }
}

/// A file sent alongside the receipt fields.
#[derive(Clone, PartialEq)]
pub struct Attachment {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read an attachment from disk, guessing the MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read attachment {}", path.display()))?;
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let mime_type = mime_for_extension(path.extension().and_then(|e| e.to_str()));
        Ok(Self::new(file_name, mime_type, bytes))
    }
}

impl std::fmt::Debug for Attachment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Attachment")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn mime_for_extension(ext: Option<&str>) -> &'static str {
    match ext.map(|e| e.to_ascii_lowercase()).as_deref() {
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}

/// Payload for creating or editing a receipt. Sent as multipart form data;
/// the owning user id is attached by the receipt store.
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptForm {
    pub store_name: String,
    pub product_name: String,
    pub purchase_date: NaiveDate,
    pub price: f64,
    pub category: String,
    pub warranty_duration: String,
    pub attachment: Option<Attachment>,
}

impl ReceiptForm {
    /// Text fields in the order the server expects them, with the optional
    /// owner id appended.
    pub fn text_fields(&self, user_id: Option<UserId>) -> Vec<(&'static str, String)> {
        let mut fields = vec![
            ("storeName", self.store_name.clone()),
            ("productName", self.product_name.clone()),
            ("purchaseDate", self.purchase_date.format("%Y-%m-%d").to_string()),
            ("price", self.price.to_string()),
            ("category", self.category.clone()),
            ("warrantyDuration", self.warranty_duration.clone()),
        ];
        if let Some(id) = user_id {
            fields.push(("userId", id.to_string()));
        }
        fields
    }

    /// Expiry the server will compute for this form, if the duration is known.
    pub fn expected_expiry(&self) -> Option<NaiveDate> {
        WarrantyDuration::parse(&self.warranty_duration)?.expiry_from(self.purchase_date)
    }
}
