//! Data models for FindWarranty entities.
//!
//! - `User`, `Credentials`: the authenticated account and login payload
//! - `Receipt`, `ReceiptForm`, `Attachment`: stored receipts and the
//!   multipart payload used to create or edit them
//! - `WarrantyDuration`, `WarrantyStatus`: warranty expiry rules

pub mod receipt;
pub mod user;
pub mod warranty;

pub use receipt::{Attachment, Receipt, ReceiptForm, ReceiptId};
pub use user::{Credentials, User, UserId};
pub use warranty::{WarrantyDuration, WarrantyStatus};
