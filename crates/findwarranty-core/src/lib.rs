//! Core library for the FindWarranty client.
//!
//! - `api`: the remote REST API (`WarrantyApi`, `ApiClient`)
//! - `auth`: the signed-in session and its persistent store
//! - `receipts`: the user's receipt collection and statistics
//! - `router`: route table and navigation guard
//! - `assets`: offline cache for the web app's static assets
//! - `context`: `AppContext`, which owns all of the above for one client

pub mod api;
pub mod assets;
pub mod auth;
pub mod config;
pub mod context;
pub mod error;
pub mod fence;
pub mod models;
pub mod receipts;
pub mod router;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{ApiClient, ApiError, WarrantyApi};
pub use config::Config;
pub use context::AppContext;
pub use error::StoreError;
pub use models::{Receipt, ReceiptForm, User};
