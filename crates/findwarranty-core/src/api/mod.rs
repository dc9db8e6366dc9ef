//! REST API client module for the FindWarranty backend.
//!
//! This module provides the `WarrantyApi` trait describing the remote
//! endpoints, and `ApiClient`, its HTTP implementation over `reqwest`.
//!
//! Every call performs exactly one request; there is no retry or backoff.

pub mod backend;
pub mod client;
pub mod error;

pub use backend::WarrantyApi;
pub use client::ApiClient;
pub use error::ApiError;
