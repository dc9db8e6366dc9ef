//! Offline cache for the app's static assets.
//!
//! A fixed list of assets is fetched once into a named cache directory and
//! afterwards served from disk, falling back to the network for anything
//! not cached. There is no invalidation beyond the cache name.

pub mod cache;
pub mod source;

pub use cache::{AssetCache, ASSETS, CACHE_NAME};
pub use source::{AssetSource, HttpAssetSource};
