//! Receipt collection and statistics.
//!
//! `ReceiptStore` owns the signed-in user's receipt list and performs the
//! create/read/update/delete calls; `ReceiptStats` summarises a list for
//! the statistics view.

pub mod stats;
pub mod store;

pub use stats::{CategoryTotal, ReceiptStats};
pub use store::ReceiptStore;
