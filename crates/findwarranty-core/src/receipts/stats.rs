use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{Receipt, WarrantyStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct CategoryTotal {
    pub category: String,
    pub count: usize,
    pub spend: f64,
}

/// Aggregate figures over a receipt list.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS), ts(export))]
pub struct ReceiptStats {
    pub count: usize,
    pub total_spend: f64,
    /// Sorted by category name
    pub by_category: Vec<CategoryTotal>,
    pub active: usize,
    pub expiring_soon: usize,
    pub expired: usize,
    pub unknown_expiry: usize,
}

const UNCATEGORIZED: &str = "Uncategorized";

impl ReceiptStats {
    /// `expiring_soon` warranties are also counted as `active`.
    pub fn from_receipts(receipts: &[Receipt], today: NaiveDate) -> Self {
        let mut stats = ReceiptStats {
            count: receipts.len(),
            ..Default::default()
        };
        let mut categories: BTreeMap<&str, (usize, f64)> = BTreeMap::new();

        for receipt in receipts {
            let price = receipt.price.unwrap_or(0.0);
            stats.total_spend += price;

            let category = match receipt.category.trim() {
                "" => UNCATEGORIZED,
                name => name,
            };
            let entry = categories.entry(category).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += price;

            match receipt.warranty_status(today) {
                WarrantyStatus::Active => stats.active += 1,
                WarrantyStatus::ExpiringSoon => {
                    stats.active += 1;
                    stats.expiring_soon += 1;
                }
                WarrantyStatus::Expired => stats.expired += 1,
                WarrantyStatus::Unknown => stats.unknown_expiry += 1,
            }
        }

        stats.by_category = categories
            .into_iter()
            .map(|(category, (count, spend))| CategoryTotal {
                category: category.to_string(),
                count,
                spend,
            })
            .collect();
        stats
    }

    /// Receipts whose warranty runs out within the "expiring soon" window,
    /// soonest first.
    pub fn expiring_soon(receipts: &[Receipt], today: NaiveDate) -> Vec<&Receipt> {
        let mut soon: Vec<&Receipt> = receipts
            .iter()
            .filter(|r| r.warranty_status(today) == WarrantyStatus::ExpiringSoon)
            .collect();
        soon.sort_by_key(|r| r.expiry_date());
        soon
    }
}
