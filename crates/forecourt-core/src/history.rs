//! # Entry History
//!
//! Stored entries as `GET /recent-entries` returns them, flattened into one
//! line per product for display.
//!
//! Only the most recent entry may be deleted, and the delete action sits on
//! that entry's last line.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;

use crate::submission::ENTRY_DATE_FORMAT;

/// Backend entry id. Some deployments use numbers, some strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(untagged)]
#[ts(export)]
pub enum EntryId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryId::Number(n) => write!(f, "{}", n),
            EntryId::Text(s) => f.write_str(s),
        }
    }
}

// =============================================================================
// Stored shapes
// =============================================================================

/// A sale line as stored. Every field may be missing on old entries.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredSaleLine {
    pub product_name: Option<String>,
    pub gun: Option<String>,
    pub opening: Option<f64>,
    pub closing: Option<f64>,
    pub testing: Option<f64>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredSale {
    pub date: Option<String>,
    pub employee_id: Option<i64>,
    pub products: Vec<StoredSaleLine>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoredCollection {
    pub date: Option<String>,
    pub employee_id: Option<i64>,
    pub cash_received: Option<f64>,
    pub phone_pay: Option<f64>,
    pub credit_card: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryRecord {
    pub entry_id: EntryId,
    #[serde(default)]
    pub entry_sale_data: Option<StoredSale>,
    #[serde(default)]
    pub entry_collection_data: Option<StoredCollection>,
}

impl EntryRecord {
    /// Sale date, or `None` when missing or unreadable.
    pub fn sale_date(&self) -> Option<NaiveDateTime> {
        self.entry_sale_data
            .as_ref()
            .and_then(|s| s.date.as_deref())
            .and_then(parse_entry_date)
    }
}

/// Accepts the entry format plus the ISO variants older entries were saved in.
pub fn parse_entry_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, ENTRY_DATE_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f"))
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|d| d.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

// =============================================================================
// Latest entry & flattening
// =============================================================================

/// Index of the most recent entry by sale date.
///
/// Strictly later dates win, so among equal dates the first listed is kept.
/// Entries without a readable date sort before any dated entry.
pub fn latest_entry_index(entries: &[EntryRecord]) -> Option<usize> {
    if entries.is_empty() {
        return None;
    }
    let mut latest = 0;
    for (idx, entry) in entries.iter().enumerate().skip(1) {
        if entry.sale_date() > entries[latest].sale_date() {
            latest = idx;
        }
    }
    Some(latest)
}

/// One row of the history table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct HistoryLine {
    pub entry_id: EntryId,
    pub date: Option<String>,
    pub product_name: String,
    pub gun: String,
    pub opening: Option<f64>,
    pub closing: Option<f64>,
    pub cash_received: Option<f64>,
    pub phone_pay: Option<f64>,
    pub credit_card: Option<f64>,
    pub employee_id: Option<i64>,
    /// Set on the last line of the latest entry only.
    pub deletable: bool,
}

/// Flattens entries into display lines. Entries without products produce none.
pub fn flatten(entries: &[EntryRecord]) -> Vec<HistoryLine> {
    let latest = latest_entry_index(entries);
    let mut lines = Vec::new();

    for (idx, entry) in entries.iter().enumerate() {
        let sale = entry.entry_sale_data.clone().unwrap_or_default();
        let collection = entry.entry_collection_data.clone().unwrap_or_default();
        let count = sale.products.len();

        for (i, product) in sale.products.iter().enumerate() {
            lines.push(HistoryLine {
                entry_id: entry.entry_id.clone(),
                date: sale.date.clone(),
                product_name: product.product_name.clone().unwrap_or_default(),
                gun: product.gun.clone().unwrap_or_default(),
                opening: product.opening,
                closing: product.closing,
                cash_received: collection.cash_received,
                phone_pay: collection.phone_pay,
                credit_card: collection.credit_card,
                employee_id: sale.employee_id,
                deletable: Some(idx) == latest && i + 1 == count,
            });
        }
    }
    lines
}
