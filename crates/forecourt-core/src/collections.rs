//! # Collections Aggregator
//!
//! Money taken over the shift, compared against what the meters say was sold.
//!
//! ```text
//!   cash_received ─┐
//!   phone_pay     ─┼─► total_collection ─┐
//!   credit_card   ─┘                     ├─► short_collections = collection - sales
//!   Σ row.sales_value ─► total_sales ────┘
//! ```
//!
//! A negative short means money is missing. The threshold is only enforced at
//! submission; [`CollectionTotals::is_below_tolerance`] exists so a front end
//! can highlight the figure while the operator types.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::row::ProductRow;

/// The three collection inputs. `None` means the field was left blank.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CollectionEntry {
    pub cash_received: Option<Money>,
    pub phone_pay: Option<Money>,
    pub credit_card: Option<Money>,
}

impl CollectionEntry {
    /// Sum of the three inputs, blanks counted as zero.
    pub fn total(&self) -> Money {
        [self.cash_received, self.phone_pay, self.credit_card]
            .into_iter()
            .map(Option::unwrap_or_default)
            .sum()
    }
}

/// Derived totals shown under the row table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CollectionTotals {
    pub total_sales: Money,
    pub total_collection: Money,
    pub short_collections: Money,
}

impl CollectionTotals {
    /// True when the shortfall is beyond `tolerance`. Exactly `-tolerance` is fine.
    #[inline]
    pub fn is_below_tolerance(&self, tolerance: Money) -> bool {
        self.short_collections < -tolerance
    }
}

/// Recomputes the totals from scratch. Row order does not matter.
pub fn aggregate(rows: &[ProductRow], entry: &CollectionEntry) -> CollectionTotals {
    let total_sales: Money = rows.iter().map(|r| r.sales_value).sum();
    let total_collection = entry.total();

    CollectionTotals {
        total_sales,
        total_collection,
        short_collections: total_collection - total_sales,
    }
}
