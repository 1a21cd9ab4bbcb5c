//! # Product Row & Row Calculator
//!
//! One row per pump gun. The operator picks a product and gun, reads the
//! closing meter, and the row derives what was sold.
//!
//! ## Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Inputs                         Derived                                 │
//! │  ──────                         ───────                                 │
//! │  opening  (last closing)  ──┐                                           │
//! │  closing  (typed)         ──┼─► volume = max(closing - opening          │
//! │  testing  (typed)         ──┘              - testing, 0)                │
//! │                                     │                                   │
//! │                                     ├─ volume > current level?          │
//! │                                     │     yes → error, volume = 0       │
//! │                                     ▼                                   │
//! │  price    (product)       ────► value  = round(volume × price, 2)       │
//! │  level, capacity (tank)   ────► refill = max(capacity                   │
//! │                                              - (level - volume), 0)     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use ts_rs::TS;
use uuid::Uuid;

use crate::money::{Money, UnitPrice, Volume};
use crate::types::DEFAULT_METRIC;

// =============================================================================
// Row Identity
// =============================================================================

/// Stable identifier of a row for its whole life in the form.
///
/// Positions shift when rows are removed, so enrichment responses are routed
/// by id rather than index.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RowId(String);

impl RowId {
    pub fn new() -> Self {
        RowId(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RowId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(s: &str) -> Self {
        RowId(s.to_string())
    }
}

// =============================================================================
// Product Row
// =============================================================================

/// A product-sale line.
///
/// ## Field Ownership
/// - `product_*`, `price`: set from the selected product
/// - `opening`: pre-filled from the last recorded closing, editable as a fallback
/// - `closing`, `testing`: typed by the operator
/// - `current_level`, `tank_capacity`, `metric`: latest inventory snapshot
/// - `sales_volume`, `sales_value`, `refill_space`, `error`: derived, never set directly
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct ProductRow {
    pub row_id: RowId,
    pub product_id: Option<i64>,
    pub product_name: String,
    pub gun: String,
    pub opening: Option<Volume>,
    pub closing: Option<Volume>,
    pub testing: Option<Volume>,
    pub price: Option<UnitPrice>,
    pub current_level: Volume,
    pub tank_capacity: Volume,
    pub metric: String,
    pub sales_volume: Volume,
    pub sales_value: Money,
    pub refill_space: Volume,
    pub error: Option<String>,

    /// Bumped whenever the product changes; guards tank-state responses.
    #[serde(skip)]
    pub(crate) tank_generation: u64,

    /// Bumped on product, gun or manual opening edits; guards last-closing responses.
    #[serde(skip)]
    pub(crate) closing_generation: u64,
}

impl ProductRow {
    /// Creates an empty row, as added by "Add Product".
    pub fn new() -> Self {
        ProductRow {
            row_id: RowId::new(),
            product_id: None,
            product_name: String::new(),
            gun: String::new(),
            opening: None,
            closing: None,
            testing: None,
            price: None,
            current_level: Volume::zero(),
            tank_capacity: Volume::zero(),
            metric: DEFAULT_METRIC.to_string(),
            sales_volume: Volume::zero(),
            sales_value: Money::zero(),
            refill_space: Volume::zero(),
            error: None,
            tank_generation: 0,
            closing_generation: 0,
        }
    }

    /// Recomputes every derived field from the current inputs.
    ///
    /// Deterministic and infallible. Blank inputs count as zero here; the
    /// completeness rule at submission catches them separately.
    pub fn recalculate(&mut self) {
        let opening = self.opening.unwrap_or_default();
        let closing = self.closing.unwrap_or_default();
        let testing = self.testing.unwrap_or_default();
        let price = self.price.unwrap_or_default();

        let volume = (closing - opening - testing).clamp_non_negative();

        if volume > self.current_level {
            self.error = Some(format!(
                "Sales ({} L) exceed current tank level ({} L).",
                volume, self.current_level
            ));
            self.sales_volume = Volume::zero();
            self.sales_value = Money::zero();
        } else {
            self.error = None;
            self.sales_volume = volume;
            self.sales_value = Money::value_of(volume, price);
        }

        self.refill_space =
            (self.tank_capacity - (self.current_level - self.sales_volume)).clamp_non_negative();
    }

    /// True when the capacity check failed.
    #[inline]
    pub fn has_error(&self) -> bool {
        self.error.is_some()
    }

    /// Product, gun, opening, closing and price are all present.
    pub fn is_complete(&self) -> bool {
        self.product_id.is_some()
            && !self.product_name.trim().is_empty()
            && !self.gun.trim().is_empty()
            && self.opening.is_some()
            && self.closing.is_some()
            && self.price.is_some()
    }

    /// Both identifying fields for the last-closing lookup are set.
    pub fn has_product_and_gun(&self) -> bool {
        !self.product_name.is_empty() && !self.gun.is_empty()
    }

    pub fn tank_generation(&self) -> u64 {
        self.tank_generation
    }

    pub fn closing_generation(&self) -> u64 {
        self.closing_generation
    }
}

impl Default for ProductRow {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
