//! # Reference Types
//!
//! Read-only data the entry form is built from, as the backend serves it.
//!
//! ## Type Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Reference Data                                   │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌───────────────────────┐ │
//! │  │    Employee     │   │     Product     │   │  InventorySnapshot    │ │
//! │  │  ─────────────  │   │  ─────────────  │   │  ───────────────────  │ │
//! │  │  employeeId     │   │  productId      │   │  productId            │ │
//! │  │  first / last   │   │  productName    │   │  currentLevel         │ │
//! │  │  role           │   │  price          │   │  tankCapacity         │ │
//! │  │  GET /active    │   │  status         │   │  metric               │ │
//! │  └─────────────────┘   │  GET /products  │   │  GET /inventory/latest│ │
//! │                        └─────────────────┘   └───────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Numbers arrive as JSON floats; accessors convert them to [`Money`] and
//! [`Volume`] so nothing downstream touches `f64`.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{UnitPrice, Volume};

/// Label the backend uses for fuel sold through a pump.
pub const DEFAULT_METRIC: &str = "Liters (Sale)";

/// Product status value that makes a product selectable.
pub const ACTIVE_STATUS: &str = "ACTIVE";

// =============================================================================
// Employee
// =============================================================================

/// An employee currently on the active roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Employee {
    pub employee_id: i64,
    #[serde(default)]
    pub employee_first_name: String,
    #[serde(default)]
    pub employee_last_name: String,
    #[serde(default)]
    pub employee_role: Option<String>,
}

impl Employee {
    /// Label shown in the employee picker: `"7 - Asha Rao"`.
    pub fn display_name(&self) -> String {
        format!(
            "{} - {} {}",
            self.employee_id, self.employee_first_name, self.employee_last_name
        )
        .trim_end()
        .to_string()
    }
}

// =============================================================================
// Product
// =============================================================================

/// A fuel product with its current unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    pub product_id: i64,
    pub product_name: String,
    /// Unit price as served (per litre).
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub status: Option<String>,
}

impl Product {
    /// Returns the unit price at full precision.
    #[inline]
    pub fn unit_price(&self) -> UnitPrice {
        UnitPrice::from_f64(self.price)
    }

    /// Status is `ACTIVE`, compared case-insensitively. Missing status is inactive.
    pub fn is_active(&self) -> bool {
        self.status
            .as_deref()
            .map(|s| s.trim().eq_ignore_ascii_case(ACTIVE_STATUS))
            .unwrap_or(false)
    }
}

/// Keeps only products the form may offer.
pub fn active_products(products: Vec<Product>) -> Vec<Product> {
    products.into_iter().filter(Product::is_active).collect()
}

// =============================================================================
// Inventory Snapshot
// =============================================================================

/// Latest recorded tank state for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventorySnapshot {
    pub product_id: i64,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub current_level: Option<f64>,
    #[serde(default)]
    pub tank_capacity: Option<f64>,
    #[serde(default)]
    pub metric: Option<String>,
}

impl InventorySnapshot {
    pub fn current_level(&self) -> Volume {
        Volume::from_f64(self.current_level.unwrap_or(0.0))
    }

    pub fn tank_capacity(&self) -> Volume {
        Volume::from_f64(self.tank_capacity.unwrap_or(0.0))
    }

    /// Metric label, falling back to `default` when blank.
    pub fn metric_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.metric.as_deref() {
            Some(m) if !m.trim().is_empty() => m,
            _ => default,
        }
    }
}

/// Finds the snapshot for `product_id` in a `/inventory/latest` listing.
pub fn snapshot_for(snapshots: &[InventorySnapshot], product_id: i64) -> Option<&InventorySnapshot> {
    snapshots.iter().find(|s| s.product_id == product_id)
}

// =============================================================================
// Last Closing
// =============================================================================

/// Response of `GET /sales/last`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LastClosing {
    #[serde(default)]
    pub last_closing: Option<f64>,
}

impl LastClosing {
    /// The reading to pre-fill as opening; a missing value means a fresh meter.
    pub fn reading(&self) -> Volume {
        Volume::from_f64(self.last_closing.unwrap_or(0.0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
