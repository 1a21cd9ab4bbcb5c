//! # forecourt-core: Pure Logic for Sales & Collections Entry
//!
//! Everything the shift-close form computes, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Forecourt Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                apps/entry-cli  (forecourt binary)               │   │
//! │  │     reconcile ──► submit ──► history ──► delete-latest          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    forecourt-client                             │   │
//! │  │   reference loader, row enrichment, submission coordinator      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ forecourt-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌────────────────┐  │   │
//! │  │   │  money   │ │   row    │ │ collections│ │   validation   │  │   │
//! │  │   │  Money   │ │ProductRow│ │  totals    │ │  five rules    │  │   │
//! │  │   │  Volume  │ │ recalc   │ │  short     │ │  refill check  │  │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └────────────────┘  │   │
//! │  │   ┌──────────┐ ┌──────────┐ ┌────────────┐ ┌────────────────┐  │   │
//! │  │   │   form   │ │submission│ │  session   │ │    history     │  │   │
//! │  │   │SalesForm │ │ payloads │ │  Session   │ │ recent entries │  │   │
//! │  │   └──────────┘ └──────────┘ └────────────┘ └────────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO NETWORK • NO CLOCK READS • PURE FUNCTIONS         │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money and Volume in integer hundredths
//! - [`types`] - Reference data (Employee, Product, InventorySnapshot)
//! - [`row`] - Product rows and the row calculator
//! - [`collections`] - Collections totals and short collections
//! - [`validation`] - Submission rules and the tank refill check
//! - [`form`] - The editable form and enrichment tickets
//! - [`submission`] - Request bodies for the entry endpoints
//! - [`session`] - Signed-in user and bearer token
//! - [`history`] - Stored entries and the latest-entry rule
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::NaiveDate;
//! use forecourt_core::{FormPolicy, InventorySnapshot, Money, Product, SalesForm, Volume};
//!
//! let now = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap().and_hms_opt(18, 0, 0).unwrap();
//! let mut form = SalesForm::new(FormPolicy::default(), now);
//! form.set_products(vec![Product {
//!     product_id: 1,
//!     product_name: "Petrol".into(),
//!     price: 10.0,
//!     status: Some("ACTIVE".into()),
//! }]);
//!
//! let row = form.add_row();
//! let plan = form.select_product(&row, "Petrol").unwrap();
//! let tank = InventorySnapshot {
//!     product_id: 1,
//!     product_name: None,
//!     current_level: Some(1000.0),
//!     tank_capacity: Some(5000.0),
//!     metric: None,
//! };
//! form.apply_tank_state(&plan.tank, Some(&tank));
//! form.set_opening(&row, Some(Volume::from_litres(100))).unwrap();
//! form.set_closing(&row, Some(Volume::from_litres(150))).unwrap();
//! form.set_testing(&row, Some(Volume::from_litres(5))).unwrap();
//!
//! assert_eq!(form.totals().total_sales, Money::from_major_minor(450, 0));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod collections;
pub mod error;
pub mod form;
pub mod history;
pub mod money;
pub mod row;
pub mod session;
pub mod submission;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use collections::{CollectionEntry, CollectionTotals};
pub use error::{CoreError, CoreResult, RefillError, ValidationError};
pub use form::{ClosingTicket, EnrichmentOutcome, EnrichmentPlan, FormPolicy, FormView, SalesForm, TankTicket};
pub use money::{Money, UnitPrice, Volume};
pub use row::{ProductRow, RowId};
pub use session::{LoginRequest, LoginResponse, Session, SessionUser};
pub use submission::{EntryPayload, InventoryRecord};
pub use types::*;
pub use validation::ValidationPolicy;
