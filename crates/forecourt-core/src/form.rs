//! # Sales Form
//!
//! The in-memory state of one Sales & Collections entry: reference lists,
//! selected employee, product rows and collection inputs.
//!
//! ## Enrichment Tickets
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  select_product(row, "Petrol")                                          │
//! │     ├─ price/id set, tank state reset, generations bumped               │
//! │     └─► EnrichmentPlan { tank: TankTicket, closing: Some(ClosingTicket)}│
//! │                          │                     │                        │
//! │           (caller fetches, lock NOT held)      │                        │
//! │                          ▼                     ▼                        │
//! │  apply_tank_state(ticket, snapshot)   apply_last_closing(ticket, v)     │
//! │     generation still current? ──yes──► write fields, recalculate        │
//! │                               ──no───► Stale, nothing touched           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Tank tickets are invalidated by a product change only. Closing tickets are
//! invalidated by a product change, a gun change, or the operator typing an
//! opening reading by hand.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::collections::{aggregate, CollectionEntry, CollectionTotals};
use crate::error::{CoreError, CoreResult};
use crate::money::{Money, Volume};
use crate::row::{ProductRow, RowId};
use crate::types::{active_products, Employee, InventorySnapshot, Product, DEFAULT_METRIC};
use crate::validation::{validate_submission, ValidationPolicy, ValidationResult};

/// Pump guns offered when nothing else is configured.
pub const DEFAULT_GUNS: [&str; 3] = ["G1", "G2", "G3"];

// =============================================================================
// Policy
// =============================================================================

/// Station-specific knobs for the form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormPolicy {
    pub guns: Vec<String>,
    pub default_metric: String,
    pub validation: ValidationPolicy,
}

impl Default for FormPolicy {
    fn default() -> Self {
        FormPolicy {
            guns: DEFAULT_GUNS.iter().map(|g| g.to_string()).collect(),
            default_metric: DEFAULT_METRIC.to_string(),
            validation: ValidationPolicy::default(),
        }
    }
}

// =============================================================================
// Tickets
// =============================================================================

/// Pending `GET /inventory/latest` lookup for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TankTicket {
    pub row_id: RowId,
    pub product_id: i64,
    generation: u64,
}

/// Pending `GET /sales/last` lookup for one row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosingTicket {
    pub row_id: RowId,
    pub product_name: String,
    pub gun: String,
    generation: u64,
}

/// Lookups a product selection asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentPlan {
    pub tank: TankTicket,
    /// Present only when the row already has a gun.
    pub closing: Option<ClosingTicket>,
}

/// Whether an enrichment response was written into the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrichmentOutcome {
    Applied,
    /// The row was edited or removed after the ticket was issued.
    Stale,
}

// =============================================================================
// Form View
// =============================================================================

/// Read-only snapshot for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FormView {
    pub employee_id: Option<i64>,
    pub entry_date: String,
    pub rows: Vec<ProductRow>,
    pub collections: CollectionEntry,
    pub totals: CollectionTotals,
    pub guns: Vec<String>,
}

// =============================================================================
// Sales Form
// =============================================================================

/// One entry being filled in.
///
/// Every mutation that touches a row recalculates that row before returning,
/// so derived fields are never stale. Totals are computed on demand.
#[derive(Debug, Clone)]
pub struct SalesForm {
    policy: FormPolicy,
    employees: Vec<Employee>,
    products: Vec<Product>,
    employee_id: Option<i64>,
    rows: Vec<ProductRow>,
    collections: CollectionEntry,
    entry_date: NaiveDateTime,
}

impl SalesForm {
    /// Creates an empty form dated `now`.
    pub fn new(policy: FormPolicy, now: NaiveDateTime) -> Self {
        SalesForm {
            policy,
            employees: Vec::new(),
            products: Vec::new(),
            employee_id: None,
            rows: Vec::new(),
            collections: CollectionEntry::default(),
            entry_date: now,
        }
    }

    // -------------------------------------------------------------------------
    // Reference data
    // -------------------------------------------------------------------------

    pub fn set_employees(&mut self, employees: Vec<Employee>) {
        self.employees = employees;
    }

    /// Stores the product list, keeping only active products.
    pub fn set_products(&mut self, products: Vec<Product>) {
        self.products = active_products(products);
    }

    pub fn employees(&self) -> &[Employee] {
        &self.employees
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn policy(&self) -> &FormPolicy {
        &self.policy
    }

    // -------------------------------------------------------------------------
    // Employee
    // -------------------------------------------------------------------------

    /// Selects the employee on shift. Must be on the active roster.
    pub fn select_employee(&mut self, employee_id: i64) -> CoreResult<()> {
        if !self.employees.iter().any(|e| e.employee_id == employee_id) {
            return Err(CoreError::EmployeeNotFound(employee_id));
        }
        self.employee_id = Some(employee_id);
        Ok(())
    }

    pub fn employee_id(&self) -> Option<i64> {
        self.employee_id
    }

    pub fn employee(&self) -> Option<&Employee> {
        let id = self.employee_id?;
        self.employees.iter().find(|e| e.employee_id == id)
    }

    // -------------------------------------------------------------------------
    // Rows
    // -------------------------------------------------------------------------

    /// Appends an empty row and returns its id.
    pub fn add_row(&mut self) -> RowId {
        let mut row = ProductRow::new();
        row.metric = self.policy.default_metric.clone();
        let id = row.row_id.clone();
        self.rows.push(row);
        id
    }

    /// Removes the row at `index`.
    pub fn remove_row(&mut self, index: usize) -> CoreResult<ProductRow> {
        if index >= self.rows.len() {
            return Err(CoreError::RowIndexOutOfRange {
                index,
                len: self.rows.len(),
            });
        }
        Ok(self.rows.remove(index))
    }

    /// Removes the row with `row_id`, wherever it currently sits.
    pub fn remove_row_by_id(&mut self, row_id: &RowId) -> CoreResult<ProductRow> {
        let index = self.index_of(row_id)?;
        Ok(self.rows.remove(index))
    }

    /// Removes the last row, if any.
    pub fn remove_last_row(&mut self) -> Option<ProductRow> {
        self.rows.pop()
    }

    pub fn rows(&self) -> &[ProductRow] {
        &self.rows
    }

    pub fn row(&self, row_id: &RowId) -> CoreResult<&ProductRow> {
        self.rows
            .iter()
            .find(|r| &r.row_id == row_id)
            .ok_or_else(|| CoreError::RowNotFound(row_id.to_string()))
    }

    pub fn row_id_at(&self, index: usize) -> CoreResult<RowId> {
        self.rows
            .get(index)
            .map(|r| r.row_id.clone())
            .ok_or(CoreError::RowIndexOutOfRange {
                index,
                len: self.rows.len(),
            })
    }

    fn index_of(&self, row_id: &RowId) -> CoreResult<usize> {
        self.rows
            .iter()
            .position(|r| &r.row_id == row_id)
            .ok_or_else(|| CoreError::RowNotFound(row_id.to_string()))
    }

    fn row_mut(&mut self, row_id: &RowId) -> CoreResult<&mut ProductRow> {
        self.rows
            .iter_mut()
            .find(|r| &r.row_id == row_id)
            .ok_or_else(|| CoreError::RowNotFound(row_id.to_string()))
    }

    /// Applies `f` to the row and recalculates it.
    fn edit_row<F>(&mut self, row_id: &RowId, f: F) -> CoreResult<&ProductRow>
    where
        F: FnOnce(&mut ProductRow),
    {
        let row = self.row_mut(row_id)?;
        f(row);
        row.recalculate();
        Ok(row)
    }

    // -------------------------------------------------------------------------
    // Row field edits
    // -------------------------------------------------------------------------

    /// Selects a product for the row by name.
    ///
    /// Price and id come from the product. Tank state is reset until the
    /// returned tank ticket is applied, so a previous product's level can
    /// never validate this product's sale.
    pub fn select_product(&mut self, row_id: &RowId, product_name: &str) -> CoreResult<EnrichmentPlan> {
        let product = self
            .products
            .iter()
            .find(|p| p.product_name == product_name)
            .cloned()
            .ok_or_else(|| CoreError::ProductNotFound(product_name.to_string()))?;
        let default_metric = self.policy.default_metric.clone();

        let row = self.edit_row(row_id, |row| {
            row.product_id = Some(product.product_id);
            row.product_name = product.product_name.clone();
            row.price = Some(product.unit_price());
            row.current_level = Volume::zero();
            row.tank_capacity = Volume::zero();
            row.metric = default_metric;
            row.tank_generation += 1;
            row.closing_generation += 1;
        })?;

        Ok(EnrichmentPlan {
            tank: TankTicket {
                row_id: row.row_id.clone(),
                product_id: product.product_id,
                generation: row.tank_generation,
            },
            closing: closing_ticket(row),
        })
    }

    /// Sets the row's gun. Returns a closing ticket once product and gun are both set.
    pub fn select_gun(&mut self, row_id: &RowId, gun: &str) -> CoreResult<Option<ClosingTicket>> {
        if !self.policy.guns.iter().any(|g| g == gun) {
            return Err(CoreError::UnknownGun {
                gun: gun.to_string(),
                allowed: self.policy.guns.clone(),
            });
        }

        let row = self.edit_row(row_id, |row| {
            row.gun = gun.to_string();
            row.closing_generation += 1;
        })?;
        Ok(closing_ticket(row))
    }

    /// Manual opening entry. Supersedes any pending last-closing lookup.
    pub fn set_opening(&mut self, row_id: &RowId, opening: Option<Volume>) -> CoreResult<()> {
        self.edit_row(row_id, |row| {
            row.opening = opening;
            row.closing_generation += 1;
        })?;
        Ok(())
    }

    pub fn set_closing(&mut self, row_id: &RowId, closing: Option<Volume>) -> CoreResult<()> {
        self.edit_row(row_id, |row| row.closing = closing)?;
        Ok(())
    }

    pub fn set_testing(&mut self, row_id: &RowId, testing: Option<Volume>) -> CoreResult<()> {
        self.edit_row(row_id, |row| row.testing = testing)?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Enrichment
    // -------------------------------------------------------------------------

    /// Writes a tank snapshot into the row if the ticket is still current.
    ///
    /// `None` (lookup failed or product missing from the listing) zeroes the
    /// tank state, which makes any positive sale an error until corrected.
    pub fn apply_tank_state(
        &mut self,
        ticket: &TankTicket,
        snapshot: Option<&InventorySnapshot>,
    ) -> EnrichmentOutcome {
        let default_metric = self.policy.default_metric.clone();
        let Ok(row) = self.row_mut(&ticket.row_id) else {
            return EnrichmentOutcome::Stale;
        };
        if row.tank_generation != ticket.generation {
            return EnrichmentOutcome::Stale;
        }

        match snapshot {
            Some(s) => {
                row.current_level = s.current_level();
                row.tank_capacity = s.tank_capacity();
                row.metric = s.metric_or(&default_metric).to_string();
            }
            None => {
                row.current_level = Volume::zero();
                row.tank_capacity = Volume::zero();
                row.metric = default_metric;
            }
        }
        row.recalculate();
        EnrichmentOutcome::Applied
    }

    /// Pre-fills the opening reading if the ticket is still current.
    pub fn apply_last_closing(&mut self, ticket: &ClosingTicket, reading: Volume) -> EnrichmentOutcome {
        let Ok(row) = self.row_mut(&ticket.row_id) else {
            return EnrichmentOutcome::Stale;
        };
        if row.closing_generation != ticket.generation {
            return EnrichmentOutcome::Stale;
        }
        row.opening = Some(reading);
        row.recalculate();
        EnrichmentOutcome::Applied
    }

    // -------------------------------------------------------------------------
    // Collections
    // -------------------------------------------------------------------------

    pub fn set_cash_received(&mut self, amount: Option<Money>) {
        self.collections.cash_received = amount;
    }

    pub fn set_phone_pay(&mut self, amount: Option<Money>) {
        self.collections.phone_pay = amount;
    }

    pub fn set_credit_card(&mut self, amount: Option<Money>) {
        self.collections.credit_card = amount;
    }

    pub fn collections(&self) -> &CollectionEntry {
        &self.collections
    }

    pub fn totals(&self) -> CollectionTotals {
        aggregate(&self.rows, &self.collections)
    }

    // -------------------------------------------------------------------------
    // Submission support
    // -------------------------------------------------------------------------

    /// Runs the submission rules against the current state.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_submission(
            self.employee_id,
            &self.rows,
            &self.totals(),
            &self.policy.validation,
        )
    }

    pub fn entry_date(&self) -> NaiveDateTime {
        self.entry_date
    }

    pub fn set_entry_date(&mut self, date: NaiveDateTime) {
        self.entry_date = date;
    }

    /// Clears everything the operator entered. Reference lists are kept.
    pub fn reset(&mut self, now: NaiveDateTime) {
        self.employee_id = None;
        self.rows.clear();
        self.collections = CollectionEntry::default();
        self.entry_date = now;
    }

    pub fn view(&self) -> FormView {
        FormView {
            employee_id: self.employee_id,
            entry_date: crate::submission::format_entry_date(self.entry_date),
            rows: self.rows.clone(),
            collections: self.collections.clone(),
            totals: self.totals(),
            guns: self.policy.guns.clone(),
        }
    }
}

fn closing_ticket(row: &ProductRow) -> Option<ClosingTicket> {
    row.has_product_and_gun().then(|| ClosingTicket {
        row_id: row.row_id.clone(),
        product_name: row.product_name.clone(),
        gun: row.gun.clone(),
        generation: row.closing_generation,
    })
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 14)
            .and_then(|d| d.and_hms_opt(18, 30, 0))
            .unwrap()
    }

    fn product(id: i64, name: &str, price: f64) -> Product {
        Product {
            product_id: id,
            product_name: name.to_string(),
            price,
            status: Some("ACTIVE".to_string()),
        }
    }

    fn snapshot(id: i64, level: f64, capacity: f64) -> InventorySnapshot {
        InventorySnapshot {
            product_id: id,
            product_name: None,
            current_level: Some(level),
            tank_capacity: Some(capacity),
            metric: None,
        }
    }

    fn form() -> SalesForm {
        let mut form = SalesForm::new(FormPolicy::default(), now());
        form.set_employees(vec![Employee {
            employee_id: 7,
            employee_first_name: "Asha".into(),
            employee_last_name: "Rao".into(),
            employee_role: None,
        }]);
        form.set_products(vec![
            product(1, "Petrol", 10.0),
            product(2, "Diesel", 20.0),
            Product {
                status: Some("INACTIVE".into()),
                ..product(3, "Kerosene", 5.0)
            },
        ]);
        form
    }

    /// Adds a fully enriched row and returns its id.
    fn filled_row(
        form: &mut SalesForm,
        name: &str,
        gun: &str,
        opening: i64,
        closing: i64,
        level: f64,
    ) -> RowId {
        let id = form.add_row();
        let plan = form.select_product(&id, name).unwrap();
        let snap = snapshot(plan.tank.product_id, level, 5000.0);
        assert_eq!(form.apply_tank_state(&plan.tank, Some(&snap)), EnrichmentOutcome::Applied);
        let ticket = form.select_gun(&id, gun).unwrap().unwrap();
        form.apply_last_closing(&ticket, Volume::from_litres(opening));
        form.set_closing(&id, Some(Volume::from_litres(closing))).unwrap();
        id
    }

    #[test]
    fn test_inactive_products_filtered() {
        let mut f = form();
        assert_eq!(f.products().len(), 2);
        let id = f.add_row();
        assert!(matches!(
            f.select_product(&id, "Kerosene"),
            Err(CoreError::ProductNotFound(_))
        ));
        let foreign = RowId::from("not-a-row");
        assert!(matches!(f.select_product(&foreign, "Petrol"), Err(CoreError::RowNotFound(_))));
    }

    #[test]
    fn test_scenario_row_derivation() {
        let mut f = form();
        let id = filled_row(&mut f, "Petrol", "G1", 100, 150, 1000.0);
        f.set_testing(&id, Some(Volume::from_litres(5))).unwrap();

        let row = f.row(&id).unwrap();
        assert_eq!(row.opening, Some(Volume::from_litres(100)));
        assert_eq!(row.sales_volume, Volume::from_litres(45));
        assert_eq!(row.sales_value, Money::from_major_minor(450, 0));
    }

    #[test]
    fn test_tank_overdraw_blocks_submission() {
        let mut f = form();
        f.select_employee(7).unwrap();
        let id = filled_row(&mut f, "Petrol", "G1", 0, 500, 100.0);

        let row = f.row(&id).unwrap();
        assert!(row.has_error());
        assert_eq!(row.sales_volume, Volume::zero());
        assert_eq!(
            f.validate(),
            Err(ValidationError::RowErrors { rows: vec![0] })
        );
    }

    #[test]
    fn test_short_collection_threshold() {
        let mut f = form();
        f.select_employee(7).unwrap();
        filled_row(&mut f, "Petrol", "G1", 0, 10, 1000.0); // 100
        filled_row(&mut f, "Diesel", "G2", 0, 10, 1000.0); // 200
        filled_row(&mut f, "Petrol", "G3", 0, 30, 1000.0); // 300

        f.set_cash_received(Some(Money::from_major_minor(500, 0)));
        f.set_phone_pay(Some(Money::from_major_minor(50, 0)));
        f.set_credit_card(Some(Money::from_major_minor(40, 0)));
        assert_eq!(f.totals().short_collections, Money::from_major_minor(-10, 0));
        assert!(f.validate().is_ok());

        f.set_credit_card(Some(Money::from_major_minor(30, 0)));
        assert_eq!(f.totals().short_collections, Money::from_major_minor(-20, 0));
        assert!(matches!(
            f.validate(),
            Err(ValidationError::ShortCollections { .. })
        ));
    }

    #[test]
    fn test_stale_tank_ticket_discarded_after_product_change() {
        let mut f = form();
        let id = f.add_row();
        let first = f.select_product(&id, "Petrol").unwrap();
        let second = f.select_product(&id, "Diesel").unwrap();

        // Petrol's response arrives late
        let petrol = snapshot(1, 9999.0, 9999.0);
        assert_eq!(f.apply_tank_state(&first.tank, Some(&petrol)), EnrichmentOutcome::Stale);
        assert_eq!(f.row(&id).unwrap().current_level, Volume::zero());

        let diesel = snapshot(2, 300.0, 1000.0);
        assert_eq!(f.apply_tank_state(&second.tank, Some(&diesel)), EnrichmentOutcome::Applied);
        assert_eq!(f.row(&id).unwrap().current_level, Volume::from_litres(300));
    }

    #[test]
    fn test_gun_change_keeps_tank_ticket_valid() {
        let mut f = form();
        let id = f.add_row();
        f.select_gun(&id, "G1").unwrap();
        let plan = f.select_product(&id, "Petrol").unwrap();
        let first_closing = plan.closing.clone().unwrap();

        let second_closing = f.select_gun(&id, "G2").unwrap().unwrap();

        assert_eq!(
            f.apply_tank_state(&plan.tank, Some(&snapshot(1, 800.0, 1000.0))),
            EnrichmentOutcome::Applied
        );
        assert_eq!(
            f.apply_last_closing(&first_closing, Volume::from_litres(111)),
            EnrichmentOutcome::Stale
        );
        assert_eq!(
            f.apply_last_closing(&second_closing, Volume::from_litres(222)),
            EnrichmentOutcome::Applied
        );
        assert_eq!(f.row(&id).unwrap().opening, Some(Volume::from_litres(222)));
    }

    #[test]
    fn test_manual_opening_beats_late_prefill() {
        let mut f = form();
        let id = f.add_row();
        f.select_product(&id, "Petrol").unwrap();
        let ticket = f.select_gun(&id, "G1").unwrap().unwrap();

        f.set_opening(&id, Some(Volume::from_litres(42))).unwrap();
        assert_eq!(
            f.apply_last_closing(&ticket, Volume::from_litres(10)),
            EnrichmentOutcome::Stale
        );
        assert_eq!(f.row(&id).unwrap().opening, Some(Volume::from_litres(42)));
    }

    #[test]
    fn test_removed_row_ticket_is_stale() {
        let mut f = form();
        let id = f.add_row();
        let plan = f.select_product(&id, "Petrol").unwrap();
        f.remove_row_by_id(&id).unwrap();
        assert_eq!(
            f.apply_tank_state(&plan.tank, Some(&snapshot(1, 1.0, 1.0))),
            EnrichmentOutcome::Stale
        );
    }

    #[test]
    fn test_tank_lookup_failure_zeroes_state() {
        let mut f = form();
        let id = f.add_row();
        let plan = f.select_product(&id, "Petrol").unwrap();
        assert_eq!(f.apply_tank_state(&plan.tank, None), EnrichmentOutcome::Applied);
        let row = f.row(&id).unwrap();
        assert_eq!(row.current_level, Volume::zero());
        assert_eq!(row.metric, DEFAULT_METRIC);
    }

    #[test]
    fn test_unknown_gun_rejected() {
        let mut f = form();
        let id = f.add_row();
        assert!(matches!(
            f.select_gun(&id, "G9"),
            Err(CoreError::UnknownGun { .. })
        ));
    }

    #[test]
    fn test_no_closing_ticket_without_gun() {
        let mut f = form();
        let id = f.add_row();
        let plan = f.select_product(&id, "Petrol").unwrap();
        assert!(plan.closing.is_none());
    }

    #[test]
    fn test_row_removal_by_position() {
        let mut f = form();
        let a = f.add_row();
        let b = f.add_row();
        let c = f.add_row();

        assert_eq!(f.remove_row(1).unwrap().row_id, b);
        assert_eq!(f.remove_last_row().map(|r| r.row_id), Some(c));
        assert_eq!(f.rows().len(), 1);
        assert_eq!(f.row_id_at(0).unwrap(), a);
        assert!(matches!(
            f.remove_row(5),
            Err(CoreError::RowIndexOutOfRange { index: 5, len: 1 })
        ));
    }

    #[test]
    fn test_unknown_employee_rejected() {
        let mut f = form();
        assert_eq!(f.select_employee(99), Err(CoreError::EmployeeNotFound(99)));
        assert_eq!(f.employee_id(), None);
    }

    #[test]
    fn test_reset_clears_entry_keeps_reference_data() {
        let mut f = form();
        f.select_employee(7).unwrap();
        filled_row(&mut f, "Petrol", "G1", 0, 10, 100.0);
        f.set_cash_received(Some(Money::from_major_minor(100, 0)));

        f.reset(now());
        assert!(f.rows().is_empty());
        assert_eq!(f.employee_id(), None);
        assert_eq!(f.collections(), &CollectionEntry::default());
        assert_eq!(f.products().len(), 2);
        assert_eq!(f.employees().len(), 1);
    }

    #[test]
    fn test_view_has_formatted_date() {
        let f = form();
        let view = f.view();
        assert_eq!(view.entry_date, "2026-03-14 18:30:00");
        assert_eq!(view.guns, vec!["G1", "G2", "G3"]);
    }
}
