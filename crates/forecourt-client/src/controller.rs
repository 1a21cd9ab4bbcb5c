//! # Entry Controller
//!
//! Drives one [`SalesForm`] against the backend: loads reference lists,
//! applies operator edits, and runs the best-effort row lookups.
//!
//! ## Enrichment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  select_product(row, "Petrol")                                          │
//! │                                                                         │
//! │  1. lock form ─► form.select_product() ─► EnrichmentPlan ─► unlock      │
//! │                                                                         │
//! │  2. no lock held:                                                       │
//! │       GET /inventory/latest ─┐                                          │
//! │       GET /sales/last ───────┴─ concurrently (closing only if gun set)  │
//! │                                                                         │
//! │  3. lock form ─► apply_tank_state / apply_last_closing ─► unlock        │
//! │       Stale tickets are dropped; the row was edited meanwhile.          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The lock is never held across an `.await`.

use chrono::NaiveDateTime;
use futures_util::future::OptionFuture;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, warn};

use forecourt_core::{
    snapshot_for, ClosingTicket, CollectionTotals, EnrichmentOutcome, FormPolicy, FormView,
    InventorySnapshot, Money, ProductRow, RowId, SalesForm, TankTicket, Volume,
};

use crate::error::ClientResult;
use crate::http::ApiClient;
use crate::notice::{Notice, NoticeLog};
use crate::reference::{load_reference_data, ReferenceData};

// =============================================================================
// Form State
// =============================================================================

/// The form shared between the controller and the submission coordinator.
#[derive(Debug, Clone)]
pub struct FormState {
    form: Arc<Mutex<SalesForm>>,
}

impl FormState {
    pub fn new(form: SalesForm) -> Self {
        FormState {
            form: Arc::new(Mutex::new(form)),
        }
    }

    /// Executes a function with read access to the form.
    pub fn with_form<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&SalesForm) -> R,
    {
        let form = self.form.lock().unwrap_or_else(PoisonError::into_inner);
        f(&form)
    }

    /// Executes a function with write access to the form.
    pub fn with_form_mut<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SalesForm) -> R,
    {
        let mut form = self.form.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut form)
    }
}

// =============================================================================
// Entry Controller
// =============================================================================

#[derive(Debug, Clone)]
pub struct EntryController {
    api: ApiClient,
    form: FormState,
    notices: NoticeLog,
}

impl EntryController {
    pub fn new(api: ApiClient, policy: FormPolicy, now: NaiveDateTime) -> Self {
        EntryController {
            api,
            form: FormState::new(SalesForm::new(policy, now)),
            notices: NoticeLog::new(),
        }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn notices(&self) -> &NoticeLog {
        &self.notices
    }

    /// Fetches employees and products and installs them in the form.
    pub async fn load_reference_data(&self) -> ReferenceData {
        let data = load_reference_data(&self.api, &self.notices).await;
        self.form.with_form_mut(|form| {
            form.set_employees(data.employees.clone());
            form.set_products(data.products.clone());
        });
        data
    }

    // =========================================================================
    // Employee & rows
    // =========================================================================

    pub fn select_employee(&self, employee_id: i64) -> ClientResult<()> {
        self.form
            .with_form_mut(|form| form.select_employee(employee_id))
            .map_err(Into::into)
    }

    pub fn add_row(&self) -> RowId {
        self.form.with_form_mut(SalesForm::add_row)
    }

    pub fn remove_row(&self, index: usize) -> ClientResult<ProductRow> {
        Ok(self.form.with_form_mut(|form| form.remove_row(index))?)
    }

    pub fn remove_last_row(&self) -> Option<ProductRow> {
        self.form.with_form_mut(SalesForm::remove_last_row)
    }

    /// Selects a product, then fetches its tank state and, when the row has a
    /// gun, the last closing reading.
    pub async fn select_product(&self, row_id: &RowId, product_name: &str) -> ClientResult<()> {
        let plan = self
            .form
            .with_form_mut(|form| form.select_product(row_id, product_name))?;

        let closing = plan.closing.as_ref().map(|t| self.fetch_last_closing(t));
        let (snapshot, reading) = tokio::join!(
            self.fetch_tank_state(&plan.tank),
            OptionFuture::from(closing)
        );

        self.apply_tank_state(&plan.tank, snapshot.as_ref());
        if let (Some(ticket), Some(Some(reading))) = (plan.closing.as_ref(), reading) {
            self.apply_last_closing(ticket, reading);
        }
        Ok(())
    }

    /// Sets the gun and, when the row has a product, pre-fills the opening.
    pub async fn select_gun(&self, row_id: &RowId, gun: &str) -> ClientResult<()> {
        let ticket = self.form.with_form_mut(|form| form.select_gun(row_id, gun))?;
        if let Some(ticket) = ticket {
            if let Some(reading) = self.fetch_last_closing(&ticket).await {
                self.apply_last_closing(&ticket, reading);
            }
        }
        Ok(())
    }

    pub fn set_opening(&self, row_id: &RowId, value: Option<Volume>) -> ClientResult<()> {
        Ok(self.form.with_form_mut(|form| form.set_opening(row_id, value))?)
    }

    pub fn set_closing(&self, row_id: &RowId, value: Option<Volume>) -> ClientResult<()> {
        Ok(self.form.with_form_mut(|form| form.set_closing(row_id, value))?)
    }

    pub fn set_testing(&self, row_id: &RowId, value: Option<Volume>) -> ClientResult<()> {
        Ok(self.form.with_form_mut(|form| form.set_testing(row_id, value))?)
    }

    // =========================================================================
    // Collections & display
    // =========================================================================

    pub fn set_cash_received(&self, amount: Option<Money>) {
        self.form.with_form_mut(|form| form.set_cash_received(amount));
    }

    pub fn set_phone_pay(&self, amount: Option<Money>) {
        self.form.with_form_mut(|form| form.set_phone_pay(amount));
    }

    pub fn set_credit_card(&self, amount: Option<Money>) {
        self.form.with_form_mut(|form| form.set_credit_card(amount));
    }

    pub fn set_entry_date(&self, date: NaiveDateTime) {
        self.form.with_form_mut(|form| form.set_entry_date(date));
    }

    pub fn totals(&self) -> CollectionTotals {
        self.form.with_form(SalesForm::totals)
    }

    pub fn view(&self) -> FormView {
        self.form.with_form(SalesForm::view)
    }

    // =========================================================================
    // Enrichment
    // =========================================================================

    /// Latest snapshot for the ticket's product. `None` on failure or absence.
    async fn fetch_tank_state(&self, ticket: &TankTicket) -> Option<InventorySnapshot> {
        match self.api.latest_inventory().await {
            Ok(snapshots) => {
                let found = snapshot_for(&snapshots, ticket.product_id).cloned();
                if found.is_none() {
                    debug!(product_id = ticket.product_id, "No inventory snapshot for product");
                }
                found
            }
            Err(e) => {
                warn!(product_id = ticket.product_id, error = %e, "Tank state lookup failed");
                None
            }
        }
    }

    /// Last recorded closing for the ticket's product and gun. A failure
    /// leaves a notice and returns `None` so the opening stays as it is.
    async fn fetch_last_closing(&self, ticket: &ClosingTicket) -> Option<Volume> {
        match self.api.last_closing(&ticket.product_name, &ticket.gun).await {
            Ok(last) => Some(last.reading()),
            Err(e) => {
                warn!(product = %ticket.product_name, gun = %ticket.gun, error = %e, "Last closing lookup failed");
                self.notices.push(Notice::error(format!(
                    "Error fetching last closing for {} - {}",
                    ticket.product_name, ticket.gun
                )));
                None
            }
        }
    }

    fn apply_tank_state(&self, ticket: &TankTicket, snapshot: Option<&InventorySnapshot>) {
        let outcome = self
            .form
            .with_form_mut(|form| form.apply_tank_state(ticket, snapshot));
        if outcome == EnrichmentOutcome::Stale {
            debug!(row = %ticket.row_id, "Discarded stale tank state");
        }
    }

    fn apply_last_closing(&self, ticket: &ClosingTicket, reading: Volume) {
        let outcome = self
            .form
            .with_form_mut(|form| form.apply_last_closing(ticket, reading));
        if outcome == EnrichmentOutcome::Stale {
            debug!(row = %ticket.row_id, "Discarded stale last closing");
        }
    }
}
