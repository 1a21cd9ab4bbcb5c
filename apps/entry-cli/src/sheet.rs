//! # Entry Sheet
//!
//! A shift's readings written as TOML, fed through the same form the
//! dashboard uses.
//!
//! ```toml
//! employee_id = 7
//! date = "2026-03-14 18:30:00"   # optional, defaults to now; ISO 8601 and
//!                                # a bare date are accepted too
//!
//! [collections]
//! cash_received = 450.0
//! phone_pay = 0.0
//! credit_card = 0.0
//!
//! [[rows]]
//! product = "Petrol"
//! gun = "G1"
//! closing = 150.0
//! testing = 5.0                  # optional
//! opening = 100.0                # optional, overrides the last closing
//! ```

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use forecourt_client::EntryController;
use forecourt_core::history::parse_entry_date;
use forecourt_core::{Money, Volume};

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Sheet {
    pub employee_id: i64,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub collections: SheetCollections,
    #[serde(default)]
    pub rows: Vec<SheetRow>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetCollections {
    pub cash_received: Option<f64>,
    pub phone_pay: Option<f64>,
    pub credit_card: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SheetRow {
    pub product: String,
    pub gun: String,
    pub closing: f64,
    #[serde(default)]
    pub testing: Option<f64>,
    #[serde(default)]
    pub opening: Option<f64>,
}

impl Sheet {
    pub fn read(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading sheet {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("in sheet {}", path.display()))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let sheet: Sheet = toml::from_str(contents)?;
        sheet.check()?;
        Ok(sheet)
    }

    fn check(&self) -> Result<()> {
        if let Some(raw) = &self.date {
            if parse_entry_date(raw).is_none() {
                bail!(
                    "date '{}' is not YYYY-MM-DD HH:MM:SS, ISO 8601 or YYYY-MM-DD",
                    raw
                );
            }
        }

        let collections = [
            ("cash_received", self.collections.cash_received),
            ("phone_pay", self.collections.phone_pay),
            ("credit_card", self.collections.credit_card),
        ];
        for (name, value) in collections {
            non_negative(name, value)?;
        }

        for (idx, row) in self.rows.iter().enumerate() {
            let n = idx + 1;
            non_negative(&format!("rows[{}].closing", n), Some(row.closing))?;
            non_negative(&format!("rows[{}].testing", n), row.testing)?;
            non_negative(&format!("rows[{}].opening", n), row.opening)?;
        }
        Ok(())
    }

    pub fn entry_date(&self) -> Option<NaiveDateTime> {
        self.date.as_deref().and_then(parse_entry_date)
    }

    /// Enters the sheet into the controller's form, row by row.
    ///
    /// Each row's product and gun are selected first so the lookups run,
    /// then the sheet's readings are typed over them.
    pub async fn apply(&self, controller: &EntryController) -> Result<()> {
        controller.select_employee(self.employee_id)?;
        if let Some(date) = self.entry_date() {
            controller.set_entry_date(date);
        }

        for row in &self.rows {
            let id = controller.add_row();
            controller
                .select_gun(&id, &row.gun)
                .await
                .with_context(|| format!("gun {}", row.gun))?;
            controller
                .select_product(&id, &row.product)
                .await
                .with_context(|| format!("product {}", row.product))?;

            if let Some(opening) = row.opening {
                controller.set_opening(&id, Some(Volume::from_f64(opening)))?;
            }
            controller.set_closing(&id, Some(Volume::from_f64(row.closing)))?;
            controller.set_testing(&id, row.testing.map(Volume::from_f64))?;
            debug!(product = %row.product, gun = %row.gun, "Sheet row entered");
        }

        controller.set_cash_received(self.collections.cash_received.map(Money::from_f64));
        controller.set_phone_pay(self.collections.phone_pay.map(Money::from_f64));
        controller.set_credit_card(self.collections.credit_card.map(Money::from_f64));
        Ok(())
    }
}

fn non_negative(name: &str, value: Option<f64>) -> Result<()> {
    match value {
        Some(v) if !v.is_finite() || v < 0.0 => bail!("{} must be a non-negative number, got {}", name, v),
        _ => Ok(()),
    }
}
