//! # Submission Payloads
//!
//! Wire bodies for the entry endpoints, built from a validated [`SalesForm`].
//!
//! ## Shapes
//! ```text
//! POST /entryData                         POST /sales        ← entrySaleData
//! {                                       POST /collections  ← entryCollectionData
//!   "entrySaleData": {                    POST /inventory    ← one per product sold
//!     "date": "2026-03-14 18:30:00",
//!     "employeeId": 7,
//!     "products": [{ productName, gun, opening, closing, testing, price }]
//!   },
//!   "entryCollectionData": { date, employeeId, cashReceived, phonePay, creditCard },
//!   "inventoryData": [{ productId, quantity, metric, employeeId }]
//! }
//! ```
//!
//! Numbers go out as JSON floats with at most two decimals.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::form::SalesForm;
use crate::money::Volume;
use crate::validation::ValidationResult;

/// Date format the backend stores entries under.
pub const ENTRY_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Formats an entry date as `YYYY-MM-DD HH:MM:SS`.
pub fn format_entry_date(date: NaiveDateTime) -> String {
    date.format(ENTRY_DATE_FORMAT).to_string()
}

// =============================================================================
// Records
// =============================================================================

/// One pump reading in `entrySaleData.products`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SaleLine {
    pub product_name: String,
    pub gun: String,
    pub opening: f64,
    pub closing: f64,
    pub testing: f64,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct SalesRecord {
    pub date: String,
    pub employee_id: i64,
    pub products: Vec<SaleLine>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CollectionRecord {
    pub date: String,
    pub employee_id: i64,
    pub cash_received: f64,
    pub phone_pay: f64,
    pub credit_card: f64,
}

/// A stock movement for one product.
///
/// With the sale metric, `quantity` is the litres dispensed and the backend
/// lowers the tank level by it. With any other metric it is a delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InventoryRecord {
    pub product_id: i64,
    pub quantity: f64,
    pub metric: String,
    pub employee_id: i64,
}

/// The combined `POST /entryData` body. Split dispatch sends its parts separately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct EntryPayload {
    pub entry_sale_data: SalesRecord,
    pub entry_collection_data: CollectionRecord,
    pub inventory_data: Vec<InventoryRecord>,
}

impl EntryPayload {
    /// Validates the form and assembles the request body.
    ///
    /// Nothing is built for a form that fails validation, so a payload in hand
    /// always passed every rule.
    pub fn from_form(form: &SalesForm) -> ValidationResult<Self> {
        form.validate()?;

        // validate() guarantees an employee
        let employee_id = form.employee_id().unwrap_or_default();
        let date = format_entry_date(form.entry_date());
        let collections = form.collections();

        let products = form
            .rows()
            .iter()
            .map(|row| SaleLine {
                product_name: row.product_name.clone(),
                gun: row.gun.clone(),
                opening: row.opening.unwrap_or_default().to_f64(),
                closing: row.closing.unwrap_or_default().to_f64(),
                testing: row.testing.unwrap_or_default().to_f64(),
                price: row.price.unwrap_or_default().to_f64(),
            })
            .collect();

        Ok(EntryPayload {
            entry_sale_data: SalesRecord {
                date: date.clone(),
                employee_id,
                products,
            },
            entry_collection_data: CollectionRecord {
                date,
                employee_id,
                cash_received: collections.cash_received.unwrap_or_default().to_f64(),
                phone_pay: collections.phone_pay.unwrap_or_default().to_f64(),
                credit_card: collections.credit_card.unwrap_or_default().to_f64(),
            },
            inventory_data: inventory_decrements(form, employee_id),
        })
    }

    /// Number of requests split dispatch will send.
    pub fn split_request_count(&self) -> usize {
        2 + self.inventory_data.len()
    }
}

/// One decrement per product, rows of the same product summed, in first-seen order.
/// Products with nothing sold are left out.
fn inventory_decrements(form: &SalesForm, employee_id: i64) -> Vec<InventoryRecord> {
    let mut merged: Vec<(i64, Volume, String)> = Vec::new();

    for row in form.rows() {
        let Some(product_id) = row.product_id else {
            continue;
        };
        match merged.iter_mut().find(|(id, _, _)| *id == product_id) {
            Some((_, volume, _)) => *volume = *volume + row.sales_volume,
            None => merged.push((product_id, row.sales_volume, row.metric.clone())),
        }
    }

    merged
        .into_iter()
        .filter(|(_, volume, _)| !volume.is_zero())
        .map(|(product_id, volume, metric)| InventoryRecord {
            product_id,
            quantity: volume.to_f64(),
            metric,
            employee_id,
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;
    use crate::form::FormPolicy;
    use crate::money::Money;
    use crate::types::{Employee, InventorySnapshot, Product};
    use chrono::NaiveDate;

    fn form() -> SalesForm {
        let now = NaiveDate::from_ymd_opt(2026, 3, 14)
            .and_then(|d| d.and_hms_opt(9, 5, 7))
            .unwrap();
        let mut form = SalesForm::new(FormPolicy::default(), now);
        form.set_employees(vec![Employee {
            employee_id: 7,
            employee_first_name: "Asha".into(),
            employee_last_name: "Rao".into(),
            employee_role: None,
        }]);
        form.set_products(vec![
            Product {
                product_id: 1,
                product_name: "Petrol".into(),
                price: 102.555,
                status: Some("ACTIVE".into()),
            },
            Product {
                product_id: 2,
                product_name: "Diesel".into(),
                price: 90.0,
                status: Some("active".into()),
            },
        ]);
        form
    }

    fn add(form: &mut SalesForm, name: &str, gun: &str, opening: i64, closing: i64) {
        let id = form.add_row();
        let plan = form.select_product(&id, name).unwrap();
        let snapshot = InventorySnapshot {
            product_id: plan.tank.product_id,
            product_name: None,
            current_level: Some(5000.0),
            tank_capacity: Some(10000.0),
            metric: None,
        };
        form.apply_tank_state(&plan.tank, Some(&snapshot));
        form.select_gun(&id, gun).unwrap();
        form.set_opening(&id, Some(Volume::from_litres(opening))).unwrap();
        form.set_closing(&id, Some(Volume::from_litres(closing))).unwrap();
    }

    #[test]
    fn test_format_entry_date() {
        assert_eq!(format_entry_date(form().entry_date()), "2026-03-14 09:05:07");
    }

    #[test]
    fn test_invalid_form_builds_nothing() {
        let f = form();
        assert_eq!(
            EntryPayload::from_form(&f),
            Err(ValidationError::EmployeeRequired)
        );
    }

    #[test]
    fn test_combined_payload_wire_format() {
        let mut f = form();
        f.select_employee(7).unwrap();
        add(&mut f, "Petrol", "G1", 100, 110);
        // 10 L at 102.555 is 1025.55
        f.set_cash_received(Some(Money::from_major_minor(1025, 55)));
        assert_eq!(f.totals().short_collections, Money::zero());

        let payload = EntryPayload::from_form(&f).unwrap();
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["entrySaleData"]["date"], "2026-03-14 09:05:07");
        assert_eq!(json["entrySaleData"]["employeeId"], 7);
        assert_eq!(json["entrySaleData"]["products"][0]["productName"], "Petrol");
        assert_eq!(json["entrySaleData"]["products"][0]["opening"], 100.0);
        assert_eq!(json["entrySaleData"]["products"][0]["testing"], 0.0);
        assert_eq!(json["entrySaleData"]["products"][0]["price"], 102.555);
        assert_eq!(json["entryCollectionData"]["cashReceived"], 1025.55);
        assert_eq!(json["entryCollectionData"]["phonePay"], 0.0);
        assert_eq!(json["inventoryData"][0]["productId"], 1);
        assert_eq!(json["inventoryData"][0]["quantity"], 10.0);
        assert_eq!(json["inventoryData"][0]["metric"], "Liters (Sale)");
    }

    #[test]
    fn test_inventory_merged_per_product() {
        let mut f = form();
        f.select_employee(7).unwrap();
        add(&mut f, "Petrol", "G1", 0, 10);
        add(&mut f, "Diesel", "G2", 0, 0);
        add(&mut f, "Petrol", "G3", 0, 5);
        // Collections cover the sale so the form validates
        f.set_cash_received(Some(Money::from_major_minor(1600, 0)));

        let payload = EntryPayload::from_form(&f).unwrap();
        assert_eq!(payload.entry_sale_data.products.len(), 3);
        assert_eq!(payload.inventory_data.len(), 1);
        assert_eq!(payload.inventory_data[0].product_id, 1);
        assert!((payload.inventory_data[0].quantity - 15.0).abs() < f64::EPSILON);
        assert_eq!(payload.split_request_count(), 3);
    }
}
