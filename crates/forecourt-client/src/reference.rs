//! # Reference Data Loader
//!
//! Employees and products the form is built from. Both lists are fetched
//! concurrently; a failure of one never blocks the other.

use tracing::{info, warn};

use forecourt_core::{active_products, Employee, Product};

use crate::http::ApiClient;
use crate::notice::{Notice, NoticeLog};

pub const EMPLOYEES_FAILED: &str = "Failed to load employees.";
pub const PRODUCTS_FAILED: &str = "Unable to load products";

/// Lists loaded at start-up. Products are already filtered to active ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceData {
    pub employees: Vec<Employee>,
    pub products: Vec<Product>,
}

/// Loads both lists. A failed list is empty and leaves an error notice.
pub async fn load_reference_data(api: &ApiClient, notices: &NoticeLog) -> ReferenceData {
    let (employees, products) = tokio::join!(api.active_employees(), api.products());

    let employees = employees.unwrap_or_else(|e| {
        warn!(error = %e, "Employee list unavailable");
        notices.push(Notice::error(EMPLOYEES_FAILED));
        Vec::new()
    });

    let products = match products {
        Ok(all) => active_products(all),
        Err(e) => {
            warn!(error = %e, "Product list unavailable");
            notices.push(Notice::error(PRODUCTS_FAILED));
            Vec::new()
        }
    };

    info!(
        employees = employees.len(),
        products = products.len(),
        "Reference data loaded"
    );
    ReferenceData {
        employees,
        products,
    }
}
