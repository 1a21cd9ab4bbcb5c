//! # Tank Refill
//!
//! Records a delivery into a product's tank. The refill is checked against
//! the latest snapshot before anything is sent:
//!
//! ```text
//!   GET /inventory/latest ─► snapshot_for(product) ─► check_refill()
//!                                                        │ ok
//!                                                        ▼
//!                                   POST /inventory { productId, quantity,
//!                                                     metric, employeeId }
//! ```

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use forecourt_core::validation::check_refill;
use forecourt_core::{snapshot_for, CoreError, InventoryRecord, InventorySnapshot, RefillError, Volume};

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::notice::{Notice, NoticeLog};

pub const CAPACITY_EXCEEDED: &str = "Tank capacity exceeded.";
pub const REFILL_ADDED: &str = "Entry added successfully!";
pub const REFILL_FAILED: &str = "Failed to add entry.";

/// Metric sent when the snapshot has none.
pub const REFILL_METRIC: &str = "liters";

/// What an accepted refill recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefillReceipt {
    pub product_id: i64,
    pub quantity: Volume,
    pub metric: String,
    /// Free space left in the tank after the refill.
    pub refill_space: Volume,
}

#[derive(Debug, Clone)]
pub struct InventoryService {
    api: ApiClient,
    notices: NoticeLog,
}

impl InventoryService {
    pub fn new(api: ApiClient, notices: NoticeLog) -> Self {
        InventoryService { api, notices }
    }

    pub async fn latest(&self) -> ClientResult<Vec<InventorySnapshot>> {
        self.api.latest_inventory().await
    }

    /// Adds `quantity` to the product's tank.
    pub async fn refill(
        &self,
        product_id: i64,
        quantity: Volume,
        employee_id: i64,
    ) -> ClientResult<RefillReceipt> {
        let snapshots = self.api.latest_inventory().await?;
        let snapshot = snapshot_for(&snapshots, product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let refill_space = check_refill(snapshot.current_level(), quantity, snapshot.tank_capacity())
            .map_err(|e| {
                if matches!(e, RefillError::CapacityExceeded { .. }) {
                    self.notices.push(Notice::error(CAPACITY_EXCEEDED));
                }
                ClientError::from(e)
            })?;

        let record = InventoryRecord {
            product_id,
            quantity: quantity.to_f64(),
            metric: snapshot.metric_or(REFILL_METRIC).to_string(),
            employee_id,
        };

        let key = Uuid::new_v4().to_string();
        if let Err(e) = self.api.post_inventory(&record, &key).await {
            warn!(product_id, error = %e, "Refill rejected");
            let message = e.backend_message().unwrap_or(REFILL_FAILED).to_string();
            self.notices.push(Notice::error(message));
            return Err(e);
        }

        info!(product_id, quantity = %quantity, "Tank refilled");
        self.notices.push(Notice::success(REFILL_ADDED));
        Ok(RefillReceipt {
            product_id,
            quantity,
            metric: record.metric,
            refill_space,
        })
    }
}
