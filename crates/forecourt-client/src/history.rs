//! # Entry History Service
//!
//! Recent entries and deletion of the latest one.

use tracing::{info, warn};

use forecourt_core::history::{flatten, latest_entry_index, EntryId, EntryRecord, HistoryLine};

use crate::error::{ClientError, ClientResult};
use crate::http::ApiClient;
use crate::notice::{Notice, NoticeLog};

pub const LOAD_FAILED: &str = "Failed to load recent entries.";
pub const DELETE_SUCCEEDED: &str = "Entry deleted successfully.";
pub const DELETE_FAILED: &str = "Failed to delete entry.";

#[derive(Debug, Clone)]
pub struct HistoryService {
    api: ApiClient,
    notices: NoticeLog,
}

impl HistoryService {
    pub fn new(api: ApiClient, notices: NoticeLog) -> Self {
        HistoryService { api, notices }
    }

    /// Stored entries in backend order.
    pub async fn recent(&self) -> ClientResult<Vec<EntryRecord>> {
        self.api.recent_entries().await.map_err(|e| {
            warn!(error = %e, "Recent entries unavailable");
            self.notices.push(Notice::error(LOAD_FAILED));
            e
        })
    }

    /// Display lines, the last line of the latest entry marked deletable.
    pub async fn lines(&self) -> ClientResult<Vec<HistoryLine>> {
        Ok(flatten(&self.recent().await?))
    }

    /// Deletes the most recent entry and returns its id.
    pub async fn delete_latest(&self) -> ClientResult<EntryId> {
        let entries = self.recent().await?;
        let latest = latest_id(&entries)?;
        self.remove(&latest).await?;
        Ok(latest)
    }

    /// Deletes `entry_id`, which must be the most recent entry.
    pub async fn delete(&self, entry_id: &EntryId) -> ClientResult<()> {
        let entries = self.recent().await?;
        let latest = latest_id(&entries)?;
        if latest.to_string() != entry_id.to_string() {
            return Err(ClientError::NotLatestEntry {
                requested: entry_id.to_string(),
                latest: latest.to_string(),
            });
        }
        self.remove(&latest).await
    }

    async fn remove(&self, entry_id: &EntryId) -> ClientResult<()> {
        match self.api.delete_entry(entry_id).await {
            Ok(()) => {
                info!(entry_id = %entry_id, "Entry deleted");
                self.notices.push(Notice::success(DELETE_SUCCEEDED));
                Ok(())
            }
            Err(e) => {
                warn!(entry_id = %entry_id, error = %e, "Entry delete failed");
                self.notices.push(Notice::error(DELETE_FAILED));
                Err(e)
            }
        }
    }
}

fn latest_id(entries: &[EntryRecord]) -> ClientResult<EntryId> {
    latest_entry_index(entries)
        .map(|idx| entries[idx].entry_id.clone())
        .ok_or(ClientError::NoEntries)
}
