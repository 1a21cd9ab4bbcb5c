//! # Entry App
//!
//! Wires one API client, one notice log and one form into the services a
//! front end needs. Everything inside shares the same session and notices.

use chrono::NaiveDateTime;

use crate::config::ClientConfig;
use crate::controller::EntryController;
use crate::coordinator::SubmissionCoordinator;
use crate::error::ClientResult;
use crate::history::HistoryService;
use crate::http::ApiClient;
use crate::inventory::InventoryService;
use crate::notice::NoticeLog;

#[derive(Debug, Clone)]
pub struct EntryApp {
    pub controller: EntryController,
    pub coordinator: SubmissionCoordinator,
    pub history: HistoryService,
    pub inventory: InventoryService,
}

impl EntryApp {
    pub fn new(config: &ClientConfig, now: NaiveDateTime) -> ClientResult<Self> {
        let api = ApiClient::new(config)?;
        let controller = EntryController::new(api.clone(), config.form_policy(), now);
        let notices: NoticeLog = controller.notices().clone();

        let coordinator = SubmissionCoordinator::new(
            api.clone(),
            controller.form().clone(),
            notices.clone(),
            config.strategy(),
            config.result_display(),
        );

        Ok(EntryApp {
            history: HistoryService::new(api.clone(), notices.clone()),
            inventory: InventoryService::new(api, notices),
            controller,
            coordinator,
        })
    }

    pub fn api(&self) -> &ApiClient {
        self.controller.api()
    }

    pub fn notices(&self) -> &NoticeLog {
        self.controller.notices()
    }
}
