//! # forecourt-client: Backend Client for Forecourt
//!
//! Everything the Sales & Collections form does over the network: reference
//! lists, row enrichment, submission, history, tank refills.
//!
//! ## Architecture Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                           EntryApp                                      │
//! │                                                                         │
//! │  ┌──────────────────┐   FormState (Arc<Mutex<SalesForm>>)               │
//! │  │ EntryController  │◄──────────────────────┐                           │
//! │  │ reference load   │                       │                           │
//! │  │ row enrichment   │         ┌─────────────┴──────────┐                │
//! │  └────────┬─────────┘         │ SubmissionCoordinator  │                │
//! │           │                   │ combined / split       │                │
//! │           │                   └─────────────┬──────────┘                │
//! │  ┌────────┴─────────┐  ┌────────────────┐   │                           │
//! │  │ HistoryService   │  │InventoryService│   │                           │
//! │  └────────┬─────────┘  └───────┬────────┘   │                           │
//! │           └──────────┬─────────┴────────────┘                           │
//! │                      ▼                                                  │
//! │               ApiClient (reqwest) ──► dashboard backend                 │
//! │                                                                         │
//! │  Non-fatal problems ──► NoticeLog ──► front end                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`app`] - Wires the services together
//! - [`config`] - Client configuration (TOML + env)
//! - [`controller`] - Form state and row enrichment
//! - [`coordinator`] - Submission state machine and dispatch
//! - [`error`] - Client error types
//! - [`history`] - Recent entries, delete latest
//! - [`http`] - reqwest wrapper over the backend endpoints
//! - [`inventory`] - Tank refills
//! - [`notice`] - Operator notices
//! - [`reference`] - Employee and product lists
//!
//! ## Usage
//!
//! ```rust,ignore
//! use forecourt_client::{ClientConfig, EntryApp};
//!
//! let config = ClientConfig::load(None)?;
//! let app = EntryApp::new(&config, chrono::Local::now().naive_local())?;
//!
//! app.controller.load_reference_data().await;
//! app.controller.select_employee(7)?;
//! let row = app.controller.add_row();
//! app.controller.select_gun(&row, "G1").await?;
//! app.controller.select_product(&row, "Petrol").await?;
//!
//! let receipt = app.coordinator.submit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod app;
pub mod config;
pub mod controller;
pub mod coordinator;
pub mod error;
pub mod history;
pub mod http;
pub mod inventory;
pub mod notice;
pub mod reference;

// =============================================================================
// Re-exports
// =============================================================================

pub use app::EntryApp;
pub use config::{BackendSettings, ClientConfig, FormSettings, SubmitStrategy, UiSettings};
pub use controller::{EntryController, FormState};
pub use coordinator::{SubmissionCoordinator, SubmissionOutcome, SubmissionReceipt, SubmissionState};
pub use error::{ClientError, ClientResult};
pub use history::HistoryService;
pub use http::{ApiClient, IDEMPOTENCY_HEADER};
pub use inventory::{InventoryService, RefillReceipt};
pub use notice::{Notice, NoticeLevel, NoticeLog};
pub use reference::ReferenceData;
