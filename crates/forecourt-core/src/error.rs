//! # Error Types
//!
//! Domain-specific error types for forecourt-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  forecourt-core errors (this file)                                     │
//! │  ├── CoreError         - Form editing failures (unknown row, product)  │
//! │  ├── ValidationError   - Pre-network submission rules                  │
//! │  └── RefillError       - Tank refill checks                            │
//! │                                                                         │
//! │  forecourt-client errors (separate crate)                              │
//! │  └── ClientError       - HTTP, config, backend rejections              │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ClientError → Notice (front end)  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::money::Volume;

// =============================================================================
// Core Error
// =============================================================================

/// Failures while editing the entry form.
#[derive(Debug, Error, PartialEq)]
pub enum CoreError {
    /// No row with this id exists in the form.
    ///
    /// ## When This Occurs
    /// - The row was removed while an enrichment request was in flight
    /// - A stale UI handle refers to a row from a previous (reset) form
    #[error("Row not found: {0}")]
    RowNotFound(String),

    /// Row index outside the current row list.
    #[error("Row index {index} out of range ({len} rows)")]
    RowIndexOutOfRange { index: usize, len: usize },

    /// The product name is not in the active product list.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// The gun is not one of the configured dispensing guns.
    #[error("Unknown gun '{gun}', expected one of: {allowed:?}")]
    UnknownGun { gun: String, allowed: Vec<String> },

    /// The employee id is not in the active employee list.
    #[error("Employee not found: {0}")]
    EmployeeNotFound(i64),

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Submission rules, checked in declaration order before any request is sent.
///
/// The `Display` text is what the operator sees in the failure notice.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Rule 1: an employee must be selected.
    #[error("Please select employee")]
    EmployeeRequired,

    /// Rule 2: at least one product row.
    #[error("Add at least one product")]
    NoRows,

    /// Rule 3: no row may carry a capacity error.
    #[error("Fix errors before submitting")]
    RowErrors { rows: Vec<usize> },

    /// Rule 4: collections may fall short by at most the tolerance.
    #[error("Short collections cannot be less than -{tolerance}")]
    ShortCollections { short: String, tolerance: String },

    /// Rule 5: every row needs product, gun, opening, closing and price.
    #[error("Fill all product fields")]
    IncompleteRows { rows: Vec<usize> },
}

// =============================================================================
// Refill Error
// =============================================================================

/// Tank refill check failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RefillError {
    #[error("Refill quantity must be greater than zero")]
    EmptyQuantity,

    #[error("Tank capacity exceeded: {level} + {quantity} > {capacity}")]
    CapacityExceeded {
        level: Volume,
        quantity: Volume,
        capacity: Volume,
    },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;
