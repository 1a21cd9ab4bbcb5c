//! # Validation Module
//!
//! Submission rules for the Sales & Collections form, plus the tank refill
//! check used when inventory is topped up.
//!
//! ## Rule Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Checked top to bottom; the first failure is reported, nothing is sent. │
//! │                                                                         │
//! │  1. employee selected              "Please select employee"            │
//! │  2. at least one row      (policy) "Add at least one product"          │
//! │  3. no row error                   "Fix errors before submitting"      │
//! │  4. short >= -tolerance            "Short collections cannot be ..."   │
//! │  5. every row complete    (policy) "Fill all product fields"           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use forecourt_core::validation::{validate_submission, ValidationPolicy};
//! use forecourt_core::collections::CollectionTotals;
//! use forecourt_core::error::ValidationError;
//!
//! let policy = ValidationPolicy::default();
//! let result = validate_submission(None, &[], &CollectionTotals::default(), &policy);
//! assert_eq!(result, Err(ValidationError::EmployeeRequired));
//! ```

use serde::{Deserialize, Serialize};

use crate::collections::CollectionTotals;
use crate::error::{RefillError, ValidationError};
use crate::money::{Money, Volume};
use crate::row::ProductRow;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Default shortfall allowed between collections and sales (10.00).
pub const DEFAULT_SHORT_TOLERANCE: Money = Money::from_hundredths(1000);

/// Slack allowed when a refill would land exactly on capacity.
const REFILL_SLACK: Volume = Volume::from_hundredths(1);

// =============================================================================
// Policy
// =============================================================================

/// Which submission rules apply and with what threshold.
///
/// Rules 2 and 5 have been relaxed in some deployments, so both are switchable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationPolicy {
    pub short_collection_tolerance: Money,
    pub require_rows: bool,
    pub require_complete_rows: bool,
}

impl Default for ValidationPolicy {
    fn default() -> Self {
        ValidationPolicy {
            short_collection_tolerance: DEFAULT_SHORT_TOLERANCE,
            require_rows: true,
            require_complete_rows: true,
        }
    }
}

// =============================================================================
// Submission Rules
// =============================================================================

/// Validates the whole form before anything is sent.
///
/// ## Example
/// ```rust
/// use forecourt_core::validation::{validate_submission, ValidationPolicy};
/// use forecourt_core::collections::CollectionTotals;
/// use forecourt_core::error::ValidationError;
///
/// let err = validate_submission(Some(7), &[], &CollectionTotals::default(), &ValidationPolicy::default());
/// assert_eq!(err, Err(ValidationError::NoRows));
/// ```
pub fn validate_submission(
    employee_id: Option<i64>,
    rows: &[ProductRow],
    totals: &CollectionTotals,
    policy: &ValidationPolicy,
) -> ValidationResult<()> {
    if employee_id.is_none() {
        return Err(ValidationError::EmployeeRequired);
    }

    if policy.require_rows && rows.is_empty() {
        return Err(ValidationError::NoRows);
    }

    let errored = positions(rows, ProductRow::has_error);
    if !errored.is_empty() {
        return Err(ValidationError::RowErrors { rows: errored });
    }

    if totals.is_below_tolerance(policy.short_collection_tolerance) {
        return Err(ValidationError::ShortCollections {
            short: totals.short_collections.to_string(),
            tolerance: format_tolerance(policy.short_collection_tolerance),
        });
    }

    if policy.require_complete_rows {
        let incomplete = positions(rows, |r| !r.is_complete());
        if !incomplete.is_empty() {
            return Err(ValidationError::IncompleteRows { rows: incomplete });
        }
    }

    Ok(())
}

fn positions(rows: &[ProductRow], pred: impl Fn(&ProductRow) -> bool) -> Vec<usize> {
    rows.iter()
        .enumerate()
        .filter_map(|(i, r)| pred(r).then_some(i))
        .collect()
}

/// Whole amounts drop the decimals: 10.00 reads as "10", 7.50 stays "7.50".
fn format_tolerance(tolerance: Money) -> String {
    let abs = tolerance.abs();
    if abs.hundredths() % 100 == 0 {
        (abs.hundredths() / 100).to_string()
    } else {
        abs.to_string()
    }
}

// =============================================================================
// Tank Refill
// =============================================================================

/// Checks that adding `quantity` to a tank at `level` stays within `capacity`.
///
/// Returns the refill space left after the top-up. A hundredth of a litre of
/// overshoot is accepted so a refill to the brim is not rejected by rounding.
///
/// ```rust
/// use forecourt_core::money::Volume;
/// use forecourt_core::validation::check_refill;
///
/// let space = check_refill(Volume::from_litres(900), Volume::from_litres(100), Volume::from_litres(1000));
/// assert_eq!(space, Ok(Volume::zero()));
/// assert!(check_refill(Volume::from_litres(900), Volume::from_litres(101), Volume::from_litres(1000)).is_err());
/// ```
pub fn check_refill(level: Volume, quantity: Volume, capacity: Volume) -> Result<Volume, RefillError> {
    if quantity <= Volume::zero() {
        return Err(RefillError::EmptyQuantity);
    }

    if (level + quantity) - capacity > REFILL_SLACK {
        return Err(RefillError::CapacityExceeded {
            level,
            quantity,
            capacity,
        });
    }

    Ok((capacity - (level + quantity)).clamp_non_negative())
}

// =============================================================================
// Unit Tests
// =============================================================================
