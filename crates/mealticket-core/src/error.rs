//! # Error Types
//!
//! Domain-specific error types for mealticket-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  mealticket-core errors (this file)                                    │
//! │  ├── CoreError        - Redemption rule violations                     │
//! │  └── ValidationError  - Malformed input                                │
//! │                                                                         │
//! │  mealticket-db errors (separate crate)                                 │
//! │  └── DbError          - Store failures, guard misses                   │
//! │                                                                         │
//! │  mealticket-engine errors                                              │
//! │  └── RedemptionError  - What callers see (NotFound, Forbidden, ...)    │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → RedemptionError                   │
//! │        DbError ───────────────────► RedemptionError                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Redemption rule violations.
///
/// Each variant names the precondition that failed and, where it helps the
/// operator, the measured value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// A status change that the transition table does not allow.
    ///
    /// ## When This Occurs
    /// - Resolving a transaction that is already completed or rejected
    #[error("{entity} cannot move from {from} to {to}")]
    InvalidStatusTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// The QR code has already been consumed by an approved transaction.
    #[error("QR code has already been used")]
    QrCodeAlreadyUsed,

    /// The QR code's redemption window has elapsed.
    #[error("QR code expired at {expired_at}")]
    QrCodeExpired { expired_at: DateTime<Utc> },

    /// The employee's status does not allow coupon use.
    #[error("Employee account is {status}; coupons cannot be used")]
    EmployeeCannotRedeem { status: String },

    /// The employee has no coupons left to issue a QR code against.
    #[error("No coupons available")]
    NoCouponsAvailable,

    /// The supplier has been deactivated.
    #[error("Supplier account has been deactivated")]
    SupplierInactive,

    /// The supplier has not been verified yet.
    #[error("Supplier account is pending verification")]
    SupplierUnverified,

    /// The employee is farther from the supplier than its radius allows.
    ///
    /// ## User Workflow
    /// ```text
    /// Terminal sends employee coordinates
    ///      │
    ///      ▼
    /// distance = 612 m, radius = 500 m
    ///      │
    ///      ▼
    /// OutsideRadius { distance_meters: 612, radius_meters: 500 }
    ///      │
    ///      ▼
    /// Terminal shows: "Employee must be within 500 meters"
    /// ```
    #[error("Employee is {distance_meters} m away; allowed radius is {radius_meters} m")]
    OutsideRadius {
        distance_meters: i64,
        radius_meters: i64,
    },

    /// Balance does not cover the requested coupons.
    #[error("Insufficient coupon balance: available {available}, requested {requested}")]
    InsufficientBalance { available: i64, requested: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, malformed QR payload).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
