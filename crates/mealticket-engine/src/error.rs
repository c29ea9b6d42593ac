//! # Redemption Error Types
//!
//! The error taxonomy callers of the engine branch on.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ValidationError ──► CoreError ──┐                                     │
//! │                                  ├──► RedemptionError ──► ErrorResponse│
//! │  sqlx::Error ──────► DbError ────┘         │                 (JSON)    │
//! │                                            │                           │
//! │  tokio::time::error::Elapsed ──────────────┘ (Timeout, retryable)     │
//! │                                                                         │
//! │  {                                                                      │
//! │    "code": "FORBIDDEN",                                                 │
//! │    "message": "Employee is 612 m away; allowed radius is 500 m",        │
//! │    "details": { "distance_meters": 612, "radius_meters": 500 }          │
//! │  }                                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use std::time::Duration;
use thiserror::Error;
use ts_rs::TS;

use mealticket_core::{CoreError, ValidationError};
use mealticket_db::{DbError, GuardFailure};

/// Result type alias for engine operations.
pub type RedemptionResult<T> = Result<T, RedemptionError>;

// =============================================================================
// Redemption Error
// =============================================================================

/// Every failure the redemption protocol can report.
///
/// All variants are terminal to the request: nothing is retained from a
/// failed call. Only [`RedemptionError::Timeout`] is worth retrying as is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RedemptionError {
    /// Referenced entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Status, permission or location violation.
    #[error("{0}")]
    Forbidden(ForbiddenReason),

    /// Re-entry into a terminal state, or a lost race on one.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Out-of-range quantity or malformed input.
    #[error("Invalid argument: {0}")]
    InvalidArgument(#[from] ValidationError),

    /// The employee's balance does not cover the request.
    #[error("Insufficient balance: current {current}, requested {requested}")]
    InsufficientBalance { current: i64, requested: i64 },

    /// The QR code was already consumed.
    #[error("QR code has already been used")]
    AlreadyUsed,

    /// The QR code's window has elapsed.
    #[error("QR code expired at {expired_at}")]
    Expired { expired_at: DateTime<Utc> },

    /// A store call exceeded its deadline.
    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Store or atomic-unit failure.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Why a [`RedemptionError::Forbidden`] was raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForbiddenReason {
    #[error("Supplier account has been deactivated")]
    SupplierInactive,

    #[error("Supplier account is pending verification")]
    SupplierUnverified,

    #[error("Employee account is {status}; coupons cannot be used")]
    EmployeeInactive { status: String },

    #[error("No coupons available")]
    NoCouponsAvailable,

    #[error("Employee is {distance_meters} m away; allowed radius is {radius_meters} m")]
    OutsideRadius {
        distance_meters: i64,
        radius_meters: i64,
    },

    #[error("You can only resolve your own transactions")]
    OwnershipMismatch,
}

/// Machine-readable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[ts(export)]
pub enum ErrorKind {
    NotFound,
    Forbidden,
    Conflict,
    InvalidArgument,
    InsufficientBalance,
    AlreadyUsed,
    Expired,
    Timeout,
    Internal,
}

impl RedemptionError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        RedemptionError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// The code a client switches on.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RedemptionError::NotFound { .. } => ErrorKind::NotFound,
            RedemptionError::Forbidden(_) => ErrorKind::Forbidden,
            RedemptionError::Conflict(_) => ErrorKind::Conflict,
            RedemptionError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            RedemptionError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            RedemptionError::AlreadyUsed => ErrorKind::AlreadyUsed,
            RedemptionError::Expired { .. } => ErrorKind::Expired,
            RedemptionError::Timeout { .. } => ErrorKind::Timeout,
            RedemptionError::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Returns true if the same call may succeed when repeated unchanged.
    ///
    /// A timed-out approval left nothing behind (the atomic unit either
    /// committed or rolled back), so repeating it is safe.
    pub fn is_retryable(&self) -> bool {
        matches!(self, RedemptionError::Timeout { .. })
    }

    /// Serializable view for transport layers.
    pub fn to_response(&self) -> ErrorResponse {
        let details = match self {
            RedemptionError::Forbidden(ForbiddenReason::OutsideRadius {
                distance_meters,
                radius_meters,
            }) => Some(json!({
                "distance_meters": distance_meters,
                "radius_meters": radius_meters,
            })),
            RedemptionError::InsufficientBalance { current, requested } => Some(json!({
                "current_balance": current,
                "requested": requested,
            })),
            RedemptionError::Expired { expired_at } => Some(json!({
                "expired_at": expired_at,
            })),
            _ => None,
        };

        ErrorResponse {
            code: self.kind(),
            message: self.to_string(),
            details,
            retryable: self.is_retryable(),
        }
    }
}

/// What a transport layer sends back on failure.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
    pub retryable: bool,
}

// =============================================================================
// Error Conversions
// =============================================================================

impl From<CoreError> for RedemptionError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::InvalidStatusTransition { .. } => RedemptionError::Conflict(err.to_string()),
            CoreError::QrCodeAlreadyUsed => RedemptionError::AlreadyUsed,
            CoreError::QrCodeExpired { expired_at } => RedemptionError::Expired { expired_at },
            CoreError::EmployeeCannotRedeem { status } => {
                RedemptionError::Forbidden(ForbiddenReason::EmployeeInactive { status })
            }
            CoreError::NoCouponsAvailable => {
                RedemptionError::Forbidden(ForbiddenReason::NoCouponsAvailable)
            }
            CoreError::SupplierInactive => {
                RedemptionError::Forbidden(ForbiddenReason::SupplierInactive)
            }
            CoreError::SupplierUnverified => {
                RedemptionError::Forbidden(ForbiddenReason::SupplierUnverified)
            }
            CoreError::OutsideRadius {
                distance_meters,
                radius_meters,
            } => RedemptionError::Forbidden(ForbiddenReason::OutsideRadius {
                distance_meters,
                radius_meters,
            }),
            CoreError::InsufficientBalance {
                available,
                requested,
            } => RedemptionError::InsufficientBalance {
                current: available,
                requested,
            },
            CoreError::Validation(v) => RedemptionError::InvalidArgument(v),
        }
    }
}

impl From<DbError> for RedemptionError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => RedemptionError::NotFound { entity, id },
            DbError::GuardFailed(GuardFailure::BalanceTooLow {
                available,
                requested,
                ..
            }) => RedemptionError::InsufficientBalance {
                current: available,
                requested,
            },
            DbError::GuardFailed(GuardFailure::QrCodeConsumed { .. }) => {
                RedemptionError::AlreadyUsed
            }
            DbError::GuardFailed(guard @ GuardFailure::TransactionNotPending { .. }) => {
                RedemptionError::Conflict(guard.to_string())
            }
            other => {
                tracing::error!(error = %other, "Store operation failed");
                RedemptionError::Internal(other.to_string())
            }
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_serializes_screaming_snake_case() {
        assert_eq!(
            serde_json::to_string(&ErrorKind::InsufficientBalance).unwrap(),
            "\"INSUFFICIENT_BALANCE\""
        );
        assert_eq!(
            serde_json::to_string(&ErrorKind::AlreadyUsed).unwrap(),
            "\"ALREADY_USED\""
        );
    }

    #[test]
    fn test_only_timeout_is_retryable() {
        let timeout = RedemptionError::Timeout {
            operation: "approve",
            after: Duration::from_secs(100),
        };
        assert!(timeout.is_retryable());
        assert_eq!(timeout.to_string(), "approve timed out after 100s");

        assert!(!RedemptionError::AlreadyUsed.is_retryable());
        assert!(!RedemptionError::Internal("disk".into()).is_retryable());
        assert!(!RedemptionError::Conflict("done".into()).is_retryable());
    }

    #[test]
    fn test_core_error_mapping() {
        let err: RedemptionError = CoreError::OutsideRadius {
            distance_meters: 612,
            radius_meters: 500,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Forbidden);

        let response = err.to_response();
        let details = response.details.unwrap();
        assert_eq!(details["distance_meters"], 612);
        assert_eq!(details["radius_meters"], 500);

        let err: RedemptionError = CoreError::QrCodeAlreadyUsed.into();
        assert_eq!(err, RedemptionError::AlreadyUsed);

        let err: RedemptionError = ValidationError::OutOfRange {
            field: "coupons_used".into(),
            min: 1,
            max: 3,
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_guard_failure_mapping() {
        let err: RedemptionError = DbError::GuardFailed(GuardFailure::BalanceTooLow {
            employee_id: "e".into(),
            available: 1,
            requested: 3,
        })
        .into();
        assert_eq!(
            err,
            RedemptionError::InsufficientBalance {
                current: 1,
                requested: 3
            }
        );

        let err: RedemptionError = DbError::GuardFailed(GuardFailure::QrCodeConsumed {
            qr_code_id: "q".into(),
        })
        .into();
        assert_eq!(err.kind(), ErrorKind::AlreadyUsed);

        let err: RedemptionError = DbError::GuardFailed(GuardFailure::TransactionNotPending {
            transaction_id: "t".into(),
        })
        .into();
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: RedemptionError = DbError::TransactionFailed("disk I/O".into()).into();
        assert_eq!(err.kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_response_shape() {
        let response = RedemptionError::InsufficientBalance {
            current: 1,
            requested: 2,
        }
        .to_response();
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["code"], "INSUFFICIENT_BALANCE");
        assert_eq!(value["details"]["current_balance"], 1);
        assert_eq!(value["retryable"], false);

        let value = serde_json::to_value(RedemptionError::AlreadyUsed.to_response()).unwrap();
        assert!(value.get("details").is_none());
    }
}
