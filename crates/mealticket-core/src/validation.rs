//! # Validation Module
//!
//! Redemption preconditions as pure checks.
//!
//! ## Initiation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Merchant terminal: charge N coupons against a scanned QR code          │
//! │                                                                         │
//! │  1. ensure_supplier_can_accept     inactive / unverified ─► Forbidden   │
//! │  2. ensure_qr_redeemable           used ─► AlreadyUsed                  │
//! │                                    expired ─► Expired                   │
//! │  3. (employee lookup)              missing ─► NotFound                  │
//! │  4. ensure_employee_can_redeem     suspended / terminated ─► Forbidden  │
//! │  5. ensure_within_radius           too far ─► Forbidden (+distance)     │
//! │  6. validate_coupon_quantity       N ∉ [1,3] ─► InvalidArgument         │
//! │  7. ensure_balance_covers          balance < N ─► InsufficientBalance   │
//! │                                                                         │
//! │  Fail fast: the first violated rule is the one reported.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is deterministic; the caller supplies `now`.

use chrono::{DateTime, Utc};

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::geo::GeoPoint;
use crate::types::{Employee, QrCode, Supplier};
use crate::{MAX_COUPONS_PER_TRANSACTION, MIN_COUPONS_PER_TRANSACTION};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

/// Longest free-text note or rejection reason accepted.
pub const MAX_NOTE_LENGTH: usize = 500;

// =============================================================================
// Input Validators
// =============================================================================

/// Validates the number of coupons charged in one transaction.
///
/// ## Example
/// ```rust
/// use mealticket_core::validation::validate_coupon_quantity;
///
/// assert!(validate_coupon_quantity(1).is_ok());
/// assert!(validate_coupon_quantity(3).is_ok());
/// assert!(validate_coupon_quantity(0).is_err());
/// assert!(validate_coupon_quantity(4).is_err());
/// ```
pub fn validate_coupon_quantity(coupons: i64) -> ValidationResult<()> {
    if !(MIN_COUPONS_PER_TRANSACTION..=MAX_COUPONS_PER_TRANSACTION).contains(&coupons) {
        return Err(ValidationError::OutOfRange {
            field: "coupons_used".to_string(),
            min: MIN_COUPONS_PER_TRANSACTION,
            max: MAX_COUPONS_PER_TRANSACTION,
        });
    }

    Ok(())
}

/// Validates an optional supplier note or rejection reason.
///
/// ## Returns
/// The trimmed text, or `None` when blank.
pub fn validate_note(field: &str, note: Option<&str>) -> ValidationResult<Option<String>> {
    let Some(note) = note.map(str::trim).filter(|n| !n.is_empty()) else {
        return Ok(None);
    };

    if note.chars().count() > MAX_NOTE_LENGTH {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: MAX_NOTE_LENGTH,
        });
    }

    Ok(Some(note.to_string()))
}

/// Validates a reported coordinate.
pub fn validate_location(point: &GeoPoint) -> ValidationResult<()> {
    if !point.is_valid() {
        return Err(ValidationError::InvalidFormat {
            field: "location".to_string(),
            reason: "latitude must be within ±90 and longitude within ±180".to_string(),
        });
    }

    Ok(())
}

/// Validates an opaque identifier or token (non-empty, bounded).
pub fn validate_identifier(field: &str, id: &str) -> ValidationResult<()> {
    let id = id.trim();

    if id.is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if id.len() > 128 {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max: 128,
        });
    }

    Ok(())
}

// =============================================================================
// Redemption Rules
// =============================================================================

/// The supplier must be both active and verified.
pub fn ensure_supplier_can_accept(supplier: &Supplier) -> CoreResult<()> {
    if !supplier.is_active {
        return Err(CoreError::SupplierInactive);
    }
    if !supplier.is_verified {
        return Err(CoreError::SupplierUnverified);
    }
    Ok(())
}

/// A consumed code is terminal regardless of its window; an unconsumed code
/// is rejected once `now` passes `expires_at`.
pub fn ensure_qr_redeemable(qr: &QrCode, now: DateTime<Utc>) -> CoreResult<()> {
    if qr.is_used {
        return Err(CoreError::QrCodeAlreadyUsed);
    }
    if qr.is_expired(now) {
        return Err(CoreError::QrCodeExpired {
            expired_at: qr.expires_at,
        });
    }
    Ok(())
}

/// Only active and on-leave employees may transact.
pub fn ensure_employee_can_redeem(employee: &Employee) -> CoreResult<()> {
    if !employee.status.may_redeem() {
        return Err(CoreError::EmployeeCannotRedeem {
            status: employee.status.to_string(),
        });
    }
    Ok(())
}

/// QR issuance additionally needs a non-zero balance.
pub fn ensure_employee_can_issue(employee: &Employee) -> CoreResult<()> {
    ensure_employee_can_redeem(employee)?;
    if employee.current_balance <= 0 {
        return Err(CoreError::NoCouponsAvailable);
    }
    Ok(())
}

/// Location check; `None` means the terminal did not report a position.
///
/// ## Returns
/// The measured distance in metres when a location was checked.
pub fn ensure_within_radius(
    supplier: &Supplier,
    employee_location: Option<&GeoPoint>,
) -> CoreResult<Option<f64>> {
    let Some(point) = employee_location else {
        return Ok(None);
    };
    validate_location(point)?;

    let radius = supplier.location_radius as f64;
    let distance = supplier.location().distance_to(point);

    if !crate::geo::within_radius(
        supplier.latitude,
        supplier.longitude,
        point.latitude,
        point.longitude,
        radius,
    ) {
        return Err(CoreError::OutsideRadius {
            distance_meters: distance.round() as i64,
            radius_meters: supplier.location_radius,
        });
    }

    Ok(Some(distance))
}

/// The employee's balance must cover the requested coupons.
pub fn ensure_balance_covers(employee: &Employee, coupons: i64) -> CoreResult<()> {
    if !employee.can_cover(coupons) {
        return Err(CoreError::InsufficientBalance {
            available: employee.current_balance,
            requested: coupons,
        });
    }
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
