//! # Domain Types
//!
//! Records and closed status enums of the redemption protocol.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Employee     │   │     QrCode      │   │ CouponTransaction│      │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  employee_id    │1─*│  code (token)   │1─1│  qr_code_id     │       │
//! │  │  status         │   │  expires_at     │   │  coupons_used   │       │
//! │  │  current_balance│   │  is_used        │   │  status         │       │
//! │  └─────────────────┘   └─────────────────┘   └────────┬────────┘       │
//! │                                                       │ *              │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌────────┴────────┐       │
//! │  │ EmployeeStatus  │   │TransactionStatus│   │    Supplier     │       │
//! │  │  Active         │   │  Pending        │   │  is_active      │       │
//! │  │  OnLeave        │   │  Completed ■    │   │  is_verified    │       │
//! │  │  Suspended      │   │  Rejected  ■    │   │  lat/lon/radius │       │
//! │  │  Terminated ■   │   └─────────────────┘   └─────────────────┘       │
//! │  └─────────────────┘                          ■ = terminal             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Statuses are closed enums. Transaction status changes go through
//! [`TransactionStatus::transition_to`]; a transition not in its table is an
//! error, never a silent string write.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, ValidationError};
use crate::geo::GeoPoint;
use crate::money::Money;

// =============================================================================
// Employee Status
// =============================================================================

/// Employment status gating coupon use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EmployeeStatus {
    Active,
    OnLeave,
    Suspended,
    Terminated,
}

impl EmployeeStatus {
    /// Only active and on-leave employees may issue QR codes or transact.
    #[inline]
    pub const fn may_redeem(&self) -> bool {
        matches!(self, EmployeeStatus::Active | EmployeeStatus::OnLeave)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            EmployeeStatus::Active => "active",
            EmployeeStatus::OnLeave => "on_leave",
            EmployeeStatus::Suspended => "suspended",
            EmployeeStatus::Terminated => "terminated",
        }
    }
}

impl Default for EmployeeStatus {
    fn default() -> Self {
        EmployeeStatus::Active
    }
}

impl fmt::Display for EmployeeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EmployeeStatus {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(EmployeeStatus::Active),
            "on_leave" => Ok(EmployeeStatus::OnLeave),
            "suspended" => Ok(EmployeeStatus::Suspended),
            "terminated" => Ok(EmployeeStatus::Terminated),
            other => Err(ValidationError::InvalidFormat {
                field: "status".to_string(),
                reason: format!(
                    "'{other}' is not one of active, on_leave, suspended, terminated"
                ),
            }),
        }
    }
}

// =============================================================================
// Transaction Status
// =============================================================================

/// Lifecycle of a coupon transaction.
///
/// ```text
///            ┌──────────► completed ■
/// pending ───┤
///            └──────────► rejected  ■
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Created by the supplier, awaiting employee confirmation.
    Pending,
    /// Approved; balance debited and QR code consumed.
    Completed,
    /// Declined by the employee; nothing debited.
    Rejected,
}

impl TransactionStatus {
    #[inline]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self, TransactionStatus::Pending)
    }

    pub const fn can_transition_to(&self, next: TransactionStatus) -> bool {
        matches!(
            (self, next),
            (TransactionStatus::Pending, TransactionStatus::Completed)
                | (TransactionStatus::Pending, TransactionStatus::Rejected)
        )
    }

    pub fn transition_to(self, next: TransactionStatus) -> Result<TransactionStatus, CoreError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(CoreError::InvalidStatusTransition {
                entity: "Transaction",
                from: self.to_string(),
                to: next.to_string(),
            })
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "pending",
            TransactionStatus::Completed => "completed",
            TransactionStatus::Rejected => "rejected",
        }
    }
}

impl Default for TransactionStatus {
    fn default() -> Self {
        TransactionStatus::Pending
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Employee
// =============================================================================

/// An employee holding a coupon balance.
///
/// `current_balance` is owned by the coupon ledger; nothing outside the
/// approval unit writes it.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Employee {
    pub employee_id: String,
    /// Identity-provider user this profile belongs to.
    pub user_id: String,
    /// Short public code printed into the QR payload.
    pub employee_code: String,
    pub name: String,
    pub email: String,
    pub status: EmployeeStatus,
    pub monthly_allocation: i64,
    pub current_balance: i64,
    #[ts(as = "Option<String>")]
    pub last_allocation_date: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Employee {
    /// Checks whether `coupons` can be covered by the current balance.
    #[inline]
    pub fn can_cover(&self, coupons: i64) -> bool {
        self.current_balance >= coupons
    }
}

// =============================================================================
// Supplier
// =============================================================================

/// A merchant accepting coupons at a fixed location.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Supplier {
    pub supplier_id: String,
    pub user_id: String,
    pub business_name: String,
    pub address: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Allowed distance between the employee and the shop, in metres.
    pub location_radius: i64,
    pub is_active: bool,
    pub is_verified: bool,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Supplier {
    #[inline]
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

// =============================================================================
// QR Code
// =============================================================================

/// A single-use, time-boxed redemption token.
///
/// Once `is_used` is set it never clears.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct QrCode {
    pub qr_code_id: String,
    /// Opaque token (UUID v4) carried in the payload.
    pub code: String,
    pub employee_id: String,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
    pub is_used: bool,
    #[ts(as = "Option<String>")]
    pub used_at: Option<DateTime<Utc>>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl QrCode {
    /// A code is expired strictly after `expires_at`.
    #[inline]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Whole minutes left before expiry, zero once elapsed.
    pub fn minutes_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.expires_at - now).num_minutes().max(0)
    }
}

/// The text encoded into the QR image: `COUPON-<employeeCode>-<token>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrPayload {
    pub employee_code: String,
    pub token: String,
}

impl QrPayload {
    pub const PREFIX: &'static str = "COUPON-";

    pub fn new(employee_code: impl Into<String>, token: impl Into<String>) -> Self {
        QrPayload {
            employee_code: employee_code.into(),
            token: token.into(),
        }
    }

    /// Parses a scanned payload. Employee codes may contain hyphens, so the
    /// token is taken as the trailing UUID.
    ///
    /// ## Example
    /// ```rust
    /// use mealticket_core::QrPayload;
    ///
    /// let p = QrPayload::parse("COUPON-EMP-007-550e8400-e29b-41d4-a716-446655440000").unwrap();
    /// assert_eq!(p.employee_code, "EMP-007");
    /// assert_eq!(p.token, "550e8400-e29b-41d4-a716-446655440000");
    /// ```
    pub fn parse(scanned: &str) -> Result<Self, ValidationError> {
        const TOKEN_LEN: usize = 36;
        let invalid = |reason: &str| ValidationError::InvalidFormat {
            field: "qr_code".to_string(),
            reason: reason.to_string(),
        };

        let rest = scanned
            .trim()
            .strip_prefix(Self::PREFIX)
            .ok_or_else(|| invalid("missing COUPON- prefix"))?;

        if rest.len() < TOKEN_LEN + 2 || !rest.is_char_boundary(rest.len() - TOKEN_LEN) {
            return Err(invalid("payload too short"));
        }

        let (head, token) = rest.split_at(rest.len() - TOKEN_LEN);
        let employee_code = head
            .strip_suffix('-')
            .filter(|c| !c.is_empty())
            .ok_or_else(|| invalid("missing employee code"))?;

        uuid::Uuid::parse_str(token).map_err(|_| invalid("token is not a UUID"))?;

        Ok(QrPayload::new(employee_code, token))
    }
}

impl fmt::Display for QrPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}-{}", Self::PREFIX, self.employee_code, self.token)
    }
}

// =============================================================================
// Coupon Transaction
// =============================================================================

/// A supplier-initiated charge against an employee's coupons.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CouponTransaction {
    pub transaction_id: String,
    pub employee_id: String,
    pub supplier_id: String,
    pub qr_code_id: String,
    /// 1..=3
    pub coupons_used: i64,
    /// Coupon face value at initiation time (frozen).
    pub unit_value_cents: i64,
    /// coupons_used × unit_value_cents
    pub total_amount_cents: i64,
    pub employee_latitude: Option<f64>,
    pub employee_longitude: Option<f64>,
    pub status: TransactionStatus,
    /// Supplier notes at initiation, replaced by the reason on rejection.
    pub notes: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
    #[ts(as = "Option<String>")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl CouponTransaction {
    #[inline]
    pub fn total_amount(&self) -> Money {
        Money::from_cents(self.total_amount_cents)
    }

    #[inline]
    pub fn unit_value(&self) -> Money {
        Money::from_cents(self.unit_value_cents)
    }

    /// Where the employee stood when the supplier initiated, if reported.
    pub fn employee_location(&self) -> Option<GeoPoint> {
        match (self.employee_latitude, self.employee_longitude) {
            (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
            _ => None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
