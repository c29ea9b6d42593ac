//! # mealticket-core: Pure Domain Logic for Meal-Coupon Redemption
//!
//! This crate holds the rules of the coupon-redemption protocol as pure
//! functions and closed types, with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Mealticket Architecture                            │
//! │                                                                         │
//! │  Employee app ── issue QR ──► token shown on screen                    │
//! │  Merchant terminal ── scan ──► initiate ──► pending transaction        │
//! │  Employee app ── confirm ──► resolve ──► completed / rejected          │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  mealticket-engine (services)                   │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              ★ mealticket-core (THIS CRATE) ★                   │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │    geo    │  │ validation│  │   │
//! │  │   │ Employee  │  │   Money   │  │ GeoPoint  │  │  coupons  │  │   │
//! │  │   │ QrCode    │  │  (cents)  │  │ haversine │  │  radius   │  │   │
//! │  │   │ Status    │  │           │  │           │  │  balance  │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                mealticket-db (Database Layer)                   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain records and their closed status enums
//! - [`money`] - Integer-cent money type
//! - [`geo`] - Distance evaluator
//! - [`error`] - Domain error types
//! - [`validation`] - Redemption rule checks
//!
//! ## Example Usage
//!
//! ```rust
//! use mealticket_core::money::Money;
//! use mealticket_core::DEFAULT_COUPON_VALUE_CENTS;
//!
//! let unit = Money::from_cents(DEFAULT_COUPON_VALUE_CENTS);
//! assert_eq!(unit.multiply_quantity(2).to_string(), "90.00");
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod geo;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, ValidationError};
pub use geo::GeoPoint;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Fewest coupons a single transaction may charge.
pub const MIN_COUPONS_PER_TRANSACTION: i64 = 1;

/// Most coupons a single transaction may charge.
///
/// ## Business Reason
/// One meal is worth at most three coupons; larger charges are treated as
/// operator error at the merchant terminal.
pub const MAX_COUPONS_PER_TRANSACTION: i64 = 3;

/// Face value of one coupon in cents (45.00).
pub const DEFAULT_COUPON_VALUE_CENTS: i64 = 4_500;

/// Minutes a freshly issued QR code stays redeemable.
pub const DEFAULT_QR_EXPIRY_MINUTES: i64 = 15;

/// Coupons credited to a new employee each month.
pub const DEFAULT_MONTHLY_ALLOCATION: i64 = 26;

/// Radius applied to suppliers onboarded without an explicit one.
pub const DEFAULT_LOCATION_RADIUS_METERS: i64 = 500;

/// Reason stored when an employee rejects without giving one.
pub const DEFAULT_REJECTION_REASON: &str = "Rejected by employee";
