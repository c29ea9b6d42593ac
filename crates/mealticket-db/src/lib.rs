//! # mealticket-db: Database Layer for Mealticket
//!
//! Persistence for employees, suppliers, QR codes and coupon transactions,
//! backed by SQLite through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Mealticket Data Flow                               │
//! │                                                                         │
//! │  mealticket-engine (issue / initiate / resolve)                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   mealticket-db (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │   │ CouponLedger │  │   │
//! │  │   │   (pool.rs)   │◄───│  employees     │   │  balance()   │  │   │
//! │  │   │  SqlitePool   │    │  suppliers     │   │  commit_     │  │   │
//! │  │   │               │    │  qr_codes      │   │  redemption()│  │   │
//! │  │   │               │    │  transactions  │   │  (atomic)    │  │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL)                                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Read paths and non-ledger writes
//! - [`ledger`] - Balance reads and the approval atomic unit
//!
//! ## Usage
//!
//! ```rust,ignore
//! use mealticket_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("mealticket.db")).await?;
//! let employee = db.employees().get_by_id("emp-1").await?;
//! let balance = db.ledger().balance("emp-1").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod repository;

#[cfg(test)]
mod fixtures;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult, GuardFailure};
pub use ledger::{BalanceSnapshot, CouponLedger, RedemptionCommit, RedemptionReceipt};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::employee::EmployeeRepository;
pub use repository::qr_code::QrCodeRepository;
pub use repository::supplier::SupplierRepository;
pub use repository::transaction::TransactionRepository;
