//! # Repository Module
//!
//! Database repository implementations for Mealticket.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  mealticket-engine                                                     │
//! │       │                                                                 │
//! │       │  db.qr_codes().get_by_code(token)                              │
//! │       ▼                                                                 │
//! │  QrCodeRepository                                                      │
//! │  ├── get_by_code(&self, code)                                          │
//! │  ├── get_by_id(&self, id)                                              │
//! │  └── insert(&self, qr)                                                 │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Writes that belong to an approval (balance debit, QR consumption,     │
//! │  transaction completion) are crate-private and only run inside         │
//! │  CouponLedger::commit_redemption.                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`EmployeeRepository`](employee::EmployeeRepository) - Employee lookups
//! - [`SupplierRepository`](supplier::SupplierRepository) - Supplier lookups
//! - [`QrCodeRepository`](qr_code::QrCodeRepository) - QR code issue and lookup
//! - [`TransactionRepository`](transaction::TransactionRepository) - Pending
//!   transactions, rejection, history

pub mod employee;
pub mod qr_code;
pub mod supplier;
pub mod transaction;

/// Generates a new random identifier.
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
