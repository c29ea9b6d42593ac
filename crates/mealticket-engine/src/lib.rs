//! # mealticket-engine: Redemption Protocol for Mealticket
//!
//! Orchestrates the three-party meal-coupon flow on top of
//! [`mealticket_db`] and the rules in [`mealticket_core`].
//!
//! ## Protocol Overview
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Coupon Redemption Protocol                         │
//! │                                                                         │
//! │   Employee app            Supplier terminal          Employee app       │
//! │        │                         │                         │            │
//! │        ▼                         │                         │            │
//! │  ┌─────────────┐   COUPON-...    │                         │            │
//! │  │ QrCodeIssuer│ ───────────────►│                         │            │
//! │  │  issue()    │  (shown on      ▼                         │            │
//! │  └─────────────┘   screen) ┌──────────────────────┐        │            │
//! │                            │TransactionCoordinator│        │            │
//! │                            │  initiate()          │        │            │
//! │                            │  7 ordered checks    │        │            │
//! │                            └──────────┬───────────┘        │            │
//! │                                       │ pending            ▼            │
//! │                                       └──────────► ┌──────────────────┐ │
//! │                                                    │ApprovalProcessor │ │
//! │                                                    │  resolve()       │ │
//! │                                                    └────────┬─────────┘ │
//! │                                                             │           │
//! │                         approve: CouponLedger atomic unit ◄─┘           │
//! │                         (debit + consume QR + complete)                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//! - [`issuer`] - QR issuance and supplier-side inspection
//! - [`coordinator`] - Transaction initiation and history
//! - [`approval`] - Approve/reject and the employee's pending queue
//! - [`ledger`] - Read-only balance view
//! - [`config`] - `RedemptionConfig` (defaults, `mealticket.toml`, env)
//! - [`deadline`] - Store-call deadlines
//! - [`error`] - `RedemptionError` and client-facing codes
//!
//! ## Usage
//! ```rust,ignore
//! use mealticket_engine::{InitiateRequest, RedemptionConfig, RedemptionEngine};
//!
//! let engine = RedemptionEngine::open(RedemptionConfig::load()?).await?;
//!
//! let issued = engine.issuer().issue(&employee_id).await?;
//! let pending = engine
//!     .coordinator()
//!     .initiate(&InitiateRequest {
//!         supplier_id,
//!         qr_code: issued.payload,
//!         coupons: 2,
//!         employee_location: None,
//!         notes: None,
//!     })
//!     .await?;
//! let resolved = engine
//!     .approvals()
//!     .resolve(&pending.transaction.transaction_id, &user_id, true, None)
//!     .await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod approval;
pub mod config;
pub mod coordinator;
pub mod deadline;
pub mod error;
pub mod issuer;
pub mod ledger;

// =============================================================================
// Re-exports
// =============================================================================

pub use approval::{ApprovalProcessor, ResolutionOutcome, ResolvedTransaction};
pub use config::RedemptionConfig;
pub use coordinator::{InitiateRequest, InitiatedTransaction, TransactionCoordinator};
pub use deadline::Deadline;
pub use error::{ErrorKind, ErrorResponse, ForbiddenReason, RedemptionError, RedemptionResult};
pub use issuer::{IssuedQrCode, QrCodeIssuer, QrInspection};
pub use ledger::LedgerView;

use mealticket_db::{Database, DbConfig};
use tracing::info;

// =============================================================================
// Engine
// =============================================================================

/// Bundles the redemption services over one database and configuration.
#[derive(Debug, Clone)]
pub struct RedemptionEngine {
    db: Database,
    config: RedemptionConfig,
}

impl RedemptionEngine {
    pub fn new(db: Database, config: RedemptionConfig) -> Self {
        RedemptionEngine { db, config }
    }

    /// Opens (and migrates) the database at `config.database_path`.
    pub async fn open(config: RedemptionConfig) -> RedemptionResult<Self> {
        let db = Database::new(DbConfig::new(&config.database_path)).await?;
        info!(path = %config.database_path.display(), "Redemption engine ready");
        Ok(RedemptionEngine::new(db, config))
    }

    pub fn config(&self) -> &RedemptionConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub fn issuer(&self) -> QrCodeIssuer {
        QrCodeIssuer::new(self.db.clone(), self.config.clone())
    }

    pub fn coordinator(&self) -> TransactionCoordinator {
        TransactionCoordinator::new(self.db.clone(), self.config.clone())
    }

    pub fn approvals(&self) -> ApprovalProcessor {
        ApprovalProcessor::new(self.db.clone(), &self.config)
    }

    pub fn ledger(&self) -> LedgerView {
        LedgerView::new(self.db.clone(), &self.config)
    }
}
