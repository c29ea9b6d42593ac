//! # Approval Processor
//!
//! The employee's side of a pending transaction.
//!
//! ## State Machine
//! ```text
//!                  resolve(approved = true)
//!              ┌──────────────────────────────► completed
//!   pending ───┤                                  (terminal)
//!              └──────────────────────────────► rejected
//!                  resolve(approved = false)      (terminal)
//!
//!   resolve() on a terminal transaction ──► Conflict
//! ```
//!
//! Approval goes through [`mealticket_db::CouponLedger::commit_redemption`],
//! the only path that debits a balance or consumes a QR code. Rejection
//! touches neither.

use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use mealticket_core::validation::{ensure_balance_covers, validate_identifier, validate_note};
use mealticket_core::{
    CouponTransaction, Employee, Money, TransactionStatus, DEFAULT_REJECTION_REASON,
};
use mealticket_db::{Database, RedemptionCommit};

use crate::config::RedemptionConfig;
use crate::deadline::Deadline;
use crate::error::{ForbiddenReason, RedemptionError, RedemptionResult};

/// How a transaction was resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolutionOutcome {
    Completed {
        coupons_deducted: i64,
        amount: Money,
        previous_balance: i64,
        new_balance: i64,
    },
    Rejected {
        reason: String,
    },
}

/// Result of [`ApprovalProcessor::resolve`].
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedTransaction {
    pub transaction: CouponTransaction,
    pub supplier_name: String,
    pub supplier_address: String,
    pub outcome: ResolutionOutcome,
}

/// Approves or rejects pending transactions on the employee's behalf.
#[derive(Debug, Clone)]
pub struct ApprovalProcessor {
    db: Database,
    deadline: Deadline,
}

impl ApprovalProcessor {
    pub fn new(db: Database, config: &RedemptionConfig) -> Self {
        ApprovalProcessor {
            db,
            deadline: Deadline::new(config.store_timeout()),
        }
    }

    /// Resolves `transaction_id` as the employee identified by
    /// `employee_user_id`.
    ///
    /// ## Errors
    /// * `NotFound` - Unknown transaction
    /// * `Forbidden` - The caller does not own the transaction
    /// * `Conflict` - Already completed or rejected, including by a racing call
    /// * `InsufficientBalance` - Approval only; the transaction stays pending
    /// * `InvalidArgument` - Rejection reason too long
    /// * `Timeout` / `Internal` - Nothing was written
    pub async fn resolve(
        &self,
        transaction_id: &str,
        employee_user_id: &str,
        approved: bool,
        reason: Option<&str>,
    ) -> RedemptionResult<ResolvedTransaction> {
        validate_identifier("transaction_id", transaction_id)?;

        let txn = self
            .deadline
            .run("load_transaction", self.db.transactions().get_by_id(transaction_id))
            .await?
            .ok_or_else(|| RedemptionError::not_found("CouponTransaction", transaction_id))?;

        let employee = self.owner(&txn, employee_user_id).await?;

        let next = if approved {
            TransactionStatus::Completed
        } else {
            TransactionStatus::Rejected
        };
        txn.status.transition_to(next).inspect_err(|_| {
            warn!(
                transaction_id = %txn.transaction_id,
                status = %txn.status,
                "Resolve attempted on a resolved transaction"
            )
        })?;

        let supplier = self
            .deadline
            .run("load_supplier", self.db.suppliers().get_by_id(&txn.supplier_id))
            .await?
            .ok_or_else(|| RedemptionError::not_found("Supplier", &txn.supplier_id))?;

        let (transaction, outcome) = if approved {
            self.approve(txn, &employee).await?
        } else {
            self.reject(txn, reason).await?
        };

        Ok(ResolvedTransaction {
            transaction,
            supplier_name: supplier.business_name,
            supplier_address: supplier.address,
            outcome,
        })
    }

    /// Pending transactions for the employee behind `employee_user_id`,
    /// oldest first.
    pub async fn pending_for(&self, employee_user_id: &str) -> RedemptionResult<Vec<CouponTransaction>> {
        let employee = self
            .deadline
            .run("load_employee", self.db.employees().get_by_user_id(employee_user_id))
            .await?
            .ok_or_else(|| RedemptionError::not_found("Employee", employee_user_id))?;

        self.deadline
            .run(
                "list_pending_transactions",
                self.db.transactions().pending_for_employee(&employee.employee_id),
            )
            .await
    }

    async fn owner(&self, txn: &CouponTransaction, employee_user_id: &str) -> RedemptionResult<Employee> {
        let employee = self
            .deadline
            .run("load_employee", self.db.employees().get_by_user_id(employee_user_id))
            .await?;

        match employee {
            Some(employee) if employee.employee_id == txn.employee_id => Ok(employee),
            _ => {
                warn!(
                    transaction_id = %txn.transaction_id,
                    user_id = %employee_user_id,
                    "Resolve attempted by a non-owner"
                );
                Err(RedemptionError::Forbidden(ForbiddenReason::OwnershipMismatch))
            }
        }
    }

    async fn approve(
        &self,
        txn: CouponTransaction,
        employee: &Employee,
    ) -> RedemptionResult<(CouponTransaction, ResolutionOutcome)> {
        // The balance may have moved since initiation.
        ensure_balance_covers(employee, txn.coupons_used).inspect_err(|e| {
            warn!(transaction_id = %txn.transaction_id, error = %e, "Approval refused; transaction stays pending")
        })?;

        let commit = RedemptionCommit::for_transaction(&txn, Utc::now());
        let receipt = self
            .deadline
            .run("commit_redemption", self.db.ledger().commit_redemption(&commit))
            .await?;

        // Committed; report from the receipt rather than re-reading the row.
        let transaction = CouponTransaction {
            status: TransactionStatus::Completed,
            updated_at: receipt.committed_at,
            resolved_at: Some(receipt.committed_at),
            ..txn
        };

        info!(
            transaction_id = %transaction.transaction_id,
            employee_id = %transaction.employee_id,
            coupons = receipt.coupons_debited,
            new_balance = receipt.new_balance,
            "Transaction approved"
        );

        let outcome = ResolutionOutcome::Completed {
            coupons_deducted: receipt.coupons_debited,
            amount: transaction.total_amount(),
            previous_balance: receipt.previous_balance,
            new_balance: receipt.new_balance,
        };
        Ok((transaction, outcome))
    }

    async fn reject(
        &self,
        txn: CouponTransaction,
        reason: Option<&str>,
    ) -> RedemptionResult<(CouponTransaction, ResolutionOutcome)> {
        let reason = validate_note("reason", reason)?
            .unwrap_or_else(|| DEFAULT_REJECTION_REASON.to_string());

        let transaction = self
            .deadline
            .run(
                "reject_transaction",
                self.db.transactions().reject(&txn.transaction_id, &reason, Utc::now()),
            )
            .await?;

        info!(
            transaction_id = %transaction.transaction_id,
            employee_id = %transaction.employee_id,
            reason = %reason,
            "Transaction rejected"
        );

        Ok((transaction, ResolutionOutcome::Rejected { reason }))
    }
}
