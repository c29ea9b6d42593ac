//! # Coupon Ledger
//!
//! Employee balances and the approval atomic unit.
//!
//! ## Approval Unit
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  BEGIN                                                                  │
//! │    1. UPDATE employees SET current_balance = current_balance - N        │
//! │         WHERE employee_id = ? AND current_balance >= N                  │
//! │         0 rows ─► BalanceTooLow                                         │
//! │    2. UPDATE qr_codes SET is_used = 1                                   │
//! │         WHERE qr_code_id = ? AND is_used = 0                            │
//! │         0 rows ─► QrCodeConsumed                                        │
//! │    3. UPDATE coupon_transactions SET status = 'completed'               │
//! │         WHERE transaction_id = ? AND status = 'pending'                 │
//! │         0 rows ─► TransactionNotPending                                 │
//! │  COMMIT                                                                 │
//! │                                                                         │
//! │  Any early return drops the sqlx Transaction, which rolls back.        │
//! │  Observers see either all three writes or none.                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The first statement is a write, so the connection takes SQLite's write
//! lock before anything is read. Two approvals racing on the same QR code
//! serialize there; the loser's QR guard matches nothing.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};

use crate::error::{DbError, DbResult, GuardFailure};
use crate::repository::{qr_code, transaction};
use mealticket_core::{CouponTransaction, EmployeeStatus};

// =============================================================================
// Types
// =============================================================================

/// Read view of an employee's coupon position.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct BalanceSnapshot {
    pub employee_id: String,
    pub employee_code: String,
    pub name: String,
    pub status: EmployeeStatus,
    pub current_balance: i64,
    pub monthly_allocation: i64,
    pub last_allocation_date: Option<DateTime<Utc>>,
}

/// The writes an approval performs, taken from a pending transaction.
#[derive(Debug, Clone, Copy)]
pub struct RedemptionCommit<'a> {
    pub transaction_id: &'a str,
    pub employee_id: &'a str,
    pub qr_code_id: &'a str,
    pub coupons: i64,
    pub at: DateTime<Utc>,
}

impl<'a> RedemptionCommit<'a> {
    pub fn for_transaction(txn: &'a CouponTransaction, at: DateTime<Utc>) -> Self {
        RedemptionCommit {
            transaction_id: &txn.transaction_id,
            employee_id: &txn.employee_id,
            qr_code_id: &txn.qr_code_id,
            coupons: txn.coupons_used,
            at,
        }
    }
}

/// Outcome of a committed approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RedemptionReceipt {
    pub transaction_id: String,
    pub coupons_debited: i64,
    pub previous_balance: i64,
    pub new_balance: i64,
    pub committed_at: DateTime<Utc>,
}

// =============================================================================
// Ledger
// =============================================================================

/// Sole owner of `employees.current_balance`.
#[derive(Debug, Clone)]
pub struct CouponLedger {
    pool: SqlitePool,
}

impl CouponLedger {
    pub fn new(pool: SqlitePool) -> Self {
        CouponLedger { pool }
    }

    /// Current balance of an employee, `None` if the employee is unknown.
    pub async fn balance(&self, employee_id: &str) -> DbResult<Option<BalanceSnapshot>> {
        let snapshot = sqlx::query_as::<_, BalanceSnapshot>(
            r#"
            SELECT
                employee_id,
                employee_code,
                name,
                status,
                current_balance,
                monthly_allocation,
                last_allocation_date
            FROM employees
            WHERE employee_id = ?1
            "#,
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(snapshot)
    }

    /// Runs the approval atomic unit.
    ///
    /// ## Returns
    /// * `Ok(RedemptionReceipt)` - All three writes committed
    /// * `Err(DbError::GuardFailed(_))` - A guard missed; nothing was written
    /// * `Err(DbError::TransactionFailed(_))` - Begin or commit failed
    pub async fn commit_redemption(
        &self,
        commit: &RedemptionCommit<'_>,
    ) -> DbResult<RedemptionReceipt> {
        if commit.coupons <= 0 {
            return Err(DbError::CheckViolation {
                message: format!("cannot debit {} coupons", commit.coupons),
            });
        }

        debug!(
            transaction_id = %commit.transaction_id,
            employee_id = %commit.employee_id,
            coupons = commit.coupons,
            "Committing redemption"
        );

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let new_balance = debit(&mut tx, commit.employee_id, commit.coupons, commit.at).await?;

        if !qr_code::mark_used(&mut tx, commit.qr_code_id, commit.at).await? {
            warn!(qr_code_id = %commit.qr_code_id, "QR code consumed concurrently; rolling back");
            return Err(DbError::GuardFailed(GuardFailure::QrCodeConsumed {
                qr_code_id: commit.qr_code_id.to_string(),
            }));
        }

        if !transaction::mark_completed(&mut tx, commit.transaction_id, commit.at).await? {
            warn!(transaction_id = %commit.transaction_id, "Transaction resolved concurrently; rolling back");
            return Err(DbError::GuardFailed(GuardFailure::TransactionNotPending {
                transaction_id: commit.transaction_id.to_string(),
            }));
        }

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            transaction_id = %commit.transaction_id,
            employee_id = %commit.employee_id,
            new_balance,
            "Redemption committed"
        );

        Ok(RedemptionReceipt {
            transaction_id: commit.transaction_id.to_string(),
            coupons_debited: commit.coupons,
            previous_balance: new_balance + commit.coupons,
            new_balance,
            committed_at: commit.at,
        })
    }
}

/// Guarded balance decrement. Only reachable through the approval unit.
///
/// ## Returns
/// The balance after the debit.
async fn debit(
    conn: &mut SqliteConnection,
    employee_id: &str,
    coupons: i64,
    at: DateTime<Utc>,
) -> DbResult<i64> {
    let new_balance: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE employees
        SET current_balance = current_balance - ?2, updated_at = ?3
        WHERE employee_id = ?1 AND current_balance >= ?2
        RETURNING current_balance
        "#,
    )
    .bind(employee_id)
    .bind(coupons)
    .bind(at)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(balance) = new_balance {
        return Ok(balance);
    }

    let available: Option<i64> =
        sqlx::query_scalar("SELECT current_balance FROM employees WHERE employee_id = ?1")
            .bind(employee_id)
            .fetch_optional(&mut *conn)
            .await?;

    match available {
        Some(available) => Err(DbError::GuardFailed(GuardFailure::BalanceTooLow {
            employee_id: employee_id.to_string(),
            available,
            requested: coupons,
        })),
        None => Err(DbError::not_found("Employee", employee_id)),
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use crate::pool::{Database, DbConfig};
    use mealticket_core::TransactionStatus;

    async fn balance_of(db: &Database, employee_id: &str) -> i64 {
        db.ledger()
            .balance(employee_id)
            .await
            .unwrap()
            .unwrap()
            .current_balance
    }

    #[tokio::test]
    async fn test_balance_snapshot() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let employee = fixtures::employee(&db, "E1", 7).await;

        let snapshot = db.ledger().balance(&employee.employee_id).await.unwrap().unwrap();
        assert_eq!(snapshot.current_balance, 7);
        assert_eq!(snapshot.employee_code, "E1");
        assert_eq!(snapshot.status, EmployeeStatus::Active);

        assert!(db.ledger().balance("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_commit_applies_all_three_writes() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (employee, supplier, qr) = fixtures::scenario(&db, 10).await;
        let txn = fixtures::pending_transaction(&db, &employee, &supplier, &qr, 2).await;

        let receipt = db
            .ledger()
            .commit_redemption(&RedemptionCommit::for_transaction(&txn, Utc::now()))
            .await
            .unwrap();

        assert_eq!(receipt.previous_balance, 10);
        assert_eq!(receipt.new_balance, 8);
        assert_eq!(balance_of(&db, &employee.employee_id).await, 8);

        let qr = db.qr_codes().get_by_id(&qr.qr_code_id).await.unwrap().unwrap();
        assert!(qr.is_used);
        assert_eq!(qr.used_at, Some(receipt.committed_at));

        let txn = db.transactions().get_by_id(&txn.transaction_id).await.unwrap().unwrap();
        assert_eq!(txn.status, TransactionStatus::Completed);
        assert_eq!(txn.resolved_at, Some(receipt.committed_at));
    }

    #[tokio::test]
    async fn test_low_balance_writes_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (employee, supplier, qr) = fixtures::scenario(&db, 1).await;
        let txn = fixtures::pending_transaction(&db, &employee, &supplier, &qr, 2).await;

        let err = db
            .ledger()
            .commit_redemption(&RedemptionCommit::for_transaction(&txn, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::GuardFailed(GuardFailure::BalanceTooLow {
                available: 1,
                requested: 2,
                ..
            })
        ));

        assert_eq!(balance_of(&db, &employee.employee_id).await, 1);
        let qr = db.qr_codes().get_by_id(&qr.qr_code_id).await.unwrap().unwrap();
        assert!(!qr.is_used);
        let txn = db.transactions().get_by_id(&txn.transaction_id).await.unwrap().unwrap();
        assert_eq!(txn.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_consumed_qr_rolls_back_debit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (employee, supplier, qr) = fixtures::scenario(&db, 10).await;
        let first = fixtures::pending_transaction(&db, &employee, &supplier, &qr, 1).await;
        let second = fixtures::pending_transaction(&db, &employee, &supplier, &qr, 3).await;

        db.ledger()
            .commit_redemption(&RedemptionCommit::for_transaction(&first, Utc::now()))
            .await
            .unwrap();
        assert_eq!(balance_of(&db, &employee.employee_id).await, 9);

        // The debit of 3 succeeds inside the unit, then the QR guard misses.
        let err = db
            .ledger()
            .commit_redemption(&RedemptionCommit::for_transaction(&second, Utc::now()))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DbError::GuardFailed(GuardFailure::QrCodeConsumed { .. })
        ));

        assert_eq!(balance_of(&db, &employee.employee_id).await, 9);
        let second = db
            .transactions()
            .get_by_id(&second.transaction_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(second.status, TransactionStatus::Pending);
    }

    #[tokio::test]
    async fn test_dropped_unit_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let employee = fixtures::employee(&db, "E1", 5).await;

        {
            let mut tx = db.pool().begin().await.unwrap();
            let after = debit(&mut tx, &employee.employee_id, 2, Utc::now()).await.unwrap();
            assert_eq!(after, 3);
            // dropped without commit
        }

        assert_eq!(balance_of(&db, &employee.employee_id).await, 5);
    }

    #[tokio::test]
    async fn test_debit_unknown_employee() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut conn = db.pool().acquire().await.unwrap();

        let err = debit(&mut conn, "ghost", 1, Utc::now()).await.unwrap_err();
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_non_positive_debit_refused() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let (employee, supplier, qr) = fixtures::scenario(&db, 10).await;
        let txn = fixtures::transaction(&employee, &supplier, &qr, 1);
        let mut commit = RedemptionCommit::for_transaction(&txn, Utc::now());
        commit.coupons = 0;

        let err = db.ledger().commit_redemption(&commit).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
        assert_eq!(balance_of(&db, &employee.employee_id).await, 10);
    }
}
