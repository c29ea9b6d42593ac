//! # Coupon Transaction Repository
//!
//! Supplier-initiated charges and their resolution.
//!
//! ## Status Writes
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  insert            ──► pending                                          │
//! │  reject            ──► rejected   (guarded: WHERE status = 'pending')   │
//! │  mark_completed    ──► completed  (guarded, approval unit only)         │
//! │                                                                         │
//! │  A guard that matches zero rows means another resolver got there       │
//! │  first; nothing is overwritten.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult, GuardFailure};
use mealticket_core::CouponTransaction;

const TRANSACTION_COLUMNS: &str = r#"
    transaction_id,
    employee_id,
    supplier_id,
    qr_code_id,
    coupons_used,
    unit_value_cents,
    total_amount_cents,
    employee_latitude,
    employee_longitude,
    status,
    notes,
    created_at,
    updated_at,
    resolved_at
"#;

/// Repository for coupon transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Records a new pending transaction.
    ///
    /// Does not touch the QR code or the employee balance.
    pub async fn insert(&self, txn: &CouponTransaction) -> DbResult<CouponTransaction> {
        debug!(
            transaction_id = %txn.transaction_id,
            employee_id = %txn.employee_id,
            supplier_id = %txn.supplier_id,
            coupons = txn.coupons_used,
            "Inserting coupon transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO coupon_transactions (
                transaction_id, employee_id, supplier_id, qr_code_id,
                coupons_used, unit_value_cents, total_amount_cents,
                employee_latitude, employee_longitude,
                status, notes, created_at, updated_at, resolved_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            "#,
        )
        .bind(&txn.transaction_id)
        .bind(&txn.employee_id)
        .bind(&txn.supplier_id)
        .bind(&txn.qr_code_id)
        .bind(txn.coupons_used)
        .bind(txn.unit_value_cents)
        .bind(txn.total_amount_cents)
        .bind(txn.employee_latitude)
        .bind(txn.employee_longitude)
        .bind(txn.status)
        .bind(&txn.notes)
        .bind(txn.created_at)
        .bind(txn.updated_at)
        .bind(txn.resolved_at)
        .execute(&self.pool)
        .await?;

        Ok(txn.clone())
    }

    /// Gets a transaction by ID.
    pub async fn get_by_id(&self, transaction_id: &str) -> DbResult<Option<CouponTransaction>> {
        let sql = format!(
            "SELECT {TRANSACTION_COLUMNS} FROM coupon_transactions WHERE transaction_id = ?1"
        );

        let txn = sqlx::query_as::<_, CouponTransaction>(&sql)
            .bind(transaction_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(txn)
    }

    /// Pending transactions awaiting an employee's decision, oldest first.
    ///
    /// A pending charge whose QR code another approval already consumed can
    /// never complete, so it is left out.
    pub async fn pending_for_employee(&self, employee_id: &str) -> DbResult<Vec<CouponTransaction>> {
        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM coupon_transactions
            WHERE employee_id = ?1 AND status = 'pending'
              AND qr_code_id IN (SELECT qr_code_id FROM qr_codes WHERE is_used = 0)
            ORDER BY created_at ASC
            "#
        );

        let txns = sqlx::query_as::<_, CouponTransaction>(&sql)
            .bind(employee_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(txns)
    }

    /// An employee's transactions, newest first.
    pub async fn list_for_employee(
        &self,
        employee_id: &str,
        limit: u32,
    ) -> DbResult<Vec<CouponTransaction>> {
        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM coupon_transactions
            WHERE employee_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#
        );

        let txns = sqlx::query_as::<_, CouponTransaction>(&sql)
            .bind(employee_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(txns)
    }

    /// A supplier's transactions, newest first.
    pub async fn list_for_supplier(
        &self,
        supplier_id: &str,
        limit: u32,
    ) -> DbResult<Vec<CouponTransaction>> {
        let sql = format!(
            r#"
            SELECT {TRANSACTION_COLUMNS} FROM coupon_transactions
            WHERE supplier_id = ?1
            ORDER BY created_at DESC
            LIMIT ?2
            "#
        );

        let txns = sqlx::query_as::<_, CouponTransaction>(&sql)
            .bind(supplier_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(txns)
    }

    /// Rejects a pending transaction, recording `reason` in `notes`.
    ///
    /// ## Returns
    /// * `Ok(CouponTransaction)` - The rejected row
    /// * `Err(DbError::GuardFailed(TransactionNotPending))` - Already resolved
    pub async fn reject(
        &self,
        transaction_id: &str,
        reason: &str,
        at: DateTime<Utc>,
    ) -> DbResult<CouponTransaction> {
        debug!(transaction_id = %transaction_id, "Rejecting coupon transaction");

        let result = sqlx::query(
            r#"
            UPDATE coupon_transactions
            SET status = 'rejected', notes = ?2, updated_at = ?3, resolved_at = ?3
            WHERE transaction_id = ?1 AND status = 'pending'
            "#,
        )
        .bind(transaction_id)
        .bind(reason)
        .bind(at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::GuardFailed(GuardFailure::TransactionNotPending {
                transaction_id: transaction_id.to_string(),
            }));
        }

        self.get_by_id(transaction_id)
            .await?
            .ok_or_else(|| DbError::not_found("CouponTransaction", transaction_id))
    }
}

/// Completes a pending transaction inside an open transaction.
///
/// ## Returns
/// `false` when the transaction was no longer pending.
pub(crate) async fn mark_completed(
    conn: &mut SqliteConnection,
    transaction_id: &str,
    at: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE coupon_transactions
        SET status = 'completed', updated_at = ?2, resolved_at = ?2
        WHERE transaction_id = ?1 AND status = 'pending'
        "#,
    )
    .bind(transaction_id)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
