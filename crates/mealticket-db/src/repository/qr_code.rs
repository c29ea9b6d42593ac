//! # QR Code Repository
//!
//! Issued redemption tokens.
//!
//! ## Lifecycle
//! ```text
//! insert (is_used = 0) ──► [approval unit] mark_used (is_used = 1, used_at)
//!                                   │
//!                                   └─ guarded: WHERE is_used = 0
//! ```
//!
//! A code is never un-used; there is no update path back to `is_used = 0`.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use mealticket_core::QrCode;

const QR_COLUMNS: &str = "qr_code_id, code, employee_id, expires_at, is_used, used_at, created_at";

/// Repository for QR code database operations.
#[derive(Debug, Clone)]
pub struct QrCodeRepository {
    pool: SqlitePool,
}

impl QrCodeRepository {
    /// Creates a new QrCodeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        QrCodeRepository { pool }
    }

    /// Persists a freshly issued code.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Token collision
    /// * `Err(DbError::ForeignKeyViolation)` - Unknown employee
    pub async fn insert(&self, qr: &QrCode) -> DbResult<QrCode> {
        debug!(qr_code_id = %qr.qr_code_id, employee_id = %qr.employee_id, "Inserting QR code");

        sqlx::query(
            r#"
            INSERT INTO qr_codes (
                qr_code_id, code, employee_id, expires_at, is_used, used_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&qr.qr_code_id)
        .bind(&qr.code)
        .bind(&qr.employee_id)
        .bind(qr.expires_at)
        .bind(qr.is_used)
        .bind(qr.used_at)
        .bind(qr.created_at)
        .execute(&self.pool)
        .await?;

        Ok(qr.clone())
    }

    /// Looks a code up by its opaque token.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<QrCode>> {
        let sql = format!("SELECT {QR_COLUMNS} FROM qr_codes WHERE code = ?1");

        let qr = sqlx::query_as::<_, QrCode>(&sql)
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(qr)
    }

    /// Looks a code up by its row identifier.
    pub async fn get_by_id(&self, qr_code_id: &str) -> DbResult<Option<QrCode>> {
        let sql = format!("SELECT {QR_COLUMNS} FROM qr_codes WHERE qr_code_id = ?1");

        let qr = sqlx::query_as::<_, QrCode>(&sql)
            .bind(qr_code_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(qr)
    }
}

/// Consumes a code inside an open transaction.
///
/// ## Returns
/// `false` when the code was already used (the guard matched no row).
pub(crate) async fn mark_used(
    conn: &mut SqliteConnection,
    qr_code_id: &str,
    at: DateTime<Utc>,
) -> DbResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE qr_codes
        SET is_used = 1, used_at = ?2
        WHERE qr_code_id = ?1 AND is_used = 0
        "#,
    )
    .bind(qr_code_id)
    .bind(at)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected() == 1)
}
