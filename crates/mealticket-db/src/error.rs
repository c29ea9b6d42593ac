//! # Store Errors
//!
//! What can go wrong below the redemption services.
//!
//! ```text
//!   sqlx::Error ──► DbError ──► RedemptionError (mealticket-engine)
//!                      ▲
//!                      └── GuardFailed: one of the three conditional
//!                          writes of an approval matched no row, and
//!                          the approval rolled back
//! ```
//!
//! The engine only branches on `NotFound` and `GuardFailed`; every other
//! variant surfaces as an internal error and is kept apart here for logs.

use thiserror::Error;

/// Which conditional write inside the approval unit matched no row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardFailure {
    /// `current_balance >= coupons` did not hold at write time.
    BalanceTooLow {
        employee_id: String,
        available: i64,
        requested: i64,
    },
    /// The QR code was already consumed by another approval.
    QrCodeConsumed { qr_code_id: String },
    /// The transaction was resolved by someone else first.
    TransactionNotPending { transaction_id: String },
}

impl std::fmt::Display for GuardFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GuardFailure::BalanceTooLow {
                employee_id,
                available,
                requested,
            } => write!(
                f,
                "employee {employee_id} holds {available} coupons, {requested} requested"
            ),
            GuardFailure::QrCodeConsumed { qr_code_id } => {
                write!(f, "QR code {qr_code_id} is already used")
            }
            GuardFailure::TransactionNotPending { transaction_id } => {
                write!(f, "transaction {transaction_id} is no longer pending")
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    /// A lookup that must hit (ledger debit target, resolved transaction)
    /// found nothing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Duplicate employee code, user id or QR token.
    #[error("Duplicate {field}")]
    UniqueViolation { field: String },

    /// A QR code or transaction pointing at a missing employee or supplier.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A schema CHECK fired, or the ledger refused a non-positive debit.
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// A guarded write inside the approval unit did not apply.
    #[error("Guard failed: {0}")]
    GuardFailed(GuardFailure),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// `BEGIN` or `COMMIT` of a multi-statement unit failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No connection freed up within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Sorts a SQLite error message by the constraint it names.
    fn from_sqlite_message(msg: &str) -> Self {
        if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
            DbError::UniqueViolation {
                field: field.to_string(),
            }
        } else if msg.contains("FOREIGN KEY constraint failed") {
            DbError::ForeignKeyViolation {
                message: msg.to_string(),
            }
        } else if msg.contains("CHECK constraint failed") {
            DbError::CheckViolation {
                message: msg.to_string(),
            }
        } else {
            DbError::QueryFailed(msg.to_string())
        }
    }
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),
            sqlx::Error::Database(db_err) => DbError::from_sqlite_message(db_err.message()),
            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;
