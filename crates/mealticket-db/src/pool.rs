//! # Store Handle
//!
//! Opens the SQLite file, applies the embedded schema and hands out the
//! repositories and the [`CouponLedger`] over one shared pool.
//!
//! ```text
//!   DbConfig::new(path) / DbConfig::in_memory()
//!        │
//!        ▼
//!   Database::new ── WAL, foreign keys, migrations
//!        │
//!        ├── employees()     EmployeeRepository
//!        ├── suppliers()     SupplierRepository
//!        ├── qr_codes()      QrCodeRepository
//!        ├── transactions()  TransactionRepository
//!        └── ledger()        CouponLedger (balance writes, approval unit)
//! ```
//!
//! WAL lets readers run beside the single writer. The approval unit relies
//! on SQLite admitting one writer at a time.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::ledger::CouponLedger;
use crate::migrations;
use crate::repository::employee::EmployeeRepository;
use crate::repository::qr_code::QrCodeRepository;
use crate::repository::supplier::SupplierRepository;
use crate::repository::transaction::TransactionRepository;

/// Where the store lives and how many connections it may hold.
#[derive(Debug, Clone)]
pub struct DbConfig {
    /// SQLite file, created on first open. `:memory:` for a throwaway store.
    pub database_path: PathBuf,

    pub max_connections: u32,

    /// How long a caller waits for a free connection before `PoolExhausted`.
    pub acquire_timeout: Duration,

    /// Idle connections are closed after this long. `None` keeps them.
    pub idle_timeout: Option<Duration>,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            database_path: path.into(),
            max_connections: 5,
            acquire_timeout: Duration::from_secs(30),
            idle_timeout: Some(Duration::from_secs(600)),
        }
    }

    /// A private in-memory store for tests.
    ///
    /// Every SQLite connection to `:memory:` opens its own database, so the
    /// pool is pinned to one connection that never idles out.
    pub fn in_memory() -> Self {
        DbConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: None,
        }
    }
}

/// Shared store handle. Clones share the pool.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Opens the pool and brings the schema up to date.
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(path = %config.database_path.display(), "Opening mealticket store");

        let connect_url = format!("sqlite://{}?mode=rwc", config.database_path.display());
        let connect_options = SqliteConnectOptions::from_str(&connect_url)
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Off by default in SQLite; QR codes and transactions reference
            // employees and suppliers.
            .foreign_keys(true)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(1)
            .acquire_timeout(config.acquire_timeout)
            .idle_timeout(config.idle_timeout)
            .connect_with(connect_options)
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;

        debug!(max_connections = config.max_connections, "Pool ready");

        migrations::run_migrations(&pool).await?;

        Ok(Database { pool })
    }

    /// The raw pool, for statements no repository covers.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn employees(&self) -> EmployeeRepository {
        EmployeeRepository::new(self.pool.clone())
    }

    pub fn suppliers(&self) -> SupplierRepository {
        SupplierRepository::new(self.pool.clone())
    }

    pub fn qr_codes(&self) -> QrCodeRepository {
        QrCodeRepository::new(self.pool.clone())
    }

    pub fn transactions(&self) -> TransactionRepository {
        TransactionRepository::new(self.pool.clone())
    }

    /// The only writer of employee balances.
    pub fn ledger(&self) -> CouponLedger {
        CouponLedger::new(self.pool.clone())
    }

    /// Closes every connection. Later calls on any clone fail.
    pub async fn close(&self) {
        info!("Closing mealticket store");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
