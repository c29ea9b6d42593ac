//! # Supplier Repository

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use mealticket_core::Supplier;

const SUPPLIER_COLUMNS: &str = r#"
    supplier_id,
    user_id,
    business_name,
    address,
    latitude,
    longitude,
    location_radius,
    is_active,
    is_verified,
    created_at,
    updated_at
"#;

/// Repository for supplier database operations.
#[derive(Debug, Clone)]
pub struct SupplierRepository {
    pool: SqlitePool,
}

impl SupplierRepository {
    pub fn new(pool: SqlitePool) -> Self {
        SupplierRepository { pool }
    }

    pub async fn get_by_id(&self, supplier_id: &str) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE supplier_id = ?1");

        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(supplier_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn get_by_user_id(&self, user_id: &str) -> DbResult<Option<Supplier>> {
        let sql = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE user_id = ?1");

        let supplier = sqlx::query_as::<_, Supplier>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(supplier)
    }

    pub async fn insert(&self, supplier: &Supplier) -> DbResult<Supplier> {
        debug!(business_name = %supplier.business_name, "Inserting supplier");

        sqlx::query(
            r#"
            INSERT INTO suppliers (
                supplier_id, user_id, business_name, address,
                latitude, longitude, location_radius,
                is_active, is_verified, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&supplier.supplier_id)
        .bind(&supplier.user_id)
        .bind(&supplier.business_name)
        .bind(&supplier.address)
        .bind(supplier.latitude)
        .bind(supplier.longitude)
        .bind(supplier.location_radius)
        .bind(supplier.is_active)
        .bind(supplier.is_verified)
        .bind(supplier.created_at)
        .bind(supplier.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(supplier.clone())
    }
}
