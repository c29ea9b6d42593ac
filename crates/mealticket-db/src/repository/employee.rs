//! # Employee Repository
//!
//! Employee lookups and onboarding inserts.
//!
//! There is no balance setter here: `current_balance` moves
//! only through [`CouponLedger`](crate::ledger::CouponLedger).

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use mealticket_core::Employee;

const EMPLOYEE_COLUMNS: &str = r#"
    employee_id,
    user_id,
    employee_code,
    name,
    email,
    status,
    monthly_allocation,
    current_balance,
    last_allocation_date,
    created_at,
    updated_at
"#;

/// Repository for employee database operations.
#[derive(Debug, Clone)]
pub struct EmployeeRepository {
    pool: SqlitePool,
}

impl EmployeeRepository {
    /// Creates a new EmployeeRepository.
    pub fn new(pool: SqlitePool) -> Self {
        EmployeeRepository { pool }
    }

    /// Gets an employee by ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Employee))` - Employee found
    /// * `Ok(None)` - Employee not found
    pub async fn get_by_id(&self, employee_id: &str) -> DbResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_id = ?1");

        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    /// Gets the employee profile owned by an identity-provider user.
    pub async fn get_by_user_id(&self, user_id: &str) -> DbResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE user_id = ?1");

        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    /// Gets an employee by the public code printed into QR payloads.
    pub async fn get_by_code(&self, employee_code: &str) -> DbResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE employee_code = ?1");

        let employee = sqlx::query_as::<_, Employee>(&sql)
            .bind(employee_code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(employee)
    }

    /// Inserts a new employee with its opening balance.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - Code or user already registered
    pub async fn insert(&self, employee: &Employee) -> DbResult<Employee> {
        debug!(employee_code = %employee.employee_code, "Inserting employee");

        sqlx::query(
            r#"
            INSERT INTO employees (
                employee_id, user_id, employee_code, name, email, status,
                monthly_allocation, current_balance, last_allocation_date,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&employee.employee_id)
        .bind(&employee.user_id)
        .bind(&employee.employee_code)
        .bind(&employee.name)
        .bind(&employee.email)
        .bind(employee.status)
        .bind(employee.monthly_allocation)
        .bind(employee.current_balance)
        .bind(employee.last_allocation_date)
        .bind(employee.created_at)
        .bind(employee.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(employee.clone())
    }

    /// Counts employees (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employees")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use crate::repository::generate_id;
    use chrono::Utc;
    use mealticket_core::EmployeeStatus;

    fn employee(code: &str, user: &str) -> Employee {
        let now = Utc::now();
        Employee {
            employee_id: generate_id(),
            user_id: user.to_string(),
            employee_code: code.to_string(),
            name: "Hana Tesfaye".to_string(),
            email: "hana@example.com".to_string(),
            status: EmployeeStatus::OnLeave,
            monthly_allocation: 26,
            current_balance: 12,
            last_allocation_date: Some(now),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.employees();
        let e = repo.insert(&employee("E100", "user-100")).await.unwrap();

        let by_id = repo.get_by_id(&e.employee_id).await.unwrap().unwrap();
        assert_eq!(by_id.employee_code, "E100");
        assert_eq!(by_id.status, EmployeeStatus::OnLeave);
        assert_eq!(by_id.current_balance, 12);

        let by_user = repo.get_by_user_id("user-100").await.unwrap().unwrap();
        assert_eq!(by_user.employee_id, e.employee_id);

        let by_code = repo.get_by_code("E100").await.unwrap().unwrap();
        assert_eq!(by_code.employee_id, e.employee_id);

        assert!(repo.get_by_id("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_code_rejected() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let repo = db.employees();
        repo.insert(&employee("E100", "user-1")).await.unwrap();

        let err = repo.insert(&employee("E100", "user-2")).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }

    #[tokio::test]
    async fn test_negative_balance_rejected_by_schema() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut e = employee("E100", "user-1");
        e.current_balance = -1;

        let err = db.employees().insert(&e).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}
