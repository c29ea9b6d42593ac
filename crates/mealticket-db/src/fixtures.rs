//! Test fixtures shared by the repository and ledger tests.

use chrono::{Duration, Utc};

use crate::pool::Database;
use crate::repository::generate_id;
use mealticket_core::{
    CouponTransaction, Employee, EmployeeStatus, QrCode, Supplier, TransactionStatus,
    DEFAULT_COUPON_VALUE_CENTS,
};

pub(crate) async fn employee(db: &Database, code: &str, balance: i64) -> Employee {
    let now = Utc::now();
    let employee = Employee {
        employee_id: generate_id(),
        user_id: format!("user-{code}"),
        employee_code: code.to_string(),
        name: "Selam Girma".to_string(),
        email: format!("{}@example.com", code.to_lowercase()),
        status: EmployeeStatus::Active,
        monthly_allocation: 26,
        current_balance: balance,
        last_allocation_date: Some(now),
        created_at: now,
        updated_at: now,
    };
    db.employees().insert(&employee).await.unwrap()
}

pub(crate) async fn supplier(db: &Database) -> Supplier {
    let now = Utc::now();
    let supplier = Supplier {
        supplier_id: generate_id(),
        user_id: generate_id(),
        business_name: "Kaldi's Coffee".to_string(),
        address: "Bole Medhanialem".to_string(),
        latitude: 8.9950,
        longitude: 38.7880,
        location_radius: 500,
        is_active: true,
        is_verified: true,
        created_at: now,
        updated_at: now,
    };
    db.suppliers().insert(&supplier).await.unwrap()
}

pub(crate) async fn qr_code(db: &Database, employee_id: &str, expires_in_minutes: i64) -> QrCode {
    let now = Utc::now();
    let qr = QrCode {
        qr_code_id: generate_id(),
        code: generate_id(),
        employee_id: employee_id.to_string(),
        expires_at: now + Duration::minutes(expires_in_minutes),
        is_used: false,
        used_at: None,
        created_at: now,
    };
    db.qr_codes().insert(&qr).await.unwrap()
}

pub(crate) async fn scenario(db: &Database, balance: i64) -> (Employee, Supplier, QrCode) {
    let employee = employee(db, "E001", balance).await;
    let supplier = supplier(db).await;
    let qr = qr_code(db, &employee.employee_id, 15).await;
    (employee, supplier, qr)
}

pub(crate) fn transaction(
    employee: &Employee,
    supplier: &Supplier,
    qr: &QrCode,
    coupons: i64,
) -> CouponTransaction {
    let now = Utc::now();
    CouponTransaction {
        transaction_id: generate_id(),
        employee_id: employee.employee_id.clone(),
        supplier_id: supplier.supplier_id.clone(),
        qr_code_id: qr.qr_code_id.clone(),
        coupons_used: coupons,
        unit_value_cents: DEFAULT_COUPON_VALUE_CENTS,
        total_amount_cents: coupons * DEFAULT_COUPON_VALUE_CENTS,
        employee_latitude: None,
        employee_longitude: None,
        status: TransactionStatus::Pending,
        notes: None,
        created_at: now,
        updated_at: now,
        resolved_at: None,
    }
}

pub(crate) async fn pending_transaction(
    db: &Database,
    employee: &Employee,
    supplier: &Supplier,
    qr: &QrCode,
    coupons: i64,
) -> CouponTransaction {
    let txn = transaction(employee, supplier, qr, coupons);
    db.transactions().insert(&txn).await.unwrap()
}
