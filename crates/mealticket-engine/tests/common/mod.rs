//! Shared fixtures for the engine integration tests.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use uuid::Uuid;

use mealticket_core::{Employee, EmployeeStatus, GeoPoint, QrCode, Supplier};
use mealticket_db::{Database, DbConfig};
use mealticket_engine::{InitiateRequest, RedemptionConfig, RedemptionEngine};

pub const SUPPLIER_LAT: f64 = 8.9950;
pub const SUPPLIER_LON: f64 = 38.7880;
pub const SUPPLIER_RADIUS: i64 = 500;

/// Metres per degree of latitude on the sphere used by the distance evaluator.
const METERS_PER_DEGREE: f64 = 6_371_000.0 * std::f64::consts::PI / 180.0;

pub async fn engine() -> RedemptionEngine {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    RedemptionEngine::new(db, RedemptionConfig::default())
}

pub async fn employee(engine: &RedemptionEngine, code: &str, balance: i64) -> Employee {
    employee_with_status(engine, code, balance, EmployeeStatus::Active).await
}

pub async fn employee_with_status(
    engine: &RedemptionEngine,
    code: &str,
    balance: i64,
    status: EmployeeStatus,
) -> Employee {
    let now = Utc::now();
    let employee = Employee {
        employee_id: Uuid::new_v4().to_string(),
        user_id: format!("user-{code}"),
        employee_code: code.to_string(),
        name: format!("Employee {code}"),
        email: format!("{}@example.com", code.to_lowercase()),
        status,
        monthly_allocation: 26,
        current_balance: balance,
        last_allocation_date: Some(now),
        created_at: now,
        updated_at: now,
    };
    engine.database().employees().insert(&employee).await.unwrap()
}

pub async fn supplier(engine: &RedemptionEngine) -> Supplier {
    supplier_with_flags(engine, true, true).await
}

pub async fn supplier_with_flags(
    engine: &RedemptionEngine,
    is_active: bool,
    is_verified: bool,
) -> Supplier {
    let now = Utc::now();
    let supplier = Supplier {
        supplier_id: Uuid::new_v4().to_string(),
        user_id: Uuid::new_v4().to_string(),
        business_name: "Tomoca Coffee".to_string(),
        address: "Wavel Street, Piassa".to_string(),
        latitude: SUPPLIER_LAT,
        longitude: SUPPLIER_LON,
        location_radius: SUPPLIER_RADIUS,
        is_active,
        is_verified,
        created_at: now,
        updated_at: now,
    };
    engine.database().suppliers().insert(&supplier).await.unwrap()
}

/// Inserts a QR code directly, bypassing issuance rules.
pub async fn qr_code(engine: &RedemptionEngine, employee_id: &str, expires_in_minutes: i64) -> QrCode {
    let now = Utc::now();
    let qr = QrCode {
        qr_code_id: Uuid::new_v4().to_string(),
        code: Uuid::new_v4().to_string(),
        employee_id: employee_id.to_string(),
        expires_at: now + Duration::minutes(expires_in_minutes),
        is_used: false,
        used_at: None,
        created_at: now - Duration::minutes(1),
    };
    engine.database().qr_codes().insert(&qr).await.unwrap()
}

pub fn request(supplier: &Supplier, qr_code: &str, coupons: i64) -> InitiateRequest {
    InitiateRequest {
        supplier_id: supplier.supplier_id.clone(),
        qr_code: qr_code.to_string(),
        coupons,
        employee_location: None,
        notes: None,
    }
}

/// A point due north of the supplier at `meters`.
pub fn north_of_supplier(meters: f64) -> GeoPoint {
    GeoPoint::new(SUPPLIER_LAT + meters / METERS_PER_DEGREE, SUPPLIER_LON)
}

pub async fn balance_of(engine: &RedemptionEngine, employee_id: &str) -> i64 {
    engine.ledger().balance(employee_id).await.unwrap().current_balance
}

pub async fn qr_is_used(engine: &RedemptionEngine, qr_code_id: &str) -> bool {
    engine
        .database()
        .qr_codes()
        .get_by_id(qr_code_id)
        .await
        .unwrap()
        .unwrap()
        .is_used
}
