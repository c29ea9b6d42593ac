//! Supplier-initiated transactions: ordered checks and the pending record.

mod common;

use mealticket_core::{EmployeeStatus, GeoPoint, TransactionStatus};
use mealticket_engine::{ErrorKind, ForbiddenReason, InitiateRequest, RedemptionError};

#[tokio::test]
async fn test_initiate_creates_pending_transaction() {
    let engine = common::engine().await;
    let employee = common::employee(&engine, "EMP-0101", 10).await;
    let supplier = common::supplier(&engine).await;
    let issued = engine.issuer().issue(&employee.employee_id).await.unwrap();

    let mut request = common::request(&supplier, &issued.payload, 2);
    request.notes = Some("  lunch combo  ".to_string());
    let initiated = engine.coordinator().initiate(&request).await.unwrap();

    let txn = &initiated.transaction;
    assert_eq!(txn.status, TransactionStatus::Pending);
    assert_eq!(txn.coupons_used, 2);
    assert_eq!(txn.qr_code_id, issued.qr_code_id);
    assert_eq!(txn.notes.as_deref(), Some("lunch combo"));
    assert_eq!(initiated.total_amount.to_string(), "90.00");
    assert_eq!(txn.total_amount_cents, 9_000);
    assert_eq!(initiated.current_balance, 10);
    assert_eq!(initiated.balance_after_approval, 8);
    assert_eq!(initiated.employee_code, "EMP-0101");
    assert_eq!(initiated.supplier_name, "Tomoca Coffee");
    assert!(initiated.requires_approval);
    assert!(initiated.distance_meters.is_none());

    // Nothing is consumed until the employee approves.
    assert_eq!(common::balance_of(&engine, &employee.employee_id).await, 10);
    assert!(!common::qr_is_used(&engine, &issued.qr_code_id).await);

    let stored = engine
        .database()
        .transactions()
        .get_by_id(&txn.transaction_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.status, TransactionStatus::Pending);
}

#[tokio::test]
async fn test_bare_token_is_accepted() {
    let engine = common::engine().await;
    let employee = common::employee(&engine, "EMP-0102", 5).await;
    let supplier = common::supplier(&engine).await;
    let issued = engine.issuer().issue(&employee.employee_id).await.unwrap();

    let initiated = engine
        .coordinator()
        .initiate(&common::request(&supplier, &issued.code, 1))
        .await
        .unwrap();

    assert_eq!(initiated.transaction.employee_id, employee.employee_id);
}

#[tokio::test]
async fn test_coupon_bounds() {
    let engine = common::engine().await;
    let employee = common::employee(&engine, "EMP-0103", 20).await;
    let supplier = common::supplier(&engine).await;
    let qr = common::qr_code(&engine, &employee.employee_id, 15).await;

    for coupons in [0, 4, -1] {
        let err = engine
            .coordinator()
            .initiate(&common::request(&supplier, &qr.code, coupons))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument, "coupons = {coupons}");
    }

    for coupons in [1, 3] {
        let initiated = engine
            .coordinator()
            .initiate(&common::request(&supplier, &qr.code, coupons))
            .await
            .unwrap();
        assert_eq!(initiated.transaction.coupons_used, coupons);
    }
}

#[tokio::test]
async fn test_location_boundary() {
    let engine = common::engine().await;
    let employee = common::employee(&engine, "EMP-0104", 20).await;
    let supplier = common::supplier(&engine).await;
    let qr = common::qr_code(&engine, &employee.employee_id, 15).await;
    let radius = common::SUPPLIER_RADIUS as f64;

    let mut request = common::request(&supplier, &qr.code, 1);
    request.employee_location = Some(common::north_of_supplier(radius));
    let initiated = engine.coordinator().initiate(&request).await.unwrap();
    let distance = initiated.distance_meters.unwrap();
    assert!((distance - radius).abs() < 0.01);
    assert_eq!(
        initiated.transaction.employee_location(),
        request.employee_location
    );

    request.employee_location = Some(common::north_of_supplier(radius + 1.0));
    let err = engine.coordinator().initiate(&request).await.unwrap_err();
    assert_eq!(
        err,
        RedemptionError::Forbidden(ForbiddenReason::OutsideRadius {
            distance_meters: 501,
            radius_meters: 500,
        })
    );
    let details = err.to_response().details.unwrap();
    assert_eq!(details["distance_meters"], 501);
}

#[tokio::test]
async fn test_origin_coordinates_are_checked() {
    let engine = common::engine().await;
    let employee = common::employee(&engine, "EMP-0105", 20).await;
    let supplier = common::supplier(&engine).await;
    let qr = common::qr_code(&engine, &employee.employee_id, 15).await;

    let mut request = common::request(&supplier, &qr.code, 1);
    request.employee_location = Some(GeoPoint::new(0.0, 0.0));

    let err = engine.coordinator().initiate(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);
}

#[tokio::test]
async fn test_supplier_checks() {
    let engine = common::engine().await;
    let employee = common::employee(&engine, "EMP-0106", 20).await;
    let qr = common::qr_code(&engine, &employee.employee_id, 15).await;

    let inactive = common::supplier_with_flags(&engine, false, true).await;
    let err = engine
        .coordinator()
        .initiate(&common::request(&inactive, &qr.code, 1))
        .await
        .unwrap_err();
    assert_eq!(err, RedemptionError::Forbidden(ForbiddenReason::SupplierInactive));

    let unverified = common::supplier_with_flags(&engine, true, false).await;
    let err = engine
        .coordinator()
        .initiate(&common::request(&unverified, &qr.code, 1))
        .await
        .unwrap_err();
    assert_eq!(err, RedemptionError::Forbidden(ForbiddenReason::SupplierUnverified));

    let err = engine
        .coordinator()
        .initiate(&InitiateRequest {
            supplier_id: "no-such-supplier".to_string(),
            ..common::request(&inactive, &qr.code, 1)
        })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_checks_fail_fast_in_order() {
    let engine = common::engine().await;
    let employee = common::employee(&engine, "EMP-0107", 1).await;
    let inactive = common::supplier_with_flags(&engine, false, true).await;
    let supplier = common::supplier(&engine).await;
    let qr = common::qr_code(&engine, &employee.employee_id, 15).await;

    // Supplier status is reported before an unknown QR code.
    let err = engine
        .coordinator()
        .initiate(&common::request(&inactive, "unknown-token", 9))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // Location is reported before quantity.
    let mut request = common::request(&supplier, &qr.code, 9);
    request.employee_location = Some(common::north_of_supplier(5_000.0));
    let err = engine.coordinator().initiate(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Forbidden);

    // Quantity is reported before balance.
    request.employee_location = None;
    let err = engine.coordinator().initiate(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);

    request.coupons = 2;
    let err = engine.coordinator().initiate(&request).await.unwrap_err();
    assert_eq!(
        err,
        RedemptionError::InsufficientBalance {
            current: 1,
            requested: 2
        }
    );
}

#[tokio::test]
async fn test_unknown_or_mismatched_code() {
    let engine = common::engine().await;
    let employee = common::employee(&engine, "EMP-0108", 5).await;
    let supplier = common::supplier(&engine).await;
    let issued = engine.issuer().issue(&employee.employee_id).await.unwrap();

    for scanned in [
        "00000000-0000-0000-0000-000000000000".to_string(),
        "COUPON-garbage".to_string(),
        format!("COUPON-EMP-9999-{}", issued.code),
    ] {
        let err = engine
            .coordinator()
            .initiate(&common::request(&supplier, &scanned, 1))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound, "{scanned}");
    }
}

#[tokio::test]
async fn test_expired_code() {
    let engine = common::engine().await;
    let employee = common::employee(&engine, "EMP-0109", 5).await;
    let supplier = common::supplier(&engine).await;
    let qr = common::qr_code(&engine, &employee.employee_id, -1).await;

    let err = engine
        .coordinator()
        .initiate(&common::request(&supplier, &qr.code, 1))
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Expired);
    assert!(matches!(err, RedemptionError::Expired { expired_at } if expired_at < chrono::Utc::now()));
}

#[tokio::test]
async fn test_used_code_is_reported_before_expiry() {
    let engine = common::engine().await;
    let employee = common::employee(&engine, "EMP-0110", 5).await;
    let supplier = common::supplier(&engine).await;

    let mut qr = common::qr_code(&engine, &employee.employee_id, 15).await;
    qr.qr_code_id = uuid::Uuid::new_v4().to_string();
    qr.code = uuid::Uuid::new_v4().to_string();
    qr.is_used = true;
    qr.used_at = Some(chrono::Utc::now());
    qr.expires_at = chrono::Utc::now() - chrono::Duration::minutes(30);
    engine.database().qr_codes().insert(&qr).await.unwrap();

    let err = engine
        .coordinator()
        .initiate(&common::request(&supplier, &qr.code, 1))
        .await
        .unwrap_err();

    assert_eq!(err, RedemptionError::AlreadyUsed);
}

#[tokio::test]
async fn test_approved_code_cannot_be_reused() {
    let engine = common::engine().await;
    let employee = common::employee(&engine, "EMP-0111", 5).await;
    let supplier = common::supplier(&engine).await;
    let issued = engine.issuer().issue(&employee.employee_id).await.unwrap();

    let initiated = engine
        .coordinator()
        .initiate(&common::request(&supplier, &issued.payload, 1))
        .await
        .unwrap();
    engine
        .approvals()
        .resolve(
            &initiated.transaction.transaction_id,
            &employee.user_id,
            true,
            None,
        )
        .await
        .unwrap();

    let err = engine
        .coordinator()
        .initiate(&common::request(&supplier, &issued.payload, 1))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::AlreadyUsed);
}

#[tokio::test]
async fn test_inactive_employee_cannot_redeem() {
    let engine = common::engine().await;
    let supplier = common::supplier(&engine).await;

    let employee =
        common::employee_with_status(&engine, "EMP-0112", 5, EmployeeStatus::Suspended).await;
    let qr = common::qr_code(&engine, &employee.employee_id, 15).await;
    let err = engine
        .coordinator()
        .initiate(&common::request(&supplier, &qr.code, 1))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RedemptionError::Forbidden(ForbiddenReason::EmployeeInactive {
            status: "suspended".to_string()
        })
    );

    let on_leave =
        common::employee_with_status(&engine, "EMP-0113", 5, EmployeeStatus::OnLeave).await;
    let qr = common::qr_code(&engine, &on_leave.employee_id, 15).await;
    assert!(engine
        .coordinator()
        .initiate(&common::request(&supplier, &qr.code, 1))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_overlong_note_is_rejected() {
    let engine = common::engine().await;
    let employee = common::employee(&engine, "EMP-0114", 5).await;
    let supplier = common::supplier(&engine).await;
    let qr = common::qr_code(&engine, &employee.employee_id, 15).await;

    let mut request = common::request(&supplier, &qr.code, 1);
    request.notes = Some("x".repeat(10_000));

    let err = engine.coordinator().initiate(&request).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidArgument);
}
