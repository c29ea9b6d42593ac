//! # Transaction Coordinator
//!
//! Supplier-side initiation of a coupon charge.
//!
//! ## Initiation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Merchant terminal scans the employee's QR code                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. supplier exists, active, verified        NotFound / Forbidden       │
//! │  2. QR resolves, unused, unexpired           NotFound / AlreadyUsed /   │
//! │                                              Expired                    │
//! │  3. employee exists                          NotFound                   │
//! │  4. employee active or on leave              Forbidden                  │
//! │  5. location (if reported) within radius     Forbidden (+distance)      │
//! │  6. coupons in 1..=3                         InvalidArgument            │
//! │  7. balance covers coupons                   InsufficientBalance        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT coupon_transactions (status = pending)                          │
//! │                                                                         │
//! │  The QR code and the balance are left untouched: the employee has not  │
//! │  confirmed anything yet.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use mealticket_core::validation::{
    ensure_balance_covers, ensure_employee_can_redeem, ensure_qr_redeemable,
    ensure_supplier_can_accept, ensure_within_radius, validate_coupon_quantity,
    validate_identifier, validate_note,
};
use mealticket_core::{CouponTransaction, GeoPoint, Money, TransactionStatus};
use mealticket_db::Database;

use crate::config::RedemptionConfig;
use crate::deadline::Deadline;
use crate::error::{RedemptionError, RedemptionResult};
use crate::issuer::ScannedCode;

/// A supplier's request to charge coupons against a scanned QR code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitiateRequest {
    pub supplier_id: String,
    /// Bare token or the full `COUPON-<employeeCode>-<token>` payload.
    pub qr_code: String,
    pub coupons: i64,
    /// Where the employee stands, if the terminal reported it.
    pub employee_location: Option<GeoPoint>,
    pub notes: Option<String>,
}

/// A pending transaction plus what the terminal shows while it waits.
#[derive(Debug, Clone, Serialize)]
pub struct InitiatedTransaction {
    pub transaction: CouponTransaction,
    pub total_amount: Money,
    pub employee_name: String,
    pub employee_code: String,
    pub current_balance: i64,
    /// Balance once the employee approves. Informational only.
    pub balance_after_approval: i64,
    pub supplier_name: String,
    pub supplier_address: String,
    pub distance_meters: Option<f64>,
    pub requires_approval: bool,
}

/// Creates pending transactions and lists transaction history.
#[derive(Debug, Clone)]
pub struct TransactionCoordinator {
    db: Database,
    config: RedemptionConfig,
    deadline: Deadline,
}

impl TransactionCoordinator {
    pub fn new(db: Database, config: RedemptionConfig) -> Self {
        let deadline = Deadline::new(config.store_timeout());
        TransactionCoordinator {
            db,
            config,
            deadline,
        }
    }

    /// Validates a charge request and records it as pending.
    ///
    /// Checks run in a fixed order and the first violation is returned.
    pub async fn initiate(&self, request: &InitiateRequest) -> RedemptionResult<InitiatedTransaction> {
        validate_identifier("supplier_id", &request.supplier_id)?;

        // 1. Supplier
        let supplier = self
            .deadline
            .run("load_supplier", self.db.suppliers().get_by_id(&request.supplier_id))
            .await?
            .ok_or_else(|| RedemptionError::not_found("Supplier", &request.supplier_id))?;
        ensure_supplier_can_accept(&supplier)
            .inspect_err(|e| warn!(supplier_id = %supplier.supplier_id, error = %e, "Supplier may not accept coupons"))?;

        // 2. QR code
        let scan = ScannedCode::parse(&request.qr_code)
            .map_err(|_| RedemptionError::not_found("QrCode", request.qr_code.trim()))?;
        let qr = self
            .deadline
            .run("load_qr_code", self.db.qr_codes().get_by_code(&scan.token))
            .await?
            .ok_or_else(|| RedemptionError::not_found("QrCode", &scan.token))?;
        let now = Utc::now();
        ensure_qr_redeemable(&qr, now)
            .inspect_err(|e| warn!(qr_code_id = %qr.qr_code_id, error = %e, "QR code not redeemable"))?;

        // 3. Employee
        let employee = self
            .deadline
            .run("load_employee", self.db.employees().get_by_id(&qr.employee_id))
            .await?
            .ok_or_else(|| RedemptionError::not_found("Employee", &qr.employee_id))?;
        if !scan.matches_employee(&employee.employee_code) {
            return Err(RedemptionError::not_found("QrCode", &scan.token));
        }

        // 4. Employee status
        ensure_employee_can_redeem(&employee)?;

        // 5. Location
        let distance_meters = ensure_within_radius(&supplier, request.employee_location.as_ref())
            .inspect_err(|e| warn!(supplier_id = %supplier.supplier_id, error = %e, "Location check failed"))?;

        // 6. Quantity
        validate_coupon_quantity(request.coupons)?;

        // 7. Balance
        ensure_balance_covers(&employee, request.coupons)?;

        let notes = validate_note("notes", request.notes.as_deref())?;

        let unit_value = self.config.coupon_value();
        let total_amount = unit_value.multiply_quantity(request.coupons);
        let transaction = CouponTransaction {
            transaction_id: Uuid::new_v4().to_string(),
            employee_id: employee.employee_id.clone(),
            supplier_id: supplier.supplier_id.clone(),
            qr_code_id: qr.qr_code_id.clone(),
            coupons_used: request.coupons,
            unit_value_cents: unit_value.cents(),
            total_amount_cents: total_amount.cents(),
            employee_latitude: request.employee_location.map(|p| p.latitude),
            employee_longitude: request.employee_location.map(|p| p.longitude),
            status: TransactionStatus::Pending,
            notes,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        };

        let transaction = self
            .deadline
            .run("insert_transaction", self.db.transactions().insert(&transaction))
            .await?;

        info!(
            transaction_id = %transaction.transaction_id,
            supplier_id = %supplier.supplier_id,
            employee_id = %employee.employee_id,
            coupons = transaction.coupons_used,
            total = %total_amount,
            "Transaction initiated, awaiting employee approval"
        );

        Ok(InitiatedTransaction {
            total_amount,
            employee_name: employee.name,
            employee_code: employee.employee_code,
            current_balance: employee.current_balance,
            balance_after_approval: employee.current_balance - transaction.coupons_used,
            supplier_name: supplier.business_name,
            supplier_address: supplier.address,
            distance_meters,
            requires_approval: true,
            transaction,
        })
    }

    /// An employee's transactions, newest first.
    pub async fn history_for_employee(
        &self,
        employee_id: &str,
        limit: u32,
    ) -> RedemptionResult<Vec<CouponTransaction>> {
        self.deadline
            .run("load_employee", self.db.employees().get_by_id(employee_id))
            .await?
            .ok_or_else(|| RedemptionError::not_found("Employee", employee_id))?;

        self.deadline
            .run(
                "list_employee_transactions",
                self.db.transactions().list_for_employee(employee_id, limit),
            )
            .await
    }

    /// A supplier's transactions, newest first.
    pub async fn history_for_supplier(
        &self,
        supplier_id: &str,
        limit: u32,
    ) -> RedemptionResult<Vec<CouponTransaction>> {
        self.deadline
            .run("load_supplier", self.db.suppliers().get_by_id(supplier_id))
            .await?
            .ok_or_else(|| RedemptionError::not_found("Supplier", supplier_id))?;

        self.deadline
            .run(
                "list_supplier_transactions",
                self.db.transactions().list_for_supplier(supplier_id, limit),
            )
            .await
    }
}
