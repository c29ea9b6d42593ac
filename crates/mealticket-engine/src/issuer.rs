//! # QR Code Issuer
//!
//! Creates single-use, time-boxed redemption tokens.
//!
//! ## Issue Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Employee app: "Show my QR code"                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load employee ─────────── missing ─────────────► NotFound             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  status active|on_leave, balance > 0 ── else ──► Forbidden             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  token = UUID v4, expires_at = now + qr_expiry_minutes                 │
//! │  payload = "COUPON-<employeeCode>-<token>" ──► SVG (EC level M)        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  INSERT qr_codes (is_used = 0)                                         │
//! │                                                                         │
//! │  The balance is checked, never reserved.                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode as QrMatrix};
use serde::Serialize;
use tracing::{debug, info};
use ts_rs::TS;
use uuid::Uuid;

use mealticket_core::validation::{
    ensure_employee_can_issue, ensure_employee_can_redeem, ensure_qr_redeemable,
    validate_identifier,
};
use mealticket_core::{QrCode, QrPayload};
use mealticket_db::Database;

use crate::config::RedemptionConfig;
use crate::deadline::Deadline;
use crate::error::{RedemptionError, RedemptionResult};

/// Minimum rendered edge length of the QR image, in pixels.
pub const QR_IMAGE_MIN_DIMENSION: u32 = 256;

/// What the employee app receives after issuing a code.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct IssuedQrCode {
    pub qr_code_id: String,
    /// The opaque token.
    pub code: String,
    /// `COUPON-<employeeCode>-<token>`, the text encoded in the image.
    pub payload: String,
    /// SVG document rendering `payload`.
    pub qr_svg: String,
    #[ts(as = "String")]
    pub expires_at: DateTime<Utc>,
    pub expires_in_minutes: i64,
    pub employee_balance: i64,
}

/// Supplier-side pre-check of a scanned code. Never mutates state.
#[derive(Debug, Clone, Serialize, TS)]
#[ts(export)]
pub struct QrInspection {
    pub valid: bool,
    pub message: String,
    pub qr_code_id: Option<String>,
    pub employee_name: Option<String>,
    pub employee_code: Option<String>,
    pub employee_balance: Option<i64>,
    #[ts(as = "Option<String>")]
    pub expires_at: Option<DateTime<Utc>>,
}

impl QrInspection {
    fn invalid(message: impl Into<String>) -> Self {
        QrInspection {
            valid: false,
            message: message.into(),
            qr_code_id: None,
            employee_name: None,
            employee_code: None,
            employee_balance: None,
            expires_at: None,
        }
    }
}

/// Issues and inspects QR codes.
#[derive(Debug, Clone)]
pub struct QrCodeIssuer {
    db: Database,
    config: RedemptionConfig,
    deadline: Deadline,
}

impl QrCodeIssuer {
    pub fn new(db: Database, config: RedemptionConfig) -> Self {
        let deadline = Deadline::new(config.store_timeout());
        QrCodeIssuer {
            db,
            config,
            deadline,
        }
    }

    /// Issues a new code for `employee_id`.
    ///
    /// ## Errors
    /// * `NotFound` - Unknown employee
    /// * `Forbidden` - Suspended/terminated employee, or zero balance
    /// * `Timeout` / `Internal` - Store failure; no code was persisted
    pub async fn issue(&self, employee_id: &str) -> RedemptionResult<IssuedQrCode> {
        validate_identifier("employee_id", employee_id)?;

        let employee = self
            .deadline
            .run("load_employee", self.db.employees().get_by_id(employee_id))
            .await?
            .ok_or_else(|| RedemptionError::not_found("Employee", employee_id))?;

        ensure_employee_can_issue(&employee)?;

        let now = Utc::now();
        let expires_at = self
            .config
            .qr_expiry()
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                RedemptionError::Internal(format!(
                    "QR expiry of {} minutes is out of range",
                    self.config.qr_expiry_minutes
                ))
            })?;
        let token = Uuid::new_v4().to_string();
        let payload = QrPayload::new(&employee.employee_code, &token).to_string();
        let qr_svg = render_svg(&payload)?;

        let qr = QrCode {
            qr_code_id: Uuid::new_v4().to_string(),
            code: token,
            employee_id: employee.employee_id.clone(),
            expires_at,
            is_used: false,
            used_at: None,
            created_at: now,
        };

        let qr = self
            .deadline
            .run("insert_qr_code", self.db.qr_codes().insert(&qr))
            .await?;

        info!(
            employee_id = %employee.employee_id,
            qr_code_id = %qr.qr_code_id,
            expires_at = %qr.expires_at,
            "QR code issued"
        );

        Ok(IssuedQrCode {
            qr_code_id: qr.qr_code_id,
            code: qr.code,
            payload,
            qr_svg,
            expires_at: qr.expires_at,
            expires_in_minutes: self.config.qr_expiry_minutes,
            employee_balance: employee.current_balance,
        })
    }

    /// Reports whether a scanned code could be charged right now.
    ///
    /// Invalid codes are reported in the result, not as errors; only store
    /// failures and timeouts return `Err`.
    pub async fn inspect(&self, scanned: &str) -> RedemptionResult<QrInspection> {
        let Ok(scan) = ScannedCode::parse(scanned) else {
            return Ok(QrInspection::invalid("Invalid QR code"));
        };

        let Some(qr) = self
            .deadline
            .run("load_qr_code", self.db.qr_codes().get_by_code(&scan.token))
            .await?
        else {
            return Ok(QrInspection::invalid("Invalid QR code"));
        };

        let Some(employee) = self
            .deadline
            .run("load_employee", self.db.employees().get_by_id(&qr.employee_id))
            .await?
        else {
            return Ok(QrInspection::invalid("Employee not found"));
        };

        if !scan.matches_employee(&employee.employee_code) {
            return Ok(QrInspection::invalid("Invalid QR code"));
        }

        let verdict = ensure_qr_redeemable(&qr, Utc::now())
            .and_then(|_| ensure_employee_can_redeem(&employee));

        debug!(qr_code_id = %qr.qr_code_id, valid = verdict.is_ok(), "QR code inspected");

        let (valid, message) = match verdict {
            Ok(()) => (true, "QR code is valid".to_string()),
            Err(err) => (false, RedemptionError::from(err).to_string()),
        };

        Ok(QrInspection {
            valid,
            message,
            qr_code_id: Some(qr.qr_code_id),
            employee_name: Some(employee.name),
            employee_code: Some(employee.employee_code),
            employee_balance: Some(employee.current_balance),
            expires_at: Some(qr.expires_at),
        })
    }
}

/// A scanned QR: either the full `COUPON-...` payload or a bare token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScannedCode {
    pub token: String,
    pub employee_code: Option<String>,
}

impl ScannedCode {
    pub(crate) fn parse(scanned: &str) -> RedemptionResult<Self> {
        let scanned = scanned.trim();

        if scanned.starts_with(QrPayload::PREFIX) {
            let payload = QrPayload::parse(scanned)?;
            return Ok(ScannedCode {
                token: payload.token,
                employee_code: Some(payload.employee_code),
            });
        }

        validate_identifier("qr_code", scanned)?;
        Ok(ScannedCode {
            token: scanned.to_string(),
            employee_code: None,
        })
    }

    /// A bare token matches any employee; a payload must name the owner.
    pub(crate) fn matches_employee(&self, employee_code: &str) -> bool {
        self.employee_code
            .as_deref()
            .map_or(true, |code| code == employee_code)
    }
}

fn render_svg(payload: &str) -> RedemptionResult<String> {
    let matrix = QrMatrix::with_error_correction_level(payload.as_bytes(), EcLevel::M)
        .map_err(|e| RedemptionError::Internal(format!("failed to encode QR image: {e}")))?;

    Ok(matrix
        .render::<svg::Color<'_>>()
        .min_dimensions(QR_IMAGE_MIN_DIMENSION, QR_IMAGE_MIN_DIMENSION)
        .build())
}
