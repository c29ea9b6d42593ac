//! Read-only balance view over the coupon ledger.

use mealticket_core::validation::validate_identifier;
use mealticket_db::{BalanceSnapshot, Database};

use crate::config::RedemptionConfig;
use crate::deadline::Deadline;
use crate::error::{RedemptionError, RedemptionResult};

/// Balance lookups for employee dashboards.
#[derive(Debug, Clone)]
pub struct LedgerView {
    db: Database,
    deadline: Deadline,
}

impl LedgerView {
    pub fn new(db: Database, config: &RedemptionConfig) -> Self {
        LedgerView {
            db,
            deadline: Deadline::new(config.store_timeout()),
        }
    }

    pub async fn balance(&self, employee_id: &str) -> RedemptionResult<BalanceSnapshot> {
        validate_identifier("employee_id", employee_id)?;

        self.deadline
            .run("load_balance", self.db.ledger().balance(employee_id))
            .await?
            .ok_or_else(|| RedemptionError::not_found("Employee", employee_id))
    }
}
