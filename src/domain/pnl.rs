use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Value deltas against earlier ledger entries. A delta whose reference
/// entry does not exist is zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PnLResult {
    pub today: Decimal,
    pub weekly: Decimal,
    pub monthly: Decimal,
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub as_of: NaiveDate,
    pub total_value: Decimal,
    pub pnl: PnLResult,
    /// False when the history append failed after a delivered notification.
    pub ledger_updated: bool,
}
