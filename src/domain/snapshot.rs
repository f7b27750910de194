use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Date format used by the ledger, e.g. `05-Mar-2024`.
pub const LEDGER_DATE_FORMAT: &str = "%d-%b-%Y";

/// One ledger row: the portfolio total recorded for a day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueSnapshot {
    pub date: NaiveDate,
    pub value: Decimal,
}

impl ValueSnapshot {
    pub fn new(date: NaiveDate, value: Decimal) -> Self {
        Self { date, value }
    }

    pub fn ledger_date(&self) -> String {
        format_ledger_date(self.date)
    }

    /// Value as stored in the ledger: rounded half-to-even to a whole number.
    pub fn ledger_value(&self) -> Decimal {
        self.value.round()
    }
}

pub fn format_ledger_date(date: NaiveDate) -> String {
    date.format(LEDGER_DATE_FORMAT).to_string()
}

pub fn parse_ledger_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), LEDGER_DATE_FORMAT).ok()
}
