use crate::domain::PnLResult;
use crate::error::PnlError;
use rust_decimal::Decimal;

pub const REPORT_TITLE: &str = "DailyPnL";

/// Title and body of a push notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub title: String,
    pub body: String,
}

impl Report {
    pub fn success(total_value: Decimal, pnl: &PnLResult, quote_currency: &str) -> Self {
        let body = [
            format!(
                "Portfolio value: {}{}",
                currency_prefix(quote_currency),
                group_thousands(total_value)
            ),
            format!("Daily PnL: {}", signed(pnl.today)),
            format!("Weekly PnL: {}", signed(pnl.weekly)),
            format!("Monthly PnL: {}", signed(pnl.monthly)),
        ]
        .join("\n");

        Self {
            title: REPORT_TITLE.to_string(),
            body,
        }
    }

    pub fn failure(error: &PnlError) -> Self {
        Self {
            title: format!("{} - ERROR {}", REPORT_TITLE, error.error_code()),
            body: error.to_string(),
        }
    }
}

fn currency_prefix(code: &str) -> String {
    match code {
        "GBP" => "£".to_string(),
        "USD" => "$".to_string(),
        "EUR" => "€".to_string(),
        other => format!("{} ", other),
    }
}

/// Whole units with thousands separators, e.g. `-1,234,568`.
fn group_thousands(value: Decimal) -> String {
    let rounded = value.round();
    let digits = rounded.abs().trunc().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Whole units, always signed: `+0`, `+125`, `-40`.
fn signed(value: Decimal) -> String {
    let rounded = value.round();
    if rounded.is_sign_negative() && !rounded.is_zero() {
        rounded.to_string()
    } else {
        format!("+{}", rounded.abs())
    }
}
