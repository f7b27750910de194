use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// One row of the user-maintained quantities table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Holding {
    #[serde(rename = "Currency")]
    pub symbol: String,
    #[serde(rename = "Quantity")]
    pub quantity: Decimal,
}

impl Holding {
    pub fn new(symbol: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            symbol: symbol.into(),
            quantity,
        }
    }
}
