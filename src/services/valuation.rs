use crate::domain::{Holding, QuoteBook};
use crate::error::{PnlError, Result};
use rust_decimal::Decimal;

pub struct ValuationEngine;

impl ValuationEngine {
    /// Total portfolio value in the quote currency.
    /// Formula: Σ(quantity × price) over every holding
    ///
    /// Every holding must have a quote. All unmatched symbols are reported
    /// together in a single `PriceMissing`.
    pub fn compute_value(quotes: &QuoteBook, holdings: &[Holding]) -> Result<Decimal> {
        let mut missing: Vec<String> = Vec::new();
        for holding in holdings {
            if quotes.get(&holding.symbol).is_none() && !missing.contains(&holding.symbol) {
                missing.push(holding.symbol.clone());
            }
        }
        if !missing.is_empty() {
            return Err(PnlError::PriceMissing { symbols: missing });
        }

        holdings.iter().try_fold(Decimal::ZERO, |total, holding| {
            let price = quotes
                .price(&holding.symbol)
                .ok_or_else(|| PnlError::PriceMissing {
                    symbols: vec![holding.symbol.clone()],
                })?;
            let value = holding.quantity.checked_mul(price).ok_or_else(|| {
                PnlError::Calculation(format!("Overflow valuing {}", holding.symbol))
            })?;
            total
                .checked_add(value)
                .ok_or_else(|| PnlError::Calculation("Overflow in total value".to_string()))
        })
    }
}
