use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    #[serde(rename = "Currency")]
    pub symbol: String,
    #[serde(rename = "Convert To")]
    pub quote_currency: String,
    #[serde(rename = "Price")]
    pub price: Decimal,
}

/// Quotes from a single fetch, keyed by asset symbol.
///
/// Keeps the order in which quotes were inserted so the snapshot file
/// follows the configured symbol order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuoteBook {
    quotes: Vec<PriceQuote>,
    index: BTreeMap<String, usize>,
}

impl QuoteBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a quote, replacing any earlier quote for the same symbol.
    pub fn insert(&mut self, quote: PriceQuote) {
        match self.index.get(&quote.symbol) {
            Some(&pos) => self.quotes[pos] = quote,
            None => {
                self.index.insert(quote.symbol.clone(), self.quotes.len());
                self.quotes.push(quote);
            }
        }
    }

    pub fn get(&self, symbol: &str) -> Option<&PriceQuote> {
        self.index.get(symbol).map(|&pos| &self.quotes[pos])
    }

    pub fn price(&self, symbol: &str) -> Option<Decimal> {
        self.get(symbol).map(|q| q.price)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PriceQuote> {
        self.quotes.iter()
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }
}

impl FromIterator<PriceQuote> for QuoteBook {
    fn from_iter<I: IntoIterator<Item = PriceQuote>>(iter: I) -> Self {
        let mut book = QuoteBook::new();
        for quote in iter {
            book.insert(quote);
        }
        book
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn quote(symbol: &str, price: Decimal) -> PriceQuote {
        PriceQuote {
            symbol: symbol.to_string(),
            quote_currency: "GBP".to_string(),
            price,
        }
    }

    #[test]
    fn test_one_quote_per_symbol() {
        let book: QuoteBook = vec![
            quote("BTC", dec!(50000)),
            quote("ETH", dec!(3000)),
            quote("BTC", dec!(51000)),
        ]
        .into_iter()
        .collect();

        assert_eq!(book.len(), 2);
        assert_eq!(book.price("BTC"), Some(dec!(51000)));
        let order: Vec<&str> = book.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(order, vec!["BTC", "ETH"]);
    }

    #[test]
    fn test_unknown_symbol() {
        let book: QuoteBook = std::iter::once(quote("BTC", dec!(1))).collect();
        assert!(book.get("XRP").is_none());
    }
}
