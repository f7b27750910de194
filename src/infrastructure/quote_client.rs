use async_trait::async_trait;
use reqwest::header::ACCEPT;
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use tracing::{debug, info, warn};

use crate::config::QuoteApiConfig;
use crate::domain::{PriceQuote, QuoteBook};
use crate::error::{PnlError, Result};
use crate::infrastructure::PriceSource;

const API_KEY_HEADER: &str = "X-CMC_PRO_API_KEY";

/// Client for the CoinMarketCap "quotes/latest" endpoint.
pub struct QuoteClient {
    http_client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl QuoteClient {
    pub fn new(config: &QuoteApiConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| PnlError::Config(format!("Failed to build quote HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            endpoint: config.endpoint.clone(),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl PriceSource for QuoteClient {
    async fn fetch(&self, symbols: &[String], quote_currency: &str) -> Result<QuoteBook> {
        if symbols.is_empty() {
            return Err(PnlError::Config("No symbols to fetch".to_string()));
        }
        if quote_currency.is_empty() {
            return Err(PnlError::Config("No quote currency".to_string()));
        }

        info!(
            "Fetching {} quotes in {} from {}",
            symbols.len(),
            quote_currency,
            self.endpoint
        );

        let query = [
            ("symbol", symbols.join(",")),
            ("convert", quote_currency.to_string()),
        ];

        // Timeouts, refused connections and non-2xx statuses all count as
        // the source being unavailable.
        let response = self
            .http_client
            .get(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .header(ACCEPT, "application/json")
            .query(&query)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| PnlError::SourceUnavailable(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| PnlError::SourceUnavailable(e.to_string()))?;

        parse_quote_response(&body, symbols, quote_currency)
    }
}

/// Parse a `{data: {SYMBOL: {quote: {CUR: {price}}}}}` body.
///
/// Symbols missing from `data`, or quoted with a null price, are left out of
/// the book; the valuation step reports them if they are held.
pub fn parse_quote_response(
    body: &str,
    symbols: &[String],
    quote_currency: &str,
) -> Result<QuoteBook> {
    let payload: Value = serde_json::from_str(body)
        .map_err(|e| PnlError::SourceFormat(format!("body is not JSON: {}", e)))?;

    let data = payload
        .get("data")
        .and_then(|d| d.as_object())
        .ok_or_else(|| PnlError::SourceFormat("missing data object".to_string()))?;

    let mut book = QuoteBook::new();
    for symbol in symbols {
        let Some(entry) = data.get(symbol) else {
            debug!("No quote returned for {}", symbol);
            continue;
        };

        let price = entry
            .get("quote")
            .and_then(|q| q.get(quote_currency))
            .and_then(|c| c.get("price"))
            .ok_or_else(|| {
                PnlError::SourceFormat(format!(
                    "missing quote.{}.price for {}",
                    quote_currency, symbol
                ))
            })?;

        let price = match price {
            Value::Null => {
                warn!("Quote source has no {} price for {}", quote_currency, symbol);
                continue;
            }
            Value::Number(n) => parse_price(&n.to_string()).ok_or_else(|| {
                PnlError::SourceFormat(format!("price for {} is out of range: {}", symbol, n))
            })?,
            other => {
                return Err(PnlError::SourceFormat(format!(
                    "price for {} is not a number: {}",
                    symbol, other
                )))
            }
        };

        debug!("Price for {}: {} {}", symbol, price, quote_currency);

        book.insert(PriceQuote {
            symbol: symbol.clone(),
            quote_currency: quote_currency.to_string(),
            price,
        });
    }

    Ok(book)
}

fn parse_price(raw: &str) -> Option<Decimal> {
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn symbols(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_quotes() {
        let body = r#"{
            "status": {"error_code": 0},
            "data": {
                "BTC": {"symbol": "BTC", "quote": {"GBP": {"price": 50000.25}}},
                "ETH": {"symbol": "ETH", "quote": {"GBP": {"price": 3000}}}
            }
        }"#;

        let book = parse_quote_response(body, &symbols(&["BTC", "ETH"]), "GBP").unwrap();

        assert_eq!(book.len(), 2);
        assert_eq!(book.price("BTC"), Some(dec!(50000.25)));
        assert_eq!(book.price("ETH"), Some(dec!(3000)));
        assert_eq!(book.get("ETH").unwrap().quote_currency, "GBP");
    }

    #[test]
    fn test_parse_keeps_requested_order() {
        let body = r#"{"data": {
            "ETH": {"quote": {"GBP": {"price": 3000}}},
            "BTC": {"quote": {"GBP": {"price": 50000}}}
        }}"#;

        let book = parse_quote_response(body, &symbols(&["BTC", "ETH"]), "GBP").unwrap();
        let order: Vec<&str> = book.iter().map(|q| q.symbol.as_str()).collect();
        assert_eq!(order, vec!["BTC", "ETH"]);
    }

    #[test]
    fn test_parse_small_price_in_exponent_form() {
        let body = r#"{"data": {"SHIB": {"quote": {"GBP": {"price": 1.5e-5}}}}}"#;
        let book = parse_quote_response(body, &symbols(&["SHIB"]), "GBP").unwrap();
        assert_eq!(book.price("SHIB"), Some(dec!(0.000015)));
    }

    #[test]
    fn test_parse_skips_unlisted_and_null_prices() {
        let body = r#"{"data": {
            "BTC": {"quote": {"GBP": {"price": 50000}}},
            "XMR": {"quote": {"GBP": {"price": null}}}
        }}"#;

        let book = parse_quote_response(body, &symbols(&["BTC", "XMR", "XRP"]), "GBP").unwrap();
        assert_eq!(book.len(), 1);
        assert!(book.get("XMR").is_none());
        assert!(book.get("XRP").is_none());
    }

    #[test]
    fn test_parse_format_errors() {
        let cases = [
            "<html>rate limited</html>",
            r#"{"status": {"error_code": 1002}}"#,
            r#"{"data": []}"#,
            r#"{"data": {"BTC": {"quote": {"USD": {"price": 1}}}}}"#,
            r#"{"data": {"BTC": {"quote": {"GBP": {}}}}}"#,
            r#"{"data": {"BTC": {"quote": {"GBP": {"price": "50000"}}}}}"#,
        ];

        for body in cases {
            let err = parse_quote_response(body, &symbols(&["BTC"]), "GBP").unwrap_err();
            assert!(
                matches!(err, PnlError::SourceFormat(_)),
                "expected format error for {}, got {:?}",
                body,
                err
            );
        }
    }

    #[tokio::test]
    async fn test_fetch_rejects_empty_symbols() {
        let client = QuoteClient::new(&QuoteApiConfig {
            endpoint: "http://127.0.0.1:9".to_string(),
            api_key: "key".to_string(),
            symbols: vec![],
            quote_currency: "GBP".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap();

        let err = client.fetch(&[], "GBP").await.unwrap_err();
        assert!(matches!(err, PnlError::Config(_)));
    }
}
