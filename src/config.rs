use crate::error::{PnlError, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_QUOTE_ENDPOINT: &str =
    "https://pro-api.coinmarketcap.com/v1/cryptocurrency/quotes/latest";
pub const DEFAULT_PUSH_ENDPOINT: &str = "https://api.pushbullet.com/v2/pushes";
pub const DEFAULT_SYMBOLS: &[&str] = &[
    "BTC", "ETH", "ADA", "DOGE", "ATOM", "DOT", "LTC", "XLM", "XRP", "XMR", "BCH", "POL", "SOL",
];
pub const DEFAULT_QUOTE_CURRENCY: &str = "GBP";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

const HOLDINGS_FILE_NAME: &str = "quantities.csv";
const HISTORY_FILE_NAME: &str = "portfolioHistory.csv";
const PRICES_FILE_NAME: &str = "currentprices.csv";

/// Quote API settings
#[derive(Debug, Clone)]
pub struct QuoteApiConfig {
    pub endpoint: String,
    pub api_key: String,
    pub symbols: Vec<String>,
    pub quote_currency: String,
    pub timeout: Duration,
}

/// Push notification settings
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Locations of the CSV files the pipeline reads and writes.
#[derive(Debug, Clone)]
pub struct DataFiles {
    pub holdings: PathBuf,
    pub history: PathBuf,
    pub prices: PathBuf,
}

impl DataFiles {
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            holdings: dir.join(HOLDINGS_FILE_NAME),
            history: dir.join(HISTORY_FILE_NAME),
            prices: dir.join(PRICES_FILE_NAME),
        }
    }

    /// File locations only; needs no API credentials.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = get("PNL_DATA_DIR").unwrap_or_else(|| ".".to_string());
        let mut files = Self::in_dir(&data_dir);
        if let Some(path) = get("PNL_HOLDINGS_FILE") {
            files.holdings = PathBuf::from(path);
        }
        if let Some(path) = get("PNL_HISTORY_FILE") {
            files.history = PathBuf::from(path);
        }
        if let Some(path) = get("PNL_PRICES_FILE") {
            files.prices = PathBuf::from(path);
        }
        files
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub quotes: QuoteApiConfig,
    pub push: PushConfig,
    pub files: DataFiles,
}

impl AppConfig {
    /// Build the configuration from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let require = |key: &str| get(key).ok_or_else(|| PnlError::Config(format!("{} not set", key)));

        let timeout_secs = match get("PNL_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| PnlError::Config(format!("Invalid PNL_HTTP_TIMEOUT_SECS: {}", raw)))?,
            None => DEFAULT_TIMEOUT_SECS,
        };
        let timeout = Duration::from_secs(timeout_secs);

        let symbols = match get("PNL_SYMBOLS") {
            Some(raw) => parse_symbols(&raw),
            None => DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        };
        if symbols.is_empty() {
            return Err(PnlError::Config("PNL_SYMBOLS lists no symbols".to_string()));
        }

        // Set but blank is an error, unlike unset which takes the default
        let quote_currency = match lookup("PNL_QUOTE_CURRENCY") {
            Some(raw) => raw.trim().to_uppercase(),
            None => DEFAULT_QUOTE_CURRENCY.to_string(),
        };
        if quote_currency.is_empty() || !quote_currency.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(PnlError::Config(format!(
                "Invalid PNL_QUOTE_CURRENCY: {}",
                quote_currency
            )));
        }

        let files = DataFiles::from_lookup(&lookup);

        Ok(Self {
            quotes: QuoteApiConfig {
                endpoint: get("CMC_ENDPOINT").unwrap_or_else(|| DEFAULT_QUOTE_ENDPOINT.to_string()),
                api_key: require("CMC_API_KEY")?,
                symbols,
                quote_currency,
                timeout,
            },
            push: PushConfig {
                endpoint: get("PUSHBULLET_ENDPOINT")
                    .unwrap_or_else(|| DEFAULT_PUSH_ENDPOINT.to_string()),
                api_key: require("PUSHBULLET_API_KEY")?,
                timeout,
            },
            files,
        })
    }
}

/// Split a comma separated symbol list, upper-casing and dropping repeats.
pub fn parse_symbols(raw: &str) -> Vec<String> {
    let mut symbols: Vec<String> = Vec::new();
    for symbol in raw.split(',').map(|s| s.trim().to_uppercase()) {
        if !symbol.is_empty() && !symbols.contains(&symbol) {
            symbols.push(symbol);
        }
    }
    symbols
}
