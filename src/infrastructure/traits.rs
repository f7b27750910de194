use async_trait::async_trait;

use crate::domain::QuoteBook;
use crate::error::Result;

/// Remote source of spot prices.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Fetch prices for `symbols`, converted into `quote_currency`, in one
    /// batched request.
    ///
    /// Transport problems surface as `SourceUnavailable`, unexpected bodies
    /// as `SourceFormat`.
    async fn fetch(&self, symbols: &[String], quote_currency: &str) -> Result<QuoteBook>;
}

/// Push transport used for both reports and failure alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str) -> Result<()>;
}
