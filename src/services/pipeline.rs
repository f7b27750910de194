use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::path::PathBuf;
use tracing::{error, info, warn};

use crate::config::{DataFiles, QuoteApiConfig};
use crate::domain::{PnLResult, RunSummary, ValueSnapshot};
use crate::error::{PnlError, Result};
use crate::infrastructure::{
    write_price_snapshot, HistoryWriter, Notifier, PortfolioStore, PriceSource,
};
use crate::services::{PnLCalculator, Report, ValuationEngine};

/// One daily run: fetch prices, value the holdings, compare against the
/// ledger, notify, and only then record the day.
pub struct DailyPnlJob<S, N> {
    source: S,
    notifier: N,
    symbols: Vec<String>,
    quote_currency: String,
    store: PortfolioStore,
    history_writer: HistoryWriter,
    snapshot_path: PathBuf,
}

impl<S: PriceSource, N: Notifier> DailyPnlJob<S, N> {
    pub fn new(source: S, notifier: N, quotes: &QuoteApiConfig, files: &DataFiles) -> Self {
        Self {
            source,
            notifier,
            symbols: quotes.symbols.clone(),
            quote_currency: quotes.quote_currency.clone(),
            store: PortfolioStore::new(files),
            history_writer: HistoryWriter::new(&files.history),
            snapshot_path: files.prices.clone(),
        }
    }

    /// Run every stage for `as_of`.
    ///
    /// Any failure before the report is pushed as an error notification and
    /// returned. A failed report push is returned without further
    /// notification. The ledger is only touched after a delivered report, and
    /// a failed append there is logged but does not fail the run.
    pub async fn run(&self, as_of: NaiveDate) -> Result<RunSummary> {
        info!("Starting daily valuation for {}", as_of);

        let (total_value, pnl) = match self.evaluate(as_of).await {
            Ok(result) => result,
            Err(err) => {
                error!("Run failed at {} stage: {}", err.stage(), err);
                self.report_failure(&err).await;
                return Err(err);
            }
        };

        let report = Report::success(total_value, &pnl, &self.quote_currency);
        self.notifier
            .notify(&report.title, &report.body)
            .await
            .map_err(|err| {
                let err = match err {
                    PnlError::DeliveryFailure(_) => err,
                    other => PnlError::DeliveryFailure(other.to_string()),
                };
                error!("Could not deliver report: {}", err);
                err
            })?;

        let snapshot = ValueSnapshot::new(as_of, total_value);
        let ledger_updated = match self.history_writer.append(&snapshot) {
            Ok(()) => true,
            Err(err) => {
                warn!("Could not write history: {}", err);
                false
            }
        };

        info!(
            "Run complete: value {} {}, daily {}, weekly {}, monthly {}",
            total_value, self.quote_currency, pnl.today, pnl.weekly, pnl.monthly
        );

        Ok(RunSummary {
            as_of,
            total_value,
            pnl,
            ledger_updated,
        })
    }

    async fn evaluate(&self, as_of: NaiveDate) -> Result<(Decimal, PnLResult)> {
        let quotes = self
            .source
            .fetch(&self.symbols, &self.quote_currency)
            .await?;
        info!("Received {} quotes", quotes.len());

        if let Err(err) = write_price_snapshot(&self.snapshot_path, &quotes) {
            warn!("Could not write price snapshot: {}", err);
        }

        let holdings = self.store.load_holdings()?;
        let total_value = ValuationEngine::compute_value(&quotes, &holdings)?;
        info!("Valued {} holdings at {}", holdings.len(), total_value);

        let history = self.store.load_history()?;
        let pnl = PnLCalculator::compute_pnl(&history, total_value, as_of)?;

        Ok((total_value, pnl))
    }

    async fn report_failure(&self, err: &PnlError) {
        let report = Report::failure(err);
        if let Err(push_err) = self.notifier.notify(&report.title, &report.body).await {
            error!("Could not deliver error report: {}", push_err);
        }
    }
}
