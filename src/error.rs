//! Error taxonomy for a daily valuation run.
//!
//! Every variant belongs to exactly one pipeline [`Stage`]. A stage has an
//! error code shown in notifications (`DailyPnL - ERROR 300`) and a separate
//! process exit status that fits the 0..=255 range a shell can observe.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, PnlError>;

#[derive(Debug, Error)]
pub enum PnlError {
    /// Connection error, timeout or non-2xx status from the quote API.
    #[error("Quote source connection failed: {0}")]
    SourceUnavailable(String),

    /// The quote API answered, but not with the JSON shape we expect.
    #[error("Unexpected JSON format from quote source: {0}")]
    SourceFormat(String),

    #[error("Required file not found: {}", .0.display())]
    MissingFile(PathBuf),

    /// A local CSV file exists but its header or rows are unusable.
    #[error("{} is malformed: {reason}", .path.display())]
    Schema { path: PathBuf, reason: String },

    /// Holdings without a quote. Lists every unmatched symbol.
    #[error("Price missing for: {}", .symbols.join(", "))]
    PriceMissing { symbols: Vec<String> },

    #[error("Valuation failed: {0}")]
    Calculation(String),

    #[error("Notification delivery failed: {0}")]
    DeliveryFailure(String),

    #[error("Could not write {}: {reason}", .path.display())]
    WriteFailure { path: PathBuf, reason: String },

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Pipeline step a failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    QuoteTransport,
    QuoteFormat,
    LocalFiles,
    Valuation,
    Notification,
}

/// Exit status for failures outside the pipeline taxonomy.
pub const GENERIC_FAILURE_STATUS: u8 = 1;

impl Stage {
    /// Code reported in error notifications and logs.
    pub fn error_code(self) -> u16 {
        match self {
            Stage::Config => 78,
            Stage::QuoteTransport => 100,
            Stage::QuoteFormat => 101,
            Stage::LocalFiles => 200,
            Stage::Valuation => 300,
            Stage::Notification => 400,
        }
    }

    /// Process exit status. Avoids 1 (generic failure) and 2 (usage error
    /// from the argument parser); 78 is `EX_CONFIG` from sysexits.
    pub fn process_status(self) -> u8 {
        match self {
            Stage::Config => 78,
            Stage::QuoteTransport => 10,
            Stage::QuoteFormat => 11,
            Stage::LocalFiles => 20,
            Stage::Valuation => 30,
            Stage::Notification => 40,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Config => "configuration",
            Stage::QuoteTransport => "quote transport",
            Stage::QuoteFormat => "quote format",
            Stage::LocalFiles => "local files",
            Stage::Valuation => "valuation",
            Stage::Notification => "notification",
        };
        f.write_str(label)
    }
}

impl PnlError {
    pub fn stage(&self) -> Stage {
        match self {
            PnlError::SourceUnavailable(_) => Stage::QuoteTransport,
            PnlError::SourceFormat(_) => Stage::QuoteFormat,
            PnlError::MissingFile(_)
            | PnlError::Schema { .. }
            | PnlError::WriteFailure { .. } => Stage::LocalFiles,
            PnlError::PriceMissing { .. } | PnlError::Calculation(_) => Stage::Valuation,
            PnlError::DeliveryFailure(_) => Stage::Notification,
            PnlError::Config(_) => Stage::Config,
        }
    }

    pub fn error_code(&self) -> u16 {
        self.stage().error_code()
    }

    pub fn process_status(&self) -> u8 {
        self.stage().process_status()
    }

    pub(crate) fn schema(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        PnlError::Schema {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub(crate) fn write_failure(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        PnlError::WriteFailure {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

/// Exit status for an error that reached the binary boundary. Pipeline errors
/// keep their stage status, even when wrapped in context.
pub fn exit_status(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<PnlError>()
        .map(PnlError::process_status)
        .unwrap_or(GENERIC_FAILURE_STATUS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    const STAGES: [Stage; 6] = [
        Stage::Config,
        Stage::QuoteTransport,
        Stage::QuoteFormat,
        Stage::LocalFiles,
        Stage::Valuation,
        Stage::Notification,
    ];

    #[test]
    fn test_error_codes_are_unique_per_stage() {
        let mut codes: Vec<u16> = STAGES.iter().map(|s| s.error_code()).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), STAGES.len());
        assert!(!codes.contains(&0));
    }

    #[test]
    fn test_process_statuses_are_distinct_and_observable() {
        // The shell sees `status & 0xff`; widen before masking so a
        // truncated value would show up as a mismatch.
        let statuses: Vec<u32> = STAGES
            .iter()
            .map(|s| u32::from(s.process_status()))
            .collect();
        for status in &statuses {
            assert_eq!(status & 0xff, *status);
            assert_ne!(*status, 0);
            assert_ne!(*status, u32::from(GENERIC_FAILURE_STATUS));
            // Reserved for argument parsing errors
            assert_ne!(*status, 2);
        }

        let mut unique = statuses.clone();
        unique.sort_unstable();
        unique.dedup();
        assert_eq!(unique.len(), STAGES.len());
    }

    #[test]
    fn test_error_maps_to_stage() {
        assert_eq!(PnlError::SourceUnavailable("timeout".into()).error_code(), 100);
        assert_eq!(PnlError::SourceFormat("no data".into()).error_code(), 101);
        assert_eq!(PnlError::MissingFile("quantities.csv".into()).error_code(), 200);
        assert_eq!(PnlError::schema("quantities.csv", "bad").error_code(), 200);
        assert_eq!(
            PnlError::PriceMissing { symbols: vec!["XRP".into()] }.error_code(),
            300
        );
        assert_eq!(PnlError::DeliveryFailure("401".into()).error_code(), 400);
        assert_eq!(PnlError::Config("CMC_API_KEY not set".into()).error_code(), 78);

        assert_eq!(PnlError::SourceUnavailable("timeout".into()).process_status(), 10);
        assert_eq!(PnlError::DeliveryFailure("401".into()).process_status(), 40);
        assert_eq!(PnlError::Config("CMC_API_KEY not set".into()).process_status(), 78);
    }

    #[test]
    fn test_exit_status_through_anyhow() {
        let plain: anyhow::Error = PnlError::PriceMissing {
            symbols: vec!["XRP".into()],
        }
        .into();
        assert_eq!(exit_status(&plain), 30);

        let wrapped = Err::<(), _>(PnlError::MissingFile("ledger.csv".into()))
            .context("Failed to rebase ledger.csv")
            .unwrap_err();
        assert_eq!(exit_status(&wrapped), 20);

        let foreign = anyhow::anyhow!("logger already initialised");
        assert_eq!(exit_status(&foreign), GENERIC_FAILURE_STATUS);
    }

    #[test]
    fn test_price_missing_lists_every_symbol() {
        let err = PnlError::PriceMissing {
            symbols: vec!["XRP".into(), "ADA".into()],
        };
        assert_eq!(err.to_string(), "Price missing for: XRP, ADA");
    }
}
