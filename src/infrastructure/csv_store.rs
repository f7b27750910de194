//! CSV files the pipeline owns: the holdings table, the value ledger and
//! the price snapshot.
//!
//! No locking is done. At most one run per day is expected.

use csv::{ReaderBuilder, StringRecord, Terminator, Trim, WriterBuilder};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::DataFiles;
use crate::domain::{parse_ledger_date, Holding, QuoteBook, ValueSnapshot};
use crate::error::{PnlError, Result};

pub const HOLDINGS_COLUMNS: [&str; 2] = ["Currency", "Quantity"];
pub const HISTORY_COLUMNS: [&str; 2] = ["Date", "Value"];
pub const SNAPSHOT_COLUMNS: [&str; 3] = ["Currency", "Convert To", "Price"];

#[derive(Debug, Deserialize)]
struct LedgerRow {
    #[serde(rename = "Date")]
    date: String,
    #[serde(rename = "Value")]
    value: Decimal,
}

/// Read access to the holdings table and the value ledger.
#[derive(Debug, Clone)]
pub struct PortfolioStore {
    holdings_path: PathBuf,
    history_path: PathBuf,
}

impl PortfolioStore {
    pub fn new(files: &DataFiles) -> Self {
        Self {
            holdings_path: files.holdings.clone(),
            history_path: files.history.clone(),
        }
    }

    /// Holdings in file order. A missing file or missing column is fatal.
    pub fn load_holdings(&self) -> Result<Vec<Holding>> {
        let path = &self.holdings_path;
        let mut reader = open_table(path, &HOLDINGS_COLUMNS)?;

        let mut holdings = Vec::new();
        for (idx, row) in reader.deserialize::<Holding>().enumerate() {
            let mut holding =
                row.map_err(|e| PnlError::schema(path, format!("row {}: {}", idx + 1, e)))?;
            holding.symbol = holding.symbol.trim().to_uppercase();
            if holding.symbol.is_empty() {
                return Err(PnlError::schema(
                    path,
                    format!("row {}: empty Currency", idx + 1),
                ));
            }
            holdings.push(holding);
        }

        debug!("Loaded {} holdings from {}", holdings.len(), path.display());
        Ok(holdings)
    }

    /// Ledger entries in append order. A ledger that does not exist yet, or
    /// is empty, is an empty history.
    pub fn load_history(&self) -> Result<Vec<ValueSnapshot>> {
        let path = &self.history_path;
        if is_missing_or_empty(path).map_err(|e| PnlError::schema(path, e))? {
            info!("No history at {}, starting fresh", path.display());
            return Ok(Vec::new());
        }

        let history = read_ledger(path)?
            .into_iter()
            .map(|(date, value)| {
                parse_ledger_date(&date)
                    .map(|date| ValueSnapshot::new(date, value))
                    .ok_or_else(|| PnlError::schema(path, format!("unreadable date {:?}", date)))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!("Loaded {} history entries from {}", history.len(), path.display());
        Ok(history)
    }
}

/// Appends one row per successful run to the value ledger.
#[derive(Debug, Clone)]
pub struct HistoryWriter {
    path: PathBuf,
}

impl HistoryWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append `snapshot`, writing the header first if the ledger is new.
    pub fn append(&self, snapshot: &ValueSnapshot) -> Result<()> {
        let path = &self.path;
        let needs_header =
            is_missing_or_empty(path).map_err(|e| PnlError::write_failure(path, e))?;

        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(path)
            .map_err(|e| PnlError::write_failure(path, e))?;

        let terminated =
            ends_with_newline(&mut file).map_err(|e| PnlError::write_failure(path, e))?;
        if !needs_header && !terminated {
            file.write_all(b"\n")
                .map_err(|e| PnlError::write_failure(path, e))?;
        }

        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(file);

        if needs_header {
            writer
                .write_record(HISTORY_COLUMNS)
                .map_err(|e| PnlError::write_failure(path, e))?;
        }
        writer
            .write_record([snapshot.ledger_date(), snapshot.ledger_value().to_string()])
            .map_err(|e| PnlError::write_failure(path, e))?;
        writer.flush().map_err(|e| PnlError::write_failure(path, e))?;

        info!(
            "Recorded {} = {} in {}",
            snapshot.ledger_date(),
            snapshot.ledger_value(),
            path.display()
        );
        Ok(())
    }
}

/// Overwrite the price snapshot with the quotes of the latest fetch.
pub fn write_price_snapshot(path: &Path, quotes: &QuoteBook) -> Result<()> {
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .terminator(Terminator::Any(b'\n'))
        .from_path(path)
        .map_err(|e| PnlError::write_failure(path, e))?;

    writer
        .write_record(SNAPSHOT_COLUMNS)
        .map_err(|e| PnlError::write_failure(path, e))?;
    for quote in quotes.iter() {
        writer
            .serialize(quote)
            .map_err(|e| PnlError::write_failure(path, e))?;
    }
    writer.flush().map_err(|e| PnlError::write_failure(path, e))?;

    debug!("Wrote {} prices to {}", quotes.len(), path.display());
    Ok(())
}

/// Shift every ledger value by `offset` and rewrite the ledger.
///
/// Used after capital is added or withdrawn so that later deltas reflect
/// market movement only. Dates are kept exactly as written. Returns the
/// number of rows rewritten.
pub fn rebase_history(path: &Path, offset: i64) -> Result<usize> {
    if !path.exists() {
        return Err(PnlError::MissingFile(path.to_path_buf()));
    }
    let rows = read_ledger(path)?;
    let offset = Decimal::from(offset);

    let tmp_path = sibling_tmp_path(path);
    let result = (|| -> Result<()> {
        let mut writer = WriterBuilder::new()
            .has_headers(false)
            .terminator(Terminator::Any(b'\n'))
            .from_path(&tmp_path)
            .map_err(|e| PnlError::write_failure(&tmp_path, e))?;

        writer
            .write_record(HISTORY_COLUMNS)
            .map_err(|e| PnlError::write_failure(&tmp_path, e))?;
        for (date, value) in &rows {
            let shifted = value
                .checked_add(offset)
                .ok_or_else(|| PnlError::Calculation(format!("Offset overflow on {}", date)))?;
            writer
                .write_record([date.clone(), shifted.round().to_string()])
                .map_err(|e| PnlError::write_failure(&tmp_path, e))?;
        }
        writer
            .flush()
            .map_err(|e| PnlError::write_failure(&tmp_path, e))?;
        drop(writer);

        fs::rename(&tmp_path, path).map_err(|e| PnlError::write_failure(path, e))
    })();

    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result?;

    info!("Shifted {} ledger rows by {}", rows.len(), offset);
    Ok(rows.len())
}

/// Open a CSV table and check that `required` headers are present.
fn open_table(path: &Path, required: &[&str]) -> Result<csv::Reader<File>> {
    if !path.exists() {
        return Err(PnlError::MissingFile(path.to_path_buf()));
    }

    let mut reader = ReaderBuilder::new()
        .trim(Trim::All)
        .from_path(path)
        .map_err(|e| PnlError::schema(path, e))?;

    let headers = reader
        .headers()
        .map_err(|e| PnlError::schema(path, e))?
        .clone();
    check_columns(path, &headers, required)?;

    Ok(reader)
}

fn check_columns(path: &Path, headers: &StringRecord, required: &[&str]) -> Result<()> {
    let missing: Vec<&str> = required
        .iter()
        .filter(|column| !headers.iter().any(|h| h == **column))
        .copied()
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(PnlError::schema(
            path,
            format!("missing columns: {}", missing.join(", ")),
        ))
    }
}

/// Raw ledger rows: the date text as written, and the value.
fn read_ledger(path: &Path) -> Result<Vec<(String, Decimal)>> {
    let mut reader = open_table(path, &HISTORY_COLUMNS)?;

    let rows = reader
        .deserialize::<LedgerRow>()
        .enumerate()
        .map(|(idx, row)| {
            row.map(|row| (row.date, row.value))
                .map_err(|e| PnlError::schema(path, format!("row {}: {}", idx + 1, e)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(rows)
}

/// Only an absent or zero-length file counts as empty. Other I/O errors
/// are returned.
fn is_missing_or_empty(path: &Path) -> std::io::Result<bool> {
    match fs::metadata(path) {
        Ok(meta) => Ok(meta.len() == 0),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(true),
        Err(e) => Err(e),
    }
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(true);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn sibling_tmp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "ledger".to_string());
    path.with_file_name(format!(".{}.tmp", name))
}
