//! Append-only transaction ledger.
//!
//! One record per line, `timestamp|type|amount|description`, for example
//! `2024-05-01 09:30:00|DEPOSIT|500.00|Cash deposit`.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;
use tracing::debug;

use crate::Amount;
use crate::model::{TransactionKind, TransactionRecord};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const DELIMITER: u8 = b'|';

/// Errors that can occur when reading or appending ledger records.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("ledger {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("ledger {path}: {source}")]
    Csv { path: PathBuf, source: csv::Error },
}

#[derive(Debug, Serialize)]
struct LedgerRow<'a> {
    timestamp: String,
    r#type: &'a str,
    amount: String,
    description: String,
}

/// File-backed ledger; the file is created on first append.
#[derive(Debug, Clone)]
pub struct Ledger {
    path: PathBuf,
}

impl Ledger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record at the end of the ledger.
    pub fn append(&self, record: &TransactionRecord) -> Result<(), LedgerError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| self.io_error(source))?;

        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .quote_style(csv::QuoteStyle::Never)
            .from_writer(file);

        let row = LedgerRow {
            timestamp: record.timestamp.format(TIMESTAMP_FORMAT).to_string(),
            r#type: record.kind.as_str(),
            amount: record.amount.to_string(),
            description: sanitize(&record.description),
        };
        writer
            .serialize(&row)
            .map_err(|source| self.csv_error(source))?;
        writer.flush().map_err(|source| self.io_error(source))?;

        Ok(())
    }

    /// Every readable record, oldest first. A missing ledger is empty.
    ///
    /// Lines with fewer than four fields, or whose timestamp, type or amount
    /// does not parse, are skipped.
    pub fn read_all(&self) -> Result<Vec<TransactionRecord>, LedgerError> {
        let reader = match csv::ReaderBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .flexible(true)
            .quoting(false)
            .from_path(&self.path)
        {
            Ok(reader) => reader,
            Err(e) => {
                if let csv::ErrorKind::Io(io) = e.kind() {
                    if io.kind() == io::ErrorKind::NotFound {
                        return Ok(Vec::new());
                    }
                }
                return Err(self.csv_error(e));
            }
        };

        let mut records = Vec::new();
        for result in reader.into_byte_records() {
            let row = result.map_err(|source| self.csv_error(source))?;
            match parse_row(&row) {
                Some(record) => records.push(record),
                None => debug!(
                    line = row.position().map(|p| p.line()),
                    "skipping malformed ledger line"
                ),
            }
        }

        Ok(records)
    }

    /// The last `n` records, oldest first.
    pub fn read_last(&self, n: usize) -> Result<Vec<TransactionRecord>, LedgerError> {
        let mut records = self.read_all()?;
        let start = records.len().saturating_sub(n);
        Ok(records.split_off(start))
    }

    fn io_error(&self, source: io::Error) -> LedgerError {
        LedgerError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn csv_error(&self, source: csv::Error) -> LedgerError {
        LedgerError::Csv {
            path: self.path.clone(),
            source,
        }
    }
}

fn parse_row(row: &csv::ByteRecord) -> Option<TransactionRecord> {
    if row.len() < 4 {
        return None;
    }
    let field = |idx: usize| std::str::from_utf8(row.get(idx)?).ok();
    Some(TransactionRecord {
        timestamp: NaiveDateTime::parse_from_str(field(0)?.trim(), TIMESTAMP_FORMAT).ok()?,
        kind: field(1)?.trim().parse().ok()?,
        amount: field(2)?.parse::<Amount>().ok()?,
        description: field(3)?.to_string(),
    })
}

/// Keep a description on one line and inside its field.
fn sanitize(description: &str) -> String {
    description
        .chars()
        .map(|c| match c {
            '|' | '\n' | '\r' => ' ',
            c => c,
        })
        .collect()
}
