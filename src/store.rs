//! Persistence of the account snapshot.
//!
//! The snapshot is two lines, `BALANCE:<decimal>` and `PIN:<integer>`, and is
//! replaced as a whole on every save.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::Amount;
use crate::atm::Account;
use crate::model::Pin;

const BALANCE_KEY: &str = "BALANCE:";
const PIN_KEY: &str = "PIN:";

/// Errors that can occur when reading or writing the snapshot.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("snapshot {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("snapshot {path}, line {line}: {reason}")]
    Malformed {
        path: PathBuf,
        line: usize,
        reason: String,
    },
}

/// File-backed, last-write-wins account snapshot.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the snapshot, or `None` if it has never been written.
    ///
    /// Unknown lines are ignored and a missing field keeps its default.
    pub fn load(&self) -> Result<Option<Account>, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(self.io_error(source)),
        };

        let mut account = Account::default();
        for (idx, line) in content.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if let Some(value) = line.strip_prefix(BALANCE_KEY) {
                let balance: Amount = value
                    .parse()
                    .map_err(|e| self.malformed(line_no, format!("{e}")))?;
                if balance < Amount::ZERO {
                    return Err(self.malformed(line_no, format!("negative balance {balance}")));
                }
                if balance > Account::MAX_BALANCE {
                    return Err(self.malformed(line_no, format!("balance {balance} out of range")));
                }
                account.balance = balance;
            } else if let Some(value) = line.strip_prefix(PIN_KEY) {
                account.pin = value
                    .trim()
                    .parse::<u32>()
                    .ok()
                    .and_then(Pin::new)
                    .ok_or_else(|| self.malformed(line_no, format!("invalid PIN '{value}'")))?;
            }
        }

        Ok(Some(account))
    }

    /// Replace the snapshot with `account`.
    ///
    /// The content is written to a temporary file next to the snapshot and
    /// renamed over it, so readers see either the old or the new snapshot.
    pub fn save(&self, account: &Account) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut file = NamedTempFile::new_in(dir).map_err(|e| self.io_error(e))?;
        write!(
            file,
            "{BALANCE_KEY}{}\n{PIN_KEY}{}\n",
            account.balance, account.pin
        )
        .and_then(|()| file.as_file().sync_all())
        .map_err(|e| self.io_error(e))?;
        file.persist(&self.path)
            .map_err(|e| self.io_error(e.error))?;

        Ok(())
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }

    fn malformed(&self, line: usize, reason: String) -> StoreError {
        StoreError::Malformed {
            path: self.path.clone(),
            line,
            reason,
        }
    }
}
