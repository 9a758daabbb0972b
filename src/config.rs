//! Command-line and environment configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::Amount;

/// Single-account ATM terminal backed by flat files.
#[derive(Debug, Clone, Parser)]
#[command(name = "atm-sim", version, about)]
pub struct Config {
    /// Directory holding the snapshot and ledger files.
    #[arg(long, env = "ATM_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Account snapshot file name, relative to the data directory.
    #[arg(long, env = "ATM_SNAPSHOT_FILE", default_value = "atm_data.txt")]
    pub snapshot_file: PathBuf,

    /// Transaction ledger file name, relative to the data directory.
    #[arg(long, env = "ATM_LEDGER_FILE", default_value = "transactions.txt")]
    pub ledger_file: PathBuf,

    /// Start with this much cash and deplete it on withdrawals, instead of
    /// drawing a random reserve for every attempt.
    #[arg(long, env = "ATM_CASH_RESERVE")]
    pub cash_reserve: Option<Amount>,
}

impl Config {
    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.data_dir.join(&self.ledger_file)
    }
}
