use std::io;
use std::process::ExitCode;

use atm_sim::atm::{Atm, CashPolicy};
use atm_sim::config::Config;
use atm_sim::console::Console;
use atm_sim::ledger::Ledger;
use atm_sim::store::SnapshotStore;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let config = Config::parse();
    info!(
        snapshot = %config.snapshot_path().display(),
        ledger = %config.ledger_path().display(),
        "starting"
    );

    let mut atm = Atm::open(
        SnapshotStore::new(config.snapshot_path()),
        Ledger::new(config.ledger_path()),
        CashPolicy::from_config(config.cash_reserve),
    );

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stdout());
    match console.run(&mut atm) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
