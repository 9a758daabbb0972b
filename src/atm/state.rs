use tracing::warn;

use crate::Amount;
use crate::model::Pin;
use crate::store::SnapshotStore;

/// The single account served by the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub balance: Amount,
    pub pin: Pin,
}

impl Account {
    pub const DEFAULT_BALANCE: Amount = Amount::from_units(10_000);

    /// Highest balance the account may hold.
    pub const MAX_BALANCE: Amount = Amount::from_units(1_000_000_000_000_000);

    /// Load the persisted snapshot.
    ///
    /// A missing snapshot is initialized with the defaults and written
    /// immediately; an unreadable one falls back to the defaults in memory.
    pub fn load(store: &SnapshotStore) -> Self {
        match store.load() {
            Ok(Some(account)) => account,
            Ok(None) => {
                let account = Account::default();
                if let Err(e) = store.save(&account) {
                    warn!(error = %e, "failed to write initial account snapshot");
                }
                account
            }
            Err(e) => {
                warn!(error = %e, "failed to load account snapshot, using defaults");
                Account::default()
            }
        }
    }

    /// Callers validate against [`Account::MAX_BALANCE`] first.
    pub fn credit(&mut self, amount: Amount) {
        self.balance += amount;
    }

    /// Callers validate against the balance first.
    pub fn debit(&mut self, amount: Amount) {
        debug_assert!(amount <= self.balance, "debit below zero");
        self.balance -= amount;
    }
}

impl Default for Account {
    fn default() -> Self {
        Self {
            balance: Self::DEFAULT_BALANCE,
            pin: Pin::DEFAULT,
        }
    }
}

/// Login state of the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Session {
    #[default]
    LoggedOut,
    LoggedIn,
}

impl Session {
    pub fn is_logged_in(self) -> bool {
        self == Session::LoggedIn
    }
}
