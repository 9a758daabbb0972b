//! ATM session controller.
//!
//! Holds the account and the login state, runs every request through the
//! validator, persists the snapshot after each mutation and records
//! successful operations in the ledger. Rejected requests leave no trace in
//! the snapshot or the ledger.

use std::fmt;

use tracing::{info, warn};

use crate::Amount;
use crate::ledger::Ledger;
use crate::model::{NoteBreakdown, TransactionKind, TransactionRecord, TransferRequest};
use crate::store::SnapshotStore;

mod cash;
pub use cash::{CashPolicy, CashReserve, RandomCashReserve, TrackedCashReserve};

mod error;
pub use error::{AtmError, DepositError, PinChangeError, TransferError, WithdrawalError};

mod state;
pub use state::{Account, Session};

pub mod validate;

/// Number of records on a mini statement.
pub const MINI_STATEMENT_LEN: usize = 5;

/// The ATM state machine over a single account.
pub struct Atm<C = CashPolicy> {
    account: Account,
    session: Session,
    store: SnapshotStore,
    ledger: Ledger,
    cash: C,
}

/// Public API
impl<C: CashReserve> Atm<C> {
    /// Load the account from `store` and start logged out.
    pub fn open(store: SnapshotStore, ledger: Ledger, cash: C) -> Self {
        let account = Account::load(&store);
        Self {
            account,
            session: Session::LoggedOut,
            store,
            ledger,
            cash,
        }
    }

    pub fn account(&self) -> &Account {
        &self.account
    }

    pub fn session(&self) -> Session {
        self.session
    }

    pub fn balance(&self) -> Amount {
        self.account.balance
    }

    pub fn login(&mut self, pin: u32) -> Result<(), AtmError> {
        let result = self.apply_login(pin);
        Self::log_result("login", None, &result);
        result?;
        self.record(TransactionKind::Login, Amount::ZERO, "User logged in");
        Ok(())
    }

    pub fn logout(&mut self) -> Result<(), AtmError> {
        self.require_login()?;
        self.session = Session::LoggedOut;
        info!("logout applied");
        self.record(TransactionKind::Logout, Amount::ZERO, "User logged out");
        Ok(())
    }

    /// Change the PIN. Allowed without logging in, given the current PIN.
    pub fn change_pin(&mut self, current: u32, new: u32, confirm: u32) -> Result<(), AtmError> {
        let result = validate::pin_change(self.account.pin, current, new, confirm);
        Self::log_result("pin change", None, &result);
        self.account.pin = result?;
        self.persist();
        self.record(TransactionKind::PinChange, Amount::ZERO, "PIN updated");
        Ok(())
    }

    pub fn check_balance(&mut self) -> Result<Amount, AtmError> {
        self.require_login()?;
        self.record(TransactionKind::BalanceCheck, Amount::ZERO, "Balance inquiry");
        Ok(self.account.balance)
    }

    /// Deposit cash, returning the new balance.
    pub fn deposit(&mut self, amount: Amount) -> Result<Amount, AtmError> {
        self.require_login()?;
        let result = validate::deposit(amount, self.account.balance);
        Self::log_result("deposit", Some(amount), &result);

        self.account.credit(result?);
        self.persist();
        self.record(TransactionKind::Deposit, amount, "Cash deposit");
        Ok(self.account.balance)
    }

    /// Withdraw cash, returning the notes paid out.
    pub fn withdraw(&mut self, amount: Amount) -> Result<NoteBreakdown, AtmError> {
        self.require_login()?;
        let result = validate::withdrawal(amount, self.account.balance, &mut self.cash);
        Self::log_result("withdrawal", Some(amount), &result);
        let notes = result?;

        self.account.debit(amount);
        self.cash.dispensed(amount);
        self.persist();
        self.record(TransactionKind::Withdrawal, amount, "Cash withdrawal");
        Ok(notes)
    }

    /// Transfer to another bank account.
    ///
    /// `confirm` is asked only once the request has passed validation; a
    /// `false` answer cancels the transfer with [`AtmError::UserCancelled`].
    pub fn transfer(
        &mut self,
        request: &TransferRequest,
        confirm: impl FnOnce(&TransferRequest) -> bool,
    ) -> Result<Amount, AtmError> {
        self.require_login()?;
        let result = validate::transfer(request, self.account.balance);
        Self::log_result("transfer", Some(request.amount), &result);
        result?;

        if !confirm(request) {
            info!(amount = %request.amount, "transfer cancelled");
            return Err(AtmError::UserCancelled);
        }

        self.account.debit(request.amount);
        self.persist();
        self.record(
            TransactionKind::Transfer,
            request.amount,
            format!(
                "Transfer to {} ({})",
                request.recipient, request.account_number
            ),
        );
        Ok(self.account.balance)
    }

    /// All ledger records, oldest first.
    ///
    /// The view itself is recorded even when reading the ledger fails.
    pub fn history(&mut self) -> Result<Vec<TransactionRecord>, AtmError> {
        self.require_login()?;
        let records = self.ledger.read_all();
        self.record(
            TransactionKind::HistoryView,
            Amount::ZERO,
            "Viewed transaction history",
        );
        Ok(records?)
    }

    /// Current balance and the last [`MINI_STATEMENT_LEN`] records.
    pub fn mini_statement(&mut self) -> Result<(Amount, Vec<TransactionRecord>), AtmError> {
        self.require_login()?;
        let records = self.ledger.read_last(MINI_STATEMENT_LEN);
        self.record(
            TransactionKind::MiniStatement,
            Amount::ZERO,
            "Viewed mini statement",
        );
        Ok((self.account.balance, records?))
    }

    /// Final save before the process ends.
    pub fn exit(&mut self) {
        info!("exiting");
        self.persist();
    }
}

/// Private API
impl<C: CashReserve> Atm<C> {
    /// Small helper to log operation results
    fn log_result<T, E: fmt::Display>(op: &str, amount: Option<Amount>, result: &Result<T, E>) {
        match (result, amount) {
            (Ok(_), Some(amt)) => info!(amount = %amt, "{op} applied"),
            (Ok(_), None) => info!("{op} applied"),
            (Err(e), Some(amt)) => info!(amount = %amt, reason = %e, "{op} rejected"),
            (Err(e), None) => info!(reason = %e, "{op} rejected"),
        }
    }

    fn apply_login(&mut self, pin: u32) -> Result<(), AtmError> {
        if self.session.is_logged_in() {
            return Err(AtmError::AlreadyLoggedIn);
        }
        if !self.account.pin.matches(pin) {
            return Err(AtmError::IncorrectPin);
        }
        self.session = Session::LoggedIn;
        Ok(())
    }

    fn require_login(&self) -> Result<(), AtmError> {
        if self.session.is_logged_in() {
            Ok(())
        } else {
            Err(AtmError::NotLoggedIn)
        }
    }

    /// Save the snapshot; a failure leaves the in-memory change in place.
    fn persist(&self) {
        if let Err(e) = self.store.save(&self.account) {
            warn!(error = %e, "failed to save account snapshot");
        }
    }

    fn record(&self, kind: TransactionKind, amount: Amount, description: impl Into<String>) {
        let record = TransactionRecord::now(kind, amount, description);
        if let Err(e) = self.ledger.append(&record) {
            warn!(error = %e, %kind, "failed to log transaction");
        }
    }
}
