//! Core domain types for the ATM.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime, Timelike};

use crate::Amount;

/// A 4-digit numeric PIN (`1000..=9999`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pin(u16);

impl Pin {
    pub const DEFAULT: Pin = Pin(1234);

    /// Returns `None` unless the code renders as exactly 4 digits.
    pub fn new(code: u32) -> Option<Self> {
        (1000..=9999).contains(&code).then(|| Pin(code as u16))
    }

    pub fn matches(self, code: u32) -> bool {
        u32::from(self.0) == code
    }
}

impl Default for Pin {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of event recorded in the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionKind {
    Login,
    Logout,
    PinChange,
    BalanceCheck,
    Deposit,
    Withdrawal,
    Transfer,
    HistoryView,
    MiniStatement,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionKind::Login => "LOGIN",
            TransactionKind::Logout => "LOGOUT",
            TransactionKind::PinChange => "PIN_CHANGE",
            TransactionKind::BalanceCheck => "BALANCE_CHECK",
            TransactionKind::Deposit => "DEPOSIT",
            TransactionKind::Withdrawal => "WITHDRAWAL",
            TransactionKind::Transfer => "TRANSFER",
            TransactionKind::HistoryView => "HISTORY_VIEW",
            TransactionKind::MiniStatement => "MINI_STATEMENT",
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransactionKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "LOGIN" => TransactionKind::Login,
            "LOGOUT" => TransactionKind::Logout,
            "PIN_CHANGE" => TransactionKind::PinChange,
            "BALANCE_CHECK" => TransactionKind::BalanceCheck,
            "DEPOSIT" => TransactionKind::Deposit,
            "WITHDRAWAL" => TransactionKind::Withdrawal,
            "TRANSFER" => TransactionKind::Transfer,
            "HISTORY_VIEW" => TransactionKind::HistoryView,
            "MINI_STATEMENT" => TransactionKind::MiniStatement,
            other => return Err(format!("unknown transaction type '{other}'")),
        })
    }
}

/// One immutable line of the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRecord {
    /// Local wall-clock time, second resolution.
    pub timestamp: NaiveDateTime,
    pub kind: TransactionKind,
    /// Zero for non-financial events.
    pub amount: Amount,
    pub description: String,
}

impl TransactionRecord {
    /// Create a record stamped with the current local time.
    pub fn now(kind: TransactionKind, amount: Amount, description: impl Into<String>) -> Self {
        let now = Local::now().naive_local();
        Self {
            timestamp: now.with_nanosecond(0).unwrap_or(now),
            kind,
            amount,
            description: description.into(),
        }
    }
}

/// Recipient details and amount of an inter-bank transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferRequest {
    pub account_number: String,
    pub recipient: String,
    pub ifsc: String,
    pub amount: Amount,
}

/// Notes dispensed for a withdrawal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NoteBreakdown {
    pub two_thousands: u32,
    pub five_hundreds: u32,
    pub hundreds: u32,
}

impl NoteBreakdown {
    /// Note face values, largest first.
    pub const DENOMINATIONS: [i64; 3] = [2000, 500, 100];

    /// Greedy largest-first decomposition of `amount`.
    ///
    /// Returns `None` when a remainder is left over, i.e. the amount is not
    /// a whole multiple of the smallest note.
    pub fn greedy(amount: Amount) -> Option<Self> {
        let mut rest = amount.scaled();
        let mut counts = [0u32; 3];
        for (count, note) in counts.iter_mut().zip(Self::DENOMINATIONS) {
            let note = Amount::from_units(note).scaled();
            *count = u32::try_from(rest / note).ok()?;
            rest %= note;
        }

        (rest == 0).then_some(NoteBreakdown {
            two_thousands: counts[0],
            five_hundreds: counts[1],
            hundreds: counts[2],
        })
    }

    /// `(face value, count)` pairs, largest first, including zero counts.
    pub fn notes(&self) -> [(i64, u32); 3] {
        [
            (2000, self.two_thousands),
            (500, self.five_hundreds),
            (100, self.hundreds),
        ]
    }

    pub fn total(&self) -> Amount {
        self.notes()
            .into_iter()
            .map(|(face, count)| Amount::from_units(face * i64::from(count)))
            .fold(Amount::ZERO, |acc, a| acc + a)
    }
}
