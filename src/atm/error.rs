//! Error types for ATM operations.

use thiserror::Error;

use crate::Amount;
use crate::ledger::LedgerError;

/// Top-level error returned by the [`Atm`](super::Atm) operations.
#[derive(Debug, Error)]
pub enum AtmError {
    #[error("please log in first")]
    NotLoggedIn,

    #[error("already logged in")]
    AlreadyLoggedIn,

    #[error("invalid PIN")]
    IncorrectPin,

    #[error("transfer cancelled")]
    UserCancelled,

    #[error("deposit failed: {0}")]
    Deposit(#[from] DepositError),

    #[error("withdrawal failed: {0}")]
    Withdrawal(#[from] WithdrawalError),

    #[error("transfer failed: {0}")]
    Transfer(#[from] TransferError),

    #[error("PIN change failed: {0}")]
    PinChange(#[from] PinChangeError),

    #[error("error reading transactions: {0}")]
    Ledger(#[from] LedgerError),
}

/// Error during deposit validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DepositError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("deposit limit exceeded, maximum is {} per transaction", .0.to_rupees())]
    LimitExceeded(Amount),
    #[error("amount must be a multiple of 100 (notes of 100, 500, 2000)")]
    InvalidDenomination,
    #[error("balance would exceed {}", .0.to_rupees())]
    BalanceLimitExceeded(Amount),
}

/// Error during withdrawal validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WithdrawalError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("insufficient funds: available {}, requested {}", .0.to_rupees(), .1.to_rupees())]
    InsufficientFunds(Amount, Amount),
    #[error("withdrawal limit exceeded, maximum is {} per transaction", .0.to_rupees())]
    LimitExceeded(Amount),
    #[error("amount must be a multiple of 100 (notes of 100, 500, 2000)")]
    InvalidDenomination,
    #[error("ATM cash limit exceeded, please try a smaller amount")]
    CashUnavailable,
}

/// Error during transfer validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransferError {
    #[error("amount must be greater than zero")]
    NonPositiveAmount,
    #[error("insufficient funds: available {}, requested {}", .0.to_rupees(), .1.to_rupees())]
    InsufficientFunds(Amount, Amount),
    #[error("transfer limit exceeded, maximum is {} per transaction", .0.to_rupees())]
    LimitExceeded(Amount),
    #[error("invalid account number '{0}', must be 11 digits")]
    InvalidAccountNumber(String),
    #[error("invalid IFSC code '{0}', expected format ABCD0123456")]
    InvalidIfsc(String),
}

/// Error during PIN change validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PinChangeError {
    #[error("incorrect current PIN")]
    WrongCurrentPin,
    #[error("PIN must be 4 digits")]
    InvalidPinFormat,
    #[error("PINs don't match")]
    PinMismatch,
}
