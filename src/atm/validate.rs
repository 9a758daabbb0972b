//! Pure business rules checked before the account is touched.
//!
//! Only the withdrawal cash check reaches outside its arguments, through the
//! supplied [`CashReserve`].

use std::sync::LazyLock;

use regex::Regex;

use super::cash::CashReserve;
use super::error::{DepositError, PinChangeError, TransferError, WithdrawalError};
use super::state::Account;
use crate::Amount;
use crate::model::{NoteBreakdown, Pin, TransferRequest};

pub const DEPOSIT_LIMIT: Amount = Amount::from_units(50_000);
pub const WITHDRAWAL_LIMIT: Amount = Amount::from_units(25_000);
pub const TRANSFER_LIMIT: Amount = Amount::from_units(100_000);

/// Smallest note; cash amounts must be whole multiples of it.
const NOTE_UNIT: i64 = 100;

static ACCOUNT_NUMBER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{11}$").expect("invalid account number pattern"));

static IFSC_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Z]{4}0[0-9]{6}$").expect("invalid IFSC pattern"));

/// Validate a cash deposit onto `balance`, returning the amount to credit.
pub fn deposit(amount: Amount, balance: Amount) -> Result<Amount, DepositError> {
    if !amount.is_positive() {
        return Err(DepositError::NonPositiveAmount);
    }
    if amount > DEPOSIT_LIMIT {
        return Err(DepositError::LimitExceeded(DEPOSIT_LIMIT));
    }
    if !amount.is_multiple_of(NOTE_UNIT) {
        return Err(DepositError::InvalidDenomination);
    }
    if balance
        .checked_add(amount)
        .is_none_or(|total| total > Account::MAX_BALANCE)
    {
        return Err(DepositError::BalanceLimitExceeded(Account::MAX_BALANCE));
    }
    Ok(amount)
}

/// Validate a cash withdrawal against the balance and the machine's cash,
/// returning the notes to dispense.
pub fn withdrawal(
    amount: Amount,
    balance: Amount,
    cash: &mut impl CashReserve,
) -> Result<NoteBreakdown, WithdrawalError> {
    if !amount.is_positive() {
        return Err(WithdrawalError::NonPositiveAmount);
    }
    if amount > WITHDRAWAL_LIMIT {
        return Err(WithdrawalError::LimitExceeded(WITHDRAWAL_LIMIT));
    }
    if amount > balance {
        return Err(WithdrawalError::InsufficientFunds(balance, amount));
    }
    if !amount.is_multiple_of(NOTE_UNIT) {
        return Err(WithdrawalError::InvalidDenomination);
    }
    // sampled last so rejected requests never consume a draw
    if !cash.covers(amount) {
        return Err(WithdrawalError::CashUnavailable);
    }
    NoteBreakdown::greedy(amount).ok_or(WithdrawalError::InvalidDenomination)
}

/// Validate an inter-bank transfer.
pub fn transfer(request: &TransferRequest, balance: Amount) -> Result<(), TransferError> {
    let amount = request.amount;
    if !amount.is_positive() {
        return Err(TransferError::NonPositiveAmount);
    }
    if amount > TRANSFER_LIMIT {
        return Err(TransferError::LimitExceeded(TRANSFER_LIMIT));
    }
    if amount > balance {
        return Err(TransferError::InsufficientFunds(balance, amount));
    }
    if !is_account_number(&request.account_number) {
        return Err(TransferError::InvalidAccountNumber(
            request.account_number.clone(),
        ));
    }
    if !is_ifsc(&request.ifsc) {
        return Err(TransferError::InvalidIfsc(request.ifsc.clone()));
    }
    Ok(())
}

/// Validate a PIN change, returning the new PIN.
pub fn pin_change(stored: Pin, current: u32, new: u32, confirm: u32) -> Result<Pin, PinChangeError> {
    if !stored.matches(current) {
        return Err(PinChangeError::WrongCurrentPin);
    }
    let pin = Pin::new(new).ok_or(PinChangeError::InvalidPinFormat)?;
    if new != confirm {
        return Err(PinChangeError::PinMismatch);
    }
    Ok(pin)
}

/// Exactly 11 ASCII digits.
pub fn is_account_number(value: &str) -> bool {
    ACCOUNT_NUMBER_PATTERN.is_match(value)
}

/// Four uppercase letters, a literal `0`, then six digits.
pub fn is_ifsc(value: &str) -> bool {
    IFSC_PATTERN.is_match(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const START: Amount = Account::DEFAULT_BALANCE;

    fn units(n: i64) -> Amount {
        Amount::from_units(n)
    }

    fn plenty(_: Amount) -> bool {
        true
    }

    fn empty(_: Amount) -> bool {
        false
    }

    fn request(amount: i64, account: &str, ifsc: &str) -> TransferRequest {
        TransferRequest {
            account_number: account.to_string(),
            recipient: "Asha".to_string(),
            ifsc: ifsc.to_string(),
            amount: units(amount),
        }
    }

    // Deposit

    #[test]
    fn deposit_accepts_valid_amount() {
        assert_eq!(deposit(units(500), START), Ok(units(500)));
        assert_eq!(deposit(units(50_000), START), Ok(units(50_000)));
    }

    #[test]
    fn deposit_rejects_non_positive() {
        assert_eq!(deposit(Amount::ZERO, START), Err(DepositError::NonPositiveAmount));
        assert_eq!(deposit(units(-100), START), Err(DepositError::NonPositiveAmount));
    }

    #[test]
    fn deposit_rejects_over_limit() {
        assert_eq!(
            deposit(units(50_100), START),
            Err(DepositError::LimitExceeded(DEPOSIT_LIMIT))
        );
    }

    #[test]
    fn deposit_rejects_odd_denomination() {
        assert_eq!(deposit(units(150), START), Err(DepositError::InvalidDenomination));
        assert_eq!(
            deposit(Amount::from_scaled(10_050), START),
            Err(DepositError::InvalidDenomination)
        );
    }

    #[test]
    fn deposit_rejects_balance_past_ceiling() {
        assert_eq!(
            deposit(units(100), Account::MAX_BALANCE),
            Err(DepositError::BalanceLimitExceeded(Account::MAX_BALANCE))
        );
        assert_eq!(
            deposit(units(100), Amount::from_scaled(i64::MAX - 1)),
            Err(DepositError::BalanceLimitExceeded(Account::MAX_BALANCE))
        );
        assert_eq!(
            deposit(units(100), Account::MAX_BALANCE - units(100)),
            Ok(units(100))
        );
    }

    // Withdrawal

    #[test]
    fn withdrawal_returns_note_breakdown() {
        let notes = withdrawal(units(2_600), units(10_000), &mut plenty).unwrap();
        assert_eq!(
            notes,
            NoteBreakdown {
                two_thousands: 1,
                five_hundreds: 1,
                hundreds: 1
            }
        );
    }

    #[test]
    fn withdrawal_checks_in_order() {
        let balance = units(10_500);
        assert_eq!(
            withdrawal(Amount::ZERO, balance, &mut plenty),
            Err(WithdrawalError::NonPositiveAmount)
        );
        // the limit is checked before the balance
        assert_eq!(
            withdrawal(units(30_000), balance, &mut plenty),
            Err(WithdrawalError::LimitExceeded(WITHDRAWAL_LIMIT))
        );
        assert_eq!(
            withdrawal(units(20_000), balance, &mut plenty),
            Err(WithdrawalError::InsufficientFunds(balance, units(20_000)))
        );
        assert_eq!(
            withdrawal(units(250), balance, &mut plenty),
            Err(WithdrawalError::InvalidDenomination)
        );
        assert_eq!(
            withdrawal(units(200), balance, &mut empty),
            Err(WithdrawalError::CashUnavailable)
        );
    }

    #[test]
    fn rejected_withdrawal_does_not_consult_cash() {
        let mut draws = 0;
        let mut counting = |_: Amount| {
            draws += 1;
            true
        };
        let _ = withdrawal(units(150), units(1_000), &mut counting);
        let _ = withdrawal(units(2_000), units(1_000), &mut counting);
        assert_eq!(draws, 0);
    }

    #[test]
    fn withdrawal_of_whole_balance() {
        assert!(withdrawal(units(1_000), units(1_000), &mut plenty).is_ok());
    }

    // Transfer

    #[test]
    fn transfer_accepts_valid_request() {
        assert_eq!(
            transfer(&request(200, "12345678901", "ABCD0123456"), units(10_000)),
            Ok(())
        );
    }

    #[test]
    fn transfer_allows_paise() {
        let mut req = request(0, "12345678901", "ABCD0123456");
        req.amount = Amount::from_scaled(20_050);
        assert_eq!(transfer(&req, units(10_000)), Ok(()));
    }

    #[test]
    fn transfer_rejects_bad_amounts() {
        let balance = units(200_000);
        assert_eq!(
            transfer(&request(0, "12345678901", "ABCD0123456"), balance),
            Err(TransferError::NonPositiveAmount)
        );
        assert_eq!(
            transfer(&request(100_100, "12345678901", "ABCD0123456"), balance),
            Err(TransferError::LimitExceeded(TRANSFER_LIMIT))
        );
        assert_eq!(
            transfer(&request(300, "12345678901", "ABCD0123456"), units(200)),
            Err(TransferError::InsufficientFunds(units(200), units(300)))
        );
    }

    #[test]
    fn transfer_rejects_bad_account_number() {
        for account in ["1234567890", "123456789012", "1234567890a", "", "１２３４５６７８９０１"] {
            assert!(matches!(
                transfer(&request(200, account, "ABCD0123456"), units(10_000)),
                Err(TransferError::InvalidAccountNumber(_))
            ));
        }
    }

    #[test]
    fn transfer_rejects_bad_ifsc() {
        for ifsc in ["abcd0123456", "ABCD1123456", "ABC00123456", "ABCD012345", "ABCD01234567"] {
            assert!(matches!(
                transfer(&request(200, "12345678901", ifsc), units(10_000)),
                Err(TransferError::InvalidIfsc(_))
            ));
        }
    }

    // PIN change

    #[test]
    fn pin_change_succeeds() {
        assert_eq!(
            pin_change(Pin::DEFAULT, 1234, 4321, 4321),
            Ok(Pin::new(4321).unwrap())
        );
    }

    #[test]
    fn pin_change_to_same_pin_is_fine() {
        let pin = pin_change(Pin::DEFAULT, 1234, 1234, 1234).unwrap();
        assert_eq!(pin_change(pin, 1234, 1234, 1234), Ok(pin));
    }

    #[test]
    fn pin_change_failures() {
        assert_eq!(
            pin_change(Pin::DEFAULT, 1111, 4321, 4321),
            Err(PinChangeError::WrongCurrentPin)
        );
        assert_eq!(
            pin_change(Pin::DEFAULT, 1234, 123, 123),
            Err(PinChangeError::InvalidPinFormat)
        );
        assert_eq!(
            pin_change(Pin::DEFAULT, 1234, 12345, 12345),
            Err(PinChangeError::InvalidPinFormat)
        );
        assert_eq!(
            pin_change(Pin::DEFAULT, 1234, 4321, 4322),
            Err(PinChangeError::PinMismatch)
        );
    }

    proptest! {
        #[test]
        fn deposit_succeeds_iff_rules_hold(scaled in -1_000_000i64..10_000_000) {
            let amount = Amount::from_scaled(scaled);
            let valid = scaled > 0
                && amount <= DEPOSIT_LIMIT
                && amount.is_multiple_of(100);
            prop_assert_eq!(deposit(amount, START).is_ok(), valid);
        }

        #[test]
        fn withdrawal_never_breaks_rules(scaled in -1_000_000i64..5_000_000, balance in 0i64..5_000_000) {
            let amount = Amount::from_scaled(scaled);
            let balance = Amount::from_scaled(balance);
            if withdrawal(amount, balance, &mut plenty).is_ok() {
                prop_assert!(amount.is_positive());
                prop_assert!(amount <= balance);
                prop_assert!(amount <= WITHDRAWAL_LIMIT);
                prop_assert!(amount.is_multiple_of(100));
            }
        }

        #[test]
        fn breakdown_sums_to_amount(hundreds in 1i64..=250) {
            let amount = units(hundreds * 100);
            let notes = withdrawal(amount, WITHDRAWAL_LIMIT, &mut plenty).unwrap();
            prop_assert_eq!(notes.total(), amount);
            prop_assert!(notes.five_hundreds <= 3);
            prop_assert!(notes.hundreds <= 4);
        }

        #[test]
        fn ifsc_pattern_accepts_generated_codes(code in "[A-Z]{4}0[0-9]{6}") {
            prop_assert!(is_ifsc(&code));
        }
    }
}
