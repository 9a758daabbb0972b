use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Fixed-point currency amount with 2 decimal places, stored as a scaled integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Hash)]
pub struct Amount(i64);

/// Error returned when text is not a decimal amount.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("'{0}' is not a valid amount")]
pub struct ParseAmountError(String);

impl Amount {
    const SCALE: i64 = 100;

    pub const ZERO: Amount = Amount(0);

    /// Amount of whole currency units.
    pub const fn from_units(units: i64) -> Self {
        Amount(units * Self::SCALE)
    }

    pub const fn from_scaled(value: i64) -> Self {
        Amount(value)
    }

    pub const fn scaled(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, rhs: Amount) -> Option<Amount> {
        self.0.checked_add(rhs.0).map(Amount)
    }

    /// True when the amount is a whole multiple of `units` currency units.
    pub const fn is_multiple_of(self, units: i64) -> bool {
        self.0 % (units * Self::SCALE) == 0
    }

    /// Render with the Indian rupee sign and lakh/crore digit grouping,
    /// e.g. `₹1,00,000.00`.
    pub fn to_rupees(self) -> String {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        let whole = (abs / Self::SCALE as u64).to_string();
        let frac = abs % Self::SCALE as u64;

        // last three digits form one group, the rest are grouped in pairs
        let grouped = if whole.len() <= 3 {
            whole
        } else {
            let (head, tail) = whole.split_at(whole.len() - 3);
            let mut groups = Vec::new();
            let mut end = head.len();
            while end > 0 {
                let start = end.saturating_sub(2);
                groups.push(&head[start..end]);
                end = start;
            }
            groups.reverse();
            format!("{},{tail}", groups.join(","))
        };

        format!("{sign}₹{grouped}.{frac:02}")
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        let whole = abs / Self::SCALE;
        let frac = abs % Self::SCALE;
        write!(f, "{sign}{whole}.{frac:02}")
    }
}

impl FromStr for Amount {
    type Err = ParseAmountError;

    /// Parse exact decimal text with at most two fractional digits.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseAmountError(s.to_string());
        let text = s.trim();

        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };

        let (whole, frac) = match digits.split_once('.') {
            Some((whole, frac)) => (whole, frac),
            None => (digits, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (whole.is_empty() && frac.is_empty())
            || frac.len() > 2
            || !all_digits(whole)
            || !all_digits(frac)
        {
            return Err(err());
        }

        let whole: i64 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| err())?
        };
        let frac: i64 = match frac.len() {
            0 => 0,
            1 => frac.parse::<i64>().map_err(|_| err())? * 10,
            _ => frac.parse().map_err(|_| err())?,
        };

        let scaled = whole
            .checked_mul(Self::SCALE)
            .and_then(|w| w.checked_add(frac))
            .ok_or_else(err)?;

        Ok(Amount(if negative { -scaled } else { scaled }))
    }
}

impl std::ops::Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Amount(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Amount(self.0 - rhs.0)
    }
}

impl std::ops::AddAssign for Amount {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

impl std::ops::SubAssign for Amount {
    fn sub_assign(&mut self, rhs: Self) {
        self.0 -= rhs.0;
    }
}
