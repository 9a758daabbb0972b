//! Simulated physical cash held by the machine.

use rand::Rng;
use tracing::debug;

use crate::Amount;

/// Decides whether the machine holds enough notes to pay out a withdrawal.
pub trait CashReserve {
    /// Whether `amount` can be dispensed right now.
    fn covers(&mut self, amount: Amount) -> bool;

    /// Called after `amount` has been paid out.
    fn dispensed(&mut self, _amount: Amount) {}
}

/// Draws a fresh, uniformly random reserve in `[0, limit)` for every attempt,
/// so the same withdrawal may succeed on one try and fail on the next.
#[derive(Debug, Clone)]
pub struct RandomCashReserve {
    limit: Amount,
}

impl RandomCashReserve {
    pub const DEFAULT_LIMIT: Amount = Amount::from_units(100_000);

    pub fn new(limit: Amount) -> Self {
        Self { limit }
    }
}

impl Default for RandomCashReserve {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT)
    }
}

impl CashReserve for RandomCashReserve {
    fn covers(&mut self, amount: Amount) -> bool {
        if !self.limit.is_positive() {
            return false;
        }
        let available = Amount::from_scaled(rand::thread_rng().gen_range(0..self.limit.scaled()));
        debug!(%available, %amount, "drew cash reserve");
        amount <= available
    }
}

/// A reserve that starts at a fixed level and depletes as notes are paid out.
#[derive(Debug, Clone)]
pub struct TrackedCashReserve {
    remaining: Amount,
}

impl TrackedCashReserve {
    pub fn new(initial: Amount) -> Self {
        Self { remaining: initial }
    }

    pub fn remaining(&self) -> Amount {
        self.remaining
    }
}

impl CashReserve for TrackedCashReserve {
    fn covers(&mut self, amount: Amount) -> bool {
        amount <= self.remaining
    }

    fn dispensed(&mut self, amount: Amount) {
        self.remaining -= amount;
    }
}

/// Either cash policy, selected at startup.
#[derive(Debug, Clone)]
pub enum CashPolicy {
    Random(RandomCashReserve),
    Tracked(TrackedCashReserve),
}

impl CashPolicy {
    /// A depleting reserve when `initial` is given, otherwise a random draw.
    pub fn from_config(initial: Option<Amount>) -> Self {
        match initial {
            Some(initial) => CashPolicy::Tracked(TrackedCashReserve::new(initial)),
            None => CashPolicy::Random(RandomCashReserve::default()),
        }
    }
}

impl CashReserve for CashPolicy {
    fn covers(&mut self, amount: Amount) -> bool {
        match self {
            CashPolicy::Random(reserve) => reserve.covers(amount),
            CashPolicy::Tracked(reserve) => reserve.covers(amount),
        }
    }

    fn dispensed(&mut self, amount: Amount) {
        match self {
            CashPolicy::Random(reserve) => reserve.dispensed(amount),
            CashPolicy::Tracked(reserve) => reserve.dispensed(amount),
        }
    }
}

impl<F: FnMut(Amount) -> bool> CashReserve for F {
    fn covers(&mut self, amount: Amount) -> bool {
        self(amount)
    }
}
