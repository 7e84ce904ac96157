//! Shared currency balance paid into by enemy deaths and spent on towers.

use thiserror::Error;

/// Reasons a ledger operation may be rejected.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The requested debit exceeds the available balance.
    #[error("insufficient funds: requested {requested}, balance {balance}")]
    InsufficientFunds {
        /// Amount the caller attempted to debit.
        requested: u32,
        /// Balance at the time of the request.
        balance: u32,
    },
}

/// Session-wide currency balance.
///
/// One ledger exists per simulation session. It is owned by the world and
/// lent mutably to every component that credits or debits it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CurrencyLedger {
    balance: u32,
}

impl CurrencyLedger {
    /// Creates a ledger holding the provided starting balance.
    #[must_use]
    pub const fn new(balance: u32) -> Self {
        Self { balance }
    }

    /// Current balance.
    #[must_use]
    pub const fn balance(&self) -> u32 {
        self.balance
    }

    /// Adds `amount` to the balance, saturating at `u32::MAX`.
    pub fn credit(&mut self, amount: u32) {
        self.balance = self.balance.saturating_add(amount);
    }

    /// Removes `amount` from the balance and returns the new balance.
    ///
    /// Fails without touching the balance when `amount` exceeds it.
    pub fn debit(&mut self, amount: u32) -> Result<u32, LedgerError> {
        let remaining = self
            .balance
            .checked_sub(amount)
            .ok_or(LedgerError::InsufficientFunds {
                requested: amount,
                balance: self.balance,
            })?;
        self.balance = remaining;
        Ok(remaining)
    }

    /// Reports whether a debit of `amount` would succeed.
    #[must_use]
    pub const fn can_afford(&self, amount: u32) -> bool {
        amount <= self.balance
    }

    /// Replaces the balance at the start of a new session.
    pub fn reset(&mut self, balance: u32) {
        self.balance = balance;
    }
}
