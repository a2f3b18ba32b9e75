//! Currency balance and play credits
//!
//! Bets convert currency into credits at a fixed exchange rate; each launch
//! in budget mode spends one credit. Balances never go negative.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BudgetError {
    #[error("Bet must be greater than zero")]
    InvalidBet,
    #[error("Insufficient balance: bet {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },
    #[error("Budget mode is off")]
    Disabled,
}

/// Ledger state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetLedger {
    currency_balance: u64,
    credits: u32,
    exchange_rate: f64,
}

impl BudgetLedger {
    pub fn new(currency_balance: u64, exchange_rate: f64) -> Self {
        Self {
            currency_balance,
            credits: 0,
            exchange_rate: exchange_rate.max(0.0),
        }
    }

    pub fn currency_balance(&self) -> u64 {
        self.currency_balance
    }

    pub fn credits(&self) -> u32 {
        self.credits
    }

    pub fn exchange_rate(&self) -> f64 {
        self.exchange_rate
    }

    /// Credits a bet of `amount` would buy: `max(1, floor(amount * rate))`
    pub fn credits_for(&self, amount: u64) -> u32 {
        let raw = (amount as f64 * self.exchange_rate).floor();
        (raw.min(f64::from(u32::MAX)) as u32).max(1)
    }

    /// Convert `amount` currency into credits. Leaves the ledger untouched on error.
    pub fn place_bet(&mut self, amount: u64) -> Result<&Self, BudgetError> {
        if amount == 0 {
            return Err(BudgetError::InvalidBet);
        }
        if amount > self.currency_balance {
            return Err(BudgetError::InsufficientBalance {
                requested: amount,
                available: self.currency_balance,
            });
        }
        let bought = self.credits_for(amount);
        self.currency_balance -= amount;
        self.credits = self.credits.saturating_add(bought);
        log::info!(
            "Bet {} -> {} credits (balance {}, credits {})",
            amount,
            bought,
            self.currency_balance,
            self.credits
        );
        Ok(self)
    }

    /// Spend one credit. `false` when there are none left.
    pub fn deduct_credit(&mut self) -> bool {
        if self.credits == 0 {
            return false;
        }
        self.credits -= 1;
        true
    }

    pub fn add_credits(&mut self, credits: u32) {
        self.credits = self.credits.saturating_add(credits);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_bet_converts_at_rate() {
        let mut ledger = BudgetLedger::new(1000, 0.1);
        let state = ledger.place_bet(500).unwrap();
        assert_eq!(state.credits(), 50);
        assert_eq!(state.currency_balance(), 500);
    }

    #[test]
    fn test_insufficient_balance_leaves_state() {
        let mut ledger = BudgetLedger::new(1000, 0.1);
        let before = ledger.clone();
        let err = ledger.place_bet(2000).unwrap_err();
        assert_eq!(
            err,
            BudgetError::InsufficientBalance {
                requested: 2000,
                available: 1000
            }
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_zero_bet_rejected() {
        let mut ledger = BudgetLedger::new(1000, 0.1);
        assert_eq!(ledger.place_bet(0).unwrap_err(), BudgetError::InvalidBet);
        assert_eq!(ledger.credits(), 0);
    }

    #[test]
    fn test_small_bet_buys_at_least_one_credit() {
        let mut ledger = BudgetLedger::new(1000, 0.1);
        ledger.place_bet(3).unwrap();
        assert_eq!(ledger.credits(), 1);
        assert_eq!(ledger.currency_balance(), 997);
    }

    #[test]
    fn test_deduct_credit_floor() {
        let mut ledger = BudgetLedger::new(0, 0.1);
        assert!(!ledger.deduct_credit());
        ledger.add_credits(2);
        assert!(ledger.deduct_credit());
        assert!(ledger.deduct_credit());
        assert!(!ledger.deduct_credit());
        assert_eq!(ledger.credits(), 0);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(BudgetError::InvalidBet.to_string(), "Bet must be greater than zero");
        let msg = BudgetError::InsufficientBalance {
            requested: 5,
            available: 1,
        }
        .to_string();
        assert!(msg.contains("Insufficient balance"));
    }

    proptest! {
        #[test]
        fn prop_balance_is_conserved(start in 0u64..100_000, bets in prop::collection::vec(0u64..5_000, 0..20)) {
            let mut ledger = BudgetLedger::new(start, 0.1);
            let mut spent = 0u64;
            for bet in bets {
                if ledger.place_bet(bet).is_ok() {
                    spent += bet;
                }
            }
            prop_assert_eq!(ledger.currency_balance() + spent, start);
        }
    }
}
