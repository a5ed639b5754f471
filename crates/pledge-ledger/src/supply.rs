//! Supply conservation invariant checker.
//!
//! Mathematical invariant, checkable after every commit (and asserted for
//! the touched mints in debug builds):
//! ```text
//! ∀ mint: Σ(token account balances) == Σ(deposits)
//! ```
//!
//! Escrow only moves tokens between accounts. If the sum ever drifts,
//! something created or destroyed value.

use std::collections::HashMap;

use pledge_types::{Address, PledgeError, Result};

/// Tracks per-mint deposit totals.
#[derive(Debug, Default)]
pub struct SupplyConservation {
    deposits: HashMap<Address, u128>,
}

impl SupplyConservation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_deposit(&mut self, mint: Address, amount: u64) {
        *self.deposits.entry(mint).or_insert(0) += u128::from(amount);
    }

    /// Expected total supply for a mint.
    #[must_use]
    pub fn expected_supply(&self, mint: &Address) -> u128 {
        self.deposits.get(mint).copied().unwrap_or(0)
    }

    /// Verify that `actual_supply` (sum of balances) matches deposits.
    ///
    /// # Errors
    /// [`PledgeError::SupplyInvariantViolation`] if actual ≠ expected.
    pub fn verify(&self, mint: &Address, actual_supply: u128) -> Result<()> {
        let expected = self.expected_supply(mint);
        if actual_supply != expected {
            return Err(PledgeError::SupplyInvariantViolation {
                reason: format!("mint {mint}: actual {actual_supply} != expected {expected}"),
            });
        }
        Ok(())
    }

    /// All mints that ever received a deposit.
    #[must_use]
    pub fn tracked_mints(&self) -> Vec<Address> {
        let mut mints: Vec<_> = self.deposits.keys().copied().collect();
        mints.sort();
        mints
    }
}
