//! The committed ledger: account state, slot counter, receipt log.

use std::collections::HashMap;

use pledge_types::{Address, PledgeError, Receipt, ReceiptKind, Result, Signer};
use serde::Serialize;

use crate::{
    account::{Account, TokenAccount},
    clock::{Clock, SystemClock},
    supply::SupplyConservation,
    transaction::Transaction,
};

/// A committed transaction's return value and its receipt.
#[derive(Debug, Clone)]
pub struct Committed<T> {
    pub value: T,
    pub receipt: Receipt,
}

/// Harness-level token events.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TokenAdminEvent {
    AccountOpened {
        account: Address,
        mint: Address,
        owner: Address,
    },
    Deposited {
        account: Address,
        amount: u64,
    },
}

/// Single-writer, in-memory ledger.
///
/// Every mutation goes through [`Ledger::transact`], which applies all of a
/// transaction's writes or none of them and numbers commits with a strictly
/// increasing slot. Debug builds re-check supply for every mint a commit
/// touched.
pub struct Ledger<C: Clock = SystemClock> {
    accounts: HashMap<Address, Account>,
    clock: C,
    slot: u64,
    receipts: Vec<Receipt>,
    supply: SupplyConservation,
}

impl Ledger<SystemClock> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for Ledger<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> Ledger<C> {
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self {
            accounts: HashMap::new(),
            clock,
            slot: 0,
            receipts: Vec::new(),
            supply: SupplyConservation::new(),
        }
    }

    /// Run `f` as one atomic unit of work.
    ///
    /// On `Ok`, the overlay is merged, the slot advances, and a receipt over
    /// the JSON-encoded return value is appended. On `Err`, nothing changes.
    ///
    /// # Errors
    /// Whatever `f` returns, or `Serialization` if the value cannot be encoded.
    pub fn transact<T, F>(&mut self, kind: ReceiptKind, f: F) -> Result<Committed<T>>
    where
        T: Serialize,
        F: FnOnce(&mut Transaction<'_>) -> Result<T>,
    {
        let now = self.clock.unix_timestamp();
        let mut tx = Transaction::new(&self.accounts, now);
        let value = match f(&mut tx) {
            Ok(value) => value,
            Err(err) => {
                tracing::debug!(kind = %kind, error = %err, "transaction rolled back");
                return Err(err);
            }
        };
        let payload = serde_json::to_vec(&value)?;
        let effects = tx.into_effects();

        let touched = effects.writes.len();
        let mut mints: Vec<Address> = effects
            .writes
            .values()
            .filter_map(|a| match a {
                Account::Token(t) => Some(t.mint),
                Account::Data(_) => None,
            })
            .collect();
        mints.sort();
        mints.dedup();

        self.accounts.extend(effects.writes);
        for (mint, amount) in effects.deposits {
            self.supply.record_deposit(mint, amount);
        }
        self.slot += 1;
        debug_assert!(
            mints.iter().all(|mint| self.verify_supply(mint).is_ok()),
            "supply drifted at slot {}",
            self.slot
        );

        let receipt = Receipt::new(kind, self.slot, payload, self.clock.now());
        self.receipts.push(receipt.clone());
        tracing::debug!(
            slot = self.slot,
            kind = %kind,
            tx = %receipt.tx_id,
            accounts = touched,
            "transaction committed"
        );
        Ok(Committed { value, receipt })
    }

    // -----------------------------------------------------------------
    // Harness plumbing
    // -----------------------------------------------------------------

    /// Open an empty token account owned by `owner`.
    pub fn create_token_account(
        &mut self,
        address: Address,
        mint: Address,
        owner: Signer,
    ) -> Result<Receipt> {
        let owner = owner.address();
        self.transact(ReceiptKind::TokenAdmin, |tx| {
            tx.create_token_account(address, mint, owner)?;
            Ok(TokenAdminEvent::AccountOpened {
                account: address,
                mint,
                owner,
            })
        })
        .map(|c| c.receipt)
    }

    /// Credit fresh tokens into an existing account.
    pub fn deposit(&mut self, account: Address, amount: u64) -> Result<Receipt> {
        self.transact(ReceiptKind::TokenAdmin, |tx| {
            tx.deposit(account, amount)?;
            Ok(TokenAdminEvent::Deposited { account, amount })
        })
        .map(|c| c.receipt)
    }

    // -----------------------------------------------------------------
    // Read views
    // -----------------------------------------------------------------

    #[must_use]
    pub fn account(&self, address: &Address) -> Option<&Account> {
        self.accounts.get(address)
    }

    /// # Errors
    /// `AccountNotFound`, or `AccountDataInvalid` for a token account.
    pub fn data(&self, address: &Address) -> Result<&[u8]> {
        self.accounts
            .get(address)
            .ok_or(PledgeError::AccountNotFound(*address))?
            .as_data(address)
    }

    /// # Errors
    /// `AccountNotFound`, or `AccountDataInvalid` for a record account.
    pub fn token_account(&self, address: &Address) -> Result<TokenAccount> {
        self.accounts
            .get(address)
            .ok_or(PledgeError::AccountNotFound(*address))?
            .as_token(address)
            .copied()
    }

    /// Token balance of `address`.
    pub fn balance(&self, address: &Address) -> Result<u64> {
        self.token_account(address).map(|a| a.amount)
    }

    /// Sum of every token account of `mint`.
    #[must_use]
    pub fn total_supply(&self, mint: &Address) -> u128 {
        self.accounts
            .values()
            .filter_map(|a| match a {
                Account::Token(t) if t.mint == *mint => Some(u128::from(t.amount)),
                _ => None,
            })
            .sum()
    }

    /// Check supply conservation for one mint.
    ///
    /// # Errors
    /// `SupplyInvariantViolation` if balances and deposits disagree.
    pub fn verify_supply(&self, mint: &Address) -> Result<()> {
        self.supply.verify(mint, self.total_supply(mint))
    }

    /// Check supply conservation for every mint ever deposited.
    pub fn verify_all_supply(&self) -> Result<()> {
        self.supply
            .tracked_mints()
            .iter()
            .try_for_each(|mint| self.verify_supply(mint))
    }

    /// Number of committed transactions.
    #[must_use]
    pub fn slot(&self) -> u64 {
        self.slot
    }

    /// Append-only receipt log, in slot order.
    #[must_use]
    pub fn receipts(&self) -> &[Receipt] {
        &self.receipts
    }

    #[must_use]
    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Current clock reading.
    #[must_use]
    pub fn now(&self) -> i64 {
        self.clock.unix_timestamp()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{clock::ManualClock, transaction::TransferAuthority};

    const MINT: Address = Address([0x4d; 32]);

    fn ledger() -> Ledger<Arc<ManualClock>> {
        Ledger::with_clock(Arc::new(ManualClock::new(1_000)))
    }

    #[test]
    fn harness_deposit_commits_and_tracks_supply() {
        let mut l = ledger();
        let (_, alice) = Signer::generate();
        let acct = Address::random();
        l.create_token_account(acct, MINT, alice).unwrap();
        let r = l.deposit(acct, 100).unwrap();

        assert_eq!(l.balance(&acct).unwrap(), 100);
        assert_eq!(r.slot, 2);
        assert_eq!(l.slot(), 2);
        assert_eq!(l.receipts().len(), 2);
        assert!(r.verify_payload());
        l.verify_supply(&MINT).unwrap();
    }

    #[test]
    fn failed_transaction_leaves_no_trace() {
        let mut l = ledger();
        let (_, alice) = Signer::generate();
        let from = Address::random();
        let to = Address::random();
        l.create_token_account(from, MINT, alice).unwrap();
        l.deposit(from, 10).unwrap();
        let slot = l.slot();

        let err = l
            .transact(ReceiptKind::TokenAdmin, |tx| {
                tx.create_token_account(to, MINT, alice.address())?;
                tx.transfer(from, to, 5, TransferAuthority::Signer(alice))?;
                // Fails after two successful writes.
                tx.transfer(from, to, 50, TransferAuthority::Signer(alice))?;
                Ok(())
            })
            .unwrap_err();

        assert!(matches!(err, PledgeError::InsufficientFunds { .. }));
        assert!(l.account(&to).is_none(), "allocation must roll back");
        assert_eq!(l.balance(&from).unwrap(), 10);
        assert_eq!(l.slot(), slot);
        assert_eq!(l.receipts().len(), usize::try_from(slot).unwrap());
        l.verify_all_supply().unwrap();
    }

    #[test]
    fn transaction_sees_clock_at_start() {
        let clock = Arc::new(ManualClock::new(50));
        let mut l = Ledger::with_clock(Arc::clone(&clock));
        let seen = l
            .transact(ReceiptKind::TokenAdmin, |tx| Ok(tx.now()))
            .unwrap();
        assert_eq!(seen.value, 50);
        clock.advance(10);
        assert_eq!(l.now(), 60);
        assert_eq!(seen.receipt.committed_at.timestamp(), 50);
    }

    #[test]
    fn committed_transfers_keep_supply() {
        let mut l = ledger();
        let (_, alice) = Signer::generate();
        let a = Address::random();
        let b = Address::random();
        l.create_token_account(a, MINT, alice).unwrap();
        l.create_token_account(b, MINT, alice).unwrap();
        l.deposit(a, 30).unwrap();

        l.transact(ReceiptKind::TokenAdmin, |tx| {
            tx.transfer(a, b, 20, TransferAuthority::Signer(alice))?;
            tx.transfer(b, a, 5, TransferAuthority::Signer(alice))
        })
        .unwrap();

        assert_eq!(l.balance(&a).unwrap(), 15);
        assert_eq!(l.balance(&b).unwrap(), 15);
        assert_eq!(l.total_supply(&MINT), 30);
        l.verify_supply(&MINT).unwrap();
    }

    #[test]
    fn self_transfer_rolls_back() {
        let mut l = ledger();
        let (_, alice) = Signer::generate();
        let a = Address::random();
        l.create_token_account(a, MINT, alice).unwrap();
        l.deposit(a, 10).unwrap();
        let slot = l.slot();

        let err = l
            .transact(ReceiptKind::TokenAdmin, |tx| {
                tx.transfer(a, a, 10, TransferAuthority::Signer(alice))
            })
            .unwrap_err();
        assert!(matches!(err, PledgeError::SelfTransfer(x) if x == a));
        assert_eq!(l.balance(&a).unwrap(), 10);
        assert_eq!(l.slot(), slot);
    }

    #[test]
    fn slots_are_strictly_increasing() {
        let mut l = ledger();
        for _ in 0..5 {
            l.transact(ReceiptKind::TokenAdmin, |_| Ok(())).unwrap();
        }
        let slots: Vec<u64> = l.receipts().iter().map(|r| r.slot).collect();
        assert_eq!(slots, vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn kind_mismatch_reads_fail() {
        let mut l = ledger();
        let (_, alice) = Signer::generate();
        let acct = Address::random();
        l.create_token_account(acct, MINT, alice).unwrap();
        assert!(matches!(
            l.data(&acct),
            Err(PledgeError::AccountDataInvalid { .. })
        ));
        assert!(matches!(
            l.balance(&Address::random()),
            Err(PledgeError::AccountNotFound(_))
        ));
    }
}
