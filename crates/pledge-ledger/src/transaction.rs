//! Atomic transactions over the account store.
//!
//! A [`Transaction`] reads through to committed state and buffers every
//! write in an overlay. The overlay is merged only when the whole unit of
//! work succeeds; on any error it is dropped and committed state is
//! untouched. There is no way to observe a half-applied operation.

use std::collections::HashMap;

use pledge_types::{Address, PledgeError, Result, Signer, VaultAuthority};

use crate::account::{Account, TokenAccount};

/// Who is spending from a token account.
#[derive(Debug, Clone, Copy)]
pub enum TransferAuthority<'a> {
    /// A key holder whose transaction signature the substrate verified.
    Signer(Signer),
    /// Reconstructed key-less authority over one promise vault.
    Vault(&'a VaultAuthority),
}

impl TransferAuthority<'_> {
    fn address(&self) -> Address {
        match self {
            Self::Signer(s) => s.address(),
            Self::Vault(v) => v.address(),
        }
    }
}

/// Effects of a finished transaction, ready to merge.
pub(crate) struct Effects {
    pub(crate) writes: HashMap<Address, Account>,
    pub(crate) deposits: Vec<(Address, u64)>,
}

/// One in-flight unit of work.
pub struct Transaction<'a> {
    base: &'a HashMap<Address, Account>,
    writes: HashMap<Address, Account>,
    deposits: Vec<(Address, u64)>,
    now: i64,
}

impl<'a> Transaction<'a> {
    pub(crate) fn new(base: &'a HashMap<Address, Account>, now: i64) -> Self {
        Self {
            base,
            writes: HashMap::new(),
            deposits: Vec::new(),
            now,
        }
    }

    pub(crate) fn into_effects(self) -> Effects {
        Effects {
            writes: self.writes,
            deposits: self.deposits,
        }
    }

    /// Clock reading taken when the transaction started.
    #[must_use]
    pub fn now(&self) -> i64 {
        self.now
    }

    fn get(&self, address: &Address) -> Option<&Account> {
        self.writes.get(address).or_else(|| self.base.get(address))
    }

    #[must_use]
    pub fn exists(&self, address: &Address) -> bool {
        self.get(address).is_some()
    }

    // -----------------------------------------------------------------
    // Record accounts
    // -----------------------------------------------------------------

    /// # Errors
    /// `AccountNotFound`, or `AccountDataInvalid` for a token account.
    pub fn data(&self, address: &Address) -> Result<&[u8]> {
        self.get(address)
            .ok_or(PledgeError::AccountNotFound(*address))?
            .as_data(address)
    }

    /// Allocate a new record account.
    ///
    /// # Errors
    /// `AccountAlreadyExists` if anything lives at `address`.
    pub fn allocate_data(&mut self, address: Address, data: Vec<u8>) -> Result<()> {
        if self.exists(&address) {
            return Err(PledgeError::AccountAlreadyExists(address));
        }
        self.writes.insert(address, Account::Data(data));
        Ok(())
    }

    /// Overwrite an existing record account.
    ///
    /// # Errors
    /// `AccountNotFound`, or `AccountDataInvalid` for a token account.
    pub fn write_data(&mut self, address: Address, data: Vec<u8>) -> Result<()> {
        self.data(&address)?;
        self.writes.insert(address, Account::Data(data));
        Ok(())
    }

    // -----------------------------------------------------------------
    // Token accounts
    // -----------------------------------------------------------------

    /// # Errors
    /// `AccountNotFound`, or `AccountDataInvalid` for a record account.
    pub fn token_account(&self, address: &Address) -> Result<TokenAccount> {
        self.get(address)
            .ok_or(PledgeError::AccountNotFound(*address))?
            .as_token(address)
            .copied()
    }

    /// Allocate an empty token account.
    ///
    /// # Errors
    /// `AccountAlreadyExists` if anything lives at `address`.
    pub fn create_token_account(
        &mut self,
        address: Address,
        mint: Address,
        owner: Address,
    ) -> Result<()> {
        if self.exists(&address) {
            return Err(PledgeError::AccountAlreadyExists(address));
        }
        self.writes
            .insert(address, Account::Token(TokenAccount::new(mint, owner)));
        Ok(())
    }

    /// Credit new tokens into an account. Harness plumbing only: records the
    /// amount against the mint's expected supply.
    ///
    /// # Errors
    /// `InvalidAmount` for zero, `BalanceOverflow`, or lookup errors.
    pub fn deposit(&mut self, address: Address, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(PledgeError::InvalidAmount {
                reason: "deposit of zero".into(),
            });
        }
        let mut acct = self.token_account(&address)?;
        acct.amount = acct
            .amount
            .checked_add(amount)
            .ok_or(PledgeError::BalanceOverflow(address))?;
        self.deposits.push((acct.mint, amount));
        self.writes.insert(address, Account::Token(acct));
        Ok(())
    }

    /// Move `amount` between two token accounts of the same mint.
    ///
    /// The authority must own `from`. A signer can never debit a vault,
    /// because vault owners are off-curve and signers are not.
    ///
    /// # Errors
    /// - `InvalidAmount` for zero
    /// - `SelfTransfer` if `from == to`
    /// - `AccountNotFound` / `AccountDataInvalid` for bad addresses
    /// - `MintMismatch` if the accounts hold different mints
    /// - `UnauthorizedTransfer` if the authority does not own `from`
    /// - `InsufficientFunds` if `from` holds less than `amount`
    /// - `BalanceOverflow` if `to` would overflow
    pub fn transfer(
        &mut self,
        from: Address,
        to: Address,
        amount: u64,
        authority: TransferAuthority<'_>,
    ) -> Result<()> {
        if amount == 0 {
            return Err(PledgeError::InvalidAmount {
                reason: "transfer of zero".into(),
            });
        }
        if from == to {
            return Err(PledgeError::SelfTransfer(from));
        }
        let mut source = self.token_account(&from)?;
        let mut dest = self.token_account(&to)?;

        if source.mint != dest.mint {
            return Err(PledgeError::MintMismatch {
                expected: source.mint,
                actual: dest.mint,
            });
        }

        let authorised = match authority {
            TransferAuthority::Signer(_) => source.owner == authority.address(),
            TransferAuthority::Vault(v) => v.address() == from && source.owner == from,
        };
        if !authorised {
            return Err(PledgeError::UnauthorizedTransfer { account: from });
        }

        if source.amount < amount {
            return Err(PledgeError::InsufficientFunds {
                needed: amount,
                available: source.amount,
            });
        }

        source.amount -= amount;
        dest.amount = dest
            .amount
            .checked_add(amount)
            .ok_or(PledgeError::BalanceOverflow(to))?;

        self.writes.insert(from, Account::Token(source));
        self.writes.insert(to, Account::Token(dest));
        Ok(())
    }
}
