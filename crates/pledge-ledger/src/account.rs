//! Account kinds held by the ledger.
//!
//! An address holds either opaque record data (users, promises) or a token
//! account. The kind is fixed at allocation.

use pledge_types::{Address, PledgeError, Result};
use serde::{Deserialize, Serialize};

/// A balance of one mint, spendable by `owner`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenAccount {
    pub mint: Address,
    /// Spending authority. A signer address, or a derived vault address.
    pub owner: Address,
    pub amount: u64,
}

impl TokenAccount {
    #[must_use]
    pub fn new(mint: Address, owner: Address) -> Self {
        Self {
            mint,
            owner,
            amount: 0,
        }
    }

    /// Whether only a vault authority can spend from this account.
    #[must_use]
    pub fn is_vault_owned(&self) -> bool {
        !self.owner.is_on_curve()
    }
}

/// Contents stored at an address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Account {
    /// Encoded record (see `pledge_types::codec`).
    Data(Vec<u8>),
    Token(TokenAccount),
}

impl Account {
    /// # Errors
    /// [`PledgeError::AccountDataInvalid`] if this is a token account.
    pub fn as_data(&self, address: &Address) -> Result<&[u8]> {
        match self {
            Self::Data(data) => Ok(data),
            Self::Token(_) => Err(PledgeError::AccountDataInvalid {
                reason: format!("{address} is a token account"),
            }),
        }
    }

    /// # Errors
    /// [`PledgeError::AccountDataInvalid`] if this is a record account.
    pub fn as_token(&self, address: &Address) -> Result<&TokenAccount> {
        match self {
            Self::Token(token) => Ok(token),
            Self::Data(_) => Err(PledgeError::AccountDataInvalid {
                reason: format!("{address} is not a token account"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use pledge_types::{derive_address, Signer};

    use super::*;

    #[test]
    fn new_token_account_is_empty() {
        let acct = TokenAccount::new(Address([1u8; 32]), Address([2u8; 32]));
        assert_eq!(acct.amount, 0);
    }

    #[test]
    fn vault_ownership_follows_curve() {
        let (_, signer) = Signer::generate();
        let (vault, _) = derive_address(&Address([0u8; 32]), &[b"v"]).unwrap();
        assert!(!TokenAccount::new(Address([1u8; 32]), signer.address()).is_vault_owned());
        assert!(TokenAccount::new(Address([1u8; 32]), vault).is_vault_owned());
    }

    #[test]
    fn kind_accessors() {
        let addr = Address([3u8; 32]);
        let data = Account::Data(vec![1, 2, 3]);
        let token = Account::Token(TokenAccount::new(addr, addr));
        assert_eq!(data.as_data(&addr).unwrap(), &[1, 2, 3]);
        assert!(data.as_token(&addr).is_err());
        assert!(token.as_token(&addr).is_ok());
        assert!(matches!(
            token.as_data(&addr),
            Err(PledgeError::AccountDataInvalid { .. })
        ));
    }
}
