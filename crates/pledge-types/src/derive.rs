//! Derived-address resolution.
//!
//! A derived address is a SHA-256 digest of a seed tuple that does **not**
//! decode as an ed25519 point. No private key exists for it, so the only way
//! to exercise its authority is to rebuild the same seeds, which is what
//! [`AddressResolver::vault_authority`] does.
//!
//! ## Preimage
//!
//! ```text
//! "pledge:derive:v1:" || n_seeds (u32 BE)
//!   || for each seed: len (u32 BE) || bytes
//!   || bump (u8) || program_id (32)
//! ```
//!
//! Length prefixes make the encoding injective: two distinct seed tuples can
//! never produce the same preimage. The bump is searched from 255 downwards
//! until the digest is off-curve.

use sha2::{Digest, Sha256};

use crate::{constants, Address, PledgeError, Result};

const DERIVE_DOMAIN: &[u8] = b"pledge:derive:v1:";

/// Derive an off-curve address from `seeds` under `program_id`.
///
/// Returns the address and the bump that produced it.
///
/// # Errors
/// Returns [`PledgeError::NoViableBump`] if all 256 bumps land on the curve.
pub fn derive_address(program_id: &Address, seeds: &[&[u8]]) -> Result<(Address, u8)> {
    for bump in (0..=u8::MAX).rev() {
        let candidate = hash_seeds(program_id, seeds, bump);
        if !candidate.is_on_curve() {
            return Ok((candidate, bump));
        }
    }
    Err(PledgeError::NoViableBump)
}

#[allow(clippy::cast_possible_truncation)]
fn hash_seeds(program_id: &Address, seeds: &[&[u8]], bump: u8) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(DERIVE_DOMAIN);
    hasher.update((seeds.len() as u32).to_be_bytes());
    for seed in seeds {
        hasher.update((seed.len() as u32).to_be_bytes());
        hasher.update(seed);
    }
    hasher.update([bump]);
    hasher.update(program_id.as_bytes());
    Address(hasher.finalize().into())
}

/// Key-less spending authority over one promise vault.
///
/// Only [`AddressResolver::vault_authority`] can produce one, and it is not
/// `Clone`: holding a `VaultAuthority` proves the holder rebuilt the vault's
/// seeds from the promise's public identity.
#[derive(Debug)]
pub struct VaultAuthority {
    vault: Address,
    owner: Address,
    sequence: u64,
    bump: u8,
}

impl VaultAuthority {
    /// The vault address this authority can debit.
    #[must_use]
    pub fn address(&self) -> Address {
        self.vault
    }

    #[must_use]
    pub fn owner(&self) -> Address {
        self.owner
    }

    #[must_use]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    #[must_use]
    pub fn bump(&self) -> u8 {
        self.bump
    }
}

/// Resolves every account family from public seed data.
///
/// Writers and verifiers call the same functions, so an account's identity
/// can always be reconstructed from the fields stored on the records.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressResolver {
    program_id: Address,
}

impl AddressResolver {
    #[must_use]
    pub fn new(program_id: Address) -> Self {
        Self { program_id }
    }

    #[must_use]
    pub fn program_id(&self) -> Address {
        self.program_id
    }

    /// Address of the user record for `slug`.
    pub fn user_address(&self, slug: &str) -> Result<Address> {
        let (addr, _) = derive_address(
            &self.program_id,
            &[constants::USER_SEED, slug.as_bytes()],
        )?;
        Ok(addr)
    }

    /// Address of the promise record for `(owner, sequence)`.
    pub fn promise_address(&self, owner: &Address, sequence: u64) -> Result<Address> {
        let (addr, _) = derive_address(
            &self.program_id,
            &[constants::PROMISE_SEED, owner.as_bytes(), &sequence.to_be_bytes()],
        )?;
        Ok(addr)
    }

    /// Address of the vault token account for `(owner, sequence)`.
    pub fn vault_address(&self, owner: &Address, sequence: u64) -> Result<Address> {
        self.vault_authority(owner, sequence).map(|a| a.address())
    }

    /// Rebuild the vault seeds and hand back the authority they confer.
    pub fn vault_authority(&self, owner: &Address, sequence: u64) -> Result<VaultAuthority> {
        let (vault, bump) = derive_address(
            &self.program_id,
            &[constants::VAULT_SEED, owner.as_bytes(), &sequence.to_be_bytes()],
        )?;
        Ok(VaultAuthority {
            vault,
            owner: *owner,
            sequence,
            bump,
        })
    }
}
