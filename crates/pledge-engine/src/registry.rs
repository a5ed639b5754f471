//! User registry.
//!
//! One record per slug, at the address derived from `["user", slug]`.
//! Registration is first-come: a second registration of the same slug
//! finds the account already allocated and fails.

use pledge_ledger::Transaction;
use pledge_types::{Address, AddressResolver, PledgeError, Result, Signer, User};

use crate::events::UserRegistered;

/// Allocate a fresh user record with `promise_sequence = 0`.
///
/// # Errors
/// - `InvalidSlug` for an empty or over-long slug
/// - `InvalidName` if `name` exceeds `max_name_len` bytes
/// - `DuplicateSlug` if the slug is taken
pub(crate) fn register_user(
    tx: &mut Transaction<'_>,
    resolver: &AddressResolver,
    max_name_len: usize,
    signer: Signer,
    name: &str,
    slug: &str,
) -> Result<UserRegistered> {
    User::validate_slug(slug)?;
    if name.len() > max_name_len {
        return Err(PledgeError::InvalidName {
            reason: format!("{} bytes exceeds {max_name_len}", name.len()),
        });
    }

    let address = resolver.user_address(slug)?;
    if tx.exists(&address) {
        return Err(PledgeError::DuplicateSlug(slug.to_string()));
    }

    let user = User::new(slug, name, signer.address());
    tx.allocate_data(address, user.to_account_data())?;

    Ok(UserRegistered {
        user: address,
        slug: user.slug,
        name: user.name,
        authority: user.authority,
    })
}

/// Decode the user record at `address`.
///
/// # Errors
/// `AccountNotFound` if nothing is there, `AccountDataInvalid` if it is
/// not a user record.
pub(crate) fn load_user(tx: &Transaction<'_>, address: &Address) -> Result<User> {
    User::from_account_data(tx.data(address)?)
}
