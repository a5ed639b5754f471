//! Promise creation: open a vault, fund it, record the promise.
//!
//! ```text
//! signer ──amount──▶ vault(owner, seq)      Promise(owner, seq) = ACTIVE
//!                                           user.promise_sequence = seq + 1
//! ```
//!
//! All four writes land in one transaction. The sequence is read from the
//! user record inside that transaction, so two promises can never share
//! `(owner, sequence)`.

use pledge_ledger::{Transaction, TransferAuthority};
use pledge_types::{
    Address, AddressResolver, PledgeError, Promise, PromiseTerms, Result, Signer,
};
use serde::{Deserialize, Serialize};

use crate::{events::PromiseCreated, registry::load_user};

/// Parameters of a new promise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatePromise {
    /// The owner's user record.
    pub user: Address,
    /// Absolute expiry, unix seconds. Accepted as given.
    pub timeout: i64,
    pub referee: Address,
    /// Defaults to the signer.
    pub beneficiary: Option<Address>,
    pub amount: u64,
    pub mint: Address,
    /// Signer-owned token account the deposit is drawn from.
    pub funding_source: Address,
}

pub(crate) fn create_promise(
    tx: &mut Transaction<'_>,
    resolver: &AddressResolver,
    signer: Signer,
    request: &CreatePromise,
) -> Result<PromiseCreated> {
    let owner = signer.address();
    let mut user = load_user(tx, &request.user)?;
    if user.authority != owner {
        return Err(PledgeError::UnauthorizedOwner {
            signer: owner,
            user: request.user,
        });
    }
    if request.amount == 0 {
        return Err(PledgeError::InvalidAmount {
            reason: "promise amount must be > 0".into(),
        });
    }
    // A derived beneficiary could never sign for, or spend, a release.
    let beneficiary = match request.beneficiary {
        Some(beneficiary) => Signer::new(beneficiary)?.address(),
        None => owner,
    };

    let sequence = user.take_sequence()?;
    let promise_address = resolver.promise_address(&owner, sequence)?;
    let vault = resolver.vault_address(&owner, sequence)?;
    tracing::debug!(
        user = %request.user,
        sequence,
        promise = %promise_address,
        vault = %vault,
        "derived promise accounts"
    );

    tx.create_token_account(vault, request.mint, vault)?;
    tx.transfer(
        request.funding_source,
        vault,
        request.amount,
        TransferAuthority::Signer(signer),
    )?;

    let terms = PromiseTerms {
        timeout: request.timeout,
        referee: request.referee,
        beneficiary,
        amount: request.amount,
        mint: request.mint,
    };
    let promise = Promise::open(owner, request.user, sequence, terms, request.funding_source);
    tx.allocate_data(promise_address, promise.to_account_data())?;
    tx.write_data(request.user, user.to_account_data())?;

    Ok(PromiseCreated {
        reference: promise.reference(),
        promise: promise_address,
        vault,
        user: request.user,
        mint: promise.mint,
        amount: promise.amount,
        timeout: promise.timeout,
        referee: promise.referee,
        beneficiary: promise.beneficiary,
    })
}
