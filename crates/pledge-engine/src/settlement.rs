//! Settlement: the two terminal transitions of a promise.
//!
//! ```text
//! pay:      ACTIVE ─[now <= timeout]─▶ PAID       vault → beneficiary (+ remainder → refund)
//! collect:  ACTIVE ─[now >  timeout]─▶ FORFEITED  vault → destination
//! ```
//!
//! The promise record and vault are re-derived from the public
//! `(owner, sequence)` pair. Vault debits are authorised only by the
//! [`VaultAuthority`](pledge_types::VaultAuthority) the resolver rebuilds
//! from those seeds; no caller-held key is involved.

use ed25519_dalek::{Signature, VerifyingKey};
use pledge_ledger::{TokenAccount, Transaction, TransferAuthority};
use pledge_types::{
    pay_endorsement_payload, Address, AddressResolver, PledgeError, Promise, PromiseRef,
    RefereePolicy, Result, VaultAuthority,
};
use serde::{Deserialize, Serialize};

use crate::events::PromiseSettled;

/// Release (part of) a deposit to the beneficiary before the timeout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayRequest {
    pub promise: PromiseRef,
    /// Vault the caller believes backs the promise.
    pub vault: Address,
    /// Token account owned by the promise's beneficiary.
    pub beneficiary_account: Address,
    /// `0 < amount <= deposit`. Any remainder is refunded.
    pub amount: u64,
    /// Referee endorsement over [`pay_endorsement_payload`].
    pub referee_signature: Option<Signature>,
}

/// Collect an expired, unresolved deposit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectRequest {
    pub promise: PromiseRef,
    pub vault: Address,
    pub destination_account: Address,
}

/// Settlement rules fixed by engine configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SettlementRules {
    pub(crate) referee_policy: RefereePolicy,
    pub(crate) collector: Option<Address>,
}

fn load_promise(
    tx: &Transaction<'_>,
    resolver: &AddressResolver,
    reference: PromiseRef,
) -> Result<(Address, Promise)> {
    let address = resolver.promise_address(&reference.owner, reference.sequence)?;
    let promise = Promise::from_account_data(tx.data(&address)?)?;
    Ok((address, promise))
}

fn vault_authority(
    resolver: &AddressResolver,
    reference: PromiseRef,
    presented: Address,
) -> Result<VaultAuthority> {
    let authority = resolver.vault_authority(&reference.owner, reference.sequence)?;
    if authority.address() != presented {
        return Err(PledgeError::VaultMismatch {
            expected: authority.address(),
            presented,
        });
    }
    Ok(authority)
}

/// A token account that may receive settlement funds. Never vault-owned.
fn destination(tx: &Transaction<'_>, account: &Address) -> Result<TokenAccount> {
    let token = tx.token_account(account)?;
    if token.is_vault_owned() {
        return Err(PledgeError::VaultDestination(*account));
    }
    Ok(token)
}

fn verify_endorsement(
    referee: &Address,
    promise: &Address,
    request: &PayRequest,
) -> Result<()> {
    let signature = request
        .referee_signature
        .ok_or(PledgeError::WrongReferee(*referee))?;
    let key = VerifyingKey::from_bytes(referee.as_bytes())
        .map_err(|_| PledgeError::RefereeSignatureInvalid)?;
    let payload = pay_endorsement_payload(promise, &request.beneficiary_account, request.amount);
    key.verify_strict(&payload, &signature)
        .map_err(|_| PledgeError::RefereeSignatureInvalid)
}

/// Checks run in order: state, time, vault, amount, destination, beneficiary,
/// referee.
pub(crate) fn pay(
    tx: &mut Transaction<'_>,
    resolver: &AddressResolver,
    rules: SettlementRules,
    request: &PayRequest,
) -> Result<PromiseSettled> {
    let (address, promise) = load_promise(tx, resolver, request.promise)?;
    let now = tx.now();
    let paid = promise.into_active()?.pay(now)?;
    let authority = vault_authority(resolver, request.promise, request.vault)?;

    if request.amount == 0 {
        return Err(PledgeError::InvalidAmount {
            reason: "pay amount must be > 0".into(),
        });
    }
    if request.amount > paid.amount {
        return Err(PledgeError::AmountExceedsDeposit {
            requested: request.amount,
            deposit: paid.amount,
        });
    }

    let payout = destination(tx, &request.beneficiary_account)?;
    if payout.owner != paid.beneficiary {
        return Err(PledgeError::WrongBeneficiary {
            expected: paid.beneficiary,
            actual: payout.owner,
        });
    }

    if rules.referee_policy == RefereePolicy::Signed {
        verify_endorsement(&paid.referee, &address, request)?;
    }

    tx.transfer(
        request.vault,
        request.beneficiary_account,
        request.amount,
        TransferAuthority::Vault(&authority),
    )?;
    let refunded = tx.token_account(&request.vault)?.amount;
    if refunded > 0 {
        tx.transfer(
            request.vault,
            paid.refund_account,
            refunded,
            TransferAuthority::Vault(&authority),
        )?;
    }
    tx.write_data(address, paid.to_account_data())?;

    Ok(PromiseSettled {
        reference: request.promise,
        promise: address,
        state: paid.state(),
        destination: request.beneficiary_account,
        released: request.amount,
        refunded,
        settled_at: now,
    })
}

/// Checks run in order: state, time, vault, destination, collector.
pub(crate) fn collect_broken_promise(
    tx: &mut Transaction<'_>,
    resolver: &AddressResolver,
    rules: SettlementRules,
    request: &CollectRequest,
) -> Result<PromiseSettled> {
    let (address, promise) = load_promise(tx, resolver, request.promise)?;
    let now = tx.now();
    let forfeited = promise.into_active()?.forfeit(now)?;
    let authority = vault_authority(resolver, request.promise, request.vault)?;

    let sink = destination(tx, &request.destination_account)?;
    if let Some(collector) = rules.collector {
        if sink.owner != collector {
            return Err(PledgeError::WrongCollector {
                expected: collector,
                actual: sink.owner,
            });
        }
    }

    let released = tx.token_account(&request.vault)?.amount;
    if released > 0 {
        tx.transfer(
            request.vault,
            request.destination_account,
            released,
            TransferAuthority::Vault(&authority),
        )?;
    }
    tx.write_data(address, forfeited.to_account_data())?;

    Ok(PromiseSettled {
        reference: request.promise,
        promise: address,
        state: forfeited.state(),
        destination: request.destination_account,
        released,
        refunded: 0,
        settled_at: now,
    })
}
