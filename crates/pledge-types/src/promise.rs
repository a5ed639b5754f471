//! # Promise — the time-boxed escrow commitment
//!
//! A `Promise` binds a deposit held in a derived-address vault to a referee,
//! a beneficiary and an absolute timeout.
//!
//! ## State Machine
//!
//! ```text
//!   ┌────────┐  pay, now <= timeout      ┌──────┐
//!   │ ACTIVE ├──────────────────────────▶│ PAID │
//!   └───┬────┘                           └──────┘
//!       │ collect, now > timeout
//!       ▼
//!   ┌───────────┐
//!   │ FORFEITED │
//!   └───────────┘
//! ```
//!
//! Both terminal transitions go through [`ActivePromise`], which can only be
//! obtained from an ACTIVE record and is consumed by the transition.

use serde::{Deserialize, Serialize};

use crate::{
    codec::{AccountReader, AccountWriter},
    constants::PAY_ENDORSEMENT_DOMAIN,
    Address, PledgeError, PromiseRef, Result,
};

const KIND: &str = "Promise";

/// The lifecycle state of a promise.
///
/// Transitions are **monotonic**:
/// - `Active → Paid` (referee-side release before the timeout)
/// - `Active → Forfeited` (collection after the timeout)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PromiseState {
    /// Deposit sits in the vault.
    Active,
    /// Released to the beneficiary. **Terminal.**
    Paid,
    /// Collected after expiry. **Terminal.**
    Forfeited,
}

impl PromiseState {
    #[must_use]
    pub fn can_transition_to(&self, target: Self) -> bool {
        matches!((self, target), (Self::Active, Self::Paid | Self::Forfeited))
    }

    #[must_use]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Active)
    }

    fn tag(self) -> u8 {
        match self {
            Self::Active => 0,
            Self::Paid => 1,
            Self::Forfeited => 2,
        }
    }

    fn from_tag(tag: u8) -> Result<Self> {
        match tag {
            0 => Ok(Self::Active),
            1 => Ok(Self::Paid),
            2 => Ok(Self::Forfeited),
            other => Err(PledgeError::AccountDataInvalid {
                reason: format!("unknown promise state tag {other}"),
            }),
        }
    }
}

impl std::fmt::Display for PromiseState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Paid => write!(f, "PAID"),
            Self::Forfeited => write!(f, "FORFEITED"),
        }
    }
}

/// Terms of a promise fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseTerms {
    /// Absolute expiry, unix seconds.
    pub timeout: i64,
    /// Identity entitled to request release.
    pub referee: Address,
    /// Identity whose token account may receive a release.
    pub beneficiary: Address,
    /// Deposited quantity.
    pub amount: u64,
    /// Asset type.
    pub mint: Address,
}

/// The authoritative promise record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise {
    /// Signer that funded the promise.
    pub owner: Address,
    /// Owner's user record.
    pub user: Address,
    /// Owner's `promise_sequence` at creation.
    pub sequence: u64,
    pub mint: Address,
    pub amount: u64,
    pub timeout: i64,
    pub referee: Address,
    pub beneficiary: Address,
    /// Funding token account; receives the remainder of a partial release.
    pub refund_account: Address,
    state: PromiseState,
}

impl Promise {
    /// A new ACTIVE promise.
    #[must_use]
    pub fn open(
        owner: Address,
        user: Address,
        sequence: u64,
        terms: PromiseTerms,
        refund_account: Address,
    ) -> Self {
        Self {
            owner,
            user,
            sequence,
            mint: terms.mint,
            amount: terms.amount,
            timeout: terms.timeout,
            referee: terms.referee,
            beneficiary: terms.beneficiary,
            refund_account,
            state: PromiseState::Active,
        }
    }

    #[must_use]
    pub fn state(&self) -> PromiseState {
        self.state
    }

    #[must_use]
    pub fn reference(&self) -> PromiseRef {
        PromiseRef::new(self.owner, self.sequence)
    }

    /// Whether `now` is past the timeout.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        now > self.timeout
    }

    /// Unlock the transition API.
    ///
    /// # Errors
    /// [`PledgeError::AlreadyResolved`] if the promise is PAID or FORFEITED.
    pub fn into_active(self) -> Result<ActivePromise> {
        if self.state != PromiseState::Active {
            return Err(PledgeError::AlreadyResolved(self.state));
        }
        Ok(ActivePromise(self))
    }

    /// Encode into the persisted account layout.
    #[must_use]
    pub fn to_account_data(&self) -> Vec<u8> {
        AccountWriter::new(KIND, 32 * 6 + 8 * 3 + 1)
            .address(&self.owner)
            .address(&self.user)
            .u64(self.sequence)
            .address(&self.mint)
            .u64(self.amount)
            .i64(self.timeout)
            .address(&self.referee)
            .address(&self.beneficiary)
            .address(&self.refund_account)
            .u8(self.state.tag())
            .finish()
    }

    /// Decode from the persisted account layout.
    ///
    /// # Errors
    /// [`PledgeError::AccountDataInvalid`] on any layout violation.
    pub fn from_account_data(data: &[u8]) -> Result<Self> {
        let mut r = AccountReader::new(KIND, data)?;
        let promise = Self {
            owner: r.address()?,
            user: r.address()?,
            sequence: r.u64()?,
            mint: r.address()?,
            amount: r.u64()?,
            timeout: r.i64()?,
            referee: r.address()?,
            beneficiary: r.address()?,
            refund_account: r.address()?,
            state: PromiseState::from_tag(r.u8()?)?,
        };
        r.finish()?;
        Ok(promise)
    }
}

/// A promise proven to be ACTIVE.
///
/// The transitions take `self`, so one value can be resolved at most once.
#[derive(Debug)]
pub struct ActivePromise(Promise);

impl ActivePromise {
    /// Release before the timeout. `now == timeout` still counts as in time.
    ///
    /// # Errors
    /// [`PledgeError::TimeLimitExceeded`] if `now > timeout`.
    pub fn pay(self, now: i64) -> Result<Promise> {
        if self.0.is_expired_at(now) {
            return Err(PledgeError::TimeLimitExceeded {
                timeout: self.0.timeout,
                now,
            });
        }
        Ok(self.resolve(PromiseState::Paid))
    }

    /// Forfeit after the timeout.
    ///
    /// # Errors
    /// [`PledgeError::NotYetExpired`] if `now <= timeout`.
    pub fn forfeit(self, now: i64) -> Result<Promise> {
        if !self.0.is_expired_at(now) {
            return Err(PledgeError::NotYetExpired {
                timeout: self.0.timeout,
                now,
            });
        }
        Ok(self.resolve(PromiseState::Forfeited))
    }

    fn resolve(self, target: PromiseState) -> Promise {
        debug_assert!(self.0.state.can_transition_to(target));
        let mut promise = self.0;
        promise.state = target;
        promise
    }
}

/// Canonical bytes a referee signs to endorse a release.
///
/// Format: `"pledge:pay:v1:" || promise address || beneficiary account || amount (u64 BE)`
#[must_use]
pub fn pay_endorsement_payload(
    promise: &Address,
    beneficiary_account: &Address,
    amount: u64,
) -> Vec<u8> {
    let mut payload = Vec::with_capacity(PAY_ENDORSEMENT_DOMAIN.len() + 72);
    payload.extend_from_slice(PAY_ENDORSEMENT_DOMAIN);
    payload.extend_from_slice(promise.as_bytes());
    payload.extend_from_slice(beneficiary_account.as_bytes());
    payload.extend_from_slice(&amount.to_be_bytes());
    payload
}

/// Dummy promise for testing. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Promise {
    pub fn dummy(amount: u64, timeout: i64) -> Self {
        let owner = Address::random();
        Self::open(
            owner,
            Address::random(),
            0,
            PromiseTerms {
                timeout,
                referee: Address::random(),
                beneficiary: owner,
                amount,
                mint: Address::random(),
            },
            Address::random(),
        )
    }
}
