//! The promise engine: one façade over registry, escrow and settlement.

use pledge_ledger::{Clock, Committed, Ledger, SystemClock};
use pledge_types::{
    constants, Address, AddressResolver, EngineConfig, Promise, ReceiptKind, Result, Signer, User,
};

use crate::{
    escrow::{self, CreatePromise},
    events::{PromiseCreated, PromiseSettled, UserRegistered},
    registry,
    settlement::{self, CollectRequest, PayRequest, SettlementRules},
};

/// Owns the ledger and applies every promise operation to it.
///
/// Mutating operations take `&mut self`; each is a single ledger
/// transaction that either commits with a receipt or changes nothing.
pub struct PromiseEngine<C: Clock = SystemClock> {
    config: EngineConfig,
    resolver: AddressResolver,
    ledger: Ledger<C>,
}

impl PromiseEngine<SystemClock> {
    /// Engine on the wall clock.
    ///
    /// # Errors
    /// `Configuration` if `config` fails validation.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_clock(config, SystemClock)
    }
}

impl<C: Clock> PromiseEngine<C> {
    /// # Errors
    /// `Configuration` if `config` fails validation.
    pub fn with_clock(config: EngineConfig, clock: C) -> Result<Self> {
        config.validate()?;
        tracing::info!(
            engine = constants::ENGINE_NAME,
            version = constants::VERSION,
            program_id = %config.program_id,
            referee_policy = ?config.referee_policy,
            collector = ?config.collector,
            "promise engine started"
        );
        Ok(Self {
            resolver: AddressResolver::new(config.program_id),
            config,
            ledger: Ledger::with_clock(clock),
        })
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn resolver(&self) -> &AddressResolver {
        &self.resolver
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger<C> {
        &self.ledger
    }

    /// Mutable ledger access for token-account setup and deposits.
    pub fn ledger_mut(&mut self) -> &mut Ledger<C> {
        &mut self.ledger
    }

    fn rules(&self) -> SettlementRules {
        SettlementRules {
            referee_policy: self.config.referee_policy,
            collector: self.config.collector,
        }
    }

    // -----------------------------------------------------------------
    // Registry
    // -----------------------------------------------------------------

    /// Register a new user under `slug`.
    ///
    /// # Errors
    /// `DuplicateSlug`, `InvalidSlug`, `InvalidName`.
    pub fn register_user(
        &mut self,
        signer: Signer,
        name: &str,
        slug: &str,
    ) -> Result<Committed<UserRegistered>> {
        let resolver = self.resolver;
        let max_name_len = self.config.max_name_len;
        let result = self.ledger.transact(ReceiptKind::UserRegistered, |tx| {
            registry::register_user(tx, &resolver, max_name_len, signer, name, slug)
        });
        match &result {
            Ok(c) => tracing::info!(
                user = %c.value.user,
                slug,
                slot = c.receipt.slot,
                "user registered"
            ),
            Err(e) => tracing::warn!(slug, error = %e, "user registration rejected"),
        }
        result
    }

    /// The user record at `user`.
    ///
    /// # Errors
    /// `AccountNotFound`, or `AccountDataInvalid` if it is not a user record.
    pub fn user(&self, user: &Address) -> Result<User> {
        User::from_account_data(self.ledger.data(user)?)
    }

    /// Look a user up by slug.
    pub fn user_by_slug(&self, slug: &str) -> Result<(Address, User)> {
        let address = self.resolver.user_address(slug)?;
        Ok((address, self.user(&address)?))
    }

    /// Sequence index the user's next promise will receive.
    ///
    /// # Errors
    /// `AccountNotFound` if no user record exists.
    pub fn next_sequence(&self, user: &Address) -> Result<u64> {
        self.user(user).map(|u| u.promise_sequence)
    }

    // -----------------------------------------------------------------
    // Escrow
    // -----------------------------------------------------------------

    /// Open a promise and fund its vault.
    ///
    /// # Errors
    /// `AccountNotFound`, `UnauthorizedOwner`, `InvalidAmount`, `NotASigner`
    /// (derived beneficiary), `MintMismatch`, `UnauthorizedTransfer`,
    /// `InsufficientFunds`.
    pub fn create_promise(
        &mut self,
        signer: Signer,
        request: &CreatePromise,
    ) -> Result<Committed<PromiseCreated>> {
        let resolver = self.resolver;
        let result = self.ledger.transact(ReceiptKind::PromiseCreated, |tx| {
            escrow::create_promise(tx, &resolver, signer, request)
        });
        match &result {
            Ok(c) => tracing::info!(
                promise = %c.value.reference,
                vault = %c.value.vault,
                amount = c.value.amount,
                timeout = c.value.timeout,
                slot = c.receipt.slot,
                "promise created"
            ),
            Err(e) => tracing::warn!(
                user = %request.user,
                amount = request.amount,
                error = %e,
                "promise creation rejected"
            ),
        }
        result
    }

    /// The promise record for `(owner, sequence)`.
    ///
    /// # Errors
    /// `AccountNotFound`, or `AccountDataInvalid` if it is not a promise record.
    pub fn promise(&self, owner: &Address, sequence: u64) -> Result<Promise> {
        let address = self.resolver.promise_address(owner, sequence)?;
        Promise::from_account_data(self.ledger.data(&address)?)
    }

    // -----------------------------------------------------------------
    // Settlement
    // -----------------------------------------------------------------

    /// Release a promise's deposit before its timeout.
    ///
    /// # Errors
    /// `AccountNotFound`, `AlreadyResolved`, `TimeLimitExceeded`,
    /// `VaultMismatch`, `InvalidAmount`, `AmountExceedsDeposit`,
    /// `VaultDestination`, `WrongBeneficiary`, `WrongReferee`,
    /// `RefereeSignatureInvalid`.
    pub fn pay(&mut self, request: &PayRequest) -> Result<Committed<PromiseSettled>> {
        let resolver = self.resolver;
        let rules = self.rules();
        let result = self.ledger.transact(ReceiptKind::PromisePaid, |tx| {
            settlement::pay(tx, &resolver, rules, request)
        });
        log_settlement("pay", &request.promise, &result);
        result
    }

    /// Collect an expired, unresolved promise.
    ///
    /// # Errors
    /// `AccountNotFound`, `AlreadyResolved`, `NotYetExpired`,
    /// `VaultMismatch`, `VaultDestination`, `WrongCollector`.
    pub fn collect_broken_promise(
        &mut self,
        request: &CollectRequest,
    ) -> Result<Committed<PromiseSettled>> {
        let resolver = self.resolver;
        let rules = self.rules();
        let result = self.ledger.transact(ReceiptKind::PromiseForfeited, |tx| {
            settlement::collect_broken_promise(tx, &resolver, rules, request)
        });
        log_settlement("collect", &request.promise, &result);
        result
    }
}

fn log_settlement(
    op: &str,
    promise: &pledge_types::PromiseRef,
    result: &Result<Committed<PromiseSettled>>,
) {
    match result {
        Ok(c) => tracing::info!(
            op,
            %promise,
            state = %c.value.state,
            released = c.value.released,
            refunded = c.value.refunded,
            slot = c.receipt.slot,
            "promise settled"
        ),
        Err(e) => tracing::warn!(op, %promise, error = %e, "settlement rejected"),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use pledge_ledger::ManualClock;
    use pledge_types::{PledgeError, PromiseState, RefereePolicy};

    use super::*;

    const MINT: Address = Address([0x4d; 32]);

    fn engine(config: EngineConfig) -> (PromiseEngine<Arc<ManualClock>>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let engine = PromiseEngine::with_clock(config, Arc::clone(&clock)).unwrap();
        (engine, clock)
    }

    #[test]
    fn rejects_invalid_config() {
        let config = EngineConfig {
            max_name_len: 0,
            ..EngineConfig::default()
        };
        assert!(matches!(
            PromiseEngine::new(config),
            Err(PledgeError::Configuration(_))
        ));
    }

    #[test]
    fn lookup_by_slug_and_sequence() {
        let (mut engine, _) = engine(EngineConfig::default());
        let (_, alice) = Signer::generate();
        let reg = engine.register_user(alice, "Alice", "alice").unwrap();

        let (addr, user) = engine.user_by_slug("alice").unwrap();
        assert_eq!(addr, reg.value.user);
        assert_eq!(user.slug, "alice");
        assert_eq!(engine.next_sequence(&addr).unwrap(), 0);
        assert!(matches!(
            engine.next_sequence(&Address::random()),
            Err(PledgeError::AccountNotFound(_))
        ));
    }

    #[test]
    fn receipts_follow_operations() {
        let (mut engine, clock) = engine(EngineConfig::default());
        let (_, alice) = Signer::generate();
        let user = engine.register_user(alice, "Alice", "alice").unwrap().value.user;
        let wallet = Address::random();
        engine.ledger_mut().create_token_account(wallet, MINT, alice).unwrap();
        engine.ledger_mut().deposit(wallet, 50).unwrap();

        let created = engine
            .create_promise(
                alice,
                &CreatePromise {
                    user,
                    timeout: 1_005,
                    referee: Address::random(),
                    beneficiary: None,
                    amount: 20,
                    mint: MINT,
                    funding_source: wallet,
                },
            )
            .unwrap();
        assert_eq!(created.receipt.kind, ReceiptKind::PromiseCreated);
        let decoded: PromiseCreated = serde_json::from_slice(&created.receipt.payload).unwrap();
        assert_eq!(decoded, created.value);

        clock.advance(6);
        let settled = engine
            .collect_broken_promise(&CollectRequest {
                promise: created.value.reference,
                vault: created.value.vault,
                destination_account: wallet,
            })
            .unwrap();
        assert_eq!(settled.receipt.kind, ReceiptKind::PromiseForfeited);
        assert_eq!(settled.value.settled_at, 1_006);

        let kinds: Vec<ReceiptKind> = engine.ledger().receipts().iter().map(|r| r.kind).collect();
        assert_eq!(
            kinds,
            vec![
                ReceiptKind::UserRegistered,
                ReceiptKind::TokenAdmin,
                ReceiptKind::TokenAdmin,
                ReceiptKind::PromiseCreated,
                ReceiptKind::PromiseForfeited,
            ]
        );
        assert_eq!(
            engine.promise(&alice.address(), 0).unwrap().state(),
            PromiseState::Forfeited
        );
        engine.ledger().verify_all_supply().unwrap();
    }

    #[test]
    fn policy_comes_from_config() {
        let config = EngineConfig {
            referee_policy: RefereePolicy::Signed,
            ..EngineConfig::default()
        };
        let (mut engine, _) = engine(config);
        let (_, alice) = Signer::generate();
        let user = engine.register_user(alice, "Alice", "alice").unwrap().value.user;
        let wallet = Address::random();
        engine.ledger_mut().create_token_account(wallet, MINT, alice).unwrap();
        engine.ledger_mut().deposit(wallet, 10).unwrap();
        let referee = Address::random();
        let created = engine
            .create_promise(
                alice,
                &CreatePromise {
                    user,
                    timeout: 2_000,
                    referee,
                    beneficiary: None,
                    amount: 10,
                    mint: MINT,
                    funding_source: wallet,
                },
            )
            .unwrap()
            .value;

        let err = engine
            .pay(&PayRequest {
                promise: created.reference,
                vault: created.vault,
                beneficiary_account: wallet,
                amount: 10,
                referee_signature: None,
            })
            .unwrap_err();
        assert!(matches!(err, PledgeError::WrongReferee(r) if r == referee));
    }
}
