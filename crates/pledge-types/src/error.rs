//! Error types for the Pledge escrow engine.
//!
//! All errors use the `PL_ERR_` prefix convention for easy grepping in logs.
//! Error codes are grouped by subsystem:
//! - 1xx: User registry errors
//! - 2xx: Account store errors
//! - 3xx: Token errors
//! - 4xx: Promise / settlement errors
//! - 5xx: Address derivation errors
//! - 9xx: General / internal errors

use thiserror::Error;

use crate::{Address, PromiseState};

/// Central error enum for all Pledge operations.
#[derive(Debug, Error)]
pub enum PledgeError {
    // =================================================================
    // Registry Errors (1xx)
    // =================================================================
    /// A user record already exists at the address derived from this slug.
    #[error("PL_ERR_100: Slug already registered: {0}")]
    DuplicateSlug(String),

    /// The slug is empty or longer than the seed limit.
    #[error("PL_ERR_101: Invalid slug: {reason}")]
    InvalidSlug { reason: String },

    /// The display name exceeds the configured limit.
    #[error("PL_ERR_102: Invalid name: {reason}")]
    InvalidName { reason: String },

    /// The signer is not the authority recorded on the user record.
    #[error("PL_ERR_103: Signer {signer} is not the authority of user {user}")]
    UnauthorizedOwner { signer: Address, user: Address },

    // =================================================================
    // Account Errors (2xx)
    // =================================================================
    /// No account exists at the referenced address.
    #[error("PL_ERR_200: Account not found: {0}")]
    AccountNotFound(Address),

    /// An account already exists where a new one was to be allocated.
    #[error("PL_ERR_201: Account already exists: {0}")]
    AccountAlreadyExists(Address),

    /// Account data failed to decode, or the account has the wrong kind.
    #[error("PL_ERR_202: Invalid account data: {reason}")]
    AccountDataInvalid { reason: String },

    // =================================================================
    // Token Errors (3xx)
    // =================================================================
    /// The source token account holds less than the requested amount.
    #[error("PL_ERR_300: Insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: u64, available: u64 },

    /// Two token accounts (or an account and a promise) disagree on mint.
    #[error("PL_ERR_301: Mint mismatch: expected {expected}, got {actual}")]
    MintMismatch { expected: Address, actual: Address },

    /// The presented authority does not own the source token account.
    #[error("PL_ERR_302: Unauthorized transfer from {account}")]
    UnauthorizedTransfer { account: Address },

    /// A credit would overflow the destination balance.
    #[error("PL_ERR_303: Balance overflow on {0}")]
    BalanceOverflow(Address),

    /// Zero or otherwise unusable amount.
    #[error("PL_ERR_304: Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Source and destination are the same account.
    #[error("PL_ERR_305: Transfer from {0} to itself")]
    SelfTransfer(Address),

    // =================================================================
    // Promise / Settlement Errors (4xx)
    // =================================================================
    /// Pay attempted after the promise timeout.
    #[error("PL_ERR_400: Time limit exceeded: timeout {timeout}, now {now}")]
    TimeLimitExceeded { timeout: i64, now: i64 },

    /// Collect attempted at or before the promise timeout.
    #[error("PL_ERR_401: Promise not yet expired: timeout {timeout}, now {now}")]
    NotYetExpired { timeout: i64, now: i64 },

    /// The promise has already been paid or forfeited.
    #[error("PL_ERR_402: Promise already resolved ({0})")]
    AlreadyResolved(PromiseState),

    /// The presented vault is not the one derived for this promise.
    #[error("PL_ERR_403: Vault mismatch: expected {expected}, presented {presented}")]
    VaultMismatch { expected: Address, presented: Address },

    /// Requested release exceeds the deposited amount.
    #[error("PL_ERR_404: Requested {requested} exceeds deposit {deposit}")]
    AmountExceedsDeposit { requested: u64, deposit: u64 },

    /// The payout account is not owned by the recorded beneficiary.
    #[error("PL_ERR_405: Wrong beneficiary: expected {expected}, got {actual}")]
    WrongBeneficiary { expected: Address, actual: Address },

    /// Referee endorsement is required but was not supplied.
    #[error("PL_ERR_406: Referee endorsement required from {0}")]
    WrongReferee(Address),

    /// The referee signature does not verify over the pay payload.
    #[error("PL_ERR_407: Referee signature verification failed")]
    RefereeSignatureInvalid,

    /// The forfeiture destination is not owned by the configured collector.
    #[error("PL_ERR_408: Wrong collector: expected {expected}, got {actual}")]
    WrongCollector { expected: Address, actual: Address },

    /// A settlement destination is itself a promise vault.
    #[error("PL_ERR_409: Destination {0} is a promise vault")]
    VaultDestination(Address),

    // =================================================================
    // Derivation Errors (5xx)
    // =================================================================
    /// Every bump produced an on-curve point.
    #[error("PL_ERR_500: No viable bump seed for derived address")]
    NoViableBump,

    /// A signer address was required but the bytes are not an ed25519 point.
    #[error("PL_ERR_501: Not a signer address: {0}")]
    NotASigner(Address),

    // =================================================================
    // General / Internal (9xx)
    // =================================================================
    /// Unrecoverable internal error.
    #[error("PL_ERR_900: Internal error: {0}")]
    Internal(String),

    /// Serialization / deserialization error.
    #[error("PL_ERR_901: Serialization error: {0}")]
    Serialization(String),

    /// Configuration error (invalid config file, bad fields, etc.).
    #[error("PL_ERR_902: Configuration error: {0}")]
    Configuration(String),

    /// I/O error.
    #[error("PL_ERR_903: I/O error: {0}")]
    Io(String),

    /// Token supply no longer matches deposits. Critical safety alert.
    #[error("PL_ERR_904: Supply invariant violation: {reason}")]
    SupplyInvariantViolation { reason: String },
}

/// Crate-wide `Result` alias.
pub type Result<T> = std::result::Result<T, PledgeError>;

impl From<std::io::Error> for PledgeError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for PledgeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_contains_prefix() {
        let err = PledgeError::DuplicateSlug("alice".into());
        let msg = format!("{err}");
        assert!(msg.starts_with("PL_ERR_100"), "Got: {msg}");
        assert!(msg.contains("alice"));
    }

    #[test]
    fn insufficient_funds_display() {
        let err = PledgeError::InsufficientFunds {
            needed: 100,
            available: 50,
        };
        let msg = format!("{err}");
        assert!(msg.contains("PL_ERR_300"));
        assert!(msg.contains("100"));
        assert!(msg.contains("50"));
    }

    #[test]
    fn already_resolved_names_state() {
        let msg = format!("{}", PledgeError::AlreadyResolved(PromiseState::Forfeited));
        assert!(msg.contains("PL_ERR_402"));
        assert!(msg.contains("FORFEITED"));
    }

    #[test]
    fn all_errors_have_pl_err_prefix() {
        let errors: Vec<Box<dyn std::error::Error>> = vec![
            Box::new(PledgeError::AccountNotFound(Address([7u8; 32]))),
            Box::new(PledgeError::TimeLimitExceeded { timeout: 1, now: 2 }),
            Box::new(PledgeError::NotYetExpired { timeout: 2, now: 1 }),
            Box::new(PledgeError::NoViableBump),
            Box::new(PledgeError::SelfTransfer(Address([1u8; 32]))),
            Box::new(PledgeError::VaultDestination(Address([2u8; 32]))),
            Box::new(PledgeError::Internal("test".into())),
        ];
        for err in errors {
            let msg = format!("{err}");
            assert!(
                msg.starts_with("PL_ERR_"),
                "Error missing PL_ERR_ prefix: {msg}"
            );
        }
    }
}
