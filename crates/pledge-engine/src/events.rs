//! Committed-operation events.
//!
//! Each successful engine operation returns one of these; its JSON encoding
//! is the payload hashed into the operation's receipt.

use pledge_types::{Address, PromiseRef, PromiseState};
use serde::{Deserialize, Serialize};

/// A user record was allocated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRegistered {
    pub user: Address,
    pub slug: String,
    pub name: String,
    pub authority: Address,
}

/// A promise was opened and its vault funded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseCreated {
    pub reference: PromiseRef,
    pub promise: Address,
    pub vault: Address,
    pub user: Address,
    pub mint: Address,
    pub amount: u64,
    pub timeout: i64,
    pub referee: Address,
    pub beneficiary: Address,
}

/// A promise reached a terminal state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromiseSettled {
    pub reference: PromiseRef,
    pub promise: Address,
    pub state: PromiseState,
    /// Account that received the released or forfeited tokens.
    pub destination: Address,
    pub released: u64,
    /// Remainder returned to the funding account on a partial release.
    pub refunded: u64,
    pub settled_at: i64,
}
