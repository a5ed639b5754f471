//! # pledge-types
//!
//! Shared types, errors, and configuration for the **Pledge** escrow engine.
//!
//! This crate is the leaf dependency of the workspace; every other crate
//! depends on it. It defines:
//!
//! - **Identifiers**: [`Address`], [`Signer`], [`TxId`], [`PromiseRef`]
//! - **Derivation**: [`AddressResolver`], [`VaultAuthority`], [`derive_address`]
//! - **Records**: [`User`], [`Promise`], [`PromiseState`], [`ActivePromise`]
//! - **Receipts**: [`Receipt`], [`ReceiptKind`]
//! - **Configuration**: [`EngineConfig`], [`RefereePolicy`], [`LoggingConfig`]
//! - **Errors**: [`PledgeError`] with `PL_ERR_` prefix codes
//! - **Constants**: seed tags and limits

pub mod address;
pub mod codec;
pub mod config;
pub mod constants;
pub mod derive;
pub mod error;
pub mod promise;
pub mod receipt;
pub mod user;

pub use address::*;
pub use config::*;
pub use derive::*;
pub use error::*;
pub use promise::*;
pub use receipt::*;
pub use user::*;

// Constants are accessed via `pledge_types::constants::FOO`
// (not re-exported to avoid name collisions).
