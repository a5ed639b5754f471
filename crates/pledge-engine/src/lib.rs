//! # pledge-engine
//!
//! Time-boxed conditional escrow on top of [`pledge_ledger`].
//!
//! ## Architecture
//!
//! A user funds a *promise*: tokens move into a vault at a derived address
//! that no key controls. Before the timeout the deposit can be released to
//! the beneficiary; after it, anyone may collect it.
//!
//! 1. **Registry**: one user record per slug, each with a promise counter
//! 2. **Escrow**: open vault, fund it, record the promise, bump the counter
//! 3. **Settlement**: pay (in time) or collect (expired), vault authority
//!    re-derived from the promise's public `(owner, sequence)`
//! 4. **Receipts**: every commit is logged with a slot and payload hash
//!
//! ## Lifecycle
//!
//! ```text
//! register_user ─▶ create_promise ─┬─ pay (now <= timeout)      ─▶ PAID
//!                                  └─ collect (now > timeout)   ─▶ FORFEITED
//! ```

pub mod engine;
pub mod escrow;
pub mod events;
mod registry;
pub mod settlement;
pub mod telemetry;

pub use engine::PromiseEngine;
pub use escrow::CreatePromise;
pub use events::{PromiseCreated, PromiseSettled, UserRegistered};
pub use settlement::{CollectRequest, PayRequest};
pub use telemetry::init_tracing;
