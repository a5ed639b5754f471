//! # pledge-ledger
//!
//! In-memory ledger substrate for the Pledge escrow engine.
//!
//! ## Architecture
//!
//! The escrow core treats the ledger as an external capability. This crate
//! provides a single-process rendition of it:
//! 1. **Account store**: record accounts and token accounts keyed by [`Address`](pledge_types::Address)
//! 2. **Token transfers**: mint-checked, owner-authorised balance moves
//! 3. **Transactions**: overlay writes merged all-or-nothing
//! 4. **Ordering**: a global slot counter and an append-only receipt log
//! 5. **SupplyConservation**: per-mint balance sum == deposits, verifiable on demand
//!
//! ## Transaction Flow
//!
//! ```text
//! Ledger::transact(kind, |tx| { reads / writes / transfers })
//!     Ok  → merge overlay → slot += 1 → Receipt
//!     Err → drop overlay  → state unchanged
//! ```

pub mod account;
pub mod clock;
pub mod ledger;
pub mod supply;
pub mod transaction;

pub use account::{Account, TokenAccount};
pub use clock::{Clock, ManualClock, SystemClock};
pub use ledger::{Committed, Ledger, TokenAdminEvent};
pub use supply::SupplyConservation;
pub use transaction::{Transaction, TransferAuthority};
