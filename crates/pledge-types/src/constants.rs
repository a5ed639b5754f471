//! System-wide constants for the Pledge escrow engine.

/// Seed tag for user record addresses.
pub const USER_SEED: &[u8] = b"user";

/// Seed tag for promise record addresses.
pub const PROMISE_SEED: &[u8] = b"promise";

/// Seed tag for promise vault addresses.
pub const VAULT_SEED: &[u8] = b"promise_wallet";

/// Maximum slug length in bytes (one derivation seed).
pub const MAX_SLUG_LEN: usize = 32;

/// Default maximum display-name length in bytes.
pub const DEFAULT_MAX_NAME_LEN: usize = 64;

/// Length of the account-kind discriminator prefix.
pub const DISCRIMINATOR_LEN: usize = 8;

/// Domain tag for referee pay endorsements.
pub const PAY_ENDORSEMENT_DOMAIN: &[u8] = b"pledge:pay:v1:";

/// Default program id (hex) used when no configuration is supplied.
pub const DEFAULT_PROGRAM_ID: &str =
    "706c656467652d657363726f772d70726f6772616d2d69642d76312d30303030";

/// Version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name.
pub const ENGINE_NAME: &str = "Pledge";
