//! Addresses and identifiers used throughout Pledge.
//!
//! Every account lives at a 32-byte [`Address`]. Signer addresses are
//! ed25519 public keys; derived addresses are deliberately *off* the curve so
//! that no private key can exist for them (see [`crate::derive`]).

use std::{fmt, str::FromStr};

use ed25519_dalek::VerifyingKey;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::{PledgeError, Result};

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A 32-byte account address, rendered as lowercase hex.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct Address(pub [u8; 32]);

impl Address {
    #[must_use]
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Whether these bytes decompress to an ed25519 point, i.e. whether a
    /// private key could exist for this address.
    #[must_use]
    pub fn is_on_curve(&self) -> bool {
        VerifyingKey::from_bytes(&self.0).is_ok()
    }

    /// First four bytes as hex, for log lines.
    #[must_use]
    pub fn short(&self) -> String {
        hex::encode(&self.0[..4])
    }
}

impl From<VerifyingKey> for Address {
    fn from(key: VerifyingKey) -> Self {
        Self(key.to_bytes())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.short())
    }
}

impl FromStr for Address {
    type Err = PledgeError;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s, &mut bytes).map_err(|e| {
            PledgeError::Serialization(format!("invalid address {s:?}: {e}"))
        })?;
        Ok(Self(bytes))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Signer
// ---------------------------------------------------------------------------

/// An address that has authorised the current operation.
///
/// Signature verification belongs to the substrate; by the time a `Signer`
/// reaches the engine the transaction signature has been checked. The only
/// thing enforced here is that the address is a real ed25519 key, so a
/// derived (key-less) address can never pose as a signer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signer(Address);

impl Signer {
    /// # Errors
    /// Returns [`PledgeError::NotASigner`] for off-curve addresses.
    pub fn new(address: Address) -> Result<Self> {
        if !address.is_on_curve() {
            return Err(PledgeError::NotASigner(address));
        }
        Ok(Self(address))
    }

    #[must_use]
    pub fn address(&self) -> Address {
        self.0
    }
}

impl From<VerifyingKey> for Signer {
    fn from(key: VerifyingKey) -> Self {
        Self(Address::from(key))
    }
}

// ---------------------------------------------------------------------------
// TxId
// ---------------------------------------------------------------------------

/// Identifier of a committed transaction. Uses UUIDv7 for time-ordered sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct TxId(pub Uuid);

impl TxId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for TxId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tx:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// PromiseRef
// ---------------------------------------------------------------------------

/// Public identity of a promise: its owner and sequence index.
///
/// Both the promise record and its vault are re-derived from this pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct PromiseRef {
    pub owner: Address,
    pub sequence: u64,
}

impl PromiseRef {
    #[must_use]
    pub fn new(owner: Address, sequence: u64) -> Self {
        Self { owner, sequence }
    }
}

impl fmt::Display for PromiseRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "promise:{}#{}", self.owner.short(), self.sequence)
    }
}

// ---------------------------------------------------------------------------
// Test helpers
// ---------------------------------------------------------------------------

/// Random keys and addresses for tests. **Never use in production.**
#[cfg(any(test, feature = "test-helpers"))]
impl Address {
    /// Random 32 bytes. May or may not be on the curve.
    pub fn random() -> Self {
        Self(rand::random::<[u8; 32]>())
    }
}

#[cfg(any(test, feature = "test-helpers"))]
impl Signer {
    /// Fresh ed25519 keypair and its signer identity.
    pub fn generate() -> (ed25519_dalek::SigningKey, Self) {
        let key = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
        let signer = Self::from(key.verifying_key());
        (key, signer)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_hex_roundtrip() {
        let addr = Address([0xab; 32]);
        let s = addr.to_string();
        assert_eq!(s.len(), 64);
        assert!(s.starts_with("abab"));
        let back: Address = s.parse().unwrap();
        assert_eq!(addr, back);
    }

    #[test]
    fn address_parse_rejects_bad_hex() {
        assert!("zz".parse::<Address>().is_err());
        assert!("abcd".parse::<Address>().is_err());
    }

    #[test]
    fn verifying_key_is_on_curve() {
        let (_, signer) = Signer::generate();
        assert!(signer.address().is_on_curve());
    }

    #[test]
    fn signer_rejects_off_curve_address() {
        // Find some off-curve bytes deterministically.
        let off = (0u8..=255)
            .map(|b| Address([b; 32]))
            .find(|a| !a.is_on_curve())
            .expect("some constant pattern is off-curve");
        let err = Signer::new(off).unwrap_err();
        assert!(matches!(err, PledgeError::NotASigner(a) if a == off));
    }

    #[test]
    fn tx_id_ordering() {
        let a = TxId::new();
        let b = TxId::new();
        assert!(a < b);
    }

    #[test]
    fn serde_uses_hex_strings() {
        let addr = Address([1u8; 32]);
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{}\"", "01".repeat(32)));
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(addr, back);

        let r = PromiseRef::new(addr, 3);
        let json = serde_json::to_string(&r).unwrap();
        let back: PromiseRef = serde_json::from_str(&json).unwrap();
        assert_eq!(r, back);
    }
}
