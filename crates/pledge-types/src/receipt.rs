//! Commit receipts for the Pledge audit trail.
//!
//! Every committed operation produces a [`Receipt`] holding the SHA-256 of
//! its JSON event payload, the slot it was committed in, and the commit time.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::TxId;

/// The type of action this receipt proves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptKind {
    /// A user record was registered.
    UserRegistered,
    /// A promise was created and its vault funded.
    PromiseCreated,
    /// A promise was released to its beneficiary.
    PromisePaid,
    /// An expired promise was collected.
    PromiseForfeited,
    /// Harness-level token account or deposit operation.
    TokenAdmin,
}

impl std::fmt::Display for ReceiptKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserRegistered => write!(f, "USER_REGISTERED"),
            Self::PromiseCreated => write!(f, "PROMISE_CREATED"),
            Self::PromisePaid => write!(f, "PROMISE_PAID"),
            Self::PromiseForfeited => write!(f, "PROMISE_FORFEITED"),
            Self::TokenAdmin => write!(f, "TOKEN_ADMIN"),
        }
    }
}

/// Proof that a transaction committed.
///
/// Receipts form an append-only log in slot order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_id: TxId,
    pub kind: ReceiptKind,
    /// Global commit sequence number.
    pub slot: u64,
    /// SHA-256 of `payload`.
    pub payload_hash: [u8; 32],
    /// JSON-encoded event.
    pub payload: Vec<u8>,
    pub committed_at: DateTime<Utc>,
}

impl Receipt {
    #[must_use]
    pub fn new(kind: ReceiptKind, slot: u64, payload: Vec<u8>, committed_at: DateTime<Utc>) -> Self {
        let payload_hash = Sha256::digest(&payload).into();
        Self {
            tx_id: TxId::new(),
            kind,
            slot,
            payload_hash,
            payload,
            committed_at,
        }
    }

    /// Recompute the payload hash and compare.
    #[must_use]
    pub fn verify_payload(&self) -> bool {
        let actual: [u8; 32] = Sha256::digest(&self.payload).into();
        actual == self.payload_hash
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receipt_kind_display() {
        assert_eq!(format!("{}", ReceiptKind::PromisePaid), "PROMISE_PAID");
        assert_eq!(
            format!("{}", ReceiptKind::PromiseForfeited),
            "PROMISE_FORFEITED"
        );
    }

    #[test]
    fn payload_hash_verifies() {
        let mut r = Receipt::new(ReceiptKind::PromiseCreated, 3, b"{}".to_vec(), Utc::now());
        assert!(r.verify_payload());
        r.payload.push(b' ');
        assert!(!r.verify_payload());
    }

    #[test]
    fn receipt_kind_serde_roundtrip() {
        let k = ReceiptKind::UserRegistered;
        let json = serde_json::to_string(&k).unwrap();
        let back: ReceiptKind = serde_json::from_str(&json).unwrap();
        assert_eq!(k, back);
    }
}
