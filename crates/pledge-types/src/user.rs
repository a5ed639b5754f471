//! User registry records.

use serde::{Deserialize, Serialize};

use crate::{
    codec::{AccountReader, AccountWriter},
    constants::MAX_SLUG_LEN,
    Address, PledgeError, Result,
};

const KIND: &str = "User";

/// One registered identity.
///
/// `promise_sequence` is the only mutable field, and only promise creation
/// writes it. It is the sequence index the *next* promise will receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Short unique handle; seed of the record's address.
    pub slug: String,
    /// Display label, fixed at registration.
    pub name: String,
    /// Next promise index. Starts at 0, never decremented.
    pub promise_sequence: u64,
    /// Signer that registered this user and may fund promises from it.
    pub authority: Address,
}

impl User {
    /// Fresh record with a zero sequence.
    #[must_use]
    pub fn new(slug: impl Into<String>, name: impl Into<String>, authority: Address) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            promise_sequence: 0,
            authority,
        }
    }

    /// Validate a slug for use as a derivation seed.
    ///
    /// # Errors
    /// [`PledgeError::InvalidSlug`] if empty or longer than [`MAX_SLUG_LEN`] bytes.
    pub fn validate_slug(slug: &str) -> Result<()> {
        if slug.is_empty() {
            return Err(PledgeError::InvalidSlug {
                reason: "slug is empty".into(),
            });
        }
        if slug.len() > MAX_SLUG_LEN {
            return Err(PledgeError::InvalidSlug {
                reason: format!("{} bytes exceeds {MAX_SLUG_LEN}", slug.len()),
            });
        }
        Ok(())
    }

    /// Claim the current sequence index and advance the counter.
    ///
    /// # Errors
    /// [`PledgeError::Internal`] on counter overflow.
    pub fn take_sequence(&mut self) -> Result<u64> {
        let current = self.promise_sequence;
        self.promise_sequence = current
            .checked_add(1)
            .ok_or_else(|| PledgeError::Internal(format!("promise sequence overflow for {}", self.slug)))?;
        Ok(current)
    }

    /// Encode into the persisted account layout.
    #[must_use]
    pub fn to_account_data(&self) -> Vec<u8> {
        AccountWriter::new(KIND, 1 + self.slug.len() + 4 + self.name.len() + 8 + 32)
            .short_str(&self.slug)
            .str(&self.name)
            .u64(self.promise_sequence)
            .address(&self.authority)
            .finish()
    }

    /// Decode from the persisted account layout.
    ///
    /// # Errors
    /// [`PledgeError::AccountDataInvalid`] on any layout violation.
    pub fn from_account_data(data: &[u8]) -> Result<Self> {
        let mut r = AccountReader::new(KIND, data)?;
        let slug = r.short_str()?;
        let name = r.str()?;
        let promise_sequence = r.u64()?;
        let authority = r.address()?;
        r.finish()?;
        if slug.len() > MAX_SLUG_LEN {
            return Err(PledgeError::AccountDataInvalid {
                reason: format!("stored slug is {} bytes", slug.len()),
            });
        }
        Ok(Self {
            slug,
            name,
            promise_sequence,
            authority,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_starts_at_zero() {
        let u = User::new("alice", "Alice", Address([1u8; 32]));
        assert_eq!(u.promise_sequence, 0);
    }

    #[test]
    fn take_sequence_is_monotonic() {
        let mut u = User::new("alice", "Alice", Address([1u8; 32]));
        assert_eq!(u.take_sequence().unwrap(), 0);
        assert_eq!(u.take_sequence().unwrap(), 1);
        assert_eq!(u.promise_sequence, 2);
    }

    #[test]
    fn take_sequence_overflow_leaves_counter() {
        let mut u = User::new("alice", "Alice", Address([1u8; 32]));
        u.promise_sequence = u64::MAX;
        assert!(u.take_sequence().is_err());
        assert_eq!(u.promise_sequence, u64::MAX);
    }

    #[test]
    fn slug_validation() {
        assert!(User::validate_slug("slug6").is_ok());
        assert!(User::validate_slug(&"x".repeat(32)).is_ok());
        assert!(matches!(
            User::validate_slug(""),
            Err(PledgeError::InvalidSlug { .. })
        ));
        assert!(matches!(
            User::validate_slug(&"x".repeat(33)),
            Err(PledgeError::InvalidSlug { .. })
        ));
    }

    #[test]
    fn account_layout_roundtrip() {
        let mut u = User::new("slug6", "name", Address([2u8; 32]));
        u.promise_sequence = 258;
        let data = u.to_account_data();
        assert_eq!(User::from_account_data(&data).unwrap(), u);
    }

    #[test]
    fn sequence_is_stored_big_endian() {
        let mut u = User::new("a", "", Address([0u8; 32]));
        u.promise_sequence = 1;
        let data = u.to_account_data();
        // discriminator(8) + slug(1 + 1) + name(4 + 0)
        let seq = &data[14..22];
        assert_eq!(seq, &[0, 0, 0, 0, 0, 0, 0, 1]);
    }
}
