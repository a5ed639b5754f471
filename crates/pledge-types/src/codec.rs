//! Byte layout helpers for persisted account data.
//!
//! Every record starts with an 8-byte discriminator
//! `sha256("account:<Kind>")[..8]`, followed by fixed-order fields.
//! Integers are big-endian.

use sha2::{Digest, Sha256};

use crate::{constants::DISCRIMINATOR_LEN, Address, PledgeError, Result};

/// Discriminator for an account kind.
#[must_use]
pub fn discriminator(kind: &str) -> [u8; DISCRIMINATOR_LEN] {
    let hash = Sha256::digest(format!("account:{kind}").as_bytes());
    let mut out = [0u8; DISCRIMINATOR_LEN];
    out.copy_from_slice(&hash[..DISCRIMINATOR_LEN]);
    out
}

/// Append-only writer for account data.
pub(crate) struct AccountWriter {
    buf: Vec<u8>,
}

impl AccountWriter {
    pub(crate) fn new(kind: &str, capacity: usize) -> Self {
        let mut buf = Vec::with_capacity(DISCRIMINATOR_LEN + capacity);
        buf.extend_from_slice(&discriminator(kind));
        Self { buf }
    }

    pub(crate) fn u8(&mut self, v: u8) -> &mut Self {
        self.buf.push(v);
        self
    }

    pub(crate) fn u64(&mut self, v: u64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub(crate) fn i64(&mut self, v: i64) -> &mut Self {
        self.buf.extend_from_slice(&v.to_be_bytes());
        self
    }

    pub(crate) fn address(&mut self, v: &Address) -> &mut Self {
        self.buf.extend_from_slice(v.as_bytes());
        self
    }

    /// Short string: u8 length prefix. Caller guarantees `len <= 255`.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn short_str(&mut self, v: &str) -> &mut Self {
        self.buf.push(v.len() as u8);
        self.buf.extend_from_slice(v.as_bytes());
        self
    }

    /// Long string: u32 length prefix.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn str(&mut self, v: &str) -> &mut Self {
        self.buf.extend_from_slice(&(v.len() as u32).to_be_bytes());
        self.buf.extend_from_slice(v.as_bytes());
        self
    }

    pub(crate) fn finish(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }
}

/// Cursor over account data. Every read is bounds-checked.
pub(crate) struct AccountReader<'a> {
    data: &'a [u8],
    pos: usize,
    kind: &'static str,
}

impl<'a> AccountReader<'a> {
    /// # Errors
    /// Fails if the data does not begin with the discriminator for `kind`.
    pub(crate) fn new(kind: &'static str, data: &'a [u8]) -> Result<Self> {
        if data.len() < DISCRIMINATOR_LEN || data[..DISCRIMINATOR_LEN] != discriminator(kind) {
            return Err(PledgeError::AccountDataInvalid {
                reason: format!("not a {kind} account"),
            });
        }
        Ok(Self {
            data,
            pos: DISCRIMINATOR_LEN,
            kind,
        })
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self.pos.checked_add(n).filter(|&e| e <= self.data.len());
        let Some(end) = end else {
            return Err(PledgeError::AccountDataInvalid {
                reason: format!("{} account truncated at byte {}", self.kind, self.pos),
            });
        };
        let out = &self.data[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub(crate) fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_be_bytes(self.array()?))
    }

    pub(crate) fn i64(&mut self) -> Result<i64> {
        Ok(i64::from_be_bytes(self.array()?))
    }

    pub(crate) fn address(&mut self) -> Result<Address> {
        Ok(Address(self.array()?))
    }

    pub(crate) fn short_str(&mut self) -> Result<String> {
        let len = usize::from(self.u8()?);
        self.utf8(len)
    }

    pub(crate) fn str(&mut self) -> Result<String> {
        let len = u32::from_be_bytes(self.array()?) as usize;
        self.utf8(len)
    }

    fn utf8(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|e| PledgeError::AccountDataInvalid {
            reason: format!("{} account has non-UTF-8 text: {e}", self.kind),
        })
    }

    /// Reject trailing bytes.
    pub(crate) fn finish(self) -> Result<()> {
        if self.pos != self.data.len() {
            return Err(PledgeError::AccountDataInvalid {
                reason: format!(
                    "{} account has {} trailing bytes",
                    self.kind,
                    self.data.len() - self.pos
                ),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discriminators_differ_by_kind() {
        assert_ne!(discriminator("User"), discriminator("Promise"));
        assert_eq!(discriminator("User"), discriminator("User"));
    }

    #[test]
    fn reader_rejects_wrong_kind() {
        let data = AccountWriter::new("User", 8).u64(1).finish();
        assert!(AccountReader::new("Promise", &data).is_err());
        assert!(AccountReader::new("User", &data).is_ok());
    }

    #[test]
    fn reader_detects_truncation_and_trailing_bytes() {
        let data = AccountWriter::new("User", 8).u64(42).finish();

        let mut r = AccountReader::new("User", &data[..data.len() - 1]).unwrap();
        assert!(matches!(
            r.u64(),
            Err(PledgeError::AccountDataInvalid { .. })
        ));

        let r = AccountReader::new("User", &data).unwrap();
        assert!(r.finish().is_err(), "unread u64 must count as trailing");
    }

    #[test]
    fn integers_are_big_endian() {
        let data = AccountWriter::new("User", 8).u64(1).finish();
        assert_eq!(&data[DISCRIMINATOR_LEN..], &[0, 0, 0, 0, 0, 0, 0, 1]);
    }
}
