//! Fixed-stride binary codec for [`RankedBoundedSet`].
//!
//! The wire format is a bare sequence of 16-byte records, one per entry, in
//! rank order at encode time:
//!
//! ```text
//! +----------------+----------------+
//! | id: i64 (BE)   | score: i64 (BE)|   x len
//! +----------------+----------------+
//! ```
//!
//! There is no header, length prefix or version byte; the record count is
//! `bytes.len() / 16`. Decoding replays every record through
//! [`RankedBoundedSet::add`], so an over-long or reordered input is trimmed
//! back to the codec's bound instead of producing an invalid set.

use crate::ranked_set::{DEFAULT_K, RankedBoundedSet};
use crate::entry::ScoredEntry;
use thiserror::Error;
use tracing::warn;

/// Width of one encoded entry.
pub const RECORD_LEN: usize = 16;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Input length is not a whole number of records.
    #[error("encoded top-k length {len} is not a multiple of 16 (trailing {trailing} bytes)")]
    Format { len: usize, trailing: usize },
}

/// Encoder/decoder bound to the `k` that decoded sets are created with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TopKCodec {
    pub k: usize,
}

impl Default for TopKCodec {
    fn default() -> Self {
        Self { k: DEFAULT_K }
    }
}

impl TopKCodec {
    #[must_use]
    pub const fn new(k: usize) -> Self {
        Self { k }
    }

    /// Encode `set` in rank order. Output is exactly `16 * set.len()` bytes.
    #[must_use]
    pub fn encode(&self, set: &RankedBoundedSet) -> Vec<u8> {
        encode(set)
    }

    /// Decode into a fresh set bounded to `self.k`.
    ///
    /// Empty input yields an empty set.
    ///
    /// # Errors
    /// [`CodecError::Format`] if the length is not a multiple of [`RECORD_LEN`].
    pub fn decode(&self, bytes: &[u8]) -> Result<RankedBoundedSet, CodecError> {
        let trailing = bytes.len() % RECORD_LEN;
        if trailing != 0 {
            warn!(len = bytes.len(), trailing, "rejecting truncated top-k record");
            return Err(CodecError::Format {
                len: bytes.len(),
                trailing,
            });
        }
        let mut set = RankedBoundedSet::new(self.k);
        for rec in bytes.chunks_exact(RECORD_LEN) {
            let (id, score) = rec.split_at(8);
            set.add(ScoredEntry::new(read_i64(id), read_i64(score)));
        }
        Ok(set)
    }

    /// Like [`decode`](Self::decode), treating an absent value as empty.
    ///
    /// # Errors
    /// [`CodecError::Format`] on a truncated record.
    pub fn decode_opt(&self, bytes: Option<&[u8]>) -> Result<RankedBoundedSet, CodecError> {
        match bytes {
            Some(b) => self.decode(b),
            None => Ok(RankedBoundedSet::new(self.k)),
        }
    }
}

/// Encode `set` in rank order.
#[must_use]
pub fn encode(set: &RankedBoundedSet) -> Vec<u8> {
    let mut out = Vec::with_capacity(set.len() * RECORD_LEN);
    for e in set {
        out.extend_from_slice(&e.id.to_be_bytes());
        out.extend_from_slice(&e.score.to_be_bytes());
    }
    out
}

#[inline]
fn read_i64(b: &[u8]) -> i64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(b);
    i64::from_be_bytes(buf)
}
