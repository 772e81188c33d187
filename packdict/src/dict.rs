//! The [`PackedDict`] value type: constructors, record accessors, the
//! binary-search indexer, and size metadata.
//!
//! Invariants maintained by every constructor and operation:
//!
//! 1. `buf.len() % block_size == 0`
//! 2. keys are strictly increasing by record index (no duplicates)
//! 3. `block_size == key_size + value_size`

use std::cmp::Ordering;
use std::fmt;

use crate::error::{DictError, Result};

/// Ordered dictionary of fixed-width records packed into one byte buffer.
///
/// Cheap to share (readers clone or borrow the value), costly to mutate
/// (each mutation allocates one result-sized buffer). See the crate docs
/// for the layout and mutation model.
#[derive(Clone, PartialEq, Eq)]
pub struct PackedDict {
    key_size: usize,
    value_size: usize,
    block_size: usize,
    buf: Vec<u8>,
}

impl PackedDict {
    /// Create an empty dictionary with the given record widths.
    ///
    /// Widths are fixed for the life of the dictionary; zero is rejected.
    pub fn new(key_size: usize, value_size: usize) -> Result<Self> {
        if key_size == 0 || value_size == 0 {
            return Err(DictError::ZeroWidth);
        }
        Ok(Self {
            key_size,
            value_size,
            block_size: key_size + value_size,
            buf: Vec::new(),
        })
    }

    /// Adopt an existing packed buffer.
    ///
    /// The buffer length must be a whole number of records. Key order inside
    /// the buffer is the caller's assertion and is not verified; a buffer
    /// with out-of-order keys makes every subsequent lookup meaningless.
    pub fn from_raw(key_size: usize, value_size: usize, buf: Vec<u8>) -> Result<Self> {
        if key_size == 0 || value_size == 0 {
            return Err(DictError::ZeroWidth);
        }
        let block_size = key_size + value_size;
        if buf.len() % block_size != 0 {
            return Err(DictError::BufferShape {
                len: buf.len(),
                block_size,
            });
        }
        Ok(Self {
            key_size,
            value_size,
            block_size,
            buf,
        })
    }

    // ------------------------------------------------------------------
    // Shape
    // ------------------------------------------------------------------

    /// Byte width of every key.
    #[inline]
    pub fn key_size(&self) -> usize {
        self.key_size
    }

    /// Byte width of every value.
    #[inline]
    pub fn value_size(&self) -> usize {
        self.value_size
    }

    /// Byte width of one record (`key_size + value_size`).
    #[inline]
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Number of records.
    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len() / self.block_size
    }

    /// True if there are no records.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Total buffer size in bytes.
    #[inline]
    pub fn size_bytes(&self) -> usize {
        self.buf.len()
    }

    /// Buffer size a dictionary of `n` records would occupy, for capacity
    /// planning.
    #[inline]
    pub fn expected_size(&self, n: usize) -> usize {
        n * self.block_size
    }

    /// The packed buffer, zero-copy.
    #[inline]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consume the dictionary and return its packed buffer.
    pub fn into_raw(self) -> Vec<u8> {
        self.buf
    }

    /// Return a dictionary whose buffer is a freshly allocated copy sized
    /// exactly to its contents, releasing any excess capacity accumulated
    /// by incremental mutation.
    pub fn compact(&self) -> PackedDict {
        PackedDict {
            key_size: self.key_size,
            value_size: self.value_size,
            block_size: self.block_size,
            buf: self.buf.as_slice().to_vec(),
        }
    }

    // ------------------------------------------------------------------
    // Record access
    // ------------------------------------------------------------------

    /// Record `index` as a `(key, value)` pair, or `None` past the end.
    pub fn get_at(&self, index: usize) -> Option<(&[u8], &[u8])> {
        if index < self.len() {
            Some(self.pair_at(index))
        } else {
            None
        }
    }

    /// Full record bytes at `i`. Caller guarantees `i < len`.
    #[inline]
    pub(crate) fn record(&self, i: usize) -> &[u8] {
        &self.buf[i * self.block_size..(i + 1) * self.block_size]
    }

    /// Key slice of record `i`. Caller guarantees `i < len`.
    #[inline]
    pub(crate) fn key_at(&self, i: usize) -> &[u8] {
        let start = i * self.block_size;
        &self.buf[start..start + self.key_size]
    }

    /// Value slice of record `i`. Caller guarantees `i < len`.
    #[inline]
    pub(crate) fn value_at(&self, i: usize) -> &[u8] {
        let start = i * self.block_size + self.key_size;
        &self.buf[start..start + self.value_size]
    }

    /// `(key, value)` slices of record `i`. Caller guarantees `i < len`.
    #[inline]
    pub(crate) fn pair_at(&self, i: usize) -> (&[u8], &[u8]) {
        self.record(i).split_at(self.key_size)
    }

    /// New dictionary with the same shape around a replacement buffer.
    #[inline]
    pub(crate) fn with_buf(&self, buf: Vec<u8>) -> PackedDict {
        debug_assert_eq!(buf.len() % self.block_size, 0);
        PackedDict {
            key_size: self.key_size,
            value_size: self.value_size,
            block_size: self.block_size,
            buf,
        }
    }

    // ------------------------------------------------------------------
    // Indexer
    // ------------------------------------------------------------------

    /// Insertion rank of `key`: the index where it lives if present, or
    /// where it would be spliced to keep the buffer sorted. Always in
    /// `[0, len]`.
    ///
    /// The key is compared as raw bytes; callers are expected to pass
    /// exactly `key_size` bytes (every public operation validates this
    /// before ranking).
    #[inline]
    pub fn rank(&self, key: &[u8]) -> usize {
        self.rank_in(0, self.len(), key)
    }

    /// Rank of `key` within the record window `[lo, hi)`.
    ///
    /// Set operations narrow `lo` across successive ordered probes so each
    /// search only covers the not-yet-passed tail of the buffer.
    pub(crate) fn rank_in(&self, mut lo: usize, mut hi: usize, key: &[u8]) -> usize {
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            match self.key_at(mid).cmp(key) {
                Ordering::Less => lo = mid + 1,
                Ordering::Greater => hi = mid,
                Ordering::Equal => return mid,
            }
        }
        lo
    }

    // ------------------------------------------------------------------
    // Width checks
    // ------------------------------------------------------------------

    #[inline]
    pub(crate) fn check_key(&self, key: &[u8]) -> Result<()> {
        if key.len() != self.key_size {
            return Err(DictError::KeyWidth {
                expected: self.key_size,
                got: key.len(),
            });
        }
        Ok(())
    }

    #[inline]
    pub(crate) fn check_value(&self, value: &[u8]) -> Result<()> {
        if value.len() != self.value_size {
            return Err(DictError::ValueWidth {
                expected: self.value_size,
                got: value.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for PackedDict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PackedDict")
            .field("key_size", &self.key_size)
            .field("value_size", &self.value_size)
            .field("len", &self.len())
            .finish()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
