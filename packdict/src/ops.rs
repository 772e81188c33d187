//! Point operations: lookup, insert, update, remove, compare-and-swap,
//! append, and ordered neighbor queries.
//!
//! Every operation validates argument widths up front, then performs at
//! most one binary search. Mutations allocate one result-sized buffer and
//! never touch `self`.

use crate::dict::PackedDict;
use crate::error::{DictError, Result};

impl PackedDict {
    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Value stored under `key`, or `None` when absent.
    pub fn get(&self, key: &[u8]) -> Result<Option<&[u8]>> {
        self.check_key(key)?;
        let i = self.rank(key);
        if i < self.len() && self.key_at(i) == key {
            Ok(Some(self.value_at(i)))
        } else {
            Ok(None)
        }
    }

    /// One lookup result per input key, in input order. No deduplication.
    pub fn get_many<'a, I>(&self, keys: I) -> Result<Vec<Option<&[u8]>>>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        keys.into_iter().map(|k| self.get(k)).collect()
    }

    /// True if `key` is present.
    pub fn contains_key(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    // ------------------------------------------------------------------
    // Mutation
    // ------------------------------------------------------------------

    /// Insert `(key, value)`, replacing the value on a key match.
    ///
    /// Returns the new dictionary; `self` is unchanged.
    pub fn insert(&self, key: &[u8], value: &[u8]) -> Result<PackedDict> {
        self.check_key(key)?;
        self.check_value(value)?;
        let i = self.rank(key);
        if i < self.len() && self.key_at(i) == key {
            let mut buf = self.as_bytes().to_vec();
            let start = i * self.block_size() + self.key_size();
            buf[start..start + self.value_size()].copy_from_slice(value);
            Ok(self.with_buf(buf))
        } else {
            Ok(self.with_buf(self.splice(i, key, value)))
        }
    }

    /// Update the value under `key` with `f`, or insert `(key, initial)`
    /// when absent. A single binary search covers both cases.
    ///
    /// When `f` returns bytes identical to the current value the dictionary
    /// is returned unchanged without rebuilding the buffer. `f` must return
    /// exactly `value_size` bytes.
    pub fn update<F>(&self, key: &[u8], initial: &[u8], f: F) -> Result<PackedDict>
    where
        F: FnOnce(&[u8]) -> Vec<u8>,
    {
        self.check_key(key)?;
        self.check_value(initial)?;
        let i = self.rank(key);
        if i < self.len() && self.key_at(i) == key {
            let current = self.value_at(i);
            let next = f(current);
            self.check_value(&next)?;
            if next.as_slice() == current {
                return Ok(self.clone());
            }
            let mut buf = self.as_bytes().to_vec();
            let start = i * self.block_size() + self.key_size();
            buf[start..start + self.value_size()].copy_from_slice(&next);
            Ok(self.with_buf(buf))
        } else {
            Ok(self.with_buf(self.splice(i, key, initial)))
        }
    }

    /// Remove the record under `key`. Absent keys are an error.
    pub fn remove(&self, key: &[u8]) -> Result<PackedDict> {
        self.check_key(key)?;
        let i = self.rank(key);
        if i >= self.len() || self.key_at(i) != key {
            return Err(DictError::KeyNotFound);
        }
        let off = i * self.block_size();
        let mut buf = Vec::with_capacity(self.size_bytes() - self.block_size());
        buf.extend_from_slice(&self.as_bytes()[..off]);
        buf.extend_from_slice(&self.as_bytes()[off + self.block_size()..]);
        Ok(self.with_buf(buf))
    }

    /// Insert `(key, value)` only if the currently stored value equals
    /// `expected` (`None` meaning the key must be absent). Any other
    /// observation is [`DictError::CasConflict`].
    ///
    /// This is the hook for an external writer doing optimistic concurrency
    /// over an atomic handle swap.
    pub fn compare_and_swap(
        &self,
        key: &[u8],
        expected: Option<&[u8]>,
        value: &[u8],
    ) -> Result<PackedDict> {
        self.check_key(key)?;
        self.check_value(value)?;
        if self.get(key)? != expected {
            return Err(DictError::CasConflict);
        }
        self.insert(key, value)
    }

    /// Concatenate `(key, value)` to the end of the buffer.
    ///
    /// Requires `key` to be strictly greater than the current last key
    /// (equality is rejected; this is not an upsert). Skips the binary
    /// search entirely: a caller-asserted fast path for pre-sorted feeds.
    pub fn append(&self, key: &[u8], value: &[u8]) -> Result<PackedDict> {
        self.check_key(key)?;
        self.check_value(value)?;
        if let Some((last_key, _)) = self.last() {
            if key <= last_key {
                return Err(DictError::AppendOrder);
            }
        }
        let mut buf = Vec::with_capacity(self.size_bytes() + self.block_size());
        buf.extend_from_slice(self.as_bytes());
        buf.extend_from_slice(key);
        buf.extend_from_slice(value);
        Ok(self.with_buf(buf))
    }

    // ------------------------------------------------------------------
    // Ordered access
    // ------------------------------------------------------------------

    /// Smallest record, or `None` when empty.
    pub fn first(&self) -> Option<(&[u8], &[u8])> {
        self.get_at(0)
    }

    /// Largest record, or `None` when empty.
    pub fn last(&self) -> Option<(&[u8], &[u8])> {
        let n = self.len();
        if n == 0 {
            None
        } else {
            self.get_at(n - 1)
        }
    }

    /// First record whose key is strictly greater than `key`, or `None`.
    ///
    /// `key` itself need not be present.
    pub fn next_after(&self, key: &[u8]) -> Result<Option<(&[u8], &[u8])>> {
        self.nth_after(key, 1)
    }

    /// `n`-th record (`n >= 1`) whose key is strictly greater than `key`,
    /// or `None` when fewer than `n` such records exist.
    pub fn nth_after(&self, key: &[u8], n: usize) -> Result<Option<(&[u8], &[u8])>> {
        self.check_key(key)?;
        if n == 0 {
            return Err(DictError::ZeroStep);
        }
        let i = self.rank(key);
        // On an exact hit, start one past it; rank already points to the
        // first greater key otherwise.
        let start = if i < self.len() && self.key_at(i) == key {
            i + 1
        } else {
            i
        };
        Ok(start.checked_add(n - 1).and_then(|i| self.get_at(i)))
    }

    // ------------------------------------------------------------------
    // Internal
    // ------------------------------------------------------------------

    /// Build a buffer with `(key, value)` spliced in as a new record at
    /// record index `i`.
    fn splice(&self, i: usize, key: &[u8], value: &[u8]) -> Vec<u8> {
        let off = i * self.block_size();
        let mut buf = Vec::with_capacity(self.size_bytes() + self.block_size());
        buf.extend_from_slice(&self.as_bytes()[..off]);
        buf.extend_from_slice(key);
        buf.extend_from_slice(value);
        buf.extend_from_slice(&self.as_bytes()[off..]);
        buf
    }
}

// ===========================================================================
// Tests
// ===========================================================================
