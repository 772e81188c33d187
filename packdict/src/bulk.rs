//! Bulk construction: merge a sorted batch into an existing dictionary, or
//! build a dictionary directly from sorted pairs.
//!
//! Both paths are single linear passes. Splicing `m` records one at a time
//! copies the buffer `m` times; these entry points copy it once.

use crate::dict::PackedDict;
use crate::error::{DictError, Result};

impl PackedDict {
    /// Merge `pairs` into the dictionary in one pass.
    ///
    /// `pairs` must be sorted ascending by key with unique keys; this is
    /// not verified, and unsorted input produces a buffer with undefined
    /// key order. Keys already present are overwritten.
    pub fn bulk_insert(&self, pairs: &[(&[u8], &[u8])]) -> Result<PackedDict> {
        for &(k, v) in pairs {
            self.check_key(k)?;
            self.check_value(v)?;
        }

        let n = self.len();
        let mut out = Vec::with_capacity(self.size_bytes() + pairs.len() * self.block_size());
        let mut i = 0;
        for &(k, v) in pairs {
            // Copy through every existing record below the incoming key.
            while i < n && self.key_at(i) < k {
                out.extend_from_slice(self.record(i));
                i += 1;
            }
            out.extend_from_slice(k);
            out.extend_from_slice(v);
            // Skip a matching existing record: the incoming value replaced it.
            if i < n && self.key_at(i) == k {
                i += 1;
            }
        }
        out.extend_from_slice(&self.as_bytes()[i * self.block_size()..]);

        let merged = self.with_buf(out);
        tracing::debug!(
            existing = n,
            incoming = pairs.len(),
            merged = merged.len(),
            "bulk_insert merged sorted batch"
        );
        Ok(merged)
    }

    /// Build a dictionary from sorted pairs into this (empty) one,
    /// producing a maximally compact buffer.
    ///
    /// `self` carries the record widths and must hold no records. `pairs`
    /// must be sorted ascending with unique keys (not verified); each
    /// pair's widths are validated.
    pub fn from_sorted_pairs(&self, pairs: &[(&[u8], &[u8])]) -> Result<PackedDict> {
        if !self.is_empty() {
            return Err(DictError::NotEmpty);
        }
        let mut buf = Vec::with_capacity(pairs.len() * self.block_size());
        for &(k, v) in pairs {
            self.check_key(k)?;
            self.check_value(v)?;
            buf.extend_from_slice(k);
            buf.extend_from_slice(v);
        }
        Ok(self.with_buf(buf))
    }
}

// ===========================================================================
// Tests
// ===========================================================================
