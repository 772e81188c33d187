//! Set operations across dictionaries: union-by-overwrite and multi-way
//! sorted intersection.
//!
//! Both walk their inputs in key order and reuse the previous probe's rank
//! as the lower bound of the next binary search, so a pass over `m` ordered
//! keys against an `n`-record dictionary costs `O(m log n)` worst case and
//! close to `O(m + log n)` when the keys land in a narrow range.

use crate::dict::PackedDict;
use crate::error::{DictError, Result};

/// Union of `small` and `big`: every record of `big`, with records from
/// `small` overwriting on key match and spliced in where absent.
///
/// Both dictionaries must share the same record widths. One linear pass
/// over `big` plus one over `small`; prefer passing the smaller overlay
/// first.
pub fn merge(small: &PackedDict, big: &PackedDict) -> Result<PackedDict> {
    check_same_shape(small, big)?;

    let n = big.len();
    let mut out = Vec::with_capacity(big.size_bytes() + small.size_bytes());
    let mut i = 0;
    for (k, v) in small.pairs() {
        while i < n && big.key_at(i) < k {
            out.extend_from_slice(big.record(i));
            i += 1;
        }
        out.extend_from_slice(k);
        out.extend_from_slice(v);
        if i < n && big.key_at(i) == k {
            i += 1;
        }
    }
    out.extend_from_slice(&big.as_bytes()[i * big.block_size()..]);

    let merged = big.with_buf(out);
    tracing::debug!(
        overlay = small.len(),
        base = n,
        merged = merged.len(),
        "merged dictionaries"
    );
    Ok(merged)
}

/// Keys present in **every** input, with values taken from the smallest
/// input. Requires at least two inputs, all with identical record widths.
///
/// Small-vs-small: inputs are ordered by buffer size ascending and the
/// smallest becomes the candidate set, filtered once per remaining input.
/// The candidate only shrinks, and each filter pass walks its probe target
/// with a narrowing rank window. Among equally sized inputs the earliest
/// argument wins the ordering, so its values are the ones carried forward.
pub fn intersection(dicts: &[&PackedDict]) -> Result<PackedDict> {
    if dicts.len() < 2 {
        return Err(DictError::TooFewInputs(dicts.len()));
    }
    for d in &dicts[1..] {
        check_same_shape(dicts[0], d)?;
    }

    let mut ordered: Vec<&PackedDict> = dicts.to_vec();
    ordered.sort_by_key(|d| d.size_bytes());
    let candidate = ordered[0];

    // First pass probes straight off the packed candidate; survivors land
    // in a pair list so later passes never rebuild a buffer most of whose
    // records are about to be discarded.
    let mut survivors = filter_pairs(candidate.pairs(), ordered[1]);
    for probe in &ordered[2..] {
        if survivors.is_empty() {
            break;
        }
        survivors = filter_pairs(survivors.into_iter(), probe);
    }

    tracing::debug!(
        inputs = dicts.len(),
        candidate = candidate.len(),
        surviving = survivors.len(),
        "intersected dictionaries"
    );
    PackedDict::new(candidate.key_size(), candidate.value_size())?.from_sorted_pairs(&survivors)
}

/// Keep the pairs whose key is present in `probe`.
///
/// `pairs` must arrive in ascending key order; each hit or miss rank
/// becomes the lower search bound for the next key.
fn filter_pairs<'a, I>(pairs: I, probe: &PackedDict) -> Vec<(&'a [u8], &'a [u8])>
where
    I: Iterator<Item = (&'a [u8], &'a [u8])>,
{
    let n = probe.len();
    let mut kept = Vec::new();
    let mut lo = 0;
    for (k, v) in pairs {
        let r = probe.rank_in(lo, n, k);
        if r < n && probe.key_at(r) == k {
            kept.push((k, v));
            lo = r + 1;
        } else {
            lo = r;
        }
        // Past the probe's end nothing further can match.
        if lo >= n {
            break;
        }
    }
    kept
}

fn check_same_shape(a: &PackedDict, b: &PackedDict) -> Result<()> {
    if a.key_size() != b.key_size() || a.value_size() != b.value_size() {
        return Err(DictError::ShapeMismatch {
            left_key: a.key_size(),
            left_value: a.value_size(),
            right_key: b.key_size(),
            right_value: b.value_size(),
        });
    }
    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================
