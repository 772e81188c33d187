//! Packed sorted dictionary: fixed-width `(key, value)` records in one
//! contiguous byte buffer, ordered by key.
//!
//! [`PackedDict`] stores every record as exactly `key_size + value_size`
//! bytes, back to back, in ascending key order. There are no pointers, no
//! per-entry headers, and no padding, so per-entry overhead is zero and the
//! whole dictionary is a single allocation that can be handed to any number
//! of concurrent readers. All lookups are binary searches over the packed
//! buffer; bulk paths merge sorted input in a single linear pass.
//!
//! ## Record layout
//!
//! ```text
//! [key_0: key_size B][value_0: value_size B][key_1][value_1]...
//! ```
//!
//! Keys are compared as raw bytes. Since all keys share one width, byte
//! order equals unsigned big-endian integer order of that width.
//!
//! ## Mutation model
//!
//! Mutating operations take `&self` and return a fresh `PackedDict`; the
//! prior value stays valid for readers holding it. A single logical writer
//! publishes new snapshots (e.g. behind an atomic handle swap) and can use
//! [`PackedDict::compare_and_swap`] to detect interleaved writes. The
//! container itself performs no synchronization and no I/O.
//!
//! ## Persistence
//!
//! [`PackedDict::serialize`] produces a self-describing blob (magic,
//! version, record widths, raw buffer); [`PackedDict::deserialize`] parses
//! and validates it. See [`wire`] for the exact format.

pub mod error;

pub mod bulk;
pub mod dict;
pub mod iter;
pub mod ops;
pub mod set_ops;
pub mod wire;

pub use dict::PackedDict;
pub use error::{DictError, Result};
pub use iter::Pairs;
pub use set_ops::{intersection, merge};
pub use wire::{DICT_MAGIC, WIRE_HEADER_SIZE, WIRE_VERSION};
