//! Error types for packed dictionary operations.

use thiserror::Error;

/// Result type alias using our Error
pub type Result<T> = std::result::Result<T, DictError>;

/// Errors raised by dictionary operations.
///
/// Every failure is an argument the caller got wrong; no operation leaves
/// partial state behind. Absent keys on lookup paths are `None`, not errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DictError {
    /// `key_size` or `value_size` of zero.
    #[error("record widths must be positive")]
    ZeroWidth,

    /// Key length differs from the declared `key_size`.
    #[error("key is {got} bytes, dictionary expects {expected}")]
    KeyWidth { expected: usize, got: usize },

    /// Value length differs from the declared `value_size`.
    #[error("value is {got} bytes, dictionary expects {expected}")]
    ValueWidth { expected: usize, got: usize },

    /// Buffer length is not a whole number of records.
    #[error("buffer length {len} is not a multiple of block size {block_size}")]
    BufferShape { len: usize, block_size: usize },

    /// `append` called with a key not strictly greater than the current last.
    #[error("append key must be strictly greater than the current last key")]
    AppendOrder,

    /// `remove` called for a key that is not present.
    #[error("key not present")]
    KeyNotFound,

    /// `compare_and_swap` observed a value other than the expected one.
    #[error("compare-and-swap: observed value differs from expected")]
    CasConflict,

    /// Two dictionaries in a set operation disagree on record widths.
    #[error(
        "record shape mismatch: {left_key}+{left_value} bytes vs {right_key}+{right_value} bytes"
    )]
    ShapeMismatch {
        left_key: usize,
        left_value: usize,
        right_key: usize,
        right_value: usize,
    },

    /// `from_sorted_pairs` called on a dictionary that already has records.
    #[error("dictionary is not empty")]
    NotEmpty,

    /// `intersection` needs at least two inputs.
    #[error("intersection requires at least two dictionaries, got {0}")]
    TooFewInputs(usize),

    /// `nth_after` called with `n == 0`; the operation is defined for `n >= 1`.
    #[error("nth_after requires n >= 1")]
    ZeroStep,

    /// `deserialize` rejected the blob's structural envelope.
    #[error("malformed dictionary blob: {0}")]
    Malformed(String),
}
