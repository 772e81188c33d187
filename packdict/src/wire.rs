//! Serialization: self-describing blob for a packed dictionary.
//!
//! ## Wire format (`PKD1`)
//!
//! ```text
//! [magic: 4B "PKD1"] [version: u8 = 1]
//! [key_size: u32 LE] [value_size: u32 LE]
//! [packed buffer: remainder of the blob]
//! ```
//!
//! The payload length is implied by the blob length. `deserialize`
//! validates the envelope (magic, version, positive widths, payload
//! length divisible by the block size) but trusts key order inside the
//! payload, the same contract as [`PackedDict::from_raw`].

use crate::dict::PackedDict;
use crate::error::{DictError, Result};

/// Magic bytes identifying a serialized dictionary.
pub const DICT_MAGIC: [u8; 4] = *b"PKD1";

/// Current wire format version.
pub const WIRE_VERSION: u8 = 1;

/// Fixed header size in bytes (magic + version + two widths).
pub const WIRE_HEADER_SIZE: usize = 13;

impl PackedDict {
    /// Encode the dictionary as a self-describing byte blob.
    ///
    /// Two blobs are byte-equal iff the dictionaries have identical widths
    /// and identical buffers.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(WIRE_HEADER_SIZE + self.size_bytes());
        out.extend_from_slice(&DICT_MAGIC);
        out.push(WIRE_VERSION);
        out.extend_from_slice(&(self.key_size() as u32).to_le_bytes());
        out.extend_from_slice(&(self.value_size() as u32).to_le_bytes());
        out.extend_from_slice(self.as_bytes());
        out
    }

    /// Decode a blob produced by [`PackedDict::serialize`].
    pub fn deserialize(data: &[u8]) -> Result<PackedDict> {
        if data.len() < WIRE_HEADER_SIZE {
            return Err(DictError::Malformed(format!(
                "blob too small: {} bytes, header needs {}",
                data.len(),
                WIRE_HEADER_SIZE
            )));
        }
        if data[0..4] != DICT_MAGIC {
            return Err(DictError::Malformed(format!(
                "expected magic PKD1, got {:?}",
                &data[0..4]
            )));
        }
        let version = data[4];
        if version != WIRE_VERSION {
            return Err(DictError::Malformed(format!(
                "unsupported version {version}"
            )));
        }
        let key_size = u32::from_le_bytes(data[5..9].try_into().unwrap()) as usize;
        let value_size = u32::from_le_bytes(data[9..13].try_into().unwrap()) as usize;
        PackedDict::from_raw(key_size, value_size, data[WIRE_HEADER_SIZE..].to_vec())
    }
}

// ===========================================================================
// Tests
// ===========================================================================
