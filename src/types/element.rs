use serde::{Deserialize, Serialize};

use crate::types::error::{Result, StorageError};

/// Fixed-width signed integer kinds the storage can hold. The kind is
/// selected once when a storage is constructed and fixes the element
/// codec for the lifetime of the backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementKind {
    Int8,
    Int16,
    Int32,
    Int64,
}

impl ElementKind {
    pub fn from_width(width: usize) -> Result<Self> {
        match width {
            1 => Ok(ElementKind::Int8),
            2 => Ok(ElementKind::Int16),
            4 => Ok(ElementKind::Int32),
            8 => Ok(ElementKind::Int64),
            _ => Err(StorageError::UnsupportedWidth { width }),
        }
    }

    pub const fn width(self) -> usize {
        match self {
            ElementKind::Int8 => 1,
            ElementKind::Int16 => 2,
            ElementKind::Int32 => 4,
            ElementKind::Int64 => 8,
        }
    }

    /// Encode a value into exactly `width()` little-endian bytes. Values
    /// outside the kind's range truncate two's-complement style, so every
    /// representable value of the kind round-trips.
    pub fn encode(self, value: i64) -> Vec<u8> {
        match self {
            ElementKind::Int8 => (value as i8).to_le_bytes().to_vec(),
            ElementKind::Int16 => (value as i16).to_le_bytes().to_vec(),
            ElementKind::Int32 => (value as i32).to_le_bytes().to_vec(),
            ElementKind::Int64 => value.to_le_bytes().to_vec(),
        }
    }

    /// Decode `width()` little-endian bytes into a sign-extended value.
    /// The caller guarantees `bytes` holds exactly one element.
    pub fn decode(self, bytes: &[u8]) -> i64 {
        match self {
            ElementKind::Int8 => bytes[0] as i8 as i64,
            ElementKind::Int16 => i16::from_le_bytes([bytes[0], bytes[1]]) as i64,
            ElementKind::Int32 => {
                i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as i64
            }
            ElementKind::Int64 => i64::from_le_bytes([
                bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
            ]),
        }
    }
}
