//! bplist error type.

use bplist_buffers::BufferError;
use thiserror::Error;

use crate::ValueKind;

/// Error type for value extraction, conversion, and decoding.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BplistError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ValueKind,
        found: ValueKind,
    },
    #[error("unsupported type: {0}")]
    UnsupportedType(String),
    #[error("missing bplist00 header")]
    BadMagic,
    #[error("unknown object marker 0x{marker:02x} at offset {offset}")]
    UnknownTag { marker: u8, offset: usize },
    #[error("read of {len} bytes at offset {offset} is out of bounds")]
    OutOfBounds { offset: usize, len: usize },
    #[error("object {0} contains itself")]
    CyclicReference(u64),
    #[error("object {0} is referenced more than once")]
    SharedReference(u64),
    #[error("invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },
}

impl From<BufferError> for BplistError {
    fn from(e: BufferError) -> Self {
        match e {
            BufferError::OutOfBounds { offset, len } => BplistError::OutOfBounds { offset, len },
            BufferError::InvalidUtf8 { offset } => BplistError::InvalidUtf8 { offset },
        }
    }
}

pub type Result<T> = std::result::Result<T, BplistError>;
