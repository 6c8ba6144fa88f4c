//! Byte buffer primitives shared by the bplist encoder and decoder.
//!
//! - [`Writer`]: auto-growing big-endian writer.
//! - [`Reader`]: cursor reader whose reads fail closed.
//! - [`int`]: variable-width integer packing and minimal-width sizing.

pub mod int;
mod reader;
mod writer;

pub use reader::{range, Reader};
pub use writer::Writer;

use thiserror::Error;

/// Error type for bounds-checked buffer reads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BufferError {
    #[error("read of {len} bytes at offset {offset} is out of bounds")]
    OutOfBounds { offset: usize, len: usize },
    #[error("invalid UTF-8 at offset {offset}")]
    InvalidUtf8 { offset: usize },
}
