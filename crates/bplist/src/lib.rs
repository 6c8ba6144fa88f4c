//! Binary property list (`bplist00`) codec.
//!
//! A [`Value`] tree of booleans, integers, reals, dates, data blobs,
//! strings, arrays and dictionaries is flattened into an object table,
//! an offset table and a 32-byte trailer, and read back from the same
//! layout.
//!
//! ```
//! use bplist::{decode, encode, Value};
//!
//! let tree: Value = vec![
//!     ("$name".to_owned(), Value::from("Test")),
//!     ("$channel".to_owned(), Value::from(3)),
//! ]
//! .into_iter()
//! .collect();
//!
//! let bytes = encode(&tree);
//! assert_eq!(&bytes[..8], b"bplist00");
//! assert_eq!(decode(&bytes).unwrap(), tree);
//! ```

pub mod cli;
pub mod constants;
mod decoder;
mod encoder;
mod error;
pub mod json;
pub mod trailer;
mod value;

pub use decoder::{decode, BplistDecoder};
pub use encoder::{count_objects, encode, BplistEncoder};
pub use error::{BplistError, Result};
pub use trailer::Trailer;
pub use value::{
    Array, Date, Dictionary, Value, ValueKind, ValueType, PLATFORM_EPOCH_UNIX_SECONDS,
};
