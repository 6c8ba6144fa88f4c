//! Core logic of the `bplist-pack` and `bplist-unpack` binaries.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::{decode, encode, BplistError, Value};

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Bplist(#[from] BplistError),
}

/// Installs a stderr `tracing` subscriber filtered by `RUST_LOG`
/// (default `warn`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Encodes a JSON document as a bplist.
pub fn pack(json: &str) -> Result<Vec<u8>, CliError> {
    let json: serde_json::Value = serde_json::from_str(json)?;
    let value = Value::try_from(json)?;
    Ok(encode(&value))
}

/// Decodes a bplist into a JSON document.
pub fn unpack(bytes: &[u8], pretty: bool) -> Result<String, CliError> {
    let value = decode(bytes)?;
    let json = serde_json::Value::from(value);
    let out = if pretty {
        serde_json::to_string_pretty(&json)?
    } else {
        serde_json::to_string(&json)?
    };
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_unpack_roundtrip() {
        let bytes = pack(r#"{"$name":"Test","$channel":3}"#).unwrap();
        assert_eq!(&bytes[..8], b"bplist00");
        assert_eq!(unpack(&bytes, false).unwrap(), r#"{"$name":"Test","$channel":3}"#);
    }

    #[test]
    fn unpack_rejects_garbage() {
        assert!(matches!(
            unpack(b"not a plist", false),
            Err(CliError::Bplist(BplistError::BadMagic))
        ));
    }

    #[test]
    fn pack_rejects_invalid_json() {
        assert!(matches!(pack("{"), Err(CliError::Json(_))));
    }
}
