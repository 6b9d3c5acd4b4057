//! Model file encoding.
//!
//! Fitted parameters are plain data (`Vec<f64>`, scalars, names) encoded with
//! `bincode`. On disk every model file starts with [`MAGIC`] and a format
//! version byte so foreign or stale files fail loudly instead of decoding
//! into garbage.

use crate::error::{DelayError, Result};
use std::path::Path;

/// First bytes of every model file.
pub const MAGIC: &[u8; 4] = b"FDLY";

/// Bumped whenever a persisted layout changes.
pub const FORMAT_VERSION: u8 = 1;

/// Types that round-trip through a byte buffer.
pub trait SerializableParams: Sized {
    type Error: std::error::Error + Send + Sync + 'static;

    fn to_bytes(&self) -> std::result::Result<Vec<u8>, Self::Error>;

    fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, Self::Error>;
}

impl<T> SerializableParams for T
where
    T: serde::Serialize + for<'de> serde::Deserialize<'de>,
{
    type Error = bincode::Error;

    fn to_bytes(&self) -> std::result::Result<Vec<u8>, Self::Error> {
        bincode::serialize(self)
    }

    fn from_bytes(bytes: &[u8]) -> std::result::Result<Self, Self::Error> {
        bincode::deserialize(bytes)
    }
}

/// Prefixes the encoded value with the file header.
pub fn encode<T: SerializableParams>(value: &T) -> Result<Vec<u8>> {
    let body = value
        .to_bytes()
        .map_err(|e| DelayError::Serialization(e.to_string()))?;
    let mut bytes = Vec::with_capacity(MAGIC.len() + 1 + body.len());
    bytes.extend_from_slice(MAGIC);
    bytes.push(FORMAT_VERSION);
    bytes.extend_from_slice(&body);
    Ok(bytes)
}

/// Checks the file header and decodes the rest.
pub fn decode<T: SerializableParams>(bytes: &[u8]) -> Result<T> {
    let body = match bytes.strip_prefix(MAGIC.as_slice()) {
        Some([version, body @ ..]) if *version == FORMAT_VERSION => body,
        Some([version, ..]) => {
            return Err(DelayError::Serialization(format!(
                "unsupported model format version {version} (expected {FORMAT_VERSION})"
            )))
        }
        _ => return Err(DelayError::Serialization("not a model file".into())),
    };
    T::from_bytes(body).map_err(|e| DelayError::Serialization(e.to_string()))
}

pub fn write_file<T: SerializableParams, P: AsRef<Path>>(value: &T, path: P) -> Result<()> {
    std::fs::write(path, encode(value)?)?;
    Ok(())
}

pub fn read_file<T: SerializableParams, P: AsRef<Path>>(path: P) -> Result<T> {
    decode(&std::fs::read(path)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Coefficients {
        weights: Vec<f64>,
        bias: f64,
    }

    fn coefficients() -> Coefficients {
        Coefficients {
            weights: vec![0.5, -1.25],
            bias: 0.125,
        }
    }

    #[test]
    fn test_encoded_file_carries_header() {
        let bytes = encode(&coefficients()).unwrap();
        assert_eq!(&bytes[..4], MAGIC);
        assert_eq!(bytes[4], FORMAT_VERSION);
        assert_eq!(decode::<Coefficients>(&bytes).unwrap(), coefficients());
    }

    #[test]
    fn test_rejects_headerless_bytes() {
        let raw = coefficients().to_bytes().unwrap();
        assert!(matches!(
            decode::<Coefficients>(&raw),
            Err(DelayError::Serialization(_))
        ));
    }

    #[test]
    fn test_rejects_other_version() {
        let mut bytes = encode(&coefficients()).unwrap();
        bytes[4] = FORMAT_VERSION + 1;
        let err = decode::<Coefficients>(&bytes).unwrap_err();
        assert!(err.to_string().contains("version"));
    }

    #[test]
    fn test_truncated_body_fails() {
        let bytes = encode(&coefficients()).unwrap();
        assert!(decode::<Coefficients>(&bytes[..bytes.len() - 4]).is_err());
    }
}
