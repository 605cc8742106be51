//! CBOR encoding for domain records.
//!
//! Record payloads in the store are opaque bytes; this module owns the
//! serde/CBOR boundary. Decode failures indicate a corrupted payload and
//! surface as storage errors, not user-facing ones.

use rollbook_store::{StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encodes a record to CBOR bytes.
pub fn encode<T: Serialize>(value: &T) -> StoreResult<Vec<u8>> {
    let mut bytes = Vec::new();
    ciborium::into_writer(value, &mut bytes)
        .map_err(|e| StoreError::corrupted(format!("cbor encode: {e}")))?;
    Ok(bytes)
}

/// Decodes a record from CBOR bytes.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> StoreResult<T> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::corrupted(format!("cbor decode: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Sample {
        name: String,
        count: u32,
        tag: Option<String>,
    }

    #[test]
    fn roundtrip() {
        let sample = Sample {
            name: "Room A".into(),
            count: 7,
            tag: None,
        };
        let bytes = encode(&sample).unwrap();
        let decoded: Sample = decode(&bytes).unwrap();
        assert_eq!(decoded, sample);
    }

    #[test]
    fn garbage_is_a_corruption_error() {
        let result: StoreResult<Sample> = decode(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(StoreError::Corrupted(_))));
    }
}
