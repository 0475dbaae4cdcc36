//! CBOR serialization helpers for message payloads.
//!
//! All message payloads are CBOR-encoded (RFC 8949) before being placed
//! into a [`crate::wire::ProtocolMessage`] envelope.

use serde::{de::DeserializeOwned, Serialize};

use crate::TransportError;

/// Serialize a value to CBOR bytes.
pub fn to_vec<T: Serialize>(value: &T) -> Result<Vec<u8>, TransportError> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf)
        .map_err(|e| TransportError::Serialization(format!("CBOR serialization failed: {e}")))?;
    Ok(buf)
}

/// Deserialize a value from CBOR bytes.
pub fn from_slice<T: DeserializeOwned>(data: &[u8]) -> Result<T, TransportError> {
    ciborium::from_reader(data)
        .map_err(|e| TransportError::Deserialization(format!("CBOR deserialization failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Keepalive, TypedMessage};

    #[test]
    fn test_roundtrip() {
        let msg = TypedMessage::Keepalive(Keepalive {});
        let bytes = to_vec(&msg).expect("serialize");
        let restored: TypedMessage = from_slice(&bytes).expect("deserialize");
        assert_eq!(restored.kind(), msg.kind());
    }

    #[test]
    fn test_invalid_data_returns_error() {
        let result: Result<TypedMessage, _> = from_slice(&[0xFF, 0xFF, 0xFF]);
        assert!(result.is_err());
    }
}
