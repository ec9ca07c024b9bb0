//! Codec trait and the JSON implementation.
//!
//! The rest of the stack never serializes directly; it goes through a
//! [`Codec`] so the wire format can change without touching handlers.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// Converts events to and from bytes.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable on the wire, which matches what browser clients expect
/// and makes DevTools inspection trivial.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ClientEvent, RoomCode};

    #[test]
    fn test_round_trip_through_codec() {
        let codec = JsonCodec;
        let event = ClientEvent::JoinRoom {
            room_code: RoomCode::new("AB12CD"),
        };

        let bytes = codec.encode(&event).unwrap();
        let decoded: ClientEvent = codec.decode(&bytes).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn test_decode_garbage_returns_error() {
        let codec = JsonCodec;
        let result: Result<ClientEvent, _> =
            codec.decode(b"not json at all");
        assert!(result.is_err());
    }

    #[test]
    fn test_decode_wrong_shape_returns_error() {
        let codec = JsonCodec;
        let result: Result<ClientEvent, _> =
            codec.decode(br#"{"name": "hello"}"#);
        assert!(result.is_err());
    }
}
