//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding events.
///
/// A decode failure on inbound data is never fatal to the connection;
/// handlers log it and wait for the next frame.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(#[source] serde_json::Error),

    /// Deserialization failed: malformed JSON, missing fields, or an
    /// unknown event tag.
    #[error("decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}
