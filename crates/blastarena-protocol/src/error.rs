//! Error type for the protocol layer.

/// Errors that can occur while encoding or decoding wire messages.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed.
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// The bytes are malformed, truncated, or carry an unknown tag.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// Well-formed but illegal at the protocol level.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
