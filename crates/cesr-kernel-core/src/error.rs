//! Error types for the CESR Kernel Core.

use thiserror::Error;

/// Core errors that can occur while encoding or decoding stream material.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("unknown derivation code: {0}")]
    UnknownCode(String),

    #[error("wrong derivation code: {got} is not a {expected} code")]
    WrongCode { expected: &'static str, got: String },

    #[error("short token for code {code}: need {need} chars, have {have}")]
    ShortToken {
        code: String,
        need: usize,
        have: usize,
    },

    #[error("malformed token: {0}")]
    MalformedToken(String),

    #[error("unrecognized cold-start byte: 0x{0:02x}")]
    ColdStart(u8),

    #[error("malformed version marker: {0}")]
    MalformedVersion(String),

    #[error("unknown protocol: {0}")]
    UnknownProtocol(String),

    #[error("unknown serialization kind: {0}")]
    UnknownKind(String),

    #[error("unsupported protocol version: {major}.{minor}")]
    UnsupportedVersion { major: u8, minor: u8 },

    #[error("declared size {declared} does not match actual size {actual}")]
    SizeMismatch { declared: usize, actual: usize },

    #[error("short stream: need {need} bytes, have {have}")]
    ShortStream { need: usize, have: usize },

    #[error("field {field} is not a string")]
    NonStringField { field: String },

    #[error("JSON decoding error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CBOR decoding error: {0}")]
    Cbor(String),

    #[error("base64 decoding error: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
