//! Error types for the kernel facade.

use cesr_kernel_core::CoreError;
use thiserror::Error;

/// Errors from the facade layers: alias registration, document embedding,
/// and integrity checks over embedded material.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("alias already registered: {0}")]
    DuplicateAlias(String),

    #[error("unknown alias: {0}")]
    UnknownAlias(String),

    #[error("declared digest {declared} does not match computed {computed}")]
    SaidMismatch { declared: String, computed: String },

    #[error("embedded material is not an event")]
    EmbeddedNotEvent,

    #[error("integrity failure: {0}")]
    IntegrityFailure(String),
}

/// Result type for facade operations.
pub type Result<T> = std::result::Result<T, KernelError>;
