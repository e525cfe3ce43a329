//! Wire-level error types.

use thiserror::Error;

/// Errors encoding or decoding broadcast frames.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// MessagePack encoding failed.
    #[error("frame encoding failed: {0}")]
    Serialization(String),

    /// MessagePack decoding failed.
    #[error("frame decoding failed: {0}")]
    Deserialization(String),

    /// A delta carried a schema version this build cannot interpret.
    #[error("unsupported delta schema {found} (this build speaks {supported})")]
    UnsupportedSchema {
        /// The schema version found on the wire.
        found: u8,
        /// The schema version this build supports.
        supported: u8,
    },
}
