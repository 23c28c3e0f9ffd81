//! Error types for Accelbuffer operations.

use std::collections::TryReserveError;

use thiserror::Error;

use crate::types::ObjectType;

/// Result type for Accelbuffer operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for Accelbuffer operations.
///
/// Every variant is fatal at the codec layer. The only sanctioned recovery
/// path for unknown data is [`Reader::skip_next`](crate::Reader::skip_next).
#[derive(Error, Debug)]
pub enum Error {
    /// Field index outside `(0, 2^28)`.
    #[error("invalid field index: {0}")]
    InvalidFieldIndex(u32),

    /// The decoded object type does not match what the typed read expects.
    #[error("cannot read {found:?} as {target}")]
    TagMismatch {
        target: &'static str,
        found: ObjectType,
    },

    /// Not enough bytes left for a required read.
    #[error("stream too short: needed {needed} bytes, only {available} available")]
    StreamTooShort { needed: usize, available: usize },

    /// No serializer could be resolved for the type.
    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),

    /// The record shape carries no payload rule and cannot be skipped.
    #[error("invalid object type: {0:?}")]
    InvalidObjectType(ObjectType),

    /// Variant integer longer than its type allows.
    #[error("varint overflow")]
    VarintOverflow,

    /// Invalid UTF-8 string.
    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    /// Invalid UTF-16 string.
    #[error("invalid UTF-16 string")]
    InvalidUtf16,

    /// Value is not a Unicode scalar value.
    #[error("invalid char: {0:#x}")]
    InvalidChar(u32),

    /// Unknown encoding or byte order in the global config byte.
    #[error("invalid config byte: {0:#04x}")]
    InvalidConfig(u8),

    /// Output buffer too small during encoding.
    #[error("buffer overflow: needed {needed} bytes, only {available} available")]
    BufferOverflow { needed: usize, available: usize },

    /// Nested payload length does not fit a 32-bit length prefix.
    #[error("payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    /// Collection count above the reader's element limit.
    #[error("collection of {count} elements exceeds the limit of {max}")]
    TooManyElements { count: u64, max: usize },

    /// Buffer growth failed.
    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// Binding added after the type's serializer was already cached.
    #[error("serializer for {0} was already resolved")]
    BindingAfterResolution(&'static str),

    /// Custom error message.
    #[error("{0}")]
    Custom(String),
}

impl Error {
    /// Creates a stream too short error.
    pub fn stream_too_short(needed: usize, available: usize) -> Self {
        Self::StreamTooShort { needed, available }
    }

    /// Creates a buffer overflow error.
    pub fn buffer_overflow(needed: usize, available: usize) -> Self {
        Self::BufferOverflow { needed, available }
    }

    /// Creates a tag mismatch error.
    pub fn tag_mismatch(target: &'static str, found: ObjectType) -> Self {
        Self::TagMismatch { target, found }
    }

    /// Creates a custom error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }
}
