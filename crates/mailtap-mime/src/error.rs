//! Error types for MIME operations.

use std::string::FromUtf8Error;

/// Result type alias for MIME operations.
pub type Result<T> = std::result::Result<T, Error>;

/// MIME error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid content type.
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),

    /// Invalid transfer or header encoding.
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    /// Base64 decode error.
    #[error("Base64 decode error: {0}")]
    Base64Decode(#[from] base64::DecodeError),

    /// UTF-8 decode error.
    #[error("UTF-8 decode error: {0}")]
    Utf8Decode(#[from] FromUtf8Error),

    /// Charset label not known to the converter.
    #[error("Unknown charset: {0}")]
    UnknownCharset(String),

    /// Missing boundary in multipart message.
    #[error("Missing boundary in multipart message")]
    MissingBoundary,

    /// Invalid multipart structure.
    #[error("Invalid multipart structure: {0}")]
    InvalidMultipart(String),

    /// No child part matched the preferred type or any fallback.
    #[error("no preferred part")]
    NoPreferredPart,

    /// An entry of an address list could not be decoded.
    #[error("address {index} invalid: {reason}")]
    InvalidAddress {
        /// Position of the entry in the comma-separated list.
        index: usize,
        /// What went wrong with it.
        reason: String,
    },
}
