//! Error types for the IMAP library.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur during IMAP operations.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error during network operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid DNS name for TLS.
    #[error("Invalid DNS name: {0}")]
    InvalidDnsName(#[from] rustls::pki_types::InvalidDnsNameError),

    /// A literal started without a valid `{N}` length.
    #[error("Parse response error at byte {position}: reply needs a valid literal length")]
    InvalidLiteral {
        /// Offset into the fed stream of the first literal byte.
        position: usize,
    },

    /// Input was fed after the tagged status line completed the response.
    #[error("Response already finished, no more input accepted")]
    AlreadyFinished,

    /// Input was fed after a framing error.
    #[error("Response decoder failed earlier and cannot accept input")]
    Poisoned,

    /// The tagged status line did not report `OK`.
    #[error("{0}")]
    Status(String),

    /// Protocol violation or unexpected data.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Operation timed out.
    #[error("Operation timed out after {0:?}")]
    Timeout(Duration),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
