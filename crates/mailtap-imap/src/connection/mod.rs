//! IMAP connection management.
//!
//! This module provides connection handling for IMAP servers, including:
//! - Configuration (host, port, security mode, timeouts, read size)
//! - TLS/plaintext stream abstraction
//! - The sequential command client

mod client;
mod config;
mod stream;

pub use client::{Client, DELETED, INBOX, RFC822_HEADER, RFC822_TEXT, SEEN};
pub use config::{Config, ConfigBuilder, DEFAULT_READ_BUFFER_SIZE, Security};
pub use stream::{ImapStream, connect, connect_plain, connect_tls, create_tls_connector};
