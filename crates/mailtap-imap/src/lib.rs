//! # mailtap-imap
//!
//! A small IMAP client built around an incremental response decoder.
//!
//! ## Features
//!
//! - **Chunk-independent decoding**: [`Response::feed`] accepts socket
//!   reads of any size and yields the same result however the stream is
//!   split
//! - **Binary-safe literals**: `{N}` literals are counted byte for byte, so
//!   message data may contain CR and LF
//! - **Command layer**: LOGIN, SELECT, SEARCH, FETCH, STORE and LOGOUT over
//!   any `AsyncRead + AsyncWrite` stream
//! - **TLS via rustls**: Secure connections without OpenSSL dependency
//! - **MIME hand-off**: [`Client::get_message`] returns a
//!   [`mailtap_mime::Message`] ready for body extraction
//!
//! ## Quick Start
//!
//! ```no_run
//! use mailtap_imap::{Client, Config, INBOX, SEEN};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::new("imap.example.com");
//! let mut client = Client::connect(&config).await?;
//! client.login("user@example.com", "password").await?;
//!
//! client.select(INBOX).await?.into_result()?;
//! for id in client.search("UNSEEN").await? {
//!     let message = client.get_message(&id).await?;
//!     let body = mailtap_mime::get_body(&message, "text/plain")?;
//!     println!("{}", body.text()?);
//!     client.store_flag(&id, SEEN).await?;
//! }
//!
//! client.logout().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Decoding without a connection
//!
//! ```
//! use mailtap_imap::Response;
//!
//! let mut response = Response::new();
//! assert!(!response.feed(b"* 2 FETCH (BODY[] {5}\r\nhe")?);
//! assert!(response.feed(b"llo)\r\na001 OK FETCH completed\r\n")?);
//!
//! assert_eq!(response.id(), "a001");
//! assert_eq!(response.error(), None);
//! assert_eq!(response.replies()[0].content(), b"hello");
//! # Ok::<(), mailtap_imap::Error>(())
//! ```
//!
//! ## Modules
//!
//! - [`command`]: Command serialization and tag generation
//! - [`connection`]: Configuration, streams and the client
//! - [`response`]: The incremental response decoder

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

pub mod command;
pub mod connection;
mod error;
pub mod response;

pub use command::{Command, TagGenerator};
pub use connection::{
    Client, Config, ConfigBuilder, DELETED, INBOX, ImapStream, RFC822_HEADER, RFC822_TEXT, SEEN,
    Security,
};
pub use error::{Error, Result};
pub use response::{Reply, Response};
