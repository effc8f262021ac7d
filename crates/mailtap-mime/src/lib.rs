//! # mailtap-mime
//!
//! Turns a fetched raw message into readable text.
//!
//! ## Features
//!
//! - **Body extraction**: walks nested `multipart/alternative`, `mixed` and
//!   `related` entities down to the preferred leaf part
//! - **Transfer decoding**: Base64 (tolerating embedded line breaks) and
//!   Quoted-Printable
//! - **Address lists**: quote-aware splitting of From/To/Cc values with
//!   RFC 2047 encoded-word display names
//! - **Charsets**: conversion to UTF-8 for every label `encoding_rs` knows
//!
//! ## Quick Start
//!
//! ```
//! use mailtap_mime::{Message, get_body, parse_address};
//!
//! let raw = b"From: =?GB2312?B?1arSqsrVvP7Iyw==?= <pongba@googlegroups.com>\r\n\
//!             Content-Type: text/plain; charset=UTF-8\r\n\
//!             Content-Transfer-Encoding: quoted-printable\r\n\
//!             \r\n\
//!             truth=3Dbeauty";
//!
//! let message = Message::parse(raw);
//! let body = get_body(&message, "text/plain")?;
//! assert_eq!(body.media_type, "text/plain");
//! assert_eq!(body.text()?, "truth=beauty");
//!
//! let from = parse_address(message.headers.get("from").unwrap_or_default())?;
//! assert_eq!(from[0].name, "摘要收件人");
//! assert_eq!(from[0].address, "pongba@googlegroups.com");
//! # Ok::<(), mailtap_mime::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod address;
mod body;
mod content_type;
mod error;
mod header;
mod message;
mod multipart;
mod select;

pub mod encoding;

pub use address::{Address, parse_address};
pub use body::{Body, get_body};
pub use content_type::ContentType;
pub use error::{Error, Result};
pub use header::Headers;
pub use message::{Message, TransferEncoding};
pub use multipart::MultipartReader;
pub use select::select_part;
