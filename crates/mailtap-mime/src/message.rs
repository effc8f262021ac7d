//! MIME entity: headers plus an undecoded body.

use crate::content_type::ContentType;
use crate::encoding::{decode_base64, decode_quoted_printable};
use crate::error::Result;
use crate::header::Headers;
use std::fmt;

/// Content-Transfer-Encoding of an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferEncoding {
    /// Base64 encoding.
    Base64,
    /// Quoted-Printable encoding.
    QuotedPrintable,
    /// Anything else (7bit, 8bit, binary, unknown or absent): passed through.
    Identity,
}

impl TransferEncoding {
    /// Parses a transfer encoding header value.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "base64" => Self::Base64,
            "quoted-printable" => Self::QuotedPrintable,
            _ => Self::Identity,
        }
    }

    /// Undoes this encoding.
    ///
    /// # Errors
    ///
    /// Returns an error if the data is malformed for the encoding.
    pub fn decode(self, data: &[u8]) -> Result<Vec<u8>> {
        match self {
            Self::Base64 => decode_base64(data),
            Self::QuotedPrintable => decode_quoted_printable(data),
            Self::Identity => Ok(data.to_vec()),
        }
    }
}

impl fmt::Display for TransferEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Base64 => write!(f, "base64"),
            Self::QuotedPrintable => write!(f, "quoted-printable"),
            Self::Identity => write!(f, "identity"),
        }
    }
}

/// A message or body part.
///
/// The body is kept exactly as received; transfer decoding happens only
/// once a leaf part has been selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    /// Entity headers.
    pub headers: Headers,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

impl Message {
    /// Creates a message from its parts.
    #[must_use]
    pub const fn new(headers: Headers, body: Vec<u8>) -> Self {
        Self { headers, body }
    }

    /// Parses a raw entity: a header block, an empty line, then the body.
    ///
    /// Input without an empty line is treated as headers only.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let (header_block, body) = split_header_block(raw);
        Self::new(Headers::parse(header_block), body.to_vec())
    }

    /// Gets the content type, defaulting to `text/plain` when absent.
    ///
    /// # Errors
    ///
    /// Returns an error if the Content-Type header is present but invalid.
    pub fn content_type(&self) -> Result<ContentType> {
        self.headers
            .get("content-type")
            .map_or_else(|| Ok(ContentType::text_plain()), ContentType::parse)
    }

    /// Gets the transfer encoding.
    #[must_use]
    pub fn transfer_encoding(&self) -> TransferEncoding {
        self.headers
            .get("content-transfer-encoding")
            .map_or(TransferEncoding::Identity, TransferEncoding::parse)
    }
}

/// Splits at the first empty line (CRLF CRLF or LF LF).
///
/// The header block keeps its final line ending.
pub(crate) fn split_header_block(raw: &[u8]) -> (&[u8], &[u8]) {
    if raw.starts_with(b"\r\n") {
        return (&[], &raw[2..]);
    }
    if raw.starts_with(b"\n") {
        return (&[], &raw[1..]);
    }

    for (i, window) in raw.windows(2).enumerate() {
        if window != b"\n\n" && window != b"\n\r" {
            continue;
        }
        let body_start = if window == b"\n\n" {
            i + 2
        } else if raw.get(i + 2) == Some(&b'\n') {
            i + 3
        } else {
            continue;
        };
        return (&raw[..=i], &raw[body_start..]);
    }

    (raw, &[])
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_encoding_parse() {
        assert_eq!(TransferEncoding::parse("base64"), TransferEncoding::Base64);
        assert_eq!(TransferEncoding::parse(" BASE64 "), TransferEncoding::Base64);
        assert_eq!(
            TransferEncoding::parse("quoted-printable"),
            TransferEncoding::QuotedPrintable
        );
        assert_eq!(TransferEncoding::parse("7bit"), TransferEncoding::Identity);
        assert_eq!(TransferEncoding::parse("x-uuencode"), TransferEncoding::Identity);
    }

    #[test]
    fn test_transfer_encoding_decode() {
        assert_eq!(
            TransferEncoding::QuotedPrintable.decode(b"a=3Db").unwrap(),
            b"a=b"
        );
        assert_eq!(TransferEncoding::Base64.decode(b"YWJj\r\n").unwrap(), b"abc");
        assert_eq!(TransferEncoding::Identity.decode(b"a=3Db").unwrap(), b"a=3Db");
    }

    #[test]
    fn test_message_parse_crlf() {
        let message = Message::parse(b"Subject: hi\r\nContent-Type: text/html\r\n\r\n<p>x</p>\r\n");
        assert_eq!(message.headers.get("subject"), Some("hi"));
        assert_eq!(message.content_type().unwrap().media_type(), "text/html");
        assert_eq!(message.body, b"<p>x</p>\r\n");
    }

    #[test]
    fn test_message_parse_lf() {
        let message = Message::parse(b"Subject: hi\n\nbody\n\nmore");
        assert_eq!(message.headers.get("subject"), Some("hi"));
        assert_eq!(message.body, b"body\n\nmore");
    }

    #[test]
    fn test_message_parse_without_headers() {
        let message = Message::parse(b"\r\nonly body");
        assert!(message.headers.is_empty());
        assert_eq!(message.body, b"only body");
    }

    #[test]
    fn test_message_parse_headers_only() {
        let message = Message::parse(b"Subject: hi\r\n");
        assert_eq!(message.headers.get("subject"), Some("hi"));
        assert!(message.body.is_empty());
    }

    #[test]
    fn test_message_defaults() {
        let message = Message::default();
        assert_eq!(message.content_type().unwrap(), ContentType::text_plain());
        assert_eq!(message.transfer_encoding(), TransferEncoding::Identity);
    }

    #[test]
    fn test_message_invalid_content_type() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "garbage");
        let message = Message::new(headers, Vec::new());
        assert!(message.content_type().is_err());
    }
}
