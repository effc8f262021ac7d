//! Untagged reply record.

use std::borrow::Cow;

/// One untagged (`* ...`) line of a server response.
///
/// `origin` reconstructs the line after the `* ` marker, up to but not
/// including its final CRLF, and keeps literal bytes in place. When the
/// line carries a parenthesized annotation, `reply_type` holds the token
/// it starts with, and a `{N}` literal inside it is captured separately in
/// `content`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    pub(crate) origin: Vec<u8>,
    pub(crate) reply_type: Vec<u8>,
    pub(crate) length: Vec<u8>,
    pub(crate) content: Vec<u8>,
}

impl Reply {
    /// Raw bytes of the line, starting at the sequence number or keyword.
    #[must_use]
    pub fn origin(&self) -> &[u8] {
        &self.origin
    }

    /// [`origin`](Self::origin) as text, with invalid UTF-8 replaced.
    #[must_use]
    pub fn origin_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.origin)
    }

    /// Token at the start of the parenthesized annotation, e.g. `RFC822.HEADER`.
    ///
    /// Empty when the line has no annotation.
    #[must_use]
    pub fn reply_type(&self) -> &[u8] {
        &self.reply_type
    }

    /// [`reply_type`](Self::reply_type) as text.
    #[must_use]
    pub fn reply_type_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.reply_type)
    }

    /// Declared literal length, if the line carried a `{N}` literal.
    #[must_use]
    pub fn length(&self) -> Option<usize> {
        std::str::from_utf8(&self.length).ok()?.parse().ok()
    }

    /// Literal bytes, exactly [`length`](Self::length) of them.
    #[must_use]
    pub fn content(&self) -> &[u8] {
        &self.content
    }

    /// [`content`](Self::content) as text.
    #[must_use]
    pub fn content_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.content)
    }

    /// Consumes the reply, returning the literal bytes.
    #[must_use]
    pub fn into_content(self) -> Vec<u8> {
        self.content
    }
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
    fn test_length() {
        let mut reply = Reply::default();
        assert_eq!(reply.length(), None);

        reply.length = b"499".to_vec();
        assert_eq!(reply.length(), Some(499));

        reply.length = b"99999999999999999999999999".to_vec();
        assert_eq!(reply.length(), None);
    }

    #[test]
    fn test_lossy_views() {
        let reply = Reply {
            origin: b"1 FETCH (BODY[] {2}\r\n\xff!)".to_vec(),
            reply_type: b"BODY[]".to_vec(),
            length: b"2".to_vec(),
            content: b"\xff!".to_vec(),
        };
        assert_eq!(reply.reply_type_str(), "BODY[]");
        assert_eq!(reply.content_str(), "\u{fffd}!");
        assert!(reply.origin_str().starts_with("1 FETCH"));
        assert_eq!(reply.into_content(), b"\xff!");
    }
}
