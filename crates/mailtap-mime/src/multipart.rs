//! Multipart framing (RFC 2046 section 5.1).
//!
//! Splits a multipart body into its child entities using boundary
//! delimiter lines. The preamble before the first delimiter and the
//! epilogue after the closing one are ignored.

use crate::error::{Error, Result};
use crate::message::Message;

/// Kind of boundary line found in a multipart body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    /// `--boundary`: another part follows.
    Open,
    /// `--boundary--`: the last part has ended.
    Close,
}

/// Iterator over the immediate child parts of a multipart body.
///
/// Lines may end in CRLF or bare LF. The line break before a delimiter
/// belongs to the delimiter, not to the preceding part. A body that runs
/// out before the closing delimiter yields an error as its last item.
#[derive(Debug, Clone)]
pub struct MultipartReader<'a> {
    rest: &'a [u8],
    dash_boundary: Vec<u8>,
    started: bool,
    done: bool,
}

impl<'a> MultipartReader<'a> {
    /// Creates a reader over `body` for the given boundary parameter.
    ///
    /// # Errors
    ///
    /// Returns an error if the boundary is empty.
    pub fn new(body: &'a [u8], boundary: &str) -> Result<Self> {
        if boundary.is_empty() {
            return Err(Error::MissingBoundary);
        }

        let mut dash_boundary = Vec::with_capacity(boundary.len() + 2);
        dash_boundary.extend_from_slice(b"--");
        dash_boundary.extend_from_slice(boundary.as_bytes());

        Ok(Self {
            rest: body,
            dash_boundary,
            started: false,
            done: false,
        })
    }

    fn classify(&self, line: &[u8]) -> Option<Delimiter> {
        let after = line.strip_prefix(self.dash_boundary.as_slice())?;
        if after.starts_with(b"--") {
            Some(Delimiter::Close)
        } else if after.iter().all(|b| *b == b' ' || *b == b'\t') {
            Some(Delimiter::Open)
        } else {
            None
        }
    }

    /// Finds the next delimiter line in `data`.
    ///
    /// Returns the offset where the line starts, the offset just past its
    /// line ending, and its kind.
    fn find_delimiter(&self, data: &[u8]) -> Option<(usize, usize, Delimiter)> {
        let mut start = 0;
        loop {
            let end = data[start..]
                .iter()
                .position(|b| *b == b'\n')
                .map_or(data.len(), |p| start + p);
            let line = &data[start..end];
            let line = line.strip_suffix(b"\r").unwrap_or(line);

            if let Some(kind) = self.classify(line) {
                return Some((start, (end + 1).min(data.len()), kind));
            }
            if end >= data.len() {
                return None;
            }
            start = end + 1;
        }
    }

    fn fail(&mut self, reason: &str) -> Option<Result<Message>> {
        self.done = true;
        Some(Err(Error::InvalidMultipart(reason.to_string())))
    }
}

impl Iterator for MultipartReader<'_> {
    type Item = Result<Message>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        if !self.started {
            let Some((_, after, kind)) = self.find_delimiter(self.rest) else {
                return self.fail("no boundary delimiter found");
            };
            if kind == Delimiter::Close {
                self.done = true;
                return None;
            }
            self.rest = &self.rest[after..];
            self.started = true;
        }

        let Some((start, after, kind)) = self.find_delimiter(self.rest) else {
            return self.fail("missing closing boundary");
        };

        let mut part = &self.rest[..start];
        part = part.strip_suffix(b"\n").unwrap_or(part);
        part = part.strip_suffix(b"\r").unwrap_or(part);

        self.rest = &self.rest[after..];
        if kind == Delimiter::Close {
            self.done = true;
        }

        Some(Ok(Message::parse(part)))
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
    fn test_two_parts_crlf() {
        let body = concat!(
            "This is the preamble.\r\n",
            "--XYZ\r\n",
            "Content-Type: text/plain\r\n",
            "\r\n",
            "plain body\r\n",
            "--XYZ\r\n",
            "Content-Type: text/html\r\n",
            "\r\n",
            "<b>html</b>\r\n",
            "--XYZ--\r\n",
            "epilogue\r\n"
        );

        let parts: Vec<Message> = MultipartReader::new(body.as_bytes(), "XYZ")
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0].headers.get("content-type"), Some("text/plain"));
        assert_eq!(parts[0].body, b"plain body");
        assert_eq!(parts[1].headers.get("content-type"), Some("text/html"));
        assert_eq!(parts[1].body, b"<b>html</b>");
    }

    #[test]
    fn test_lf_without_trailing_newline() {
        let body = "--b\nContent-Type: text/plain\n\nline one\nline two\n--b--";
        let parts: Vec<Message> = MultipartReader::new(body.as_bytes(), "b")
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"line one\nline two");
    }

    #[test]
    fn test_boundary_prefix_is_not_delimiter() {
        let body = "--b\r\n\r\n--bb is content\r\n--b --\r\n--b--\r\n";
        let parts: Vec<Message> = MultipartReader::new(body.as_bytes(), "b")
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"--bb is content\r\n--b --");
    }

    #[test]
    fn test_transport_padding() {
        let body = "--b  \r\n\r\nx\r\n--b--\r\n";
        let parts: Vec<Message> = MultipartReader::new(body.as_bytes(), "b")
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();

        assert_eq!(parts.len(), 1);
        assert_eq!(parts[0].body, b"x");
    }

    #[test]
    fn test_empty_boundary() {
        assert!(matches!(
            MultipartReader::new(b"--\r\n", ""),
            Err(Error::MissingBoundary)
        ));
    }

    #[test]
    fn test_missing_delimiter() {
        let mut reader = MultipartReader::new(b"no parts here", "b").unwrap();
        assert!(matches!(reader.next(), Some(Err(Error::InvalidMultipart(_)))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_missing_closing_delimiter() {
        let body = "--b\r\n\r\nfirst\r\n--b\r\n\r\nsecond, cut short";
        let mut reader = MultipartReader::new(body.as_bytes(), "b").unwrap();

        let first = reader.next().unwrap().unwrap();
        assert_eq!(first.body, b"first");
        assert!(matches!(reader.next(), Some(Err(Error::InvalidMultipart(_)))));
        assert!(reader.next().is_none());
    }

    #[test]
    fn test_close_only() {
        let mut reader = MultipartReader::new(b"preamble\r\n--b--\r\n", "b").unwrap();
        assert!(reader.next().is_none());
    }
}
