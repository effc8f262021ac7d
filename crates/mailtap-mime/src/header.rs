//! MIME header handling.

use std::collections::HashMap;

/// Case-insensitive, multi-valued header map.
///
/// Names are normalized to lowercase on insertion and lookup, and every
/// occurrence of a repeated header is kept in arrival order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Headers {
    headers: HashMap<String, Vec<String>>,
}

impl Headers {
    /// Creates a new empty header collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a header value.
    pub fn add(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into().to_ascii_lowercase();
        self.headers.entry(name).or_default().push(value.into());
    }

    /// Gets the first value for a header.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|v| v.first().map(String::as_str))
    }

    /// Gets all values for a header.
    #[must_use]
    pub fn get_all(&self, name: &str) -> Vec<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(|v| v.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Returns true if no header is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// Parses a header block.
    ///
    /// Parsing stops at the first empty line. Lines starting with a space
    /// or tab continue the previous header; lines without a colon are
    /// dropped. Both CRLF and bare LF line endings are accepted, and bytes
    /// that are not valid UTF-8 are replaced.
    #[must_use]
    pub fn parse(raw: &[u8]) -> Self {
        let text = String::from_utf8_lossy(raw);
        let mut headers = Self::new();
        let mut current: Option<(String, String)> = None;

        for line in text.lines() {
            if line.is_empty() {
                break;
            }

            if line.starts_with(' ') || line.starts_with('\t') {
                if let Some((_, value)) = current.as_mut() {
                    value.push(' ');
                    value.push_str(line.trim());
                }
                continue;
            }

            if let Some((name, value)) = current.take() {
                headers.add(name, value);
            }
            if let Some((name, value)) = line.split_once(':') {
                current = Some((name.trim().to_string(), value.trim().to_string()));
            }
        }

        if let Some((name, value)) = current {
            headers.add(name, value);
        }

        headers
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
    fn test_headers_case_insensitive() {
        let mut headers = Headers::new();
        headers.add("Content-Type", "text/plain");
        assert_eq!(headers.get("content-type"), Some("text/plain"));
        assert_eq!(headers.get("CONTENT-TYPE"), Some("text/plain"));
        assert_eq!(headers.get("Subject"), None);
    }

    #[test]
    fn test_headers_repeated() {
        let mut headers = Headers::new();
        headers.add("Received", "by a");
        headers.add("received", "by b");
        assert_eq!(headers.get("Received"), Some("by a"));
        assert_eq!(headers.get_all("RECEIVED"), vec!["by a", "by b"]);
        assert!(headers.get_all("To").is_empty());
    }

    #[test]
    fn test_headers_parse_folded() {
        let raw = concat!(
            "From: Googol Lee <googollee@gmail.com>\r\n",
            "To: =?UTF-8?B?R29vZ29s?=\r\n",
            " <googollee@gmail.com>\r\n",
            "Content-Type: text/plain; charset=UTF-8\r\n",
            "\r\n",
            "Body: not a header\r\n"
        );

        let headers = Headers::parse(raw.as_bytes());
        assert_eq!(headers.get("from"), Some("Googol Lee <googollee@gmail.com>"));
        assert_eq!(
            headers.get("to"),
            Some("=?UTF-8?B?R29vZ29s?= <googollee@gmail.com>")
        );
        assert_eq!(
            headers.get("content-type"),
            Some("text/plain; charset=UTF-8")
        );
        assert_eq!(headers.get("body"), None);
    }

    #[test]
    fn test_headers_parse_bare_lf() {
        let headers = Headers::parse(b"Subject: test\nContent-Transfer-Encoding: base64");
        assert_eq!(headers.get("subject"), Some("test"));
        assert_eq!(headers.get("content-transfer-encoding"), Some("base64"));
    }
}
