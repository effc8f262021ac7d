//! MIME content type handling.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::fmt;

/// MIME content type with parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentType {
    /// Main type (e.g., "text", "image", "multipart").
    pub main_type: String,
    /// Subtype (e.g., "plain", "html", "alternative").
    pub sub_type: String,
    /// Parameters keyed by lowercase name (e.g., charset, boundary).
    pub parameters: HashMap<String, String>,
}

impl ContentType {
    /// Creates a new content type without parameters.
    #[must_use]
    pub fn new(main_type: impl Into<String>, sub_type: impl Into<String>) -> Self {
        Self {
            main_type: main_type.into(),
            sub_type: sub_type.into(),
            parameters: HashMap::new(),
        }
    }

    /// The RFC 2045 default for entities without a Content-Type header.
    #[must_use]
    pub fn text_plain() -> Self {
        Self::new("text", "plain")
    }

    /// Returns `type/subtype`.
    #[must_use]
    pub fn media_type(&self) -> String {
        format!("{}/{}", self.main_type, self.sub_type)
    }

    /// Returns the charset parameter if present.
    #[must_use]
    pub fn charset(&self) -> Option<&str> {
        self.parameters.get("charset").map(String::as_str)
    }

    /// Returns the boundary parameter if present.
    #[must_use]
    pub fn boundary(&self) -> Option<&str> {
        self.parameters.get("boundary").map(String::as_str)
    }

    /// Checks if this is a multipart content type.
    #[must_use]
    pub fn is_multipart(&self) -> bool {
        self.main_type == "multipart"
    }

    /// Parses a content type string.
    ///
    /// Format: `type/subtype; param1=value1; param2="quoted; value"`
    ///
    /// Type, subtype and parameter names are lowercased; parameter values
    /// keep their case. Parameters without `=` are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if the type or subtype is missing or empty.
    pub fn parse(s: &str) -> Result<Self> {
        let mut segments = split_parameters(s).into_iter();

        let type_str = segments.next().unwrap_or_default();
        let (main_type, sub_type) = type_str
            .split_once('/')
            .ok_or_else(|| Error::InvalidContentType(format!("missing subtype in {s:?}")))?;

        let main_type = main_type.trim().to_ascii_lowercase();
        let sub_type = sub_type.trim().to_ascii_lowercase();
        if main_type.is_empty() || sub_type.is_empty() || sub_type.contains('/') {
            return Err(Error::InvalidContentType(format!("malformed media type {s:?}")));
        }

        let mut content_type = Self::new(main_type, sub_type);
        for param in segments {
            if let Some((key, value)) = param.split_once('=') {
                let key = key.trim().to_ascii_lowercase();
                let value = unquote(value.trim());
                if !key.is_empty() {
                    content_type.parameters.insert(key, value);
                }
            }
        }

        Ok(content_type)
    }
}

/// Splits on `;` outside of double quotes.
fn split_parameters(s: &str) -> Vec<&str> {
    let mut segments = Vec::new();
    let mut in_quote = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        match c {
            '"' => in_quote = !in_quote,
            ';' if !in_quote => {
                segments.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(s[start..].trim());

    segments
}

/// Strips surrounding quotes and resolves backslash escapes inside them.
fn unquote(value: &str) -> String {
    let Some(inner) = value.strip_prefix('"').and_then(|v| v.strip_suffix('"')) else {
        return value.to_string();
    };

    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                out.push(escaped);
            }
        } else {
            out.push(c);
        }
    }
    out
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.main_type, self.sub_type)?;

        let mut params: Vec<_> = self.parameters.iter().collect();
        params.sort();
        for (key, value) in params {
            if value.contains(|c: char| c.is_whitespace() || "()<>@,;:\\\"/[]?=".contains(c)) {
                write!(f, "; {key}=\"{value}\"")?;
            } else {
                write!(f, "; {key}={value}")?;
            }
        }

        Ok(())
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
    fn test_content_type_parse() {
        let ct = ContentType::parse("text/plain; charset=UTF-8").unwrap();
        assert_eq!(ct.main_type, "text");
        assert_eq!(ct.sub_type, "plain");
        assert_eq!(ct.media_type(), "text/plain");
        assert_eq!(ct.charset(), Some("UTF-8"));
        assert!(!ct.is_multipart());
    }

    #[test]
    fn test_content_type_parse_case() {
        let ct = ContentType::parse("Multipart/Alternative; BOUNDARY=14dae9d67df4436caa04c39ae8b8")
            .unwrap();
        assert_eq!(ct.media_type(), "multipart/alternative");
        assert_eq!(ct.boundary(), Some("14dae9d67df4436caa04c39ae8b8"));
        assert!(ct.is_multipart());
    }

    #[test]
    fn test_content_type_parse_quoted() {
        let ct = ContentType::parse("multipart/mixed; boundary=\"----=_Part;123\"; x=\"a\\\"b\"")
            .unwrap();
        assert_eq!(ct.boundary(), Some("----=_Part;123"));
        assert_eq!(ct.parameters.get("x").map(String::as_str), Some("a\"b"));
    }

    #[test]
    fn test_content_type_parse_errors() {
        assert!(ContentType::parse("").is_err());
        assert!(ContentType::parse("text").is_err());
        assert!(ContentType::parse("text/").is_err());
        assert!(ContentType::parse("/plain").is_err());
        assert!(ContentType::parse("a/b/c").is_err());
    }

    #[test]
    fn test_content_type_display() {
        let ct = ContentType::parse("text/plain; format=flowed; charset=utf-8").unwrap();
        assert_eq!(ct.to_string(), "text/plain; charset=utf-8; format=flowed");
    }
}
