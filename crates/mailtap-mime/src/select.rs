//! Preferred-part selection inside one multipart entity.

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::message::Message;
use crate::multipart::MultipartReader;

/// Picks one child part of a multipart body.
///
/// The first child whose media type equals `preferred` wins immediately.
/// Otherwise the first child seen for each top-level type is remembered,
/// and after the last child the one matching the top-level type of
/// `preferred` is returned, then a nested `multipart/*` child, in that
/// order. Later children with an already-seen top-level type never replace
/// the first one. Children whose Content-Type cannot be parsed are skipped.
///
/// # Errors
///
/// Returns [`Error::NoPreferredPart`] when neither rule finds a child, and
/// framing errors from [`MultipartReader`].
pub fn select_part(body: &[u8], boundary: &str, preferred: &str) -> Result<Message> {
    let preferred = preferred.trim().to_ascii_lowercase();
    let mut first_by_type: HashMap<String, Message> = HashMap::new();

    for part in MultipartReader::new(body, boundary)? {
        let part = part?;
        let content_type = match part.content_type() {
            Ok(content_type) => content_type,
            Err(e) => {
                tracing::debug!(error = %e, "skipping part with unparsable content type");
                continue;
            }
        };

        if content_type.media_type() == preferred {
            tracing::debug!(media_type = %preferred, "selected exact match");
            return Ok(part);
        }

        first_by_type
            .entry(content_type.main_type.clone())
            .or_insert(part);
    }

    let preferred_main = preferred.split('/').next().unwrap_or_default();
    if let Some(part) = first_by_type.remove(preferred_main) {
        tracing::debug!(
            main_type = preferred_main,
            "selected first part of preferred top-level type"
        );
        return Ok(part);
    }
    if let Some(part) = first_by_type.remove("multipart") {
        tracing::debug!("descending into nested multipart");
        return Ok(part);
    }

    Err(Error::NoPreferredPart)
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

    fn body(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut out = String::new();
        for (content_type, content) in parts {
            out.push_str("--sep\r\n");
            if !content_type.is_empty() {
                out.push_str(&format!("Content-Type: {content_type}\r\n"));
            }
            out.push_str("\r\n");
            out.push_str(content);
            out.push_str("\r\n");
        }
        out.push_str("--sep--\r\n");
        out.into_bytes()
    }

    #[test]
    fn test_exact_match_wins() {
        let body = body(&[("text/html", "html"), ("text/plain", "plain")]);
        let part = select_part(&body, "sep", "text/plain").unwrap();
        assert_eq!(part.body, b"plain");
    }

    #[test]
    fn test_exact_match_is_case_insensitive() {
        let body = body(&[("TEXT/PLAIN; charset=utf-8", "plain")]);
        let part = select_part(&body, "sep", "Text/Plain").unwrap();
        assert_eq!(part.body, b"plain");
    }

    #[test]
    fn test_first_exact_match_short_circuits() {
        let body = body(&[("text/plain", "one"), ("text/plain", "two")]);
        let part = select_part(&body, "sep", "text/plain").unwrap();
        assert_eq!(part.body, b"one");
    }

    #[test]
    fn test_fallback_to_first_of_top_level_type() {
        let body = body(&[
            ("image/png", "png"),
            ("text/json", "json"),
            ("text/html", "html"),
        ]);
        let part = select_part(&body, "sep", "text/plain").unwrap();
        assert_eq!(part.body, b"json");
    }

    #[test]
    fn test_fallback_to_nested_multipart() {
        let body = body(&[
            ("image/png", "png"),
            ("multipart/related; boundary=inner", "nested"),
        ]);
        let part = select_part(&body, "sep", "text/plain").unwrap();
        assert_eq!(part.body, b"nested");
    }

    #[test]
    fn test_preferred_type_bucket_beats_multipart() {
        let body = body(&[
            ("multipart/related; boundary=inner", "nested"),
            ("text/html", "html"),
        ]);
        let part = select_part(&body, "sep", "text/plain").unwrap();
        assert_eq!(part.body, b"html");
    }

    #[test]
    fn test_missing_content_type_is_text_plain() {
        let body = body(&[("image/png", "png"), ("", "implicit")]);
        let part = select_part(&body, "sep", "text/plain").unwrap();
        assert_eq!(part.body, b"implicit");
    }

    #[test]
    fn test_unparsable_part_skipped() {
        let body = body(&[("garbage", "bad"), ("text/plain", "good")]);
        let part = select_part(&body, "sep", "text/plain").unwrap();
        assert_eq!(part.body, b"good");
    }

    #[test]
    fn test_no_preferred_part() {
        let body = body(&[("image/png", "png"), ("application/pdf", "pdf")]);
        let err = select_part(&body, "sep", "text/plain").unwrap_err();
        assert!(matches!(err, Error::NoPreferredPart));
        assert_eq!(err.to_string(), "no preferred part");
    }
}
