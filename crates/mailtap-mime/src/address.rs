//! Address list parsing for From/To/Cc header values.

use std::fmt;

use crate::encoding::{convert_charset, decode_encoded_word, is_encoded_word};
use crate::error::{Error, Result};

/// A mailbox from an address list header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Address {
    /// Display name, decoded to UTF-8. Empty when absent.
    pub name: String,
    /// Address spec without angle brackets. Not validated.
    pub address: String,
}

impl Address {
    /// Creates an address.
    #[must_use]
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name.is_empty() {
            write!(f, "{}", self.address)
        } else {
            write!(f, "\"{}\" <{}>", self.name, self.address)
        }
    }
}

/// Parses a comma-separated address list.
///
/// Commas inside double quotes do not split entries; the quote tracking is
/// a plain toggle, so backslash-escaped quotes are not recognized. An entry
/// ending in `>` is split at its last `<` into display name and address
/// spec; a display name starting with `=` is decoded as RFC 2047 encoded
/// words and converted to UTF-8. Any other entry is a bare address spec.
/// Empty entries are skipped.
///
/// # Errors
///
/// Returns [`Error::InvalidAddress`] carrying the entry's position when an
/// encoded word cannot be decoded, its charset cannot be converted, or an
/// entry ends in `>` without a matching `<`.
pub fn parse_address(value: &str) -> Result<Vec<Address>> {
    split_entries(value)
        .into_iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let entry = entry.trim();
            (!entry.is_empty()).then(|| parse_entry(index, entry))
        })
        .collect()
}

fn split_entries(value: &str) -> Vec<&str> {
    let mut entries = Vec::new();
    let mut in_quote = false;
    let mut start = 0;

    for (i, c) in value.char_indices() {
        match c {
            '"' => in_quote = !in_quote,
            ',' if !in_quote => {
                entries.push(&value[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    entries.push(&value[start..]);

    entries
}

fn parse_entry(index: usize, entry: &str) -> Result<Address> {
    let Some(without_close) = entry.strip_suffix('>') else {
        return Ok(Address::new("", entry));
    };

    let open = without_close.rfind('<').ok_or_else(|| Error::InvalidAddress {
        index,
        reason: "'>' without matching '<'".to_string(),
    })?;

    let address = without_close[open + 1..].trim();
    let name = entry[..open].trim_matches(|c: char| c == '"' || c.is_whitespace());

    let name = if name.starts_with('=') {
        decode_display_name(index, name)?
    } else {
        name.to_string()
    };

    Ok(Address::new(name, address))
}

/// Decodes a display name made of encoded words.
///
/// Whitespace between two encoded words is dropped (RFC 2047 section 6.2);
/// plain words in between keep a single separating space.
fn decode_display_name(index: usize, name: &str) -> Result<String> {
    let mut decoded = String::new();
    let mut previous_encoded = false;

    for (position, word) in name.split_whitespace().enumerate() {
        if position == 0 || is_encoded_word(word) {
            let (data, charset) = decode_encoded_word(word).map_err(|e| Error::InvalidAddress {
                index,
                reason: e.to_string(),
            })?;
            let text = convert_charset(&data, &charset).map_err(|e| Error::InvalidAddress {
                index,
                reason: format!("convert charset error: {e}"),
            })?;
            if position > 0 && !previous_encoded {
                decoded.push(' ');
            }
            decoded.push_str(&text);
            previous_encoded = true;
        } else {
            decoded.push(' ');
            decoded.push_str(word);
            previous_encoded = false;
        }
    }

    Ok(decoded)
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
    use proptest::prelude::*;

    #[test]
    fn test_encoded_word_name() {
        let addrs =
            parse_address("=?GB2312?B?1arSqsrVvP7Iyw==?= <pongba@googlegroups.com>").unwrap();
        assert_eq!(addrs, vec![Address::new("摘要收件人", "pongba@googlegroups.com")]);
    }

    #[test]
    fn test_quoted_comma() {
        let addrs = parse_address("\"abc, 123\" <pongba@googlegroups.com>").unwrap();
        assert_eq!(addrs, vec![Address::new("abc, 123", "pongba@googlegroups.com")]);
    }

    #[test]
    fn test_bare_address() {
        let addrs = parse_address("pongba@googlegroups.com").unwrap();
        assert_eq!(addrs, vec![Address::new("", "pongba@googlegroups.com")]);
    }

    #[test]
    fn test_plain_name() {
        let addrs = parse_address("Pongba <pongba@googlegroups.com>").unwrap();
        assert_eq!(addrs, vec![Address::new("Pongba", "pongba@googlegroups.com")]);
    }

    #[test]
    fn test_list() {
        let addrs = parse_address(
            "Pongba <pongba@googlegroups.com>, =?GB2312?B?1arSqsrVvP7Iyw==?= <pongba@googlegroups.com>",
        )
        .unwrap();
        assert_eq!(
            addrs,
            vec![
                Address::new("Pongba", "pongba@googlegroups.com"),
                Address::new("摘要收件人", "pongba@googlegroups.com"),
            ]
        );
    }

    #[test]
    fn test_bare_list_trimmed() {
        let addrs = parse_address(" a@example.com ,b@example.com,  ").unwrap();
        assert_eq!(
            addrs,
            vec![
                Address::new("", "a@example.com"),
                Address::new("", "b@example.com"),
            ]
        );
    }

    #[test]
    fn test_name_without_space() {
        let addrs = parse_address("\"Lee\"<lee@example.com>").unwrap();
        assert_eq!(addrs, vec![Address::new("Lee", "lee@example.com")]);
    }

    #[test]
    fn test_angle_only() {
        let addrs = parse_address("<lee@example.com>").unwrap();
        assert_eq!(addrs, vec![Address::new("", "lee@example.com")]);
    }

    #[test]
    fn test_multiple_encoded_words() {
        let addrs = parse_address("=?UTF-8?Q?Andr=C3=A9?= =?UTF-8?Q?_Lee?= Jr <andre@example.com>")
            .unwrap();
        assert_eq!(addrs, vec![Address::new("André Lee Jr", "andre@example.com")]);
    }

    #[test]
    fn test_escaped_quote_is_not_special() {
        // The backslash does not protect the second quote, so the comma splits.
        let addrs = parse_address("\"a\\\", b\" <x@example.com>").unwrap();
        assert_eq!(
            addrs,
            vec![
                Address::new("", "\"a\\\""),
                Address::new("b", "x@example.com"),
            ]
        );
    }

    #[test]
    fn test_invalid_encoded_word_reports_index() {
        let err = parse_address("a@example.com, =?utf-8?X?abc?= <b@example.com>").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { index: 1, .. }));
        assert!(err.to_string().starts_with("address 1 invalid"));
    }

    #[test]
    fn test_unknown_charset_reports_index() {
        let err = parse_address("=?x-klingon?Q?abc?= <b@example.com>").unwrap_err();
        match err {
            Error::InvalidAddress { index, reason } => {
                assert_eq!(index, 0);
                assert!(reason.starts_with("convert charset error"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_open_bracket() {
        let err = parse_address("a@example.com, b@example.com>").unwrap_err();
        assert!(matches!(err, Error::InvalidAddress { index: 1, .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(Address::new("", "a@b.com").to_string(), "a@b.com");
        assert_eq!(Address::new("A B", "a@b.com").to_string(), "\"A B\" <a@b.com>");
    }

    proptest! {
        #[test]
        fn parse_address_never_panics(s in ".*") {
            let _ = parse_address(&s);
        }

        #[test]
        fn bare_addresses_round_trip(
            addrs in proptest::collection::vec("[a-z0-9.]{1,12}@[a-z]{1,10}\\.com", 1..6)
        ) {
            let parsed = parse_address(&addrs.join(", ")).unwrap();
            let specs: Vec<String> = parsed.into_iter().map(|a| a.address).collect();
            prop_assert_eq!(specs, addrs);
        }
    }
}
