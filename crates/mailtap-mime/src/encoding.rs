//! Transfer and header decoding.
//!
//! Base64 and Quoted-Printable body decoding (RFC 2045), RFC 2047 encoded
//! words, and charset conversion into UTF-8 strings.

use crate::error::{Error, Result};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use encoding_rs::Encoding;

/// Decodes Base64 data.
///
/// CR and LF bytes are removed first: bodies are line-wrapped, and some
/// providers also break lines in the middle of an encoded literal.
///
/// # Errors
///
/// Returns an error if the remaining input is not valid Base64.
pub fn decode_base64(data: &[u8]) -> Result<Vec<u8>> {
    let cleaned: Vec<u8> = data
        .iter()
        .copied()
        .filter(|b| *b != b'\r' && *b != b'\n')
        .collect();
    STANDARD.decode(cleaned).map_err(Into::into)
}

/// Decodes Quoted-Printable data (RFC 2045).
///
/// `=XX` escapes become the byte they name, `=` at the end of a line is a
/// soft line break and is removed together with the line ending.
///
/// # Errors
///
/// Returns an error on an `=` that is neither a soft line break nor
/// followed by two hex digits.
pub fn decode_quoted_printable(data: &[u8]) -> Result<Vec<u8>> {
    let mut result = Vec::with_capacity(data.len());
    let mut rest = data;

    while let Some((&byte, tail)) = rest.split_first() {
        if byte != b'=' {
            result.push(byte);
            rest = tail;
            continue;
        }

        match tail {
            [b'\r', b'\n', tail @ ..] | [b'\n', tail @ ..] => rest = tail,
            [hi, lo, tail @ ..] if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => {
                result.push(hex_value(*hi) << 4 | hex_value(*lo));
                rest = tail;
            }
            _ => {
                let offset = data.len() - rest.len();
                return Err(Error::InvalidEncoding(format!(
                    "invalid quoted-printable escape at byte {offset}"
                )));
            }
        }
    }

    Ok(result)
}

const fn hex_value(digit: u8) -> u8 {
    match digit {
        b'0'..=b'9' => digit - b'0',
        b'a'..=b'f' => digit - b'a' + 10,
        b'A'..=b'F' => digit - b'A' + 10,
        _ => 0,
    }
}

/// Returns true if `word` has the `=?charset?encoding?text?=` shape.
#[must_use]
pub fn is_encoded_word(word: &str) -> bool {
    word.len() > 4
        && word.starts_with("=?")
        && word.ends_with("?=")
        && word[2..word.len() - 2].matches('?').count() == 2
}

/// Decodes one RFC 2047 encoded word.
///
/// Returns the raw decoded bytes together with the charset label they are
/// written in. A RFC 2231 language suffix (`charset*lang`) is dropped from
/// the label.
///
/// # Errors
///
/// Returns an error if `word` is not an encoded word, names an encoding
/// other than `B` or `Q`, or its text fails to decode.
pub fn decode_encoded_word(word: &str) -> Result<(Vec<u8>, String)> {
    if !is_encoded_word(word) {
        return Err(Error::InvalidEncoding(format!("not an encoded word: {word:?}")));
    }

    let inner = &word[2..word.len() - 2];
    let mut fields = inner.splitn(3, '?');
    let (Some(charset), Some(encoding), Some(text)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(Error::InvalidEncoding(format!("malformed encoded word: {word:?}")));
    };

    let charset = charset.split('*').next().unwrap_or(charset);
    if charset.is_empty() {
        return Err(Error::InvalidEncoding(format!("encoded word without charset: {word:?}")));
    }

    let data = match encoding {
        "B" | "b" => decode_base64(text.as_bytes())?,
        "Q" | "q" => {
            let spaced = text.replace('_', " ");
            decode_quoted_printable(spaced.as_bytes())?
        }
        other => {
            return Err(Error::InvalidEncoding(format!(
                "unknown encoded word encoding: {other}"
            )));
        }
    };

    Ok((data, charset.to_string()))
}

/// Converts bytes written in `charset` into a UTF-8 string.
///
/// Labels are resolved the way browsers do (`gb2312` maps to GBK,
/// `us-ascii` to windows-1252). Malformed sequences are replaced with
/// U+FFFD.
///
/// # Errors
///
/// Returns an error if the charset label is unknown.
pub fn convert_charset(data: &[u8], charset: &str) -> Result<String> {
    let encoding = Encoding::for_label_no_replacement(charset.trim().as_bytes())
        .ok_or_else(|| Error::UnknownCharset(charset.to_string()))?;

    let (text, had_errors) = encoding.decode_with_bom_removal(data);
    if had_errors {
        tracing::debug!(charset, "replaced malformed sequences during charset conversion");
    }

    Ok(text.into_owned())
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
    fn test_base64_decode() {
        assert_eq!(decode_base64(b"SGVsbG8sIFdvcmxkIQ==").unwrap(), b"Hello, World!");
    }

    #[test]
    fn test_base64_embedded_crlf() {
        let plain = decode_base64(b"YWJjYWJjCgotLSAK").unwrap();
        let wrapped = decode_base64(b"YWJj\r\nYWJj\r\nCgot\nLSAK").unwrap();
        assert_eq!(plain, wrapped);
        assert_eq!(plain, b"abcabc\n\n-- \n");
    }

    #[test]
    fn test_base64_invalid() {
        assert!(matches!(decode_base64(b"not base64!"), Err(Error::Base64Decode(_))));
    }

    #[test]
    fn test_quoted_printable_decode() {
        assert_eq!(decode_quoted_printable(b"truth=3Dbeauty").unwrap(), b"truth=beauty");
        assert_eq!(decode_quoted_printable(b"H=C3=A9llo").unwrap(), "Héllo".as_bytes());
        assert_eq!(decode_quoted_printable(b"h=c3=a9").unwrap(), "hé".as_bytes());
    }

    #[test]
    fn test_quoted_printable_soft_line_break() {
        assert_eq!(decode_quoted_printable(b"Hello=\r\nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"Hello=\nWorld").unwrap(), b"HelloWorld");
        assert_eq!(decode_quoted_printable(b"line\r\nnext").unwrap(), b"line\r\nnext");
    }

    #[test]
    fn test_quoted_printable_invalid() {
        assert!(decode_quoted_printable(b"bad =ZZ escape").is_err());
        assert!(decode_quoted_printable(b"truncated =4").is_err());
        assert!(decode_quoted_printable(b"trailing =").is_err());
    }

    #[test]
    fn test_is_encoded_word() {
        assert!(is_encoded_word("=?utf-8?B?SMOpbGxv?="));
        assert!(!is_encoded_word("=?utf-8?B?="));
        assert!(!is_encoded_word("=?="));
        assert!(!is_encoded_word("plain"));
    }

    #[test]
    fn test_decode_encoded_word_base64() {
        let (data, charset) = decode_encoded_word("=?GB2312?B?1arSqsrVvP7Iyw==?=").unwrap();
        assert_eq!(charset, "GB2312");
        assert_eq!(data.len(), 10);
        assert_eq!(convert_charset(&data, &charset).unwrap(), "摘要收件人");
    }

    #[test]
    fn test_decode_encoded_word_q() {
        let (data, charset) = decode_encoded_word("=?ISO-8859-1?Q?Keld_J=F8rn_Simonsen?=").unwrap();
        assert_eq!(charset, "ISO-8859-1");
        assert_eq!(convert_charset(&data, &charset).unwrap(), "Keld Jørn Simonsen");
    }

    #[test]
    fn test_decode_encoded_word_language_suffix() {
        let (data, charset) = decode_encoded_word("=?US-ASCII*EN?Q?Keith_Moore?=").unwrap();
        assert_eq!(charset, "US-ASCII");
        assert_eq!(data, b"Keith Moore");
    }

    #[test]
    fn test_decode_encoded_word_errors() {
        assert!(decode_encoded_word("Pongba").is_err());
        assert!(decode_encoded_word("=?utf-8?X?abc?=").is_err());
        assert!(decode_encoded_word("=??B?YWJj?=").is_err());
        assert!(decode_encoded_word("=?utf-8?B?!!!?=").is_err());
    }

    #[test]
    fn test_convert_charset() {
        assert_eq!(convert_charset("Héllo".as_bytes(), "UTF-8").unwrap(), "Héllo");
        assert_eq!(convert_charset(b"Andr\xe9", "iso-8859-1").unwrap(), "André");
        assert!(matches!(
            convert_charset(b"abc", "x-no-such-charset"),
            Err(Error::UnknownCharset(_))
        ));
    }
}
