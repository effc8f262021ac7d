//! Command serialization helpers.

/// Writes an astring (atom or quoted string).
///
/// A quoted string cannot carry CR, LF or NUL, so those bytes are dropped.
pub fn write_astring(buf: &mut Vec<u8>, s: &str) {
    if s.is_empty() || s.bytes().any(needs_quoting) {
        buf.push(b'"');
        for b in s.bytes() {
            match b {
                b'\r' | b'\n' | 0 => continue,
                b'"' | b'\\' => buf.push(b'\\'),
                _ => {}
            }
            buf.push(b);
        }
        buf.push(b'"');
    } else {
        buf.extend_from_slice(s.as_bytes());
    }
}

/// Writes a pre-formatted argument (sequence set, criteria, fetch item).
///
/// Line breaks are dropped so an argument cannot end the command early.
pub fn write_raw(buf: &mut Vec<u8>, s: &str) {
    buf.extend(s.bytes().filter(|b| !matches!(b, b'\r' | b'\n')));
}

/// Returns true if the byte needs quoting.
const fn needs_quoting(b: u8) -> bool {
    matches!(b, b' ' | b'"' | b'\\' | b'(' | b')' | b'{' | b'%' | b'*') || b < 0x20 || b == 0x7F
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

    fn astring(s: &str) -> String {
        let mut buf = Vec::new();
        write_astring(&mut buf, s);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_atom() {
        assert_eq!(astring("INBOX"), "INBOX");
        assert_eq!(astring("user@example.com"), "user@example.com");
    }

    #[test]
    fn test_quoted() {
        assert_eq!(astring(""), "\"\"");
        assert_eq!(astring("Sent Items"), "\"Sent Items\"");
        assert_eq!(astring("pa\"ss\\word"), "\"pa\\\"ss\\\\word\"");
    }

    #[test]
    fn test_quoted_rejects_line_breaks() {
        assert_eq!(astring("x\r\ny\0"), "\"xy\"");
        assert_eq!(astring("a b\r\nc"), "\"a bc\"");
    }

    #[test]
    fn test_raw_strips_line_breaks() {
        let mut buf = Vec::new();
        write_raw(&mut buf, "1:*\r\nA2 LOGOUT");
        assert_eq!(buf, b"1:*A2 LOGOUT");
    }
}
