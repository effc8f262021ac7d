//! Readable body extraction.

use std::borrow::Cow;

use crate::content_type::ContentType;
use crate::encoding::convert_charset;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::select::select_part;

/// Decoded content of the selected leaf part.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Body {
    /// Content with its transfer encoding undone, still in `charset`.
    pub content: Vec<u8>,
    /// Media type of the selected leaf (`type/subtype`).
    pub media_type: String,
    /// Charset parameter of the selected leaf, if any.
    pub charset: Option<String>,
}

impl Body {
    /// Converts the content to a string.
    ///
    /// Content without a charset parameter must be UTF-8.
    ///
    /// # Errors
    ///
    /// Returns an error if the charset is unknown, or if no charset is
    /// declared and the content is not valid UTF-8.
    pub fn text(&self) -> Result<String> {
        match self.charset.as_deref() {
            Some(charset) => convert_charset(&self.content, charset),
            None => String::from_utf8(self.content.clone()).map_err(Into::into),
        }
    }
}

/// Multipart subtypes that are unwrapped while looking for a leaf.
fn is_container(content_type: &ContentType) -> bool {
    content_type.is_multipart()
        && matches!(
            content_type.sub_type.as_str(),
            "alternative" | "mixed" | "related"
        )
}

/// Extracts the preferred readable body of a message.
///
/// While the current entity is `multipart/alternative`, `mixed` or
/// `related`, one child is picked with [`select_part`] and replaces it.
/// The leaf reached this way is transfer-decoded according to its
/// Content-Transfer-Encoding. `preferred` is a `type/subtype` such as
/// `text/plain`; the returned media type is the leaf's own, which differs
/// from `preferred` when a fallback part was chosen.
///
/// # Errors
///
/// Returns an error if a Content-Type on the path cannot be parsed, a
/// container has no boundary, no child can be selected, or the leaf's
/// transfer encoding is malformed.
pub fn get_body(message: &Message, preferred: &str) -> Result<Body> {
    let mut current = Cow::Borrowed(message);

    let content_type = loop {
        let content_type = current.content_type()?;
        if !is_container(&content_type) {
            break content_type;
        }

        let boundary = content_type.boundary().ok_or(Error::MissingBoundary)?;
        let selected = select_part(&current.body, boundary, preferred)?;
        current = Cow::Owned(selected);
    };

    let encoding = current.transfer_encoding();
    let media_type = content_type.media_type();
    tracing::trace!(%encoding, %media_type, "decoding leaf part");

    Ok(Body {
        content: encoding.decode(&current.body)?,
        media_type,
        charset: content_type.charset().map(str::to_string),
    })
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
    use crate::header::Headers;

    const HEADERS: &str = "MIME-Version: 1.0
Date: Wed, 27 Jun 2012 14:11:28 +0800
Subject: test
From: Googol Lee <googollee@gmail.com>
";

    const SIGNATURE: &str = "新的理论从少数人的主张到一统天下，并不是因为这个理论说服了别人抛弃旧观点，而是因为一代人的逝去。\n";

    fn message(extra_headers: &str, body: &str) -> Message {
        let headers = Headers::parse(format!("{HEADERS}{extra_headers}").as_bytes());
        Message::new(headers, body.as_bytes().to_vec())
    }

    fn alternative(first_type: &str) -> Message {
        let body = format!(
            "--14dae9d67df4436caa04c39ae8b8
Content-Type: {first_type}; charset=UTF-8
Content-Transfer-Encoding: base64

YWJjYWJjCgotLSAK5paw55qE55CG6K665LuO5bCR5pWw5Lq655qE5Li75byg5Yiw5LiA57uf5aSp
5LiL77yM5bm25LiN5piv5Zug5Li66L+Z5Liq55CG6K666K+05pyN5LqG5Yir5Lq65oqb5byD5pen
6KeC54K577yM6ICM5piv5Zug5Li65LiA5Luj5Lq655qE6YCd5Y6744CCCg==
--14dae9d67df4436caa04c39ae8b8
Content-Type: text/html; charset=UTF-8
Content-Transfer-Encoding: base64

YWJjYWJjPGJyPjxicj4tLSA8YnI+5paw55qE55CG6K665LuO5bCR5pWw5Lq655qE5Li75byg5Yiw
5LiA57uf5aSp5LiL77yM5bm25LiN5piv5Zug5Li66L+Z5Liq55CG6K666K+05pyN5LqG5Yir5Lq6
5oqb5byD5pen6KeC54K577yM6ICM5piv5Zug5Li65LiA5Luj5Lq655qE6YCd5Y6744CCPGJyPgo=
--14dae9d67df4436caa04c39ae8b8--"
        );
        message(
            "Content-Type: multipart/alternative; boundary=14dae9d67df4436caa04c39ae8b8\n",
            &body,
        )
    }

    #[test]
    fn test_single_part_base64() {
        let message = message(
            "Content-Type: text/plain; charset=UTF-8\nContent-Transfer-Encoding: base64\n",
            "YTAwNyBPSyBTdWNjZXNzCgopCgotLQrmlrDnmoTnkIborrrku47lsJHmlbDkurrnmoTkuLvlvKDl
iLDkuIDnu5/lpKnkuIvvvIzlubbkuI3mmK/lm6DkuLrov5nkuKrnkIborrror7TmnI3kuobliKvk
urrmipvlvIPml6fop4LngrnvvIzogIzmmK/lm6DkuLrkuIDku6PkurrnmoTpgJ3ljrvjgIIK",
        );

        let body = get_body(&message, "text/plain").unwrap();
        assert_eq!(body.media_type, "text/plain");
        assert_eq!(body.charset.as_deref(), Some("UTF-8"));
        assert_eq!(
            body.text().unwrap(),
            format!("a007 OK Success\n\n)\n\n--\n{SIGNATURE}")
        );
    }

    #[test]
    fn test_single_part_quoted_printable() {
        let message = message(
            "Content-Type: text/plain; charset=UTF-8\nContent-Transfer-Encoding: quoted-printable\n",
            "If you believe that truth=3Dbeauty, then surely =\r\nmathematics is the most beautiful branch of philosophy.",
        );

        let body = get_body(&message, "text/plain").unwrap();
        assert_eq!(body.media_type, "text/plain");
        assert_eq!(body.charset.as_deref(), Some("UTF-8"));
        assert_eq!(
            body.text().unwrap(),
            "If you believe that truth=beauty, then surely mathematics is the most beautiful branch of philosophy."
        );
    }

    #[test]
    fn test_alternative_exact_match() {
        let body = get_body(&alternative("text/plain"), "text/plain").unwrap();
        assert_eq!(body.media_type, "text/plain");
        assert_eq!(body.charset.as_deref(), Some("UTF-8"));
        assert_eq!(body.text().unwrap(), format!("abcabc\n\n-- \n{SIGNATURE}"));
    }

    #[test]
    fn test_alternative_exact_match_html() {
        let body = get_body(&alternative("text/plain"), "text/html").unwrap();
        assert_eq!(body.media_type, "text/html");
        assert!(body.text().unwrap().starts_with("abcabc<br><br>-- <br>"));
    }

    #[test]
    fn test_alternative_fallback_reports_leaf_type() {
        let body = get_body(&alternative("text/json"), "text/plain").unwrap();
        assert_eq!(body.media_type, "text/json");
        assert_eq!(body.charset.as_deref(), Some("UTF-8"));
        assert_eq!(body.text().unwrap(), format!("abcabc\n\n-- \n{SIGNATURE}"));
    }

    #[test]
    fn test_nested_multipart() {
        let body = "--outer\r
Content-Type: multipart/alternative; boundary=\"inner\"\r
\r
--inner\r
Content-Type: text/plain; charset=iso-8859-1\r
Content-Transfer-Encoding: quoted-printable\r
\r
Andr=E9\r
--inner\r
Content-Type: text/html\r
\r
<p>Andr&eacute;</p>\r
--inner--\r
--outer\r
Content-Type: application/pdf\r
Content-Transfer-Encoding: base64\r
\r
JVBERi0=\r
--outer--\r
";
        let message = message("Content-Type: multipart/mixed; boundary=outer\n", body);

        let plain = get_body(&message, "text/plain").unwrap();
        assert_eq!(plain.media_type, "text/plain");
        assert_eq!(plain.charset.as_deref(), Some("iso-8859-1"));
        assert_eq!(plain.content, b"Andr\xe9");
        assert_eq!(plain.text().unwrap(), "André");

        let pdf = get_body(&message, "application/pdf").unwrap();
        assert_eq!(pdf.media_type, "application/pdf");
        assert_eq!(pdf.content, b"%PDF-");
        assert_eq!(pdf.charset, None);
    }

    #[test]
    fn test_missing_content_type_defaults_to_text_plain() {
        let message = message("", "hello");
        let body = get_body(&message, "text/html").unwrap();
        assert_eq!(body.media_type, "text/plain");
        assert_eq!(body.charset, None);
        assert_eq!(body.text().unwrap(), "hello");
    }

    #[test]
    fn test_other_multipart_is_leaf() {
        let message = message(
            "Content-Type: multipart/signed; boundary=x\n",
            "--x\r\n\r\nsigned\r\n--x--\r\n",
        );
        let body = get_body(&message, "text/plain").unwrap();
        assert_eq!(body.media_type, "multipart/signed");
        assert_eq!(body.content, b"--x\r\n\r\nsigned\r\n--x--\r\n");
    }

    #[test]
    fn test_errors() {
        let unparsable = message("Content-Type: nonsense\n", "x");
        assert!(matches!(
            get_body(&unparsable, "text/plain"),
            Err(Error::InvalidContentType(_))
        ));

        let no_boundary = message("Content-Type: multipart/mixed\n", "x");
        assert!(matches!(
            get_body(&no_boundary, "text/plain"),
            Err(Error::MissingBoundary)
        ));

        let no_match = message(
            "Content-Type: multipart/mixed; boundary=b\n",
            "--b\r\nContent-Type: image/png\r\n\r\npng\r\n--b--\r\n",
        );
        assert!(matches!(
            get_body(&no_match, "text/plain"),
            Err(Error::NoPreferredPart)
        ));

        let bad_base64 = message(
            "Content-Type: text/plain\nContent-Transfer-Encoding: base64\n",
            "!!not base64!!",
        );
        assert!(matches!(
            get_body(&bad_base64, "text/plain"),
            Err(Error::Base64Decode(_))
        ));
    }
}
