//! Incremental decoder for one command's server response.
//!
//! A [`Response`] is fed raw socket reads in any chunking. It records every
//! untagged line as a [`Reply`] and stops at the tagged status line:
//!
//! ```text
//! * 6955 FETCH (RFC822.HEADER {499}\r\n<499 bytes>)\r\n
//! a007 OK Success\r\n
//! ```
//!
//! Literal bytes are counted against the declared `{N}` length, so a
//! literal may contain CR and LF without ending the line.

mod reply;
mod state;

pub use reply::Reply;
pub use state::{Action, FeedState, Step};

use tracing::{debug, trace, warn};

use crate::error::{Error, Result};

/// Prefix of a successful tagged status.
const SUCCESS_PREFIX: &str = "OK ";

/// Decoded server response to a single tagged command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    id: String,
    status: String,
    error: Option<String>,
    replies: Vec<Reply>,
    state: FeedState,
    status_line: Vec<u8>,
    reply: Reply,
    consumed: usize,
}

impl Response {
    /// Creates an empty decoder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds the next chunk of the server stream.
    ///
    /// Returns `Ok(true)` once the tagged status line has been read. Bytes
    /// after that line within the same chunk are ignored.
    ///
    /// # Errors
    ///
    /// - [`Error::AlreadyFinished`] if the response was already complete.
    ///   Recorded fields are left untouched.
    /// - [`Error::InvalidLiteral`] if literal bytes arrive without a
    ///   parsable `{N}` length. The decoder is unusable afterwards.
    /// - [`Error::Poisoned`] for any feed after an `InvalidLiteral`.
    pub fn feed(&mut self, data: &[u8]) -> Result<bool> {
        match self.state {
            FeedState::Finished => {
                warn!(len = data.len(), "input fed to finished response");
                return Err(Error::AlreadyFinished);
            }
            FeedState::Failed => return Err(Error::Poisoned),
            _ => {}
        }

        for &byte in data {
            let Step { next, action } = self.state.transition(byte, &self.reply);
            self.state = next;
            self.apply(action, byte)?;
            self.consumed += 1;

            if self.state == FeedState::Finished {
                return Ok(true);
            }
        }

        Ok(false)
    }

    fn apply(&mut self, action: Action, byte: u8) -> Result<()> {
        match action {
            Action::Skip => {}
            Action::BeginReply | Action::Origin => self.reply.origin.push(byte),
            Action::Type => {
                self.reply.origin.push(byte);
                self.reply.reply_type.push(byte);
            }
            Action::OpenLiteral => {
                self.reply.origin.push(byte);
                self.reply.length.clear();
            }
            Action::Length => {
                self.reply.origin.push(byte);
                self.reply.length.push(byte);
            }
            Action::Content => {
                self.reply.origin.push(byte);
                self.reply.content.push(byte);
            }
            Action::OriginAfterCr => self.reply.origin.extend_from_slice(&[b'\r', byte]),
            Action::CompleteReply => self.complete_reply(),
            Action::Status => self.status_line.push(byte),
            Action::StatusAfterCr => self.status_line.extend_from_slice(&[b'\r', byte]),
            Action::CompleteStatus => self.complete_status(),
            Action::RejectFinished => return Err(Error::AlreadyFinished),
            Action::InvalidLiteral => {
                warn!(
                    position = self.consumed,
                    length = %String::from_utf8_lossy(&self.reply.length),
                    "literal without valid length"
                );
                return Err(Error::InvalidLiteral {
                    position: self.consumed,
                });
            }
            Action::RejectFailed => return Err(Error::Poisoned),
        }
        Ok(())
    }

    fn complete_reply(&mut self) {
        let reply = std::mem::take(&mut self.reply);
        trace!(
            origin_len = reply.origin.len(),
            reply_type = %reply.reply_type_str(),
            length = ?reply.length(),
            "untagged reply"
        );
        self.replies.push(reply);
    }

    fn complete_status(&mut self) {
        let line = String::from_utf8_lossy(&self.status_line).into_owned();
        let (id, status) = line.split_once(' ').unwrap_or((line.as_str(), ""));
        self.id = id.to_string();
        self.status = status.to_string();
        self.error = (!self.status.starts_with(SUCCESS_PREFIX)).then(|| self.status.clone());
        debug!(id = %self.id, status = %self.status, "tagged status");
    }

    /// Whether the tagged status line has been read.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == FeedState::Finished
    }

    /// Tag echoed by the status line. Empty until finished.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Status text after the tag, e.g. `OK Success`.
    #[must_use]
    pub fn status(&self) -> &str {
        &self.status
    }

    /// The status text, when it does not start with `OK `.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Untagged replies in arrival order.
    #[must_use]
    pub fn replies(&self) -> &[Reply] {
        &self.replies
    }

    /// Consumes the response, returning the replies.
    #[must_use]
    pub fn into_replies(self) -> Vec<Reply> {
        self.replies
    }

    /// Turns a non-`OK` status into [`Error::Status`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Status`] carrying the status text when the command
    /// failed.
    pub fn into_result(self) -> Result<Self> {
        match self.error {
            Some(status) => Err(Error::Status(status)),
            None => Ok(self),
        }
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
    use proptest::prelude::*;

    const TRANSCRIPT: [&str; 9] = [
        "* 6955 FETCH (RFC822.HEADER {499}\r\nMIME-Version: 1.0\r",
        "\nReceived: by 10.76.101.172 with HTTP; Tue, 26 Jun 2012 23:11:28 -0700 (PDT)\r\n",
        "Date: Wed, 27 Jun 2012 14:11:28 +0800\r\nDelivered-To: googollee@gmail.com\r\nMessage-ID: ",
        "<CAOf82vP-CNcxcNKvRSHc_rGrNrEoTq7DLOEckuD1g-MN7LqtVg@mail.gmail.com>\r\nSubject: test\r\nFrom: Googol Lee <googollee@gmail.com>\r\n",
        "To: =?UTF-8?B?R29vZ29sIExlZSAtIEdvb2dsZee6r+eIt+S7rO+8gemTgeihgOecn+axieWtkO+8ge+8gQ==?=\r\n <googollee@gmail.com>",
        "\r\nContent-Type: text/plain; charset=UTF-8\r\nContent-Transfer-Encoding: base64\r\n\r\n",
        "FLAG (\\Seen))\r\n",
        "a007 OK Success\r\n",
        "fdafas",
    ];

    fn transcript() -> Vec<u8> {
        TRANSCRIPT.concat().into_bytes()
    }

    fn decode(data: &[u8]) -> Response {
        let mut response = Response::new();
        assert!(response.feed(data).unwrap());
        response
    }

    /// Feeds `data` split at the given cut indices.
    fn decode_chunked(data: &[u8], cuts: &[prop::sample::Index]) -> Response {
        let mut points: Vec<usize> = cuts.iter().map(|i| i.index(data.len())).collect();
        points.sort_unstable();
        points.dedup();

        let mut response = Response::new();
        let mut start = 0;
        for end in points.into_iter().chain(std::iter::once(data.len())) {
            if response.feed(&data[start..end]).unwrap() {
                break;
            }
            start = end;
        }
        response
    }

    /// An untagged line, either plain text or a FETCH carrying a literal
    /// of arbitrary bytes.
    fn untagged_line() -> impl Strategy<Value = Vec<u8>> {
        prop_oneof![
            "[A-Z0-9][A-Z0-9 ]{0,19}".prop_map(|text| format!("* {text}\r\n").into_bytes()),
            (1u32..10_000, proptest::collection::vec(any::<u8>(), 0..64)).prop_map(
                |(id, literal)| {
                    let mut line =
                        format!("* {id} FETCH (BODY[] {{{}}}\r\n", literal.len()).into_bytes();
                    line.extend_from_slice(&literal);
                    line.extend_from_slice(b")\r\n");
                    line
                }
            ),
        ]
    }

    /// Untagged lines followed by one tagged status line.
    fn generated_transcript() -> impl Strategy<Value = (Vec<u8>, usize)> {
        (
            proptest::collection::vec(untagged_line(), 0..8),
            prop_oneof![Just("OK"), Just("NO"), Just("BAD")],
            "[a-z ]{0,12}",
        )
            .prop_map(|(lines, status, text)| {
                let count = lines.len();
                let mut data = lines.concat();
                data.extend_from_slice(format!("a1 {status} {text}\r\n").as_bytes());
                (data, count)
            })
    }

    #[test]
    fn test_fetch_transcript() {
        let mut response = Response::new();
        let mut finished = false;
        for chunk in TRANSCRIPT {
            finished = response.feed(chunk.as_bytes()).unwrap();
            if finished {
                break;
            }
        }

        assert!(finished);
        assert!(response.is_finished());
        assert_eq!(response.id(), "a007");
        assert_eq!(response.status(), "OK Success");
        assert_eq!(response.error(), None);
        assert_eq!(response.replies().len(), 1);

        let reply = &response.replies()[0];
        assert!(reply.origin().starts_with(b"6955"));
        assert_eq!(reply.reply_type_str(), "RFC822.HEADER\\Seen");
        assert_eq!(reply.length(), Some(499));
        assert_eq!(reply.content().len(), 499);
        assert!(reply.content().starts_with(b"MIME"));
        assert!(reply.content().ends_with(b"base64\r\n\r\n"));
    }

    #[test]
    fn test_failed_status() {
        let response = decode(b"a002 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n");
        assert_eq!(response.id(), "a002");
        assert_eq!(
            response.error(),
            Some("NO [AUTHENTICATIONFAILED] Invalid credentials")
        );
        assert!(response.replies().is_empty());

        let err = response.into_result().unwrap_err();
        assert!(matches!(err, Error::Status(ref s) if s.starts_with("NO ")));
    }

    #[test]
    fn test_bare_ok_is_error() {
        let response = decode(b"a001 OK\r\n");
        assert_eq!(response.status(), "OK");
        assert_eq!(response.error(), Some("OK"));
    }

    #[test]
    fn test_feed_after_finished() {
        let mut response = decode(b"a001 OK done\r\n");
        let before = response.clone();

        assert!(matches!(response.feed(b"* 1 EXISTS\r\n"), Err(Error::AlreadyFinished)));
        assert!(matches!(response.feed(b""), Err(Error::AlreadyFinished)));
        assert!(response.is_finished());
        assert_eq!(response, before);
    }

    #[test]
    fn test_trailing_bytes_ignored() {
        let response = decode(b"a001 OK done\r\n* garbage\r\n");
        assert_eq!(response.status(), "OK done");
        assert!(response.replies().is_empty());
    }

    #[test]
    fn test_untagged_lines() {
        let response = decode(
            b"* FLAGS (\\Answered \\Seen \\Draft)\r\n\
              * 172 EXISTS\r\n\
              * OK [UIDVALIDITY 3857529045] UIDs valid\r\n\
              * 1 FETCH (FLAGS (\\Seen) UID 4)\r\n\
              a002 OK [READ-WRITE] SELECT completed\r\n",
        );
        let origins: Vec<String> = response
            .replies()
            .iter()
            .map(|r| r.origin_str().into_owned())
            .collect();
        assert_eq!(
            origins,
            vec![
                "FLAGS (\\Answered \\Seen \\Draft)",
                "172 EXISTS",
                "OK [UIDVALIDITY 3857529045] UIDs valid",
                "1 FETCH (FLAGS (\\Seen) UID 4)",
            ]
        );
        assert_eq!(response.replies()[0].reply_type_str(), "\\Answered");
        assert_eq!(response.replies()[0].length(), None);
        assert_eq!(response.replies()[3].reply_type_str(), "FLAGS");
        assert!(response.replies()[3].content().is_empty());
    }

    #[test]
    fn test_literal_with_line_breaks() {
        let response = decode(b"* 3 FETCH (BODY[] {8}\r\na\r\nb\r\n\r\n)\r\na003 OK done\r\n");
        let reply = &response.replies()[0];
        assert_eq!(reply.reply_type(), b"BODY[]");
        assert_eq!(reply.content(), b"a\r\nb\r\n\r\n");
        assert_eq!(reply.origin(), b"3 FETCH (BODY[] {8}\r\na\r\nb\r\n\r\n)");
    }

    #[test]
    fn test_digits_outside_braces() {
        let response = decode(b"* 12 FETCH (UID 100 BODY[] {3}\r\nabc)\r\na004 OK done\r\n");
        let reply = &response.replies()[0];
        assert_eq!(reply.reply_type(), b"UID");
        assert_eq!(reply.length(), Some(3));
        assert_eq!(reply.content(), b"abc");
    }

    #[test]
    fn test_empty_literal() {
        let response = decode(b"* 1 FETCH (BODY[] {0}\r\n)\r\na005 OK done\r\n");
        let reply = &response.replies()[0];
        assert_eq!(reply.length(), Some(0));
        assert!(reply.content().is_empty());
        assert_eq!(response.status(), "OK done");
    }

    #[test]
    fn test_invalid_literal_poisons() {
        let mut response = Response::new();
        let err = response.feed(b"* 1 FETCH (BODY[] {}\r\nabc)\r\n").unwrap_err();
        assert!(matches!(err, Error::InvalidLiteral { position: 22 }));
        assert!(!response.is_finished());
        assert!(matches!(response.feed(b"a1 OK done\r\n"), Err(Error::Poisoned)));
    }

    #[test]
    fn test_lone_cr_kept_in_origin() {
        let response = decode(b"* 1 X\ry\r\na1 O\rK\r\n");
        assert_eq!(response.replies()[0].origin(), b"1 X\ry");
        assert_eq!(response.status(), "O\rK");
    }

    #[test]
    fn test_unfinished() {
        let mut response = Response::new();
        assert!(!response.feed(b"* 1 EXISTS\r\na1 OK do").unwrap());
        assert!(!response.is_finished());
        assert_eq!(response.replies().len(), 1);
        assert_eq!(response.id(), "");
        assert!(response.feed(b"ne\r\n").unwrap());
        assert_eq!(response.into_replies().len(), 1);
    }

    proptest! {
        #[test]
        fn chunking_does_not_change_result(
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..24)
        ) {
            let data = transcript();
            let whole = decode(&data);
            let chunked = decode_chunked(&data, &cuts);

            prop_assert!(chunked.is_finished());
            prop_assert_eq!(chunked, whole);
        }

        #[test]
        fn chunking_does_not_change_generated_result(
            (data, count) in generated_transcript(),
            cuts in proptest::collection::vec(any::<prop::sample::Index>(), 0..24)
        ) {
            let whole = decode(&data);
            prop_assert_eq!(whole.replies().len(), count);
            prop_assert_eq!(whole.id(), "a1");

            let chunked = decode_chunked(&data, &cuts);
            prop_assert!(chunked.is_finished());
            prop_assert_eq!(chunked, whole);
        }

        #[test]
        fn literal_length_is_exact(
            content in proptest::collection::vec(any::<u8>(), 0..256),
            chunk_size in 1usize..64
        ) {
            let mut data = format!("* 9 FETCH (BODY[TEXT] {{{}}}\r\n", content.len()).into_bytes();
            data.extend_from_slice(&content);
            data.extend_from_slice(b")\r\na9 OK FETCH completed\r\n");

            let mut response = Response::new();
            let mut finished = false;
            for chunk in data.chunks(chunk_size) {
                finished = response.feed(chunk).unwrap();
                if finished {
                    break;
                }
            }

            prop_assert!(finished);
            prop_assert_eq!(response.replies().len(), 1);
            prop_assert_eq!(response.replies()[0].content(), content.as_slice());
            prop_assert_eq!(response.error(), None);
        }
    }
}
