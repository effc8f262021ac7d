//! Byte-level decoder states and their transitions.
//!
//! Each state has its own transition function. A transition only looks
//! at the incoming byte and the reply being built, and returns the next
//! state together with the buffer [`Action`] the caller must perform.

use super::reply::Reply;

/// Position of the decoder in the response grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FeedState {
    /// Start of a line.
    #[default]
    Init,
    /// After `*`, skipping separator spaces.
    UntaggedMarker,
    /// Inside an untagged line, outside any annotation.
    ReplyBody,
    /// After `(`, reading the type token.
    ReplyType,
    /// After the type token, looking for a `{N}` literal.
    ReplyLength,
    /// After `{`, reading literal length digits up to the LF.
    LiteralLength,
    /// Counting literal bytes.
    ReplyContent,
    /// Untagged line saw CR; LF ends the line.
    ReplyBodyCr,
    /// Reading the tagged status line.
    StatusLine,
    /// Status line saw CR; LF ends the response.
    StatusLineCr,
    /// The tagged status line has been read.
    Finished,
    /// A framing error occurred.
    Failed,
}

/// Buffer effect of a single transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Drop the byte.
    Skip,
    /// Start a new reply with the byte as first origin byte.
    BeginReply,
    /// Append the byte to the reply origin.
    Origin,
    /// Append the byte to the origin and the type token.
    Type,
    /// Append the byte (`{`) to the origin and reset the literal length.
    OpenLiteral,
    /// Append the byte to the origin and the literal length.
    Length,
    /// Append the byte to the origin and the literal content.
    Content,
    /// Append a held-back CR, then the byte, to the origin.
    OriginAfterCr,
    /// The untagged line is complete.
    CompleteReply,
    /// Append the byte to the status line.
    Status,
    /// Append a held-back CR, then the byte, to the status line.
    StatusAfterCr,
    /// The status line is complete.
    CompleteStatus,
    /// The byte arrived after the response finished.
    RejectFinished,
    /// A literal byte arrived without a usable length.
    InvalidLiteral,
    /// The byte arrived after a framing error.
    RejectFailed,
}

/// Result of a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    /// State after the byte.
    pub next: FeedState,
    /// What to do with the byte.
    pub action: Action,
}

const fn step(next: FeedState, action: Action) -> Step {
    Step { next, action }
}

impl FeedState {
    /// Computes the transition for `byte`.
    #[must_use]
    pub fn transition(self, byte: u8, reply: &Reply) -> Step {
        match self {
            Self::Init => init(byte),
            Self::UntaggedMarker => untagged_marker(byte),
            Self::ReplyBody => reply_body(byte),
            Self::ReplyType => reply_type(byte, reply),
            Self::ReplyLength => reply_length(byte),
            Self::LiteralLength => literal_length(byte, reply),
            Self::ReplyContent => reply_content(reply),
            Self::ReplyBodyCr => reply_body_cr(byte),
            Self::StatusLine => status_line(byte),
            Self::StatusLineCr => status_line_cr(byte),
            Self::Finished => step(Self::Finished, Action::RejectFinished),
            Self::Failed => step(Self::Failed, Action::RejectFailed),
        }
    }
}

const fn init(byte: u8) -> Step {
    match byte {
        b'*' => step(FeedState::UntaggedMarker, Action::Skip),
        _ => step(FeedState::StatusLine, Action::Status),
    }
}

const fn untagged_marker(byte: u8) -> Step {
    match byte {
        b' ' => step(FeedState::UntaggedMarker, Action::Skip),
        _ => step(FeedState::ReplyBody, Action::BeginReply),
    }
}

const fn reply_body(byte: u8) -> Step {
    match byte {
        b'(' => step(FeedState::ReplyType, Action::Origin),
        b'\r' => step(FeedState::ReplyBodyCr, Action::Skip),
        _ => step(FeedState::ReplyBody, Action::Origin),
    }
}

fn reply_type(byte: u8, reply: &Reply) -> Step {
    match byte {
        b')' => step(FeedState::ReplyBody, Action::Origin),
        b' ' if !reply.reply_type.is_empty() => step(FeedState::ReplyLength, Action::Origin),
        b' ' => step(FeedState::ReplyType, Action::Origin),
        _ => step(FeedState::ReplyType, Action::Type),
    }
}

// A CR before any `{` means the annotation declared no literal, so the
// line ends here like any other untagged line.
const fn reply_length(byte: u8) -> Step {
    match byte {
        b'{' => step(FeedState::LiteralLength, Action::OpenLiteral),
        b'\r' => step(FeedState::ReplyBodyCr, Action::Skip),
        _ => step(FeedState::ReplyLength, Action::Origin),
    }
}

fn literal_length(byte: u8, reply: &Reply) -> Step {
    match byte {
        b'0'..=b'9' => step(FeedState::LiteralLength, Action::Length),
        b'\n' if reply.length() == Some(0) => step(FeedState::ReplyBody, Action::Origin),
        b'\n' => step(FeedState::ReplyContent, Action::Origin),
        _ => step(FeedState::LiteralLength, Action::Origin),
    }
}

fn reply_content(reply: &Reply) -> Step {
    match reply.length() {
        None => step(FeedState::Failed, Action::InvalidLiteral),
        Some(length) if reply.content.len() + 1 >= length => {
            step(FeedState::ReplyBody, Action::Content)
        }
        Some(_) => step(FeedState::ReplyContent, Action::Content),
    }
}

const fn reply_body_cr(byte: u8) -> Step {
    match byte {
        b'\n' => step(FeedState::Init, Action::CompleteReply),
        _ => step(FeedState::ReplyBody, Action::OriginAfterCr),
    }
}

const fn status_line(byte: u8) -> Step {
    match byte {
        b'\r' => step(FeedState::StatusLineCr, Action::Skip),
        _ => step(FeedState::StatusLine, Action::Status),
    }
}

const fn status_line_cr(byte: u8) -> Step {
    match byte {
        b'\n' => step(FeedState::Finished, Action::CompleteStatus),
        _ => step(FeedState::StatusLine, Action::StatusAfterCr),
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

    fn reply(reply_type: &[u8], length: &[u8], content: &[u8]) -> Reply {
        Reply {
            origin: Vec::new(),
            reply_type: reply_type.to_vec(),
            length: length.to_vec(),
            content: content.to_vec(),
        }
    }

    fn go(state: FeedState, byte: u8) -> Step {
        state.transition(byte, &Reply::default())
    }

    #[test]
    fn test_init() {
        assert_eq!(go(FeedState::Init, b'*'), step(FeedState::UntaggedMarker, Action::Skip));
        assert_eq!(go(FeedState::Init, b'a'), step(FeedState::StatusLine, Action::Status));
    }

    #[test]
    fn test_untagged_marker() {
        assert_eq!(
            go(FeedState::UntaggedMarker, b' '),
            step(FeedState::UntaggedMarker, Action::Skip)
        );
        assert_eq!(
            go(FeedState::UntaggedMarker, b'6'),
            step(FeedState::ReplyBody, Action::BeginReply)
        );
    }

    #[test]
    fn test_reply_body() {
        assert_eq!(go(FeedState::ReplyBody, b'('), step(FeedState::ReplyType, Action::Origin));
        assert_eq!(go(FeedState::ReplyBody, b'\r'), step(FeedState::ReplyBodyCr, Action::Skip));
        assert_eq!(go(FeedState::ReplyBody, b'{'), step(FeedState::ReplyBody, Action::Origin));
        assert_eq!(go(FeedState::ReplyBody, b'\n'), step(FeedState::ReplyBody, Action::Origin));
    }

    #[test]
    fn test_reply_type() {
        let typed = reply(b"BODY[]", b"", b"");
        assert_eq!(
            FeedState::ReplyType.transition(b' ', &typed),
            step(FeedState::ReplyLength, Action::Origin)
        );
        assert_eq!(go(FeedState::ReplyType, b' '), step(FeedState::ReplyType, Action::Origin));
        assert_eq!(go(FeedState::ReplyType, b')'), step(FeedState::ReplyBody, Action::Origin));
        assert_eq!(go(FeedState::ReplyType, b'R'), step(FeedState::ReplyType, Action::Type));
    }

    #[test]
    fn test_reply_length() {
        assert_eq!(
            go(FeedState::ReplyLength, b'{'),
            step(FeedState::LiteralLength, Action::OpenLiteral)
        );
        assert_eq!(go(FeedState::ReplyLength, b'\r'), step(FeedState::ReplyBodyCr, Action::Skip));
        assert_eq!(go(FeedState::ReplyLength, b'7'), step(FeedState::ReplyLength, Action::Origin));
        assert_eq!(go(FeedState::ReplyLength, b')'), step(FeedState::ReplyLength, Action::Origin));
    }

    #[test]
    fn test_literal_length() {
        assert_eq!(
            go(FeedState::LiteralLength, b'4'),
            step(FeedState::LiteralLength, Action::Length)
        );
        assert_eq!(
            go(FeedState::LiteralLength, b'}'),
            step(FeedState::LiteralLength, Action::Origin)
        );
        assert_eq!(
            go(FeedState::LiteralLength, b'\r'),
            step(FeedState::LiteralLength, Action::Origin)
        );
        assert_eq!(
            FeedState::LiteralLength.transition(b'\n', &reply(b"X", b"12", b"")),
            step(FeedState::ReplyContent, Action::Origin)
        );
        assert_eq!(
            FeedState::LiteralLength.transition(b'\n', &reply(b"X", b"0", b"")),
            step(FeedState::ReplyBody, Action::Origin)
        );
        assert_eq!(
            go(FeedState::LiteralLength, b'\n'),
            step(FeedState::ReplyContent, Action::Origin)
        );
    }

    #[test]
    fn test_reply_content() {
        assert_eq!(
            FeedState::ReplyContent.transition(b'\r', &reply(b"X", b"3", b"a")),
            step(FeedState::ReplyContent, Action::Content)
        );
        assert_eq!(
            FeedState::ReplyContent.transition(b'\n', &reply(b"X", b"3", b"a\r")),
            step(FeedState::ReplyBody, Action::Content)
        );
        assert_eq!(
            go(FeedState::ReplyContent, b'x'),
            step(FeedState::Failed, Action::InvalidLiteral)
        );
    }

    #[test]
    fn test_reply_body_cr() {
        assert_eq!(go(FeedState::ReplyBodyCr, b'\n'), step(FeedState::Init, Action::CompleteReply));
        assert_eq!(
            go(FeedState::ReplyBodyCr, b'x'),
            step(FeedState::ReplyBody, Action::OriginAfterCr)
        );
    }

    #[test]
    fn test_status_line() {
        assert_eq!(go(FeedState::StatusLine, b'\r'), step(FeedState::StatusLineCr, Action::Skip));
        assert_eq!(go(FeedState::StatusLine, b'O'), step(FeedState::StatusLine, Action::Status));
        assert_eq!(
            go(FeedState::StatusLineCr, b'\n'),
            step(FeedState::Finished, Action::CompleteStatus)
        );
        assert_eq!(
            go(FeedState::StatusLineCr, b'x'),
            step(FeedState::StatusLine, Action::StatusAfterCr)
        );
    }

    #[test]
    fn test_terminal_states() {
        for byte in [b'*', b'\r', b'\n', b'a'] {
            assert_eq!(
                go(FeedState::Finished, byte),
                step(FeedState::Finished, Action::RejectFinished)
            );
            assert_eq!(
                go(FeedState::Failed, byte),
                step(FeedState::Failed, Action::RejectFailed)
            );
        }
    }
}
