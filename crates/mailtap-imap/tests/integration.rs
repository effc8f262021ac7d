//! Integration tests for the IMAP client.
//!
//! These tests use a mock stream to simulate IMAP server responses
//! without requiring a real server connection.

#![allow(clippy::unwrap_used)]

use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

use mailtap_imap::{Client, Config, Error, INBOX, SEEN, Security};
use mailtap_mime::{get_body, parse_address};

/// Mock stream that returns predefined server segments.
///
/// Each read returns at most the rest of the current segment, so one
/// segment never bleeds into the next read.
struct MockStream {
    /// Server output, one entry per logical send.
    segments: VecDeque<Vec<u8>>,
    /// Captured commands sent by the client.
    sent: Vec<u8>,
}

impl MockStream {
    fn new<I, T>(segments: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Self {
            segments: segments.into_iter().map(|s| s.as_ref().to_vec()).collect(),
            sent: Vec::new(),
        }
    }

    fn sent_str(&self) -> String {
        String::from_utf8_lossy(&self.sent).into_owned()
    }
}

impl AsyncRead for MockStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let Some(segment) = self.segments.front_mut() else {
            return Poll::Ready(Ok(()));
        };

        let to_read = segment.len().min(buf.remaining());
        buf.put_slice(&segment[..to_read]);
        segment.drain(..to_read);
        if segment.is_empty() {
            self.segments.pop_front();
        }

        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for MockStream {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        self.sent.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

const HEADER: &str = "From: =?GB2312?B?1arSqsrVvP7Iyw==?= <pongba@googlegroups.com>\r\n\
                      To: \"abc, 123\" <team@example.com>, bob@example.com\r\n\
                      Subject: test\r\n\
                      Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
                      \r\n";

const TEXT: &str = "--b1\r\n\
                    Content-Type: text/plain; charset=UTF-8\r\n\
                    Content-Transfer-Encoding: quoted-printable\r\n\
                    \r\n\
                    truth=3Dbeauty\r\n\
                    --b1\r\n\
                    Content-Type: text/html; charset=UTF-8\r\n\
                    \r\n\
                    <p>truth</p>\r\n\
                    --b1--\r\n";

fn fetch_reply(tag: &str, id: &str, item: &str, literal: &str) -> String {
    format!(
        "* {id} FETCH ({item} {{{}}}\r\n{literal})\r\n{tag} OK FETCH completed\r\n",
        literal.len()
    )
}

fn config(read_buffer_size: usize) -> Config {
    Config::builder("localhost")
        .security(Security::None)
        .read_buffer_size(read_buffer_size)
        .build()
}

fn session_segments() -> Vec<String> {
    vec![
        "* OK [CAPABILITY IMAP4rev1] ready\r\n".to_string(),
        "a001 OK LOGIN completed\r\n".to_string(),
        "* FLAGS (\\Answered \\Flagged \\Deleted \\Seen \\Draft)\r\n\
         * 2 EXISTS\r\n\
         * OK [UIDVALIDITY 3857529045] UIDs valid\r\n\
         a002 OK [READ-WRITE] SELECT completed\r\n"
            .to_string(),
        "* SEARCH 1 2\r\na003 OK SEARCH completed\r\n".to_string(),
        fetch_reply("a004", "1", "RFC822.HEADER", HEADER),
        fetch_reply("a005", "1", "RFC822.TEXT", TEXT),
        "* 1 FETCH (FLAGS (\\Seen))\r\na006 OK STORE completed\r\n".to_string(),
        "* BYE logging out\r\na007 OK LOGOUT completed\r\n".to_string(),
    ]
}

async fn run_session(read_buffer_size: usize) -> MockStream {
    let mock = MockStream::new(session_segments());
    let mut client = Client::from_stream(mock, &config(read_buffer_size))
        .await
        .unwrap();

    client.login("user@example.com", "secret pass").await.unwrap();

    let selected = client.select(INBOX).await.unwrap();
    assert_eq!(selected.error(), None);
    assert_eq!(selected.replies().len(), 3);
    assert_eq!(selected.replies()[1].origin(), b"2 EXISTS");

    let ids = client.search("UNSEEN").await.unwrap();
    assert_eq!(ids, vec!["1", "2"]);

    let message = client.get_message(&ids[0]).await.unwrap();
    assert_eq!(message.headers.get("subject"), Some("test"));
    assert_eq!(message.body, TEXT.as_bytes());

    let from = parse_address(message.headers.get("from").unwrap()).unwrap();
    assert_eq!(from[0].name, "摘要收件人");
    assert_eq!(from[0].address, "pongba@googlegroups.com");

    let to = parse_address(message.headers.get("to").unwrap()).unwrap();
    assert_eq!(to.len(), 2);
    assert_eq!(to[0].name, "abc, 123");
    assert_eq!(to[1].address, "bob@example.com");

    let body = get_body(&message, "text/plain").unwrap();
    assert_eq!(body.media_type, "text/plain");
    assert_eq!(body.text().unwrap(), "truth=beauty");

    client.store_flag(&ids[0], SEEN).await.unwrap();
    client.logout().await.unwrap();

    client.into_inner()
}

#[tokio::test]
async fn test_full_session() {
    let stream = run_session(1024).await;
    assert_eq!(
        stream.sent_str(),
        "a001 LOGIN user@example.com \"secret pass\"\r\n\
         a002 SELECT INBOX\r\n\
         a003 SEARCH UNSEEN\r\n\
         a004 FETCH 1 rfc822.header\r\n\
         a005 FETCH 1 rfc822.text\r\n\
         a006 STORE 1 FLAGS \\Seen\r\n\
         a007 LOGOUT\r\n"
    );
}

#[tokio::test]
async fn test_full_session_tiny_reads() {
    for size in [1, 2, 3, 7, 64] {
        let stream = run_session(size).await;
        assert!(stream.segments.is_empty(), "unread data with read size {size}");
    }
}

#[tokio::test]
async fn test_fetch_skips_unsolicited_flags() {
    let mock = MockStream::new([
        "* OK ready\r\n".to_string(),
        format!(
            "* 3 FETCH (FLAGS (\\Recent))\r\n{}",
            fetch_reply("a001", "3", "RFC822.TEXT", "hello\r\n")
        ),
    ]);
    let mut client = Client::from_stream(mock, &config(1024)).await.unwrap();

    let data = client.fetch("3", "rfc822.text").await.unwrap();
    assert_eq!(data, b"hello\r\n");
}

#[tokio::test]
async fn test_fetch_missing_reply() {
    let mock = MockStream::new(["* OK ready\r\n", "a001 OK FETCH completed\r\n"]);
    let mut client = Client::from_stream(mock, &config(1024)).await.unwrap();

    let err = client.fetch("9", "rfc822.text").await.unwrap_err();
    assert!(matches!(err, Error::Protocol(_)));
}

#[tokio::test]
async fn test_fetch_without_literal() {
    let mock = MockStream::new([
        "* OK ready\r\n",
        "* 3 FETCH (FLAGS (\\Seen))\r\na001 OK FETCH completed\r\n",
    ]);
    let mut client = Client::from_stream(mock, &config(1024)).await.unwrap();

    let err = client.fetch("3", "rfc822.text").await.unwrap_err();
    assert!(matches!(err, Error::Protocol(ref s) if s.contains("message 3")));
}

#[tokio::test]
async fn test_select_failure_is_returned_as_state() {
    let mock = MockStream::new(["* OK ready\r\n", "a001 NO Mailbox doesn't exist\r\n"]);
    let mut client = Client::from_stream(mock, &config(1024)).await.unwrap();

    let response = client.select("Archive").await.unwrap();
    assert_eq!(response.error(), Some("NO Mailbox doesn't exist"));
    assert!(matches!(response.into_result(), Err(Error::Status(_))));
}

#[tokio::test]
async fn test_store_failure() {
    let mock = MockStream::new(["* OK ready\r\n", "a001 BAD Invalid flag\r\n"]);
    let mut client = Client::from_stream(mock, &config(1024)).await.unwrap();

    let err = client.store_flag("1", "Seen").await.unwrap_err();
    assert_eq!(err.to_string(), "BAD Invalid flag");
}

#[tokio::test]
async fn test_invalid_literal_surfaces() {
    let mock = MockStream::new([
        "* OK ready\r\n",
        "* 1 FETCH (RFC822.TEXT {x}\r\nabc)\r\na001 OK done\r\n",
    ]);
    let mut client = Client::from_stream(mock, &config(1024)).await.unwrap();

    let err = client.fetch("1", "rfc822.text").await.unwrap_err();
    assert!(matches!(err, Error::InvalidLiteral { .. }));
}

#[tokio::test]
async fn test_greeting_without_newline_then_eof() {
    let mock = MockStream::new(["* OK rea"]);
    let err = Client::from_stream(mock, &config(1024)).await.unwrap_err();
    assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
}
