//! Command layer over a connected stream.
//!
//! Each call tags one command, writes it, and feeds socket reads into a
//! fresh [`Response`] until the tagged status line arrives. Commands are
//! strictly sequential.

#![allow(clippy::missing_errors_doc)]

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use mailtap_mime::{Headers, Message};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;
use tracing::{debug, warn};

use super::config::Config;
use super::stream::{self, ImapStream};
use crate::command::{Command, TagGenerator};
use crate::response::{Reply, Response};
use crate::{Error, Result};

/// Fetch item for the message header block.
pub const RFC822_HEADER: &str = "rfc822.header";
/// Fetch item for the message body without headers.
pub const RFC822_TEXT: &str = "rfc822.text";
/// The `\Seen` system flag.
pub const SEEN: &str = "\\Seen";
/// The `\Deleted` system flag.
pub const DELETED: &str = "\\Deleted";
/// Name of the primary mailbox.
pub const INBOX: &str = "INBOX";

/// IMAP client connection.
pub struct Client<S> {
    stream: S,
    tag_gen: TagGenerator,
    read_buffer: BytesMut,
    io_timeout: Duration,
}

impl<S> std::fmt::Debug for Client<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("tag_gen", &self.tag_gen)
            .field("read_buffer_size", &self.read_buffer.len())
            .field("io_timeout", &self.io_timeout)
            .finish_non_exhaustive()
    }
}

impl Client<ImapStream> {
    /// Connects to the server described by `config` and reads its greeting.
    pub async fn connect(config: &Config) -> Result<Self> {
        let stream = stream::connect(config).await?;
        Self::from_stream(stream, config).await
    }
}

impl<S> Client<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a client from a connected stream.
    ///
    /// Reads the server greeting line. A `BYE` greeting is reported as
    /// [`Error::Status`].
    pub async fn from_stream(stream: S, config: &Config) -> Result<Self> {
        let mut client = Self {
            stream,
            tag_gen: TagGenerator::default(),
            read_buffer: BytesMut::zeroed(config.read_buffer_size.max(1)),
            io_timeout: config.io_timeout,
        };

        let mut greeting = Vec::new();
        loop {
            let n = client.read_chunk().await?;
            let chunk = &client.read_buffer[..n];
            if let Some(end) = chunk.iter().position(|&b| b == b'\n') {
                greeting.extend_from_slice(&chunk[..end]);
                break;
            }
            greeting.extend_from_slice(chunk);
        }

        let greeting = String::from_utf8_lossy(&greeting);
        let greeting = greeting.trim_end();
        debug!(greeting, "server greeting");

        if let Some(text) = greeting.strip_prefix("* BYE") {
            return Err(Error::Status(format!("BYE{text}")));
        }

        Ok(client)
    }

    /// Reads once from the stream into the read buffer.
    async fn read_chunk(&mut self) -> Result<usize> {
        let n = timeout(self.io_timeout, self.stream.read(&mut self.read_buffer[..]))
            .await
            .map_err(|_| Error::Timeout(self.io_timeout))??;
        if n == 0 {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed",
            )));
        }
        Ok(n)
    }

    /// Sends a command and reads its complete response.
    ///
    /// A non-`OK` tagged status is returned inside the [`Response`], not as
    /// an error.
    pub async fn execute(&mut self, command: Command) -> Result<Response> {
        let tag = self.tag_gen.next();
        debug!(tag = %tag, command = command.name(), "sending command");

        let data = command.serialize(&tag);
        let io_timeout = self.io_timeout;
        timeout(io_timeout, async {
            self.stream.write_all(&data).await?;
            self.stream.flush().await
        })
        .await
        .map_err(|_| Error::Timeout(io_timeout))??;

        let mut response = Response::new();
        loop {
            let n = self.read_chunk().await?;
            if response.feed(&self.read_buffer[..n])? {
                break;
            }
        }

        if response.id() != tag {
            warn!(expected = %tag, got = response.id(), "tag mismatch");
        }
        if let Some(status) = response.error() {
            warn!(tag = %tag, command = command.name(), status, "command failed");
        }

        Ok(response)
    }

    /// Authenticates with LOGIN.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<()> {
        self.execute(Command::Login {
            username: username.to_string(),
            password: password.to_string(),
        })
        .await?
        .into_result()?;
        Ok(())
    }

    /// Selects a mailbox.
    ///
    /// The response is returned as is so callers can read the untagged
    /// mailbox data and check [`Response::error`].
    pub async fn select(&mut self, mailbox: &str) -> Result<Response> {
        self.execute(Command::Select {
            mailbox: mailbox.to_string(),
        })
        .await
    }

    /// Searches the selected mailbox, returning message ids.
    ///
    /// An empty `SEARCH` reply yields an empty list.
    pub async fn search(&mut self, criteria: &str) -> Result<Vec<String>> {
        let response = self
            .execute(Command::Search {
                criteria: criteria.to_string(),
            })
            .await?
            .into_result()?;

        response
            .replies()
            .iter()
            .find_map(|reply| {
                let origin = reply.origin_str();
                let head = origin.get(..6)?;
                head.eq_ignore_ascii_case("SEARCH").then(|| {
                    origin[6..]
                        .split_whitespace()
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
            })
            .ok_or_else(|| Error::Protocol("missing SEARCH reply".to_string()))
    }

    /// Fetches one data item of a message, returning the literal bytes.
    ///
    /// The literal is returned exactly as sent by the server. A response
    /// with no `<id> FETCH` reply carrying a literal is an
    /// [`Error::Protocol`].
    pub async fn fetch(&mut self, id: &str, item: &str) -> Result<Vec<u8>> {
        let response = self
            .execute(Command::Fetch {
                id: id.to_string(),
                item: item.to_string(),
            })
            .await?
            .into_result()?;

        let mut fetched: Vec<Reply> = response
            .into_replies()
            .into_iter()
            .filter(|reply| is_fetch_of(reply.origin(), id))
            .collect();

        // Unsolicited flag updates for the same message carry no literal.
        match fetched.iter().position(|reply| reply.length().is_some()) {
            Some(index) => Ok(fetched.swap_remove(index).into_content()),
            None => Err(Error::Protocol(format!("missing FETCH literal for message {id}"))),
        }
    }

    /// Replaces the flags of a message.
    pub async fn store_flag(&mut self, id: &str, flag: &str) -> Result<()> {
        self.execute(Command::Store {
            id: id.to_string(),
            flag: flag.to_string(),
        })
        .await?
        .into_result()?;
        Ok(())
    }

    /// Ends the session.
    pub async fn logout(&mut self) -> Result<()> {
        self.execute(Command::Logout).await?.into_result()?;
        Ok(())
    }

    /// Fetches a message's header block and body as a MIME message.
    pub async fn get_message(&mut self, id: &str) -> Result<Message> {
        let header = self.fetch(id, RFC822_HEADER).await?;
        let body = self.fetch(id, RFC822_TEXT).await?;
        Ok(Message::new(Headers::parse(&header), body))
    }

    /// Consumes the client, returning the underlying stream.
    pub fn into_inner(self) -> S {
        self.stream
    }
}

/// Whether an untagged reply origin reads `<id> FETCH`.
fn is_fetch_of(origin: &[u8], id: &str) -> bool {
    origin
        .strip_prefix(id.as_bytes())
        .and_then(|rest| rest.strip_prefix(b" "))
        .and_then(|rest| rest.get(..5))
        .is_some_and(|keyword| keyword.eq_ignore_ascii_case(b"FETCH"))
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
    use crate::connection::config::Security;
    use tokio_test::io::Builder;

    fn config() -> Config {
        Config::builder("localhost").security(Security::None).build()
    }

    #[test]
    fn test_is_fetch_of() {
        assert!(is_fetch_of(b"12 FETCH (RFC822.TEXT {3}\r\nabc)", "12"));
        assert!(is_fetch_of(b"12 fetch (FLAGS ())", "12"));
        assert!(!is_fetch_of(b"123 FETCH (FLAGS ())", "12"));
        assert!(!is_fetch_of(b"12 EXPUNGE", "12"));
        assert!(!is_fetch_of(b"12", "12"));
    }

    #[tokio::test]
    async fn test_greeting_split_across_reads() {
        let mock = Builder::new()
            .read(b"* OK IMAP4rev1 ")
            .read(b"ready\r\n")
            .build();
        let client = Client::from_stream(mock, &config()).await;
        assert!(client.is_ok());
    }

    #[tokio::test]
    async fn test_bye_greeting() {
        let mock = Builder::new().read(b"* BYE too many connections\r\n").build();
        let err = Client::from_stream(mock, &config()).await.unwrap_err();
        assert!(matches!(err, Error::Status(ref s) if s == "BYE too many connections"));
    }

    #[tokio::test]
    async fn test_login_failure_is_status_error() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"a001 LOGIN user pass\r\n")
            .read(b"a001 NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config()).await.unwrap();
        let err = client.login("user", "pass").await.unwrap_err();
        assert!(matches!(err, Error::Status(ref s) if s.starts_with("NO")));
    }

    #[tokio::test]
    async fn test_search_empty() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"a001 SEARCH UNSEEN\r\n")
            .read(b"* SEARCH\r\na001 OK SEARCH completed\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config()).await.unwrap();
        assert!(client.search("UNSEEN").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_missing_reply() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"a001 SEARCH ALL\r\n")
            .read(b"a001 OK SEARCH completed\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config()).await.unwrap();
        let err = client.search("ALL").await.unwrap_err();
        assert!(matches!(err, Error::Protocol(_)));
    }

    #[tokio::test]
    async fn test_connection_closed_mid_response() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"a001 LOGOUT\r\n")
            .read(b"* BYE logging out\r\n")
            .build();
        let mut client = Client::from_stream(mock, &config()).await.unwrap();
        let err = client.logout().await.unwrap_err();
        assert!(matches!(err, Error::Io(ref e) if e.kind() == io::ErrorKind::UnexpectedEof));
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout() {
        let mock = Builder::new()
            .read(b"* OK ready\r\n")
            .write(b"a001 LOGOUT\r\n")
            .wait(Duration::from_secs(120))
            .build();
        let mut client = Client::from_stream(mock, &config()).await.unwrap();
        let err = client.logout().await.unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == Duration::from_secs(60)));
    }
}
