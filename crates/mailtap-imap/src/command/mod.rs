//! IMAP command builder.
//!
//! Only the commands the client layer issues are modelled. Sequence sets,
//! search criteria and fetch items are passed through as written by the
//! caller; user names, passwords and mailbox names are sent as astrings.

mod serialize;
mod tag_generator;

pub use tag_generator::TagGenerator;

use serialize::{write_astring, write_raw};

/// IMAP command.
#[derive(Clone, PartialEq, Eq)]
pub enum Command {
    /// LOGIN command.
    Login {
        /// Username.
        username: String,
        /// Password.
        password: String,
    },
    /// SELECT command.
    Select {
        /// Mailbox to select.
        mailbox: String,
    },
    /// SEARCH command.
    Search {
        /// Search criteria, e.g. `UNSEEN`.
        criteria: String,
    },
    /// FETCH command for a single data item.
    Fetch {
        /// Message sequence number or set.
        id: String,
        /// Data item, e.g. `rfc822.header`.
        item: String,
    },
    /// STORE command replacing the flags of a message.
    Store {
        /// Message sequence number or set.
        id: String,
        /// Flag or parenthesized flag list.
        flag: String,
    },
    /// LOGOUT command.
    Logout,
}

impl Command {
    /// Returns the command keyword.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Login { .. } => "LOGIN",
            Self::Select { .. } => "SELECT",
            Self::Search { .. } => "SEARCH",
            Self::Fetch { .. } => "FETCH",
            Self::Store { .. } => "STORE",
            Self::Logout => "LOGOUT",
        }
    }

    /// Serializes the command with the given tag, including the final CRLF.
    #[must_use]
    pub fn serialize(&self, tag: &str) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(tag.as_bytes());
        buf.push(b' ');
        buf.extend_from_slice(self.name().as_bytes());

        match self {
            Self::Login { username, password } => {
                buf.push(b' ');
                write_astring(&mut buf, username);
                buf.push(b' ');
                write_astring(&mut buf, password);
            }
            Self::Select { mailbox } => {
                buf.push(b' ');
                write_astring(&mut buf, mailbox);
            }
            Self::Search { criteria } => {
                buf.push(b' ');
                write_raw(&mut buf, criteria);
            }
            Self::Fetch { id, item } => {
                buf.push(b' ');
                write_raw(&mut buf, id);
                buf.push(b' ');
                write_raw(&mut buf, item);
            }
            Self::Store { id, flag } => {
                buf.push(b' ');
                write_raw(&mut buf, id);
                buf.extend_from_slice(b" FLAGS ");
                write_raw(&mut buf, flag);
            }
            Self::Logout => {}
        }

        buf.extend_from_slice(b"\r\n");
        buf
    }
}

// Keeps LOGIN credentials out of logs.
impl std::fmt::Debug for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Login { username, .. } => f
                .debug_struct("Login")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::Select { mailbox } => f.debug_struct("Select").field("mailbox", mailbox).finish(),
            Self::Search { criteria } => {
                f.debug_struct("Search").field("criteria", criteria).finish()
            }
            Self::Fetch { id, item } => f
                .debug_struct("Fetch")
                .field("id", id)
                .field("item", item)
                .finish(),
            Self::Store { id, flag } => f
                .debug_struct("Store")
                .field("id", id)
                .field("flag", flag)
                .finish(),
            Self::Logout => f.write_str("Logout"),
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

    fn serialized(command: &Command) -> String {
        String::from_utf8(command.serialize("a001")).unwrap()
    }

    #[test]
    fn test_login_command() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "pass".to_string(),
        };
        assert_eq!(serialized(&cmd), "a001 LOGIN user pass\r\n");
    }

    #[test]
    fn test_login_quoted() {
        let cmd = Command::Login {
            username: "user@example.com".to_string(),
            password: "pass word".to_string(),
        };
        assert_eq!(serialized(&cmd), "a001 LOGIN user@example.com \"pass word\"\r\n");
    }

    #[test]
    fn test_login_password_cannot_inject_command() {
        let cmd = Command::Login {
            username: "u".to_string(),
            password: "x\r\na002 DELETE INBOX".to_string(),
        };
        let line = serialized(&cmd);
        assert_eq!(line.matches("\r\n").count(), 1);
        assert_eq!(line, "a001 LOGIN u \"xa002 DELETE INBOX\"\r\n");
    }

    #[test]
    fn test_login_debug_redacts_password() {
        let cmd = Command::Login {
            username: "user".to_string(),
            password: "hunter2".to_string(),
        };
        let debug = format!("{cmd:?}");
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_select_command() {
        let cmd = Command::Select {
            mailbox: "INBOX".to_string(),
        };
        assert_eq!(serialized(&cmd), "a001 SELECT INBOX\r\n");

        let cmd = Command::Select {
            mailbox: "Sent Items".to_string(),
        };
        assert_eq!(serialized(&cmd), "a001 SELECT \"Sent Items\"\r\n");
    }

    #[test]
    fn test_search_command() {
        let cmd = Command::Search {
            criteria: "UNSEEN FROM alice".to_string(),
        };
        assert_eq!(serialized(&cmd), "a001 SEARCH UNSEEN FROM alice\r\n");
    }

    #[test]
    fn test_fetch_command() {
        let cmd = Command::Fetch {
            id: "12".to_string(),
            item: "rfc822.header".to_string(),
        };
        assert_eq!(serialized(&cmd), "a001 FETCH 12 rfc822.header\r\n");
    }

    #[test]
    fn test_store_command() {
        let cmd = Command::Store {
            id: "12".to_string(),
            flag: "\\Seen".to_string(),
        };
        assert_eq!(serialized(&cmd), "a001 STORE 12 FLAGS \\Seen\r\n");
    }

    #[test]
    fn test_logout_command() {
        assert_eq!(serialized(&Command::Logout), "a001 LOGOUT\r\n");
        assert_eq!(Command::Logout.name(), "LOGOUT");
    }
}
