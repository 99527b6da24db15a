//! Read-only IMAP retrieval client
//!
//! Connects to an IMAP server (implicit TLS, with a single plaintext
//! fallback), lists the selectable mailboxes and fetches their
//! messages. Messages are parsed as RFC 5322 into a [`ParsedMessage`].
//!
//! [`MailSession`] exposes the individual protocol steps; [`dump::run`]
//! strings them together and reports what it had to skip.

mod config;
mod connection;
pub mod dump;
mod error;
mod mailbox;
mod message;
pub mod output;
mod session;

pub use config::{DEFAULT_PLAIN_PORT, DEFAULT_TLS_PORT, ImapConfig};
pub use connection::Transport;
pub use dump::{DumpOptions, DumpReport, ErrorPolicy, Layout, MessageSink, Skipped};
pub use error::{Error, Result};
pub use mailbox::{DEFAULT_MAILBOX, MailboxAttribute, MailboxEntry, MailboxStatus};
pub use message::{
    DEFAULT_CRITERION, MessageId, ParsedMessage, PositionalMessage, RawMessage, parse_message,
    parse_positional,
};
pub use session::MailSession;
