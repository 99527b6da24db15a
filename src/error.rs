//! Error types for imap-reader

use crate::message::MessageId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IMAP error: {0}")]
    Imap(String),

    #[error("Failed to select {mailbox}: {reason}")]
    Select { mailbox: String, reason: String },

    #[error("No message body returned for {0}")]
    MessageNotFound(MessageId),

    #[error("Email parsing error: {0}")]
    Parse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TLS error: {0}")]
    Tls(String),

    /// Both the secure attempt and the plaintext retry failed.
    #[error("Secure connection failed ({secure}); plaintext fallback failed ({plain})")]
    Fallback { secure: Box<Error>, plain: Box<Error> },
}

impl From<mailparse::MailParseError> for Error {
    fn from(err: mailparse::MailParseError) -> Self {
        Self::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
