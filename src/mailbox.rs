//! IMAP mailbox types
//!
//! A [`MailboxEntry`] is one line of a `LIST` response: the mailbox
//! name, its hierarchy delimiter and the attributes the server reported.
//! Only entries without `\Noselect` can be opened with SELECT.

use async_imap::types::{Name, NameAttribute};
use serde::Serialize;
use std::fmt;

/// Mailbox selected when the caller does not name one.
pub const DEFAULT_MAILBOX: &str = "INBOX";

/// A mailbox attribute from a `LIST` response.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum MailboxAttribute {
    /// `\Noinferiors`: no child mailboxes can exist.
    NoInferiors,
    /// `\Noselect`: the name exists only as a hierarchy node.
    NoSelect,
    /// `\Marked`: new messages since the last select.
    Marked,
    /// `\Unmarked`
    Unmarked,
    /// Anything else, kept in wire form (e.g. `\HasNoChildren`).
    Custom(String),
}

impl MailboxAttribute {
    /// The IMAP wire representation of this attribute.
    #[must_use]
    pub fn as_imap_str(&self) -> &str {
        match self {
            Self::NoInferiors => "\\Noinferiors",
            Self::NoSelect => "\\Noselect",
            Self::Marked => "\\Marked",
            Self::Unmarked => "\\Unmarked",
            Self::Custom(attr) => attr,
        }
    }
}

impl fmt::Display for MailboxAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_imap_str())
    }
}

impl From<&NameAttribute<'_>> for MailboxAttribute {
    fn from(attr: &NameAttribute<'_>) -> Self {
        match attr {
            NameAttribute::NoInferiors => Self::NoInferiors,
            NameAttribute::NoSelect => Self::NoSelect,
            NameAttribute::Marked => Self::Marked,
            NameAttribute::Unmarked => Self::Unmarked,
            NameAttribute::Extension(ext) => Self::Custom(ext.to_string()),
            // RFC 6154 special-use attributes (\Sent, \Trash, ...)
            other => Self::Custom(format!("\\{other:?}")),
        }
    }
}

/// One mailbox reported by `LIST`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailboxEntry {
    pub name: String,
    pub delimiter: Option<String>,
    pub attributes: Vec<MailboxAttribute>,
}

impl MailboxEntry {
    #[must_use]
    pub fn new(name: impl Into<String>, attributes: Vec<MailboxAttribute>) -> Self {
        Self {
            name: name.into(),
            delimiter: None,
            attributes,
        }
    }

    /// Whether SELECT may be issued on this mailbox.
    #[must_use]
    pub fn is_selectable(&self) -> bool {
        !self.attributes.contains(&MailboxAttribute::NoSelect)
    }
}

impl From<&Name> for MailboxEntry {
    fn from(name: &Name) -> Self {
        Self {
            name: name.name().to_string(),
            delimiter: name.delimiter().map(ToString::to_string),
            attributes: name.attributes().iter().map(MailboxAttribute::from).collect(),
        }
    }
}

/// State reported by the server after a successful SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MailboxStatus {
    /// Number of messages in the mailbox.
    pub exists: u32,
}
