//! Fetched messages and how they are turned into readable parts
//!
//! [`parse_message`] runs the raw bytes through an RFC 5322 / MIME
//! parser. [`parse_positional`] keeps the older line layout where the
//! first three lines are taken as subject, receiver and sender.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use mailparse::{MailHeaderMap, ParsedMail};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Search criterion used when the caller does not give one.
pub const DEFAULT_CRITERION: &str = "ALL";

/// Message sequence number inside the selected mailbox.
///
/// Only meaningful for the mailbox that was selected when it was
/// returned, on the connection that returned it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct MessageId(pub u32);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message as returned by `FETCH <id> RFC822`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawMessage {
    pub id: MessageId,
    pub bytes: Vec<u8>,
}

impl RawMessage {
    /// Message text split on CRLF. Invalid UTF-8 is replaced.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8_lossy(&self.bytes)
            .split("\r\n")
            .map(ToString::to_string)
            .collect()
    }
}

/// Readable view of a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ParsedMessage {
    pub subject: Option<String>,
    pub sender: Option<String>,
    pub receiver: Option<String>,
    pub date: Option<DateTime<Utc>>,
    /// Lowercased field name to every value, in message order.
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
}

impl ParsedMessage {
    /// All values of a header field (case-insensitive).
    #[must_use]
    pub fn header(&self, name: &str) -> &[String] {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map_or(&[], Vec::as_slice)
    }
}

/// Parse raw message bytes as an RFC 5322 message.
///
/// Header values are unfolded and RFC 2047 decoded. The body is the
/// first `text/plain` part (falling back to `text/html`, then to the top
/// level body), with CRLF normalized to LF and trailing newlines removed.
///
/// # Errors
///
/// Returns [`Error::Parse`] if the bytes are not a readable MIME message
/// or a body part cannot be decoded.
pub fn parse_message(raw: &RawMessage) -> Result<ParsedMessage> {
    let mail = mailparse::parse_mail(&raw.bytes)?;

    let mut headers: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for header in &mail.headers {
        headers
            .entry(header.get_key().to_ascii_lowercase())
            .or_default()
            .push(header.get_value());
    }

    let date = mail
        .headers
        .get_first_value("Date")
        .and_then(|value| mailparse::dateparse(&value).ok())
        .and_then(|ts| DateTime::from_timestamp(ts, 0));

    Ok(ParsedMessage {
        subject: mail.headers.get_first_value("Subject"),
        sender: mail.headers.get_first_value("From"),
        receiver: mail.headers.get_first_value("To"),
        date,
        headers,
        body: normalize_newlines(&best_text(&mail)?),
    })
}

fn best_text(mail: &ParsedMail<'_>) -> Result<String> {
    if mail.subparts.is_empty() {
        return Ok(mail.get_body()?);
    }

    for mime in ["text/plain", "text/html"] {
        if let Some(part) = find_part(mail, mime) {
            return Ok(part.get_body()?);
        }
    }
    Ok(String::new())
}

fn find_part<'a>(mail: &'a ParsedMail<'a>, mime: &str) -> Option<&'a ParsedMail<'a>> {
    if mail.subparts.is_empty() {
        return (mail.ctype.mimetype == mime).then_some(mail);
    }
    mail.subparts.iter().find_map(|part| find_part(part, mime))
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").trim_end_matches('\n').to_string()
}

/// A message read with the fixed line layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PositionalMessage {
    pub subject: String,
    pub receiver: String,
    pub sender: String,
    pub body: String,
}

/// Read a message by line position.
///
/// Line 0 is the subject, line 1 the receiver, line 2 the sender. The
/// body is every line from index 3 up to, not including, the last line.
/// This ignores header folding, ordering and MIME entirely; prefer
/// [`parse_message`] for real mail.
///
/// # Errors
///
/// Returns [`Error::Parse`] if fewer than 3 lines are given.
pub fn parse_positional<S: AsRef<str>>(lines: &[S]) -> Result<PositionalMessage> {
    let [subject, receiver, sender, rest @ ..] = lines else {
        return Err(Error::Parse(format!(
            "Positional layout needs at least 3 lines, got {}",
            lines.len()
        )));
    };

    let body = match rest.split_last() {
        Some((_, body)) => body.iter().map(AsRef::as_ref).collect::<Vec<_>>().join("\n"),
        None => String::new(),
    };

    Ok(PositionalMessage {
        subject: subject.as_ref().to_string(),
        receiver: receiver.as_ref().to_string(),
        sender: sender.as_ref().to_string(),
        body,
    })
}

impl From<PositionalMessage> for ParsedMessage {
    fn from(msg: PositionalMessage) -> Self {
        Self {
            subject: Some(msg.subject),
            sender: Some(msg.sender),
            receiver: Some(msg.receiver),
            date: None,
            headers: BTreeMap::new(),
            body: msg.body,
        }
    }
}
