//! Mailbox dump workflow
//!
//! Walks every selectable mailbox, searches it, fetches and parses each
//! hit, and hands the result to a [`MessageSink`]. What happens when a
//! single mailbox or message fails is decided by [`ErrorPolicy`], and
//! every skipped item is recorded in the returned [`DumpReport`].

use crate::config::ImapConfig;
use crate::error::{Error, Result};
use crate::message::{
    DEFAULT_CRITERION, MessageId, ParsedMessage, parse_message, parse_positional,
};
use crate::session::MailSession;
use serde::Serialize;
use tracing::{info, warn};

/// Receives each message the dump produces.
pub trait MessageSink {
    /// Called once per parsed message.
    ///
    /// # Errors
    ///
    /// An error here stops the dump regardless of [`ErrorPolicy`].
    fn emit(&mut self, mailbox: &str, id: MessageId, message: &ParsedMessage) -> Result<()>;
}

/// How fetched bytes are turned into a [`ParsedMessage`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Layout {
    /// RFC 5322 headers and MIME body selection.
    #[default]
    Rfc5322,
    /// Fixed line positions (subject, receiver, sender, body).
    Positional,
}

/// What to do when one mailbox or message fails.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// Log it, record it in the report and move on.
    #[default]
    Skip,
    /// Stop and return the error.
    Abort,
}

#[derive(Debug, Clone)]
pub struct DumpOptions {
    pub criterion: String,
    pub layout: Layout,
    pub on_error: ErrorPolicy,
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            criterion: DEFAULT_CRITERION.to_string(),
            layout: Layout::default(),
            on_error: ErrorPolicy::default(),
        }
    }
}

/// A mailbox or message that was passed over.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Skipped {
    pub mailbox: String,
    /// `None` when the whole mailbox was skipped.
    pub id: Option<MessageId>,
    pub reason: String,
}

/// Summary of a dump run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DumpReport {
    pub mailboxes_visited: usize,
    pub messages_emitted: usize,
    pub skipped: Vec<Skipped>,
}

impl DumpReport {
    /// Apply `policy` to a failure: record and continue, or give the
    /// error back.
    fn skip(
        &mut self,
        policy: ErrorPolicy,
        mailbox: &str,
        id: Option<MessageId>,
        err: Error,
    ) -> Result<()> {
        match policy {
            ErrorPolicy::Abort => Err(err),
            ErrorPolicy::Skip => {
                match id {
                    Some(id) => warn!("Skipping message {} in {}: {}", id, mailbox, err),
                    None => warn!("Skipping mailbox {}: {}", mailbox, err),
                }
                self.skipped.push(Skipped {
                    mailbox: mailbox.to_string(),
                    id,
                    reason: err.to_string(),
                });
                Ok(())
            }
        }
    }
}

/// Connect, dump every selectable mailbox and log out.
///
/// Logout is attempted whether or not the dump itself succeeded; a
/// logout failure is only logged.
///
/// # Errors
///
/// Returns an error if the connection cannot be established, the
/// mailboxes cannot be listed, the sink fails, or (with
/// [`ErrorPolicy::Abort`]) any mailbox or message fails.
pub async fn run<S: MessageSink>(
    config: &ImapConfig,
    options: &DumpOptions,
    sink: &mut S,
) -> Result<DumpReport> {
    let mut session = MailSession::connect(config).await?;
    let outcome = dump_session(&mut session, options, sink).await;

    if let Err(e) = session.logout().await {
        warn!("{}", e);
    }

    outcome
}

/// Dump every selectable mailbox on an open session.
///
/// # Errors
///
/// See [`run`].
pub async fn dump_session<S: MessageSink>(
    session: &mut MailSession,
    options: &DumpOptions,
    sink: &mut S,
) -> Result<DumpReport> {
    let mut report = DumpReport::default();
    let mailboxes = session.list_mailboxes().await?;
    info!("Dumping {} mailboxes", mailboxes.len());

    for entry in &mailboxes {
        let mailbox = entry.name.as_str();

        if let Err(e) = session.select_mailbox(mailbox).await {
            report.skip(options.on_error, mailbox, None, e)?;
            continue;
        }

        let ids = match session.search_messages(&options.criterion).await {
            Ok(ids) => ids,
            Err(e) => {
                report.skip(options.on_error, mailbox, None, e)?;
                continue;
            }
        };
        report.mailboxes_visited += 1;

        for id in ids {
            match fetch_parsed(session, id, options.layout).await {
                Ok(message) => {
                    sink.emit(mailbox, id, &message)?;
                    report.messages_emitted += 1;
                }
                Err(e) => report.skip(options.on_error, mailbox, Some(id), e)?,
            }
        }
    }

    info!(
        "Dumped {} messages from {} mailboxes ({} skipped)",
        report.messages_emitted,
        report.mailboxes_visited,
        report.skipped.len()
    );
    Ok(report)
}

async fn fetch_parsed(
    session: &mut MailSession,
    id: MessageId,
    layout: Layout,
) -> Result<ParsedMessage> {
    let raw = session.fetch_message(id).await?;
    match layout {
        Layout::Rfc5322 => parse_message(&raw),
        Layout::Positional => parse_positional(&raw.lines()).map(ParsedMessage::from),
    }
}
