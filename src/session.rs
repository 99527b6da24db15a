//! Read-only IMAP session

use crate::config::ImapConfig;
use crate::connection::{self, ImapSession, Transport};
use crate::error::{Error, Result};
use crate::mailbox::{DEFAULT_MAILBOX, MailboxEntry, MailboxStatus};
use crate::message::{MessageId, RawMessage};
use futures::TryStreamExt;
use tracing::{debug, info};

/// An authenticated connection to one IMAP server.
///
/// The session owns the connection exclusively. It only exists once
/// login succeeded, and [`MailSession::logout`] consumes it.
pub struct MailSession {
    session: ImapSession,
    transport: Transport,
    selected: Option<String>,
}

impl MailSession {
    /// Connect and log in.
    ///
    /// # Errors
    ///
    /// Returns an error if neither transport can be opened or if login
    /// is rejected.
    pub async fn connect(config: &ImapConfig) -> Result<Self> {
        let (session, transport) = connection::connect(config).await?;
        Ok(Self {
            session,
            transport,
            selected: None,
        })
    }

    /// Transport the session is running over.
    #[must_use]
    pub const fn transport(&self) -> Transport {
        self.transport
    }

    /// Name of the currently selected mailbox.
    #[must_use]
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// List the mailboxes that can be selected, in server order.
    ///
    /// Entries flagged `\Noselect` are left out.
    ///
    /// # Errors
    ///
    /// Returns an error if the LIST command fails or a LIST response
    /// cannot be read. The response stream does not resume after an
    /// unreadable line, so no partial list is returned.
    pub async fn list_mailboxes(&mut self) -> Result<Vec<MailboxEntry>> {
        let mut names = self
            .session
            .list(Some(""), Some("*"))
            .await
            .map_err(|e| Error::Imap(format!("List mailboxes failed: {e}")))?;

        let mut entries = Vec::new();
        while let Some(name) = names
            .try_next()
            .await
            .map_err(|e| Error::Imap(format!("Unreadable LIST response: {e}")))?
        {
            let entry = MailboxEntry::from(&name);
            debug!("Mailbox {} {:?}", entry.name, entry.attributes);
            if entry.is_selectable() {
                entries.push(entry);
            }
        }

        Ok(entries)
    }

    /// SELECT a mailbox, making it the scope for search and fetch.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Select`] if the mailbox does not exist, cannot be
    /// selected, or the command fails.
    pub async fn select_mailbox(&mut self, name: &str) -> Result<MailboxStatus> {
        self.selected = None;
        let mailbox = self.session.select(name).await.map_err(|e| Error::Select {
            mailbox: name.to_string(),
            reason: e.to_string(),
        })?;

        info!("Selected {} ({} messages)", name, mailbox.exists);
        self.selected = Some(name.to_string());
        Ok(MailboxStatus {
            exists: mailbox.exists,
        })
    }

    /// SELECT the `INBOX`.
    ///
    /// # Errors
    ///
    /// See [`MailSession::select_mailbox`].
    pub async fn select_inbox(&mut self) -> Result<MailboxStatus> {
        self.select_mailbox(DEFAULT_MAILBOX).await
    }

    /// SEARCH the selected mailbox, returning ids in ascending order.
    ///
    /// No match yields an empty vector, not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if no mailbox is selected or the server rejects
    /// the criterion.
    pub async fn search_messages(&mut self, criterion: &str) -> Result<Vec<MessageId>> {
        let Some(mailbox) = self.selected.as_deref() else {
            return Err(Error::Imap("Search failed: no mailbox selected".into()));
        };
        debug!("Searching {} for '{}'", mailbox, criterion);

        let seqs = self
            .session
            .search(criterion)
            .await
            .map_err(|e| Error::Imap(format!("Search failed: {e}")))?;

        let mut ids: Vec<MessageId> = seqs.into_iter().map(MessageId).collect();
        ids.sort_unstable();

        info!("Found {} messages matching '{}'", ids.len(), criterion);
        Ok(ids)
    }

    /// FETCH the full message for `id` from the selected mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the FETCH fails, or
    /// [`Error::MessageNotFound`] if no body came back.
    pub async fn fetch_message(&mut self, id: MessageId) -> Result<RawMessage> {
        let messages: Vec<_> = self
            .session
            .fetch(id.to_string(), "RFC822")
            .await
            .map_err(|e| Error::Imap(format!("Fetch failed: {e}")))?
            .try_collect()
            .await
            .map_err(|e| Error::Imap(format!("Fetch error: {e}")))?;

        let bytes = messages
            .iter()
            .find_map(|msg| msg.body())
            .ok_or(Error::MessageNotFound(id))?;

        debug!("Fetched message {} ({} bytes)", id, bytes.len());
        Ok(RawMessage {
            id,
            bytes: bytes.to_vec(),
        })
    }

    /// LOGOUT and close the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the server does not acknowledge LOGOUT. The
    /// connection is dropped either way.
    pub async fn logout(mut self) -> Result<()> {
        self.session
            .logout()
            .await
            .map_err(|e| Error::Imap(format!("Logout failed: {e}")))?;
        info!("Logged out");
        Ok(())
    }
}
