//! SEARCH command handler.
//!
//! Evaluates parsed `SearchKey` criteria from imap-types against the
//! selected folder and answers with message sequence numbers
//! (RFC 3501 Section 7.2.5):
//!
//! ```text
//! * SEARCH 1 3
//! A0004 OK SEARCH completed
//! ```
//!
//! Supported keys: `ALL`, `SEEN`, `UNSEEN`, and the `NOT`, `OR` and
//! parenthesized combinators. Anything else is answered with BAD so
//! tests can tell a rejected criterion from an empty result.

use crate::fake_imap::io::{complete, write_line};
use crate::fake_imap::mailbox::{Mailbox, TestEmail};
use imap_codec::imap_types::search::SearchKey;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Handle the SEARCH command.
pub async fn handle_search<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    criteria: &[SearchKey<'_>],
    mailbox: &Mailbox,
    selected_folder: Option<&str>,
    stream: &mut BufReader<S>,
) {
    let Some(folder) = selected_folder.and_then(|name| mailbox.get_folder(name)) else {
        let _ = complete(stream, tag, "BAD", "No folder selected").await;
        return;
    };

    let mut seqs = Vec::new();
    for (idx, email) in folder.emails.iter().enumerate() {
        let matched: Option<bool> = criteria
            .iter()
            .map(|key| matches_key(email, key))
            .try_fold(true, |acc, m| m.map(|m| acc && m));
        match matched {
            Some(true) => seqs.push((idx + 1).to_string()),
            Some(false) => {}
            None => {
                let _ = complete(stream, tag, "BAD", "Unsupported search key").await;
                return;
            }
        }
    }

    let line = if seqs.is_empty() {
        "* SEARCH\r\n".to_string()
    } else {
        format!("* SEARCH {}\r\n", seqs.join(" "))
    };
    if write_line(stream, &line).await.is_ok() {
        let _ = complete(stream, tag, "OK", "SEARCH completed").await;
    }
}

/// `None` when the key is not supported.
fn matches_key(email: &TestEmail, key: &SearchKey<'_>) -> Option<bool> {
    match key {
        SearchKey::All => Some(true),
        SearchKey::Seen => Some(email.seen),
        SearchKey::Unseen => Some(!email.seen),
        SearchKey::Not(inner) => matches_key(email, inner).map(|m| !m),
        SearchKey::Or(a, b) => Some(matches_key(email, a)? || matches_key(email, b)?),
        SearchKey::And(keys) => keys
            .as_ref()
            .iter()
            .try_fold(true, |acc, k| matches_key(email, k).map(|m| acc && m)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::io::capture;
    use crate::fake_imap::mailbox::MailboxBuilder;

    const RAW: &[u8] = b"From: a@b.com\r\nSubject: Test\r\n\r\nBody";

    async fn run(
        tag: &str,
        criteria: &[SearchKey<'_>],
        mailbox: &Mailbox,
        selected: Option<&str>,
    ) -> String {
        capture(move |mut s| async move {
            handle_search(tag, criteria, mailbox, selected, &mut s).await;
        })
        .await
    }

    fn three_emails() -> Mailbox {
        MailboxBuilder::new()
            .folder("INBOX")
            .email(true, RAW)
            .email(false, RAW)
            .email(true, RAW)
            .build()
    }

    #[tokio::test]
    async fn all_returns_every_sequence_number() {
        let output = run("A1", &[SearchKey::All], &three_emails(), Some("INBOX")).await;

        assert!(output.contains("* SEARCH 1 2 3\r\n"));
        assert!(output.ends_with("A1 OK SEARCH completed\r\n"));
    }

    #[tokio::test]
    async fn unseen_filters_seen() {
        let output = run("A1", &[SearchKey::Unseen], &three_emails(), Some("INBOX")).await;
        assert!(output.contains("* SEARCH 2\r\n"));
    }

    #[tokio::test]
    async fn not_inverts() {
        let output = run(
            "A1",
            &[SearchKey::Not(Box::new(SearchKey::Unseen))],
            &three_emails(),
            Some("INBOX"),
        )
        .await;
        assert!(output.contains("* SEARCH 1 3\r\n"));
    }

    #[tokio::test]
    async fn empty_result_is_still_ok() {
        let mailbox = MailboxBuilder::new().folder("INBOX").email(true, RAW).build();

        let output = run("A1", &[SearchKey::Unseen], &mailbox, Some("INBOX")).await;

        assert_eq!(output, "* SEARCH\r\nA1 OK SEARCH completed\r\n");
    }

    #[tokio::test]
    async fn unsupported_key_is_bad() {
        let output = run("A1", &[SearchKey::Recent], &three_emails(), Some("INBOX")).await;
        assert_eq!(output, "A1 BAD Unsupported search key\r\n");
    }

    #[tokio::test]
    async fn no_folder_selected_returns_bad() {
        let output = run("A1", &[SearchKey::All], &three_emails(), None).await;
        assert!(output.contains("A1 BAD No folder selected"));
    }
}
