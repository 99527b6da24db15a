//! LIST command handler.
//!
//! Responds with one `* LIST` line per folder, followed by the tagged
//! OK (RFC 3501 Section 7.2.2). Folders built with
//! `noselect_folder` carry the `\Noselect` attribute:
//!
//! ```text
//! * LIST (\HasNoChildren) "/" "INBOX"
//! * LIST (\Noselect \HasChildren) "/" "[Gmail]"
//! A0002 OK LIST completed
//! ```
//!
//! A folder built with `malformed_folder` is sent as an unparsable
//! `* LIST` line instead.

use crate::fake_imap::io::{complete, write_line};
use crate::fake_imap::mailbox::{Folder, Mailbox};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

const MALFORMED_LINE: &str = "* LIST ))) not a mailbox list\r\n";

fn attributes(folder: &Folder) -> &'static str {
    if folder.selectable {
        "\\HasNoChildren"
    } else {
        "\\Noselect \\HasChildren"
    }
}

/// Handle the LIST command. Emits one `* LIST` line per folder.
pub async fn handle_list<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) {
    for folder in &mailbox.folders {
        let line = if folder.malformed {
            MALFORMED_LINE.to_string()
        } else {
            format!(
                "* LIST ({}) \"/\" \"{}\"\r\n",
                attributes(folder),
                folder.name
            )
        };
        if write_line(stream, &line).await.is_err() {
            return;
        }
    }
    let _ = complete(stream, tag, "OK", "LIST completed").await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::io::capture;
    use crate::fake_imap::mailbox::MailboxBuilder;

    async fn run(tag: &str, mailbox: &Mailbox) -> String {
        capture(move |mut s| async move { handle_list(tag, mailbox, &mut s).await }).await
    }

    #[tokio::test]
    async fn lists_all_folders_in_order() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .noselect_folder("[Gmail]")
            .folder("Sent")
            .build();

        let output = run("A1", &mailbox).await;

        let inbox = output.find("\"INBOX\"").unwrap();
        let gmail = output.find("\"[Gmail]\"").unwrap();
        let sent = output.find("\"Sent\"").unwrap();
        assert!(inbox < gmail && gmail < sent);
        assert!(output.ends_with("A1 OK LIST completed\r\n"));
    }

    #[tokio::test]
    async fn marks_noselect_folders() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .noselect_folder("Archive")
            .build();

        let output = run("T1", &mailbox).await;

        assert!(output.contains("* LIST (\\HasNoChildren) \"/\" \"INBOX\"\r\n"));
        assert!(output.contains("* LIST (\\Noselect \\HasChildren) \"/\" \"Archive\"\r\n"));
    }

    #[tokio::test]
    async fn malformed_folder_is_sent_in_place() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .malformed_folder()
            .folder("Sent")
            .build();

        let output = run("T3", &mailbox).await;
        let lines: Vec<&str> = output.split_inclusive("\r\n").collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].ends_with("\"INBOX\"\r\n"));
        assert_eq!(lines[1], MALFORMED_LINE);
        assert!(lines[2].ends_with("\"Sent\"\r\n"));
    }

    #[tokio::test]
    async fn empty_server_returns_only_ok() {
        let mailbox = MailboxBuilder::new().build();
        let output = run("T2", &mailbox).await;

        assert_eq!(output, "T2 OK LIST completed\r\n");
    }
}
