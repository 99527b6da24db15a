//! Message sinks that write to a byte stream
//!
//! [`ConsoleSink`] prints a human-readable block per message.
//! [`JsonLinesSink`] writes one JSON object per line.

use crate::dump::MessageSink;
use crate::error::{Error, Result};
use crate::message::{MessageId, ParsedMessage};
use serde::Serialize;
use std::io::Write;

const SEPARATOR_WIDTH: usize = 50;

/// Human-readable output.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSink<W> {
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> MessageSink for ConsoleSink<W> {
    fn emit(&mut self, mailbox: &str, id: MessageId, message: &ParsedMessage) -> Result<()> {
        let rule = "=".repeat(SEPARATOR_WIDTH);

        writeln!(self.out)?;
        writeln!(self.out, "{rule}")?;
        writeln!(self.out, "Mailbox: {mailbox} #{id}")?;
        writeln!(self.out, "From:    {}", message.sender.as_deref().unwrap_or("-"))?;
        writeln!(self.out, "To:      {}", message.receiver.as_deref().unwrap_or("-"))?;
        writeln!(self.out, "Subject: {}", message.subject.as_deref().unwrap_or("-"))?;
        if let Some(date) = message.date {
            writeln!(self.out, "Date:    {}", date.format("%Y-%m-%d %H:%M:%S"))?;
        }
        writeln!(self.out, "Body:")?;
        writeln!(self.out, "{}", message.body)?;
        writeln!(self.out, "{rule}")?;
        writeln!(self.out)?;
        Ok(())
    }
}

/// One JSON object per message, newline-delimited.
pub struct JsonLinesSink<W: Write> {
    out: W,
}

impl<W: Write> JsonLinesSink<W> {
    #[must_use]
    pub const fn new(out: W) -> Self {
        Self { out }
    }

    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[derive(Serialize)]
struct JsonRecord<'a> {
    mailbox: &'a str,
    id: MessageId,
    #[serde(flatten)]
    message: &'a ParsedMessage,
}

impl<W: Write> MessageSink for JsonLinesSink<W> {
    fn emit(&mut self, mailbox: &str, id: MessageId, message: &ParsedMessage) -> Result<()> {
        let record = JsonRecord {
            mailbox,
            id,
            message,
        };
        serde_json::to_writer(&mut self.out, &record).map_err(|e| Error::Io(e.into()))?;
        writeln!(self.out)?;
        Ok(())
    }
}
