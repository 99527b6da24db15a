#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::missing_errors_doc, clippy::missing_panics_doc)]

//! CLI that dumps every message of every selectable mailbox

use clap::Parser;
use clap::error::ErrorKind;
use imap_reader::output::{ConsoleSink, JsonLinesSink};
use imap_reader::{
    DEFAULT_CRITERION, DEFAULT_PLAIN_PORT, DEFAULT_TLS_PORT, DumpOptions, ErrorPolicy,
    ImapConfig, Layout, dump,
};
use std::io;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "imap-reader", version)]
#[command(about = "Print every message of every selectable IMAP mailbox")]
struct Args {
    /// IMAP server host name or address
    server: String,

    /// Account name used for LOGIN
    username: String,

    /// Account password
    password: String,

    /// IMAP search criterion applied to each mailbox
    #[arg(long, default_value = DEFAULT_CRITERION)]
    criterion: String,

    /// Connect without TLS
    #[arg(long)]
    plaintext: bool,

    /// Port for implicit TLS
    #[arg(long, default_value_t = DEFAULT_TLS_PORT)]
    tls_port: u16,

    /// Port for plaintext IMAP (also used as TLS fallback)
    #[arg(long, default_value_t = DEFAULT_PLAIN_PORT)]
    plain_port: u16,

    /// Accept invalid or self-signed certificates
    #[arg(long)]
    insecure: bool,

    /// Read subject, receiver and sender from the first three lines
    #[arg(long)]
    positional: bool,

    /// Stop at the first mailbox or message that fails
    #[arg(long)]
    abort_on_error: bool,

    /// Output one JSON object per message
    #[arg(long)]
    json: bool,
}

impl Args {
    fn config(&self) -> ImapConfig {
        ImapConfig::new(&self.server, &self.username, &self.password)
            .with_tls_port(self.tls_port)
            .with_plain_port(self.plain_port)
            .with_prefer_secure(!self.plaintext)
            .with_accept_invalid_certs(self.insecure)
    }

    fn options(&self) -> DumpOptions {
        DumpOptions {
            criterion: self.criterion.clone(),
            layout: if self.positional {
                Layout::Positional
            } else {
                Layout::Rfc5322
            },
            on_error: if self.abort_on_error {
                ErrorPolicy::Abort
            } else {
                ErrorPolicy::Skip
            },
        }
    }
}

fn parse_args() -> Result<Args, ExitCode> {
    Args::try_parse().map_err(|e| {
        let _ = e.print();
        match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
            _ => ExitCode::from(1),
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(code) => return Ok(code),
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let config = args.config();
    let options = args.options();
    let stdout = io::stdout().lock();

    let report = if args.json {
        dump::run(&config, &options, &mut JsonLinesSink::new(stdout)).await?
    } else {
        dump::run(&config, &options, &mut ConsoleSink::new(stdout)).await?
    };

    info!(
        "{} messages from {} mailboxes, {} skipped",
        report.messages_emitted,
        report.mailboxes_visited,
        report.skipped.len()
    );
    Ok(ExitCode::SUCCESS)
}
