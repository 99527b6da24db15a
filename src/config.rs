//! IMAP connection configuration

use crate::error::{Error, Result};
use std::env;

/// Port for IMAP over implicit TLS (RFC 8314).
pub const DEFAULT_TLS_PORT: u16 = 993;

/// Port for unencrypted IMAP.
pub const DEFAULT_PLAIN_PORT: u16 = 143;

/// IMAP connection configuration
#[derive(Debug, Clone)]
pub struct ImapConfig {
    pub host: String,
    pub tls_port: u16,
    pub plain_port: u16,
    pub username: String,
    pub password: String,
    /// Try implicit TLS first, falling back to plaintext once.
    pub prefer_secure: bool,
    /// Skip certificate verification (self-signed servers).
    pub accept_invalid_certs: bool,
}

impl ImapConfig {
    /// Configuration with default ports, TLS preferred and certificate
    /// verification enabled.
    #[must_use]
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            tls_port: DEFAULT_TLS_PORT,
            plain_port: DEFAULT_PLAIN_PORT,
            username: username.into(),
            password: password.into(),
            prefer_secure: true,
            accept_invalid_certs: false,
        }
    }

    #[must_use]
    pub const fn with_tls_port(mut self, port: u16) -> Self {
        self.tls_port = port;
        self
    }

    #[must_use]
    pub const fn with_plain_port(mut self, port: u16) -> Self {
        self.plain_port = port;
        self
    }

    #[must_use]
    pub const fn with_prefer_secure(mut self, prefer_secure: bool) -> Self {
        self.prefer_secure = prefer_secure;
        self
    }

    #[must_use]
    pub const fn with_accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Load IMAP configuration from environment variables
    ///
    /// Reads from `.env` file if present. Required variables:
    /// - `IMAP_HOST`
    /// - `IMAP_USERNAME`
    /// - `IMAP_PASSWORD`
    ///
    /// Optional (with defaults):
    /// - `IMAP_TLS_PORT` (default: `993`)
    /// - `IMAP_PLAIN_PORT` (default: `143`)
    /// - `IMAP_PREFER_SECURE` (default: `true`)
    /// - `IMAP_ACCEPT_INVALID_CERTS` (default: `false`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required variable is missing or a
    /// port or boolean does not parse.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required =
            |key: &str| lookup(key).ok_or_else(|| Error::Config(format!("{key} not set")));

        let mut config = Self::new(
            required("IMAP_HOST")?,
            required("IMAP_USERNAME")?,
            required("IMAP_PASSWORD")?,
        );

        if let Some(port) = lookup("IMAP_TLS_PORT") {
            config.tls_port = parse_port("IMAP_TLS_PORT", &port)?;
        }
        if let Some(port) = lookup("IMAP_PLAIN_PORT") {
            config.plain_port = parse_port("IMAP_PLAIN_PORT", &port)?;
        }
        if let Some(flag) = lookup("IMAP_PREFER_SECURE") {
            config.prefer_secure = parse_bool("IMAP_PREFER_SECURE", &flag)?;
        }
        if let Some(flag) = lookup("IMAP_ACCEPT_INVALID_CERTS") {
            config.accept_invalid_certs = parse_bool("IMAP_ACCEPT_INVALID_CERTS", &flag)?;
        }

        Ok(config)
    }
}

fn parse_port(key: &str, value: &str) -> Result<u16> {
    value
        .parse()
        .map_err(|e| Error::Config(format!("Invalid {key}: {e}")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!("Invalid {key}: {other}"))),
    }
}
