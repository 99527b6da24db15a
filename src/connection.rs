//! Transport setup and login
//!
//! Opens either an implicit-TLS or a plaintext stream to the server and
//! authenticates on it. When TLS is preferred and cannot be negotiated,
//! a single plaintext attempt follows; there is no further retry.

use crate::config::ImapConfig;
use crate::error::{Error, Result};
use async_imap::Session;
use futures::io::{AsyncRead, AsyncWrite};
use rustls::RootCertStore;
use rustls::pki_types::ServerName;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_util::compat::{Compat, TokioAsyncReadCompatExt};
use tracing::{debug, info, warn};

/// An authenticated IMAP session over either transport.
pub type ImapSession = Session<ImapStream>;

/// Which transport a session ended up on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Tls,
    Plain,
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Tls => f.write_str("TLS"),
            Self::Plain => f.write_str("plaintext"),
        }
    }
}

/// Byte stream underneath the IMAP session.
#[derive(Debug)]
pub enum ImapStream {
    Tls(Compat<TlsStream<TcpStream>>),
    Plain(Compat<TcpStream>),
}

impl AsyncRead for ImapStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut [u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Tls(s) => Pin::new(s).poll_read(cx, buf),
            Self::Plain(s) => Pin::new(s).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for ImapStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Self::Tls(s) => Pin::new(s).poll_write(cx, buf),
            Self::Plain(s) => Pin::new(s).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tls(s) => Pin::new(s).poll_flush(cx),
            Self::Plain(s) => Pin::new(s).poll_flush(cx),
        }
    }

    fn poll_close(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Self::Tls(s) => Pin::new(s).poll_close(cx),
            Self::Plain(s) => Pin::new(s).poll_close(cx),
        }
    }
}

/// Open a transport according to `config` and log in.
///
/// With `prefer_secure`, implicit TLS on `tls_port` is tried first. If
/// the TCP connect or the handshake fails, one plaintext attempt is made
/// on `plain_port`; if that fails too, [`Error::Fallback`] carries both
/// causes. Login failures never trigger the fallback.
pub async fn connect(config: &ImapConfig) -> Result<(ImapSession, Transport)> {
    let (stream, transport) = if config.prefer_secure {
        match open_tls(config).await {
            Ok(stream) => (stream, Transport::Tls),
            Err(secure) => {
                warn!(
                    "TLS negotiation with {} failed ({}), retrying without encryption",
                    config.host, secure
                );
                let stream = open_plain(config).await.map_err(|plain| Error::Fallback {
                    secure: Box::new(secure),
                    plain: Box::new(plain),
                })?;
                (stream, Transport::Plain)
            }
        }
    } else {
        (open_plain(config).await?, Transport::Plain)
    };

    let session = login(stream, config).await?;
    info!("Connected to IMAP server {} over {}", config.host, transport);
    Ok((session, transport))
}

async fn open_tls(config: &ImapConfig) -> Result<ImapStream> {
    let addr = format!("{}:{}", config.host, config.tls_port);
    debug!("Connecting to {} with implicit TLS", addr);

    let tcp_stream = TcpStream::connect(&addr).await?;
    let connector = tls_connector(config.accept_invalid_certs)?;
    let server_name = ServerName::try_from(config.host.clone())
        .map_err(|e| Error::Tls(format!("Invalid server name: {e}")))?;

    let tls_stream = connector
        .connect(server_name, tcp_stream)
        .await
        .map_err(|e| Error::Tls(e.to_string()))?;

    Ok(ImapStream::Tls(tls_stream.compat()))
}

async fn open_plain(config: &ImapConfig) -> Result<ImapStream> {
    let addr = format!("{}:{}", config.host, config.plain_port);
    debug!("Connecting to {} without encryption", addr);

    let tcp_stream = TcpStream::connect(&addr).await?;
    Ok(ImapStream::Plain(tcp_stream.compat()))
}

async fn login(stream: ImapStream, config: &ImapConfig) -> Result<ImapSession> {
    let client = async_imap::Client::new(stream);
    client
        .login(&config.username, &config.password)
        .await
        .map_err(|(e, _)| Error::Imap(format!("Login failed: {e}")))
}

/// Build a TLS connector backed by the Mozilla root store, or one that
/// accepts any certificate when `accept_invalid_certs` is set.
fn tls_connector(accept_invalid_certs: bool) -> Result<TlsConnector> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let builder = rustls::ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| Error::Tls(e.to_string()))?;

    let config = if accept_invalid_certs {
        builder
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(DangerousVerifier))
            .with_no_client_auth()
    } else {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        builder.with_root_certificates(roots).with_no_client_auth()
    };

    Ok(TlsConnector::from(Arc::new(config)))
}

/// Certificate verifier that accepts all certificates.
#[derive(Debug)]
struct DangerousVerifier;

impl rustls::client::danger::ServerCertVerifier for DangerousVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
