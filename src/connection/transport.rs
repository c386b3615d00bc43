// ABOUTME: The duplex byte stream a connection is built on, plain or TLS-wrapped.
// ABOUTME: native-tls/tokio-native-tls per the retrieval pack's NNTP client, the corpus's only hand-rolled TLS dial.

use crate::config::{ConnectionConfig, TlsConfig};
use crate::error::{ClientError, ClientResult};
use native_tls::{Certificate, Identity, TlsConnector as NativeTlsConnector};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpSocket, TcpStream};
use tokio_native_tls::TlsConnector;

/// Blanket trait so the connection can hold either a plain [`TcpStream`] or
/// a [`tokio_native_tls::TlsStream`] behind one boxed value, without an enum
/// that would need to forward `AsyncRead`/`AsyncWrite` by hand.
pub trait AsyncStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> AsyncStream for T {}

pub type BoxedStream = Box<dyn AsyncStream>;

/// Opens the transport per `config`: a TCP connection with keep-alive and
/// no-delay set before the handshake, then an optional TLS upgrade.
pub async fn dial(config: &ConnectionConfig) -> ClientResult<BoxedStream> {
    let tcp = tcp_connect(config).await?;

    if !config.tls.enabled {
        return Ok(Box::new(tcp));
    }

    let connector = build_tls_connector(&config.tls).map_err(|e| ClientError::Tls(e.to_string()))?;
    let connector = TlsConnector::from(connector);
    let tls = connector
        .connect(&config.host, tcp)
        .await
        .map_err(|e| ClientError::Tls(e.to_string()))?;
    Ok(Box::new(tls))
}

async fn tcp_connect(config: &ConnectionConfig) -> ClientResult<TcpStream> {
    let addr = tokio::net::lookup_host(config.addr())
        .await?
        .next()
        .ok_or_else(|| ClientError::Transport(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("no address found for {}", config.addr()),
        )))?;

    let socket = if addr.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.set_keepalive(true)?;

    let stream = socket.connect(addr).await?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

fn build_tls_connector(tls: &TlsConfig) -> Result<NativeTlsConnector, native_tls::Error> {
    let mut builder = NativeTlsConnector::builder();
    builder.danger_accept_invalid_certs(!tls.verify_server_cert);

    if let Some(pem) = &tls.ca_cert {
        builder.add_root_certificate(Certificate::from_pem(pem)?);
    }
    if let (Some(cert), Some(key)) = (&tls.client_cert, &tls.client_key) {
        builder.identity(Identity::from_pkcs8(cert, key)?);
    }
    builder.build()
}
