use crate::base::context::IoResultExt;
use crate::base::neterror::{NetError, TransportError};
use crate::socket::client::SocketType;
use crate::socket::tls::TlsConfig;
use boring::ssl::{SslConnector, SslMethod};
use tokio::net::TcpStream;
use url::Url;

/// Manages the connection process: DNS -> TCP -> SSL.
/// Roughly equivalent to net::ConnectJob.
pub struct ConnectJob;

impl ConnectJob {
    /// Open a new socket to the URL's origin. `tls` is `Some` for the
    /// encrypted transport, in which case the handshake runs on top of TCP.
    pub async fn connect(url: &Url, tls: Option<&TlsConfig>) -> Result<SocketType, TransportError> {
        let host = url.host_str().ok_or(NetError::InvalidUrl)?;
        let port = url.port_or_known_default().ok_or(NetError::InvalidUrl)?;

        // 1. DNS Resolution
        let lookup_host = host.trim_start_matches('[').trim_end_matches(']');
        let addrs: Vec<_> = tokio::net::lookup_host((lookup_host, port))
            .await
            .dns_context(host)?
            .collect();

        if addrs.is_empty() {
            return Err(TransportError::with_message(
                NetError::NameNotResolved,
                format!("resolve {}: no addresses", host),
            ));
        }

        // 2. TCP Connect, first address that answers wins
        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect(addr).await.connection_context(host, port) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => {
                    tracing::debug!(%addr, error = %e, "tcp connect attempt failed");
                    last_err = Some(e);
                }
            }
        }

        let stream = match stream {
            Some(s) => s,
            None => {
                return Err(last_err.unwrap_or_else(|| TransportError::new(NetError::ConnectionFailed)))
            }
        };
        let _ = stream.set_nodelay(true);

        tracing::debug!(host = %host, port, secure = tls.is_some(), "tcp connected");

        // 3. SSL Handshake (if https)
        let Some(tls_config) = tls else {
            return Ok(SocketType::Tcp(stream));
        };

        let mut builder = SslConnector::builder(SslMethod::tls())
            .map_err(|e| TransportError::with_message(NetError::SslProtocolError, e.to_string()))?;
        tls_config.apply_to_builder(&mut builder)?;

        let connector = builder.build();
        let mut config = connector
            .configure()
            .map_err(|e| TransportError::with_message(NetError::SslProtocolError, e.to_string()))?;

        if !TlsConfig::should_set_sni(host) {
            config.set_use_server_name_indication(false);
        }
        if !tls_config.verify_peer {
            config.set_verify_hostname(false);
        }

        let tls_stream = tokio_boring::connect(config, lookup_host, stream).await.map_err(|e| {
            tracing::debug!(host = %host, port, error = %e, "tls handshake failed");
            TransportError::with_message(NetError::SslProtocolError, e.to_string())
        })?;

        Ok(SocketType::Ssl(tls_stream))
    }
}
