use crate::base::context::HyperResultExt;
use crate::base::neterror::{NetError, TransportError};
use crate::socket::client::SocketType;
use crate::socket::pool::{ClientSocketPool, PoolConfig};
use crate::socket::tls::TlsConfig;
use bytes::Bytes;
use http::{Request, Response};
use http_body_util::Full;
use hyper::body::Incoming;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use std::sync::Arc;
use std::time::Instant;
use tokio::spawn;
use url::Url;

/// Which of the two connection pools a URL belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Transport {
    Plain,
    Secure,
}

impl Transport {
    /// Select the transport from a URL scheme. Any scheme starting with
    /// `https` (case-insensitive) is encrypted; everything else is plain.
    pub fn from_scheme(scheme: &str) -> Self {
        if scheme.len() >= 5 && scheme[..5].eq_ignore_ascii_case("https") {
            Transport::Secure
        } else {
            Transport::Plain
        }
    }

    pub fn from_url(url: &Url) -> Self {
        Self::from_scheme(url.scheme())
    }

    pub fn is_secure(self) -> bool {
        self == Transport::Secure
    }
}

/// Wraps one HTTP/1.1 connection.
/// Equivalent to net::HttpStream.
pub struct HttpStream {
    sender: http1::SendRequest<Full<Bytes>>,
    created_at: Instant,
    used: bool,
}

impl std::fmt::Debug for HttpStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStream")
            .field("closed", &self.sender.is_closed())
            .field("used", &self.used)
            .finish()
    }
}

impl HttpStream {
    /// Run the HTTP/1.1 handshake over a connected socket and spawn the
    /// connection driver. The driver lives as long as this stream (or a pool
    /// entry holding it) does.
    pub async fn handshake(socket: SocketType) -> Result<Self, TransportError> {
        let io = TokioIo::new(socket);
        // Title-case names on the wire, as browser stacks send them.
        let (sender, conn) = http1::Builder::new()
            .title_case_headers(true)
            .handshake(io)
            .await
            .transport_context()?;

        spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!(error = %e, "connection driver ended with error");
            }
        });

        Ok(Self { sender, created_at: Instant::now(), used: false })
    }

    /// Write a request and wait for the response head.
    pub async fn send_request(
        &mut self,
        req: Request<Full<Bytes>>,
    ) -> Result<Response<Incoming>, TransportError> {
        self.used = true;
        self.sender.ready().await.transport_context()?;
        self.sender.send_request(req).await.transport_context()
    }

    /// The peer or the driver closed the connection.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Whether a request has ever been written on this connection.
    pub fn was_used(&self) -> bool {
        self.used
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }
}

/// Owns the plain and encrypted connection pools and hands out streams.
pub struct HttpStreamFactory {
    plain: Arc<ClientSocketPool>,
    secure: Arc<ClientSocketPool>,
}

impl std::fmt::Debug for HttpStreamFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStreamFactory")
            .field("plain", &self.plain)
            .field("secure", &self.secure)
            .finish()
    }
}

impl Default for HttpStreamFactory {
    fn default() -> Self {
        Self::new(TlsConfig::default(), PoolConfig::default())
    }
}

impl HttpStreamFactory {
    pub fn new(tls: TlsConfig, pool_config: PoolConfig) -> Self {
        Self {
            plain: Arc::new(ClientSocketPool::new(Transport::Plain, None, pool_config.clone())),
            secure: Arc::new(ClientSocketPool::new(Transport::Secure, Some(tls), pool_config)),
        }
    }

    /// The pool serving a given transport.
    pub fn pool(&self, transport: Transport) -> &Arc<ClientSocketPool> {
        match transport {
            Transport::Plain => &self.plain,
            Transport::Secure => &self.secure,
        }
    }

    /// The pool serving a URL, chosen by its scheme.
    pub fn pool_for(&self, url: &Url) -> &Arc<ClientSocketPool> {
        self.pool(Transport::from_url(url))
    }

    /// Get a stream for the URL, reusing an idle pooled connection when one
    /// is still open. The flag is `true` for a reused connection.
    pub async fn create_stream(&self, url: &Url) -> Result<(HttpStream, bool), TransportError> {
        if url.host_str().is_none() {
            return Err(NetError::InvalidUrl.into());
        }
        self.pool_for(url).request_stream(url).await
    }

    /// Return a stream whose exchange completed cleanly.
    pub fn release_stream(&self, url: &Url, stream: HttpStream) {
        self.pool_for(url).release_stream(url, stream);
    }

    /// Forget a stream that failed or was abandoned mid-exchange.
    pub fn report_failure(&self, url: &Url) {
        self.pool_for(url).discard_stream(url);
    }

    /// Start idle cleanup on both pools. Must run inside a tokio runtime.
    pub fn start_cleanup_tasks(&self) {
        self.plain.start_cleanup_task();
        self.secure.start_cleanup_task();
    }
}
