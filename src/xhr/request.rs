use crate::base::neterror::{NetError, TransportError};
use crate::base::readystate::ReadyState;
use crate::cookies::bridge::{canonical_url, CookieBridge};
use crate::http::requestbody::RequestBody;
use crate::http::streamfactory::HttpStreamFactory;
use crate::http::transaction::{HttpNetworkTransaction, TransactionDelegate};
use crate::runtime;
use crate::xhr::config::{RequestConfig, RequestContext};
use bytes::{Bytes, BytesMut};
use http::header::SET_COOKIE;
use http::{HeaderMap, Method, Request, StatusCode};
use std::sync::{Arc, LazyLock, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use url::Url;

/// Factory used when no runtime has been installed.
static DEFAULT_FACTORY: LazyLock<Arc<HttpStreamFactory>> =
    LazyLock::new(|| Arc::new(HttpStreamFactory::default()));

/// Fired once when the response body completed cleanly.
pub type LoadCallback = Box<dyn FnOnce(&XmlHttpRequest) + Send + 'static>;

/// Fired once when the request failed or was aborted.
pub type ErrorCallback = Box<dyn FnOnce(&XmlHttpRequest, &TransportError) + Send + 'static>;

struct Inner {
    ready_state: ReadyState,
    status: u16,
    status_text: String,
    response: BytesMut,
    config: Option<RequestConfig>,
    context: RequestContext,
    onload: Option<LoadCallback>,
    onerror: Option<ErrorCallback>,
    abort: Option<oneshot::Sender<()>>,
    aborted: bool,
    sent: bool,
}

impl Inner {
    fn new() -> Self {
        Self {
            ready_state: ReadyState::Unsent,
            status: 0,
            status_text: String::new(),
            response: BytesMut::new(),
            config: None,
            context: RequestContext::default(),
            onload: None,
            onerror: None,
            abort: None,
            aborted: false,
            sent: false,
        }
    }

    fn is_configurable(&self) -> bool {
        self.ready_state == ReadyState::Opened && !self.sent
    }
}

/// How a request ended, carrying the callback to run outside the lock.
enum Completion {
    Load(Option<LoadCallback>),
    Error(Option<ErrorCallback>, TransportError),
}

/// An XMLHttpRequest-style handle for one logical request.
///
/// `open`, then `send`; the exchange runs on the tokio reactor and ends in
/// exactly one of the load or error callbacks, after the ready state has
/// reached [`XmlHttpRequest::DONE`]. Clones share the same request.
///
/// ```rust,no_run
/// use cometnet::XmlHttpRequest;
///
/// # async fn run() -> Result<(), cometnet::NetError> {
/// let xhr = XmlHttpRequest::new();
/// xhr.open("POST", "http://localhost:8080/cometd/connect")?;
/// xhr.set_request_header("Content-Type", "application/json;charset=UTF-8")?;
/// xhr.set_onload(|xhr| println!("{} {}", xhr.status(), xhr.response_text()));
/// xhr.set_onerror(|_, error| eprintln!("failed: {error}"));
/// xhr.send(r#"[{"channel":"/meta/connect"}]"#)?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct XmlHttpRequest {
    inner: Arc<Mutex<Inner>>,
    factory: Arc<HttpStreamFactory>,
    user_agent: Option<String>,
}

impl std::fmt::Debug for XmlHttpRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.lock();
        f.debug_struct("XmlHttpRequest")
            .field("ready_state", &inner.ready_state)
            .field("status", &inner.status)
            .field("config", &inner.config)
            .field("context", &inner.context)
            .finish()
    }
}

impl Default for XmlHttpRequest {
    fn default() -> Self {
        Self::new()
    }
}

impl XmlHttpRequest {
    pub const UNSENT: u16 = ReadyState::Unsent.as_u16();
    pub const OPENED: u16 = ReadyState::Opened.as_u16();
    pub const HEADERS_RECEIVED: u16 = ReadyState::HeadersReceived.as_u16();
    pub const LOADING: u16 = ReadyState::Loading.as_u16();
    pub const DONE: u16 = ReadyState::Done.as_u16();

    /// A request bound to the installed runtime, or to a process-wide
    /// default factory when none is installed.
    pub fn new() -> Self {
        match runtime::current() {
            Some(runtime) => runtime.xml_http_request(),
            None => Self::with_factory(DEFAULT_FACTORY.clone()),
        }
    }

    /// A request that draws connections from `factory`.
    pub fn with_factory(factory: Arc<HttpStreamFactory>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner::new())),
            factory,
            user_agent: None,
        }
    }

    /// `User-Agent` sent when the caller sets none.
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // Callbacks run outside the lock, so poisoning only follows a panic
        // in our own bookkeeping; the state is still consistent.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Record method and target and move to OPENED.
    ///
    /// Re-opening before `send` replaces the previous configuration.
    pub fn open(&self, method: &str, url: &str) -> Result<(), NetError> {
        let method = parse_method(method)?;
        let url = Url::parse(url).map_err(|_| NetError::InvalidUrl)?;
        if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
            return Err(NetError::InvalidUrl);
        }

        let mut inner = self.lock();
        if inner.sent || inner.ready_state > ReadyState::Opened {
            return Err(NetError::InvalidState);
        }

        inner.config = Some(RequestConfig::new(method, url));
        inner.status = 0;
        inner.status_text.clear();
        inner.response.clear();
        inner.ready_state = ReadyState::Opened;
        Ok(())
    }

    /// Set a header, replacing any earlier value under the same
    /// case-insensitive name. Valid only between `open` and `send`.
    pub fn set_request_header(&self, name: &str, value: &str) -> Result<(), NetError> {
        let mut inner = self.lock();
        if !inner.is_configurable() {
            return Err(NetError::InvalidState);
        }
        let config = inner.config.as_mut().ok_or(NetError::InvalidState)?;
        config.headers.insert(name, value)
    }

    /// Attach per-request capabilities. Read when the request is sent.
    pub fn set_context(&self, context: RequestContext) {
        self.lock().context = context;
    }

    pub fn context(&self) -> RequestContext {
        self.lock().context.clone()
    }

    /// Snapshot of what `open` and `set_request_header` recorded.
    pub fn config(&self) -> Option<RequestConfig> {
        self.lock().config.clone()
    }

    pub fn set_onload<F>(&self, callback: F)
    where
        F: FnOnce(&XmlHttpRequest) + Send + 'static,
    {
        self.lock().onload = Some(Box::new(callback));
    }

    pub fn set_onerror<F>(&self, callback: F)
    where
        F: FnOnce(&XmlHttpRequest, &TransportError) + Send + 'static,
    {
        self.lock().onerror = Some(Box::new(callback));
    }

    /// Start the exchange on the current tokio reactor and return at once.
    ///
    /// Valid once, from OPENED. Fails with [`NetError::ReactorUnavailable`]
    /// when called outside a tokio runtime.
    pub fn send(&self, body: impl Into<RequestBody>) -> Result<(), NetError> {
        let handle = Handle::try_current().map_err(|_| NetError::ReactorUnavailable)?;
        let body = body.into();

        let mut inner = self.lock();
        if !inner.is_configurable() {
            return Err(NetError::InvalidState);
        }
        let config = inner.config.as_ref().ok_or(NetError::InvalidState)?;

        let mut headers = config.headers.clone();
        headers.insert("Content-Length", &body.len().to_string())?;
        if !headers.contains("host") {
            headers.insert("Host", &config.host_header())?;
        }
        if let Some(user_agent) = &self.user_agent {
            if !headers.contains("user-agent") {
                headers.insert("User-Agent", user_agent)?;
            }
        }

        let cookie_url = canonical_url(&config.url);
        let bridge = inner.context.cookie_jar.clone();
        if let Some(bridge) = &bridge {
            let cookies = bridge.cookie_string_for(&cookie_url);
            if !cookies.is_empty() {
                tracing::debug!(url = %cookie_url, "attaching cookies");
                headers.insert("Cookie", &cookies)?;
            }
        }

        let mut request = Request::builder()
            .method(config.method.clone())
            .uri(config.origin_form())
            .body(body.into_full())
            .map_err(|_| NetError::InvalidUrl)?;
        *request.headers_mut() = headers.to_header_map();
        let url = config.url.clone();

        let (abort_tx, abort_rx) = oneshot::channel();
        inner.abort = Some(abort_tx);
        inner.sent = true;
        drop(inner);

        tracing::debug!(method = %request.method(), url = %url, "request started");

        let exchange = Exchange {
            xhr: self.clone(),
            bridge,
            cookie_url,
        };
        let transaction = HttpNetworkTransaction::new(self.factory.clone(), url, request);
        handle.spawn(exchange.run(transaction, abort_rx));
        Ok(())
    }

    /// Cancel the in-flight exchange. The error callback still fires.
    /// Does nothing when no exchange is in flight.
    pub fn abort(&self) {
        let mut inner = self.lock();
        if inner.ready_state.is_done() {
            return;
        }
        if let Some(abort) = inner.abort.take() {
            // The exchange may already be past its last await; `finish`
            // checks the flag so a clean end still reports the abort.
            inner.aborted = true;
            tracing::debug!("aborting request");
            let _ = abort.send(());
        }
    }

    /// HTTP status code, 0 until headers arrive.
    pub fn status(&self) -> u16 {
        self.lock().status
    }

    pub fn status_text(&self) -> String {
        self.lock().status_text.clone()
    }

    /// One of [`Self::UNSENT`] .. [`Self::DONE`].
    pub fn ready_state(&self) -> u16 {
        self.lock().ready_state.as_u16()
    }

    pub fn state(&self) -> ReadyState {
        self.lock().ready_state
    }

    /// Response body decoded as UTF-8, with invalid sequences replaced.
    pub fn response_text(&self) -> String {
        String::from_utf8_lossy(&self.lock().response).into_owned()
    }

    pub fn response_bytes(&self) -> Bytes {
        Bytes::copy_from_slice(&self.lock().response)
    }

    /// Move to DONE and run the matching callback. Only the first call has
    /// any effect.
    fn finish(&self, error: Option<TransportError>) {
        let completion = {
            let mut inner = self.lock();
            if inner.ready_state.is_done() {
                return;
            }
            inner.ready_state = ReadyState::Done;
            inner.abort = None;
            let onload = inner.onload.take();
            let onerror = inner.onerror.take();

            let error = match error {
                None if inner.aborted => Some(TransportError::aborted()),
                other => other,
            };
            match error {
                None => {
                    tracing::debug!(status = inner.status, "request finished");
                    Completion::Load(onload)
                }
                Some(error) => {
                    tracing::debug!(%error, "request failed");
                    if let Some(message) = &error.message {
                        inner.status_text = message.clone();
                    }
                    Completion::Error(onerror, error)
                }
            }
        };

        match completion {
            Completion::Load(Some(onload)) => onload(self),
            Completion::Error(Some(onerror), error) => onerror(self, &error),
            _ => {}
        }
    }
}

/// Normalize and validate a method token.
fn parse_method(method: &str) -> Result<Method, NetError> {
    const NORMALIZED: [&str; 6] = ["DELETE", "GET", "HEAD", "OPTIONS", "POST", "PUT"];
    const FORBIDDEN: [&str; 3] = ["CONNECT", "TRACE", "TRACK"];

    if FORBIDDEN.iter().any(|m| m.eq_ignore_ascii_case(method)) {
        return Err(NetError::MethodNotSupported);
    }
    let token = NORMALIZED
        .iter()
        .find(|m| m.eq_ignore_ascii_case(method))
        .copied()
        .unwrap_or(method);
    Method::from_bytes(token.as_bytes()).map_err(|_| NetError::MethodNotSupported)
}

/// State for one spawned exchange.
struct Exchange {
    xhr: XmlHttpRequest,
    bridge: Option<Arc<dyn CookieBridge>>,
    cookie_url: String,
}

impl Exchange {
    async fn run(mut self, mut transaction: HttpNetworkTransaction, mut abort: oneshot::Receiver<()>) {
        let result = tokio::select! {
            biased;
            Ok(()) = &mut abort => Err(TransportError::aborted()),
            result = transaction.start(&mut self) => result,
        };
        // Dropping a transaction mid-exchange discards its connection.
        drop(transaction);

        self.xhr.finish(result.err());
    }
}

impl TransactionDelegate for Exchange {
    fn on_response_started(&mut self, status: StatusCode, status_text: &str, headers: &HeaderMap) {
        {
            let mut inner = self.xhr.lock();
            if inner.ready_state.is_done() {
                return;
            }
            inner.status = status.as_u16();
            inner.status_text = status_text.to_string();
            inner.ready_state = ReadyState::HeadersReceived;
        }

        let Some(bridge) = &self.bridge else {
            return;
        };
        for value in headers.get_all(SET_COOKIE) {
            match value.to_str() {
                Ok(set_cookie) => {
                    tracing::debug!(url = %self.cookie_url, "recording Set-Cookie");
                    bridge.record(set_cookie, &self.cookie_url);
                }
                Err(_) => {
                    tracing::warn!(url = %self.cookie_url, "skipping non-ASCII Set-Cookie");
                }
            }
        }
    }

    fn on_read_completed(&mut self, chunk: Bytes) {
        let mut inner = self.xhr.lock();
        if inner.ready_state.is_done() {
            return;
        }
        inner.ready_state = ReadyState::Loading;
        inner.response.extend_from_slice(&chunk);
    }
}
