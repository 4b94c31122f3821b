use crate::cookies::bridge::CookieBridge;
use crate::http::orderedheaders::OrderedHeaderMap;
use crate::http::streamfactory::Transport;
use http::Method;
use std::sync::Arc;
use url::Url;

/// What `open` recorded: method, target and the caller's headers.
/// Frozen once the request is sent.
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub method: Method,
    pub url: Url,
    pub transport: Transport,
    pub headers: OrderedHeaderMap,
}

impl RequestConfig {
    pub fn new(method: Method, url: Url) -> Self {
        let transport = Transport::from_url(&url);
        Self {
            method,
            url,
            transport,
            headers: OrderedHeaderMap::new(),
        }
    }

    /// `Host` header value: the host, plus the port when it is not the
    /// scheme default.
    pub fn host_header(&self) -> String {
        let host = self.url.host_str().unwrap_or("");
        match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Request target in origin form: path plus query.
    pub fn origin_form(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }
}

/// Per-request capabilities supplied by the caller.
#[derive(Clone, Default)]
pub struct RequestContext {
    /// Cookie store consulted before sending and fed from `Set-Cookie`.
    pub cookie_jar: Option<Arc<dyn CookieBridge>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cookie_jar(cookie_jar: Arc<dyn CookieBridge>) -> Self {
        Self {
            cookie_jar: Some(cookie_jar),
        }
    }
}

impl std::fmt::Debug for RequestContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestContext")
            .field("cookie_jar", &self.cookie_jar.is_some())
            .finish()
    }
}
