use url::Url;

/// Per-request cookie capability supplied by the caller.
///
/// Both methods are addressed by the canonical URL of the request
/// (see [`canonical_url`]). Implementations are shared across tasks, so they
/// must be `Send + Sync`.
pub trait CookieBridge: Send + Sync {
    /// The value for the outbound `Cookie` header. Empty means no cookies.
    fn cookie_string_for(&self, url: &str) -> String;

    /// Store one raw `Set-Cookie` header value received for `url`.
    fn record(&self, set_cookie: &str, url: &str);
}

/// `scheme://host/path` with port, query and fragment stripped.
///
/// Every poll against one endpoint maps to the same key, whatever its query.
pub fn canonical_url(url: &Url) -> String {
    format!(
        "{}://{}{}",
        url.scheme(),
        url.host_str().unwrap_or(""),
        url.path()
    )
}
