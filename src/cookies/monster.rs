use crate::base::neterror::NetError;
use crate::cookies::bridge::CookieBridge;
use crate::cookies::canonical_cookie::{CanonicalCookie, SameSite};
use crate::cookies::psl;
use cookie::Cookie;
use dashmap::DashMap;
use std::sync::Arc;
use time::{Duration, OffsetDateTime};
use url::Url;

/// Maximum cookies per domain (Chromium default).
const MAX_COOKIES_PER_DOMAIN: usize = 50;

/// Maximum total cookies across all domains.
const MAX_COOKIES_TOTAL: usize = 3000;

/// In-memory cookie jar.
/// Modeled after Chromium's `net::CookieMonster`.
///
/// Cloning shares the underlying store, so one jar can back many requests.
#[derive(Clone)]
pub struct CookieMonster {
    // Map<Domain, List<Cookie>>
    store: Arc<DashMap<String, Vec<CanonicalCookie>>>,
}

impl std::fmt::Debug for CookieMonster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieMonster")
            .field("domains", &self.store.len())
            .field("cookies", &self.total_cookie_count())
            .finish()
    }
}

impl Default for CookieMonster {
    fn default() -> Self {
        Self::new()
    }
}

impl CookieMonster {
    pub fn new() -> Self {
        Self {
            store: Arc::new(DashMap::new()),
        }
    }

    /// Insert a cookie, replacing any with the same name, domain and path.
    pub fn set_canonical_cookie(&self, cookie: CanonicalCookie) {
        let mut entry = self.store.entry(cookie.domain.clone()).or_default();

        // An overwrite keeps the original creation time (RFC 6265 5.3 step 11.3).
        let mut cookie = cookie;
        if let Some(pos) = entry
            .iter()
            .position(|c| c.name == cookie.name && c.path == cookie.path)
        {
            let old = entry.remove(pos);
            cookie.creation_time = old.creation_time;
        }

        while entry.len() >= MAX_COOKIES_PER_DOMAIN {
            let Some(oldest_idx) = entry
                .iter()
                .enumerate()
                .min_by_key(|(_, c)| c.creation_time)
                .map(|(i, _)| i)
            else {
                break;
            };
            entry.remove(oldest_idx);
        }

        entry.push(cookie);
        drop(entry); // Release the shard lock before scanning all domains

        self.enforce_global_limit();
    }

    /// Remove the cookie with this name, domain and path. Returns whether one existed.
    pub fn delete_cookie(&self, name: &str, domain: &str, path: &str) -> bool {
        let Some(mut entry) = self.store.get_mut(domain) else {
            return false;
        };
        let before = entry.len();
        entry.retain(|c| c.name != name || c.path != path);
        before != entry.len()
    }

    /// Evict the oldest cookies until the global limit holds.
    fn enforce_global_limit(&self) {
        while self.total_cookie_count() > MAX_COOKIES_TOTAL {
            let mut oldest: Option<(String, usize, OffsetDateTime)> = None;

            for entry in self.store.iter() {
                for (idx, cookie) in entry.value().iter().enumerate() {
                    let older = oldest
                        .as_ref()
                        .is_some_and(|(_, _, oldest_time)| cookie.creation_time < *oldest_time);
                    if oldest.is_none() || older {
                        oldest = Some((entry.key().clone(), idx, cookie.creation_time));
                    }
                }
            }

            let Some((domain, idx, _)) = oldest else {
                break;
            };
            if let Some(mut entry) = self.store.get_mut(&domain) {
                if idx < entry.len() {
                    entry.remove(idx);
                }
            }
        }
    }

    /// Cookies to send to `url`, longest path first, then oldest first.
    pub fn get_cookies_for_url(&self, url: &Url) -> Vec<CanonicalCookie> {
        let mut result = Vec::new();
        let host = url.host_str().unwrap_or("").to_ascii_lowercase();
        let secure_scheme = url.scheme().eq_ignore_ascii_case("https");
        let now = OffsetDateTime::now_utc();

        for domain in Self::get_matching_domains(&host) {
            if let Some(entry) = self.store.get(&domain) {
                for cookie in entry.iter() {
                    if !Self::domain_matches(&cookie.domain, &host, cookie.host_only)
                        || !Self::path_matches(&cookie.path, url.path())
                        || (cookie.secure && !secure_scheme)
                        || cookie.is_expired(now)
                    {
                        continue;
                    }
                    result.push(cookie.clone());
                }
            }
        }

        result.sort_by(|a, b| {
            b.path
                .len()
                .cmp(&a.path.len())
                .then_with(|| a.creation_time.cmp(&b.creation_time))
        });

        result
    }

    /// The `Cookie` header value for `url`, empty when nothing matches.
    pub fn cookie_line_for_url(&self, url: &Url) -> String {
        self.get_cookies_for_url(url)
            .iter()
            .map(CanonicalCookie::pair)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// RFC 6265 5.1.3 domain matching.
    fn domain_matches(cookie_domain: &str, request_host: &str, host_only: bool) -> bool {
        if host_only {
            return cookie_domain.eq_ignore_ascii_case(request_host);
        }

        let cookie_domain = cookie_domain.trim_start_matches('.');
        if request_host.eq_ignore_ascii_case(cookie_domain) {
            return true;
        }

        // request_host must end with ".cookie_domain"
        let host = request_host.as_bytes();
        let domain = cookie_domain.as_bytes();
        host.len() > domain.len()
            && host[host.len() - domain.len()..].eq_ignore_ascii_case(domain)
            && host[host.len() - domain.len() - 1] == b'.'
    }

    /// RFC 6265 5.1.4 path matching.
    fn path_matches(cookie_path: &str, request_path: &str) -> bool {
        if request_path == cookie_path {
            return true;
        }

        if let Some(rest) = request_path.strip_prefix(cookie_path) {
            return cookie_path.ends_with('/') || rest.starts_with('/');
        }

        false
    }

    /// RFC 6265 5.1.4 default-path: the request path up to, not including,
    /// its last `/`; `/` when that would be empty.
    fn default_path(url: &Url) -> String {
        let path = url.path();
        if !path.starts_with('/') {
            return "/".to_string();
        }
        match path.rfind('/') {
            Some(0) | None => "/".to_string(),
            Some(idx) => path[..idx].to_string(),
        }
    }

    /// The host itself and every parent domain.
    fn get_matching_domains(host: &str) -> Vec<String> {
        let mut domains = vec![host.to_string()];

        // "foo.bar.example.com" also checks "bar.example.com" and "example.com"
        let parts: Vec<&str> = host.split('.').collect();
        for i in 1..parts.len().saturating_sub(1) {
            domains.push(parts[i..].join("."));
        }

        domains
    }

    /// Parse one `Set-Cookie` value received from `url` and apply it.
    ///
    /// A zero or negative `Max-Age`, or an `Expires` in the past, deletes the
    /// matching cookie. Rejected cookies leave the jar untouched.
    pub fn parse_and_save_cookie(&self, url: &Url, cookie_line: &str) -> Result<(), NetError> {
        let parsed = Cookie::parse(cookie_line).map_err(|_| NetError::InvalidArgument)?;
        let host = url
            .host_str()
            .ok_or(NetError::InvalidUrl)?
            .to_ascii_lowercase();
        let secure_origin = url.scheme().eq_ignore_ascii_case("https");
        let now = OffsetDateTime::now_utc();

        if parsed.name().is_empty() {
            return Err(NetError::InvalidArgument);
        }

        let (domain, host_only) = match parsed.domain() {
            Some(d) if !d.is_empty() => {
                let d = d.trim_start_matches('.').to_ascii_lowercase();
                if d == host {
                    // Domain equal to the host is allowed even when the host
                    // itself is a public suffix; the cookie becomes host-only.
                    (d, psl::is_public_suffix(&host))
                } else if psl::is_public_suffix(&d) {
                    return Err(NetError::CookiePublicSuffix);
                } else if !psl::is_valid_cookie_domain(&d, &host) {
                    return Err(NetError::InvalidArgument);
                } else {
                    (d, false)
                }
            }
            _ => (host.clone(), true),
        };

        let path = match parsed.path() {
            Some(p) if p.starts_with('/') => p.to_string(),
            _ => Self::default_path(url),
        };

        let secure = parsed.secure().unwrap_or(false);
        if secure && !secure_origin {
            return Err(NetError::InvalidArgument);
        }

        // Max-Age wins over Expires (RFC 6265 5.3 step 3).
        let expiration_time = match parsed.max_age() {
            Some(max_age) if max_age <= Duration::ZERO => Some(now),
            Some(max_age) => now.checked_add(max_age),
            None => parsed.expires().and_then(|e| e.datetime()),
        };

        let cookie = CanonicalCookie {
            name: parsed.name().to_string(),
            value: parsed.value().to_string(),
            domain,
            path,
            creation_time: now,
            expiration_time,
            last_access_time: now,
            secure,
            http_only: parsed.http_only().unwrap_or(false),
            host_only,
            same_site: SameSite::from(parsed.same_site()),
        };

        cookie.validate_prefix(secure_origin)?;

        if cookie.is_expired(now) {
            self.delete_cookie(&cookie.name, &cookie.domain, &cookie.path);
            return Ok(());
        }

        self.set_canonical_cookie(cookie);
        Ok(())
    }

    pub fn total_cookie_count(&self) -> usize {
        self.store.iter().map(|e| e.value().len()).sum()
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    /// Snapshot of every stored cookie.
    pub fn iter_all_cookies(&self) -> impl Iterator<Item = CanonicalCookie> + '_ {
        self.store.iter().flat_map(|entry| entry.value().clone())
    }
}

impl CookieBridge for CookieMonster {
    fn cookie_string_for(&self, url: &str) -> String {
        match Url::parse(url) {
            Ok(url) => self.cookie_line_for_url(&url),
            Err(e) => {
                tracing::warn!(url, error = %e, "cookie lookup for unparsable url");
                String::new()
            }
        }
    }

    fn record(&self, set_cookie: &str, url: &str) {
        let parsed = match Url::parse(url) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::warn!(url, error = %e, "dropping cookie for unparsable url");
                return;
            }
        };
        if let Err(error) = self.parse_and_save_cookie(&parsed, set_cookie) {
            tracing::warn!(url, %error, "rejected Set-Cookie");
        }
    }
}
