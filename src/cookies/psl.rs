//! Public Suffix List (PSL) checks for `Domain=` cookie attributes.
//!
//! A response may not scope a cookie to a public suffix such as `.com` or
//! `.co.uk`; such cookies are dropped. Uses Mozilla's list via the `psl`
//! crate.

use psl::{List, Psl};

/// Check if a domain is a public suffix (e.g., "com", "co.uk").
pub fn is_public_suffix(domain: &str) -> bool {
    let domain_lower = domain.to_ascii_lowercase();
    let domain_bytes = domain_lower.as_bytes();

    match List.suffix(domain_bytes) {
        // The domain is a public suffix if it equals its own suffix
        Some(suffix) => suffix.as_bytes() == domain_bytes,
        None => false,
    }
}

/// Check if a cookie domain is valid for a given request host.
/// The cookie domain must not be a public suffix, and the host must equal it
/// or be a subdomain of it.
pub fn is_valid_cookie_domain(cookie_domain: &str, url_host: &str) -> bool {
    let cookie_domain = cookie_domain.strip_prefix('.').unwrap_or(cookie_domain);
    let cookie_domain_lower = cookie_domain.to_ascii_lowercase();
    let url_host_lower = url_host.to_ascii_lowercase();

    if cookie_domain_lower.is_empty() || is_public_suffix(&cookie_domain_lower) {
        return false;
    }

    url_host_lower == cookie_domain_lower
        || url_host_lower.ends_with(&format!(".{}", cookie_domain_lower))
}
