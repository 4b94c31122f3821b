//! Cookie handling for long-polling sessions.
//!
//! A request never owns cookies itself. The caller attaches a
//! [`CookieBridge`] through the request context, and the request consults it
//! before sending and feeds it every `Set-Cookie` value it receives. Both
//! sides are keyed by the canonical URL (see [`bridge::canonical_url`]).
//!
//! | Chromium (C++) | cometnet (Rust) | Responsibility |
//! |----------------|-----------------|----------------|
//! | `net::CookieMonster` | [`CookieMonster`] | Cookie jar with LRU eviction |
//! | `net::CanonicalCookie` | [`CanonicalCookie`] | Single cookie representation |
//!
//! ```rust,no_run
//! use cometnet::cookies::{CookieBridge, CookieMonster};
//!
//! let jar = CookieMonster::new();
//! jar.record("BAYEUX_BROWSER=abc; Path=/", "http://example.com/cometd");
//! assert_eq!(jar.cookie_string_for("http://example.com/cometd"), "BAYEUX_BROWSER=abc");
//! ```

pub mod bridge;
pub mod canonical_cookie;
pub mod monster;
pub mod psl;

pub use bridge::{canonical_url, CookieBridge};
pub use canonical_cookie::{CanonicalCookie, SameSite};
pub use monster::CookieMonster;
