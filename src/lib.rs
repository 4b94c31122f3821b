//! # cometnet
//!
//! An XMLHttpRequest-style HTTP transport for long-polling clients, built on
//! a Chromium-inspired networking core.
//!
//! A Bayeux/CometD protocol engine expects a browser-like environment: a
//! request object with ready states and load/error callbacks, timers and a
//! console. `cometnet` supplies that environment on top of tokio, carrying
//! each request over persistent pooled HTTP/1.1 connections and threading
//! session cookies through a caller-supplied cookie bridge.
//!
//! ## Features
//!
//! - **Request emulation**: [`XmlHttpRequest`] with ready states `0..=4` and
//!   exactly one terminal callback per request
//! - **Connection pooling**: keep-alive reuse, one pool for plain and one for
//!   TLS connections, idle expiry
//! - **Cookies**: an optional [`CookieBridge`] per request, with an RFC 6265
//!   jar ([`CookieMonster`]) that implements it
//! - **TLS**: BoringSSL, ALPN pinned to `http/1.1`
//! - **Runtime registration**: [`runtime::install`] publishes the request
//!   constructor, timers and console under one global name
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cometnet::cookies::CookieMonster;
//! use cometnet::xhr::RequestContext;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), cometnet::NetError> {
//!     cometnet::runtime::install();
//!     let jar = Arc::new(CookieMonster::new());
//!
//!     let xhr = cometnet::XmlHttpRequest::new();
//!     xhr.open("POST", "http://localhost:8080/cometd/handshake")?;
//!     xhr.set_request_header("Content-Type", "application/json;charset=UTF-8")?;
//!     xhr.set_context(RequestContext::with_cookie_jar(jar));
//!     xhr.set_onload(|xhr| println!("{}: {}", xhr.status(), xhr.response_text()));
//!     xhr.set_onerror(|_, error| eprintln!("transport error: {error}"));
//!     xhr.send(r#"[{"channel":"/meta/handshake","version":"1.0"}]"#)?;
//!     Ok(())
//! }
//! ```
//!
//! ## Modules
//!
//! - [`base`] - Error codes and ready states
//! - [`cookies`] - Cookie bridge and cookie jar
//! - [`http`] - HTTP/1.1 transactions, ordered headers and request bodies
//! - [`runtime`] - Global runtime slot, timers and console
//! - [`socket`] - Connection pooling and TLS sockets
//! - [`xhr`] - The request emulator

pub mod base;
pub mod cookies;
pub mod http;
pub mod runtime;
pub mod socket;
pub mod xhr;

pub use base::neterror::{NetError, TransportError};
pub use base::readystate::ReadyState;
pub use cookies::{CookieBridge, CookieMonster};
pub use xhr::{RequestContext, XmlHttpRequest};
