//! Base types and error handling.
//!
//! Provides foundational types mirroring Chromium's `net/base/`:
//! - [`NetError`](neterror::NetError): Network error codes matching `net_error_list.h`
//! - [`TransportError`](neterror::TransportError): a net error plus the transport's message
//! - [`ReadyState`](readystate::ReadyState): the request object's lifecycle states

pub mod context;
pub mod neterror;
pub mod readystate;

#[cfg(test)]
mod tests;
