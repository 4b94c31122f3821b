//! XMLHttpRequest emulation over the pooled HTTP/1.1 stack.
//!
//! - [`request`]: [`XmlHttpRequest`], its ready-state machine and callbacks
//! - [`config`]: what `open` records and the per-request context

pub mod config;
pub mod request;

pub use config::{RequestConfig, RequestContext};
pub use request::{ErrorCallback, LoadCallback, XmlHttpRequest};
