//! Socket and connection management.
//!
//! Provides connection pooling and socket handling mirroring Chromium's `net/socket/`:
//! - [`pool`]: Keep-alive connection pooling, one pool per transport
//! - [`connectjob`]: DNS → TCP → TLS connection flow
//! - [`tls`]: TLS configuration with BoringSSL

pub mod client;
pub mod connectjob;
pub mod pool;
pub mod tls;
