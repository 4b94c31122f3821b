//! Ergonomic error context helpers.
//!
//! Extension traits that turn IO and hyper failures into `TransportError`s
//! carrying a human-readable message, so the error callback can surface the
//! transport's own reason as status text.

use crate::base::neterror::{NetError, TransportError};
use std::io;

/// Map an IO error kind onto the closest net error code.
pub fn net_error_from_io(kind: io::ErrorKind) -> NetError {
    match kind {
        io::ErrorKind::ConnectionRefused => NetError::ConnectionRefused,
        io::ErrorKind::ConnectionReset => NetError::ConnectionReset,
        io::ErrorKind::ConnectionAborted => NetError::ConnectionAborted,
        io::ErrorKind::NotConnected => NetError::SocketNotConnected,
        io::ErrorKind::AddrNotAvailable => NetError::AddressInvalid,
        io::ErrorKind::TimedOut => NetError::ConnectionTimedOut,
        io::ErrorKind::UnexpectedEof | io::ErrorKind::BrokenPipe => NetError::ConnectionClosed,
        _ => NetError::ConnectionFailed,
    }
}

/// Map a hyper error onto the closest net error code.
pub fn net_error_from_hyper(err: &hyper::Error) -> NetError {
    if err.is_incomplete_message() {
        NetError::ConnectionClosed
    } else if err.is_canceled() || err.is_closed() {
        NetError::ConnectionAborted
    } else if err.is_parse() || err.is_parse_status() {
        NetError::InvalidHttpResponse
    } else if err.is_timeout() {
        NetError::ConnectionTimedOut
    } else {
        NetError::Failed
    }
}

/// Extension trait for adding context to IO Results.
pub trait IoResultExt<T> {
    /// Add connection context to an IO error.
    ///
    /// # Example
    /// ```ignore
    /// use cometnet::base::context::IoResultExt;
    ///
    /// let stream = TcpStream::connect(addr).await
    ///     .connection_context("example.com", 443)?;
    /// // Error: "Connection refused: connect to example.com:443: connection refused"
    /// ```
    fn connection_context(self, host: &str, port: u16) -> Result<T, TransportError>;

    /// Add DNS resolution context to an IO error.
    fn dns_context(self, domain: &str) -> Result<T, TransportError>;
}

impl<T> IoResultExt<T> for Result<T, io::Error> {
    fn connection_context(self, host: &str, port: u16) -> Result<T, TransportError> {
        self.map_err(|e| {
            TransportError::with_message(
                net_error_from_io(e.kind()),
                format!("connect to {}:{}: {}", host, port, e),
            )
        })
    }

    fn dns_context(self, domain: &str) -> Result<T, TransportError> {
        self.map_err(|e| {
            TransportError::with_message(
                NetError::NameNotResolved,
                format!("resolve {}: {}", domain, e),
            )
        })
    }
}

/// Extension trait for hyper Results.
pub trait HyperResultExt<T> {
    fn transport_context(self) -> Result<T, TransportError>;
}

impl<T> HyperResultExt<T> for Result<T, hyper::Error> {
    fn transport_context(self) -> Result<T, TransportError> {
        self.map_err(|e| TransportError::with_message(net_error_from_hyper(&e), e.to_string()))
    }
}
