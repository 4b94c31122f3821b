use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum NetError {
    // Generic
    #[error("Operation failed")]
    Failed,
    #[error("Request aborted")]
    Aborted,
    #[error("Invalid argument")]
    InvalidArgument,

    // Connection Errors
    #[error("Connection closed (TCP FIN)")]
    ConnectionClosed,
    #[error("Connection reset (TCP RST)")]
    ConnectionReset,
    #[error("Connection refused")]
    ConnectionRefused,
    #[error("Connection aborted")]
    ConnectionAborted,
    #[error("Connection failed")]
    ConnectionFailed,
    #[error("Name not resolved")]
    NameNotResolved,
    #[error("Internet disconnected")]
    InternetDisconnected,
    #[error("SSL protocol error")]
    SslProtocolError,
    #[error("Address invalid")]
    AddressInvalid,
    #[error("Address unreachable")]
    AddressUnreachable,
    #[error("Socket not connected")]
    SocketNotConnected,
    #[error("Connection timed out")]
    ConnectionTimedOut,

    // HTTP Errors
    #[error("Invalid URL")]
    InvalidUrl,
    #[error("Disallowed URL scheme")]
    DisallowedUrlScheme,
    #[error("Invalid response")]
    InvalidResponse,
    #[error("Method not supported")]
    MethodNotSupported,
    #[error("Empty response")]
    EmptyResponse,
    #[error("Content-Length mismatch")]
    ContentLengthMismatch,
    #[error("Invalid HTTP response")]
    InvalidHttpResponse,
    #[error("Invalid header")]
    InvalidHeader,

    // Adapter errors (custom codes starting at -10000)
    #[error("Request is not in a valid state for this call")]
    InvalidState,
    #[error("No async reactor is running on this thread")]
    ReactorUnavailable,
    #[error("Cookie prefix validation failed")]
    CookieInvalidPrefix,
    #[error("Cookie domain is a public suffix")]
    CookiePublicSuffix,

    #[error("Unknown error: {0}")]
    Unknown(i32),
}

impl NetError {
    pub fn as_i32(&self) -> i32 {
        match self {
            NetError::Failed => -2,
            NetError::Aborted => -3,
            NetError::InvalidArgument => -4,

            NetError::ConnectionClosed => -100,
            NetError::ConnectionReset => -101,
            NetError::ConnectionRefused => -102,
            NetError::ConnectionAborted => -103,
            NetError::ConnectionFailed => -104,
            NetError::NameNotResolved => -105,
            NetError::InternetDisconnected => -106,
            NetError::SslProtocolError => -107,
            NetError::AddressInvalid => -108,
            NetError::AddressUnreachable => -109,
            NetError::SocketNotConnected => -112,
            NetError::ConnectionTimedOut => -118,

            NetError::InvalidUrl => -300,
            NetError::DisallowedUrlScheme => -301,
            NetError::InvalidResponse => -320,
            NetError::MethodNotSupported => -322,
            NetError::EmptyResponse => -324,
            NetError::ContentLengthMismatch => -354,
            NetError::InvalidHttpResponse => -370,
            NetError::InvalidHeader => -379,

            NetError::InvalidState => -10000,
            NetError::ReactorUnavailable => -10001,
            NetError::CookieInvalidPrefix => -10002,
            NetError::CookiePublicSuffix => -10003,
            NetError::Unknown(code) => *code,
        }
    }

    /// Whether the error was produced by the caller cancelling the request.
    pub fn is_abort(&self) -> bool {
        matches!(self, NetError::Aborted)
    }
}

impl From<i32> for NetError {
    fn from(code: i32) -> Self {
        match code {
            -2 => NetError::Failed,
            -3 => NetError::Aborted,
            -4 => NetError::InvalidArgument,

            -100 => NetError::ConnectionClosed,
            -101 => NetError::ConnectionReset,
            -102 => NetError::ConnectionRefused,
            -103 => NetError::ConnectionAborted,
            -104 => NetError::ConnectionFailed,
            -105 => NetError::NameNotResolved,
            -106 => NetError::InternetDisconnected,
            -107 => NetError::SslProtocolError,
            -108 => NetError::AddressInvalid,
            -109 => NetError::AddressUnreachable,
            -112 => NetError::SocketNotConnected,
            -118 => NetError::ConnectionTimedOut,

            -300 => NetError::InvalidUrl,
            -301 => NetError::DisallowedUrlScheme,
            -320 => NetError::InvalidResponse,
            -322 => NetError::MethodNotSupported,
            -324 => NetError::EmptyResponse,
            -354 => NetError::ContentLengthMismatch,
            -370 => NetError::InvalidHttpResponse,
            -379 => NetError::InvalidHeader,

            -10000 => NetError::InvalidState,
            -10001 => NetError::ReactorUnavailable,
            -10002 => NetError::CookieInvalidPrefix,
            -10003 => NetError::CookiePublicSuffix,
            _ => NetError::Unknown(code),
        }
    }
}

/// A failure reported after `send`, through the error callback.
///
/// `message` carries the transport's own description when one exists; it is
/// what ends up in the request's status text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{error}{}", .message.as_ref().map(|m| format!(": {m}")).unwrap_or_default())]
pub struct TransportError {
    pub error: NetError,
    pub message: Option<String>,
}

impl TransportError {
    pub fn new(error: NetError) -> Self {
        Self { error, message: None }
    }

    pub fn with_message(error: NetError, message: impl Into<String>) -> Self {
        Self { error, message: Some(message.into()) }
    }

    pub fn aborted() -> Self {
        Self::with_message(NetError::Aborted, "request aborted")
    }
}

impl From<NetError> for TransportError {
    fn from(error: NetError) -> Self {
        Self::new(error)
    }
}
