use crate::base::neterror::NetError;

/// The ready state of an `XmlHttpRequest`.
///
/// The numeric values are part of the public contract: the protocol engine
/// branches on them, so they must stay `0..=4` in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(u16)]
pub enum ReadyState {
    /// Constructed, `open` not yet called.
    #[default]
    Unsent = 0,

    /// `open` succeeded; headers may be set and `send` called.
    Opened = 1,

    /// Response status line and headers have arrived.
    HeadersReceived = 2,

    /// Body bytes are arriving.
    Loading = 3,

    /// Terminal: the request completed, failed or was aborted.
    Done = 4,
}

impl ReadyState {
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    pub fn is_done(self) -> bool {
        self == ReadyState::Done
    }
}

impl From<ReadyState> for u16 {
    fn from(state: ReadyState) -> Self {
        state.as_u16()
    }
}

impl TryFrom<u16> for ReadyState {
    type Error = NetError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ReadyState::Unsent),
            1 => Ok(ReadyState::Opened),
            2 => Ok(ReadyState::HeadersReceived),
            3 => Ok(ReadyState::Loading),
            4 => Ok(ReadyState::Done),
            _ => Err(NetError::InvalidArgument),
        }
    }
}
