use crate::base::neterror::{NetError, TransportError};
use crate::base::readystate::ReadyState;

#[test]
fn test_net_error_roundtrip() {
    // Standard Chromium error
    let original = NetError::ConnectionRefused;
    let code = original.as_i32();
    assert_eq!(code, -102);
    let converted = NetError::from(code);
    assert!(matches!(converted, NetError::ConnectionRefused));

    // Custom error
    let custom = NetError::InvalidState;
    let custom_code = custom.as_i32();
    assert_eq!(custom_code, -10000);
    let custom_converted = NetError::from(custom_code);
    assert!(matches!(custom_converted, NetError::InvalidState));
}

#[test]
fn test_unknown_error() {
    let err = NetError::from(-9999);
    assert!(matches!(err, NetError::Unknown(-9999)));
}

#[test]
fn test_collision_avoidance() {
    // Blob error range (-900 to -906) in Chromium's net_error_list.h
    let blob_range = -906..=-900;

    for err in [
        NetError::InvalidState,
        NetError::ReactorUnavailable,
        NetError::CookieInvalidPrefix,
        NetError::CookiePublicSuffix,
    ] {
        assert!(!blob_range.contains(&err.as_i32()));
    }
}

#[test]
fn test_transport_error_display() {
    let bare = TransportError::new(NetError::ConnectionReset);
    assert_eq!(bare.to_string(), "Connection reset (TCP RST)");

    let with_message = TransportError::with_message(NetError::ConnectionClosed, "socket hang up");
    assert_eq!(with_message.to_string(), "Connection closed (TCP FIN): socket hang up");

    assert!(TransportError::aborted().error.is_abort());
}

#[test]
fn test_ready_state_values() {
    assert_eq!(ReadyState::Unsent.as_u16(), 0);
    assert_eq!(ReadyState::Opened.as_u16(), 1);
    assert_eq!(ReadyState::HeadersReceived.as_u16(), 2);
    assert_eq!(ReadyState::Loading.as_u16(), 3);
    assert_eq!(ReadyState::Done.as_u16(), 4);
}

#[test]
fn test_ready_state_ordering() {
    assert!(ReadyState::Unsent < ReadyState::Opened);
    assert!(ReadyState::HeadersReceived < ReadyState::Loading);
    assert!(ReadyState::Loading < ReadyState::Done);
    assert_eq!(ReadyState::default(), ReadyState::Unsent);
}

#[test]
fn test_ready_state_try_from() {
    assert_eq!(ReadyState::try_from(3u16), Ok(ReadyState::Loading));
    assert_eq!(ReadyState::try_from(5u16), Err(NetError::InvalidArgument));
}
