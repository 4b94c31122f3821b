mod common;

use cometnet::http::{HttpStreamFactory, RequestBody};
use cometnet::{NetError, XmlHttpRequest};
use common::{header, read_request, watch, Outcome, TestServer};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};

fn new_request() -> XmlHttpRequest {
    XmlHttpRequest::with_factory(Arc::new(HttpStreamFactory::default()))
}

#[tokio::test]
async fn test_successful_request_fires_onload_once() {
    let server = TestServer::start("HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nhello").await;
    let xhr = new_request();
    let mut events = watch(&xhr);

    xhr.open("GET", &server.url("/cometd/connect")).unwrap();
    xhr.send(RequestBody::Empty).unwrap();
    assert_eq!(xhr.ready_state(), XmlHttpRequest::OPENED);

    match events.recv().await {
        Some(Outcome::Load(status)) => assert_eq!(status, 200),
        other => panic!("expected load, got {:?}", other),
    }
    assert!(events.recv().await.is_none());

    assert_eq!(xhr.ready_state(), XmlHttpRequest::DONE);
    assert_eq!(xhr.status(), 200);
    assert_eq!(xhr.status_text(), "OK");
    assert_eq!(xhr.response_text(), "hello");
}

#[tokio::test]
async fn test_custom_reason_phrase_is_status_text() {
    let server = TestServer::start("HTTP/1.1 200 Fine\r\nContent-Length: 2\r\n\r\nok").await;
    let xhr = new_request();
    let mut events = watch(&xhr);

    xhr.open("GET", &server.url("/")).unwrap();
    xhr.send(RequestBody::Empty).unwrap();

    assert!(matches!(events.recv().await, Some(Outcome::Load(200))));
    assert_eq!(xhr.status_text(), "Fine");
}

#[tokio::test]
async fn test_chunked_body_keeps_arrival_order() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await.unwrap();
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n")
            .await
            .unwrap();
        for part in ["first-", "second-", "third"] {
            let chunk = format!("{:x}\r\n{}\r\n", part.len(), part);
            socket.write_all(chunk.as_bytes()).await.unwrap();
            socket.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        socket.write_all(b"0\r\n\r\n").await.unwrap();
    });

    let xhr = new_request();
    let mut events = watch(&xhr);
    xhr.open("GET", &format!("http://{}/", addr)).unwrap();
    xhr.send(RequestBody::Empty).unwrap();

    assert!(matches!(events.recv().await, Some(Outcome::Load(200))));
    assert_eq!(xhr.response_text(), "first-second-third");
    assert_eq!(&xhr.response_bytes()[..], b"first-second-third");
}

async fn wait_for_state(xhr: &XmlHttpRequest, state: u16) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while xhr.ready_state() < state {
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("ready state never reached {}", state));
    assert_eq!(xhr.ready_state(), state);
}

#[tokio::test]
async fn test_ready_state_advances_through_a_staged_response() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (step_tx, mut step_rx) = mpsc::unbounded_channel::<()>();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await.unwrap();
        let stages: [&[u8]; 3] = [
            b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n",
            b"6\r\nfirst-\r\n",
            b"6\r\nsecond\r\n0\r\n\r\n",
        ];
        for stage in stages {
            step_rx.recv().await.unwrap();
            socket.write_all(stage).await.unwrap();
            socket.flush().await.unwrap();
        }
    });

    let xhr = new_request();
    let mut events = watch(&xhr);
    xhr.open("GET", &format!("http://{}/cometd/connect", addr)).unwrap();
    xhr.send(RequestBody::Empty).unwrap();

    let sampled = xhr.clone();
    let sampler = tokio::spawn(async move {
        let mut seen = vec![sampled.ready_state()];
        loop {
            let state = sampled.ready_state();
            if seen.last() != Some(&state) {
                seen.push(state);
            }
            if state == XmlHttpRequest::DONE {
                return seen;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
    });

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(xhr.ready_state(), XmlHttpRequest::OPENED);
    assert_eq!(xhr.status(), 0);

    step_tx.send(()).unwrap();
    wait_for_state(&xhr, XmlHttpRequest::HEADERS_RECEIVED).await;
    assert_eq!(xhr.status(), 200);
    assert_eq!(xhr.status_text(), "OK");
    assert_eq!(xhr.response_text(), "");

    step_tx.send(()).unwrap();
    wait_for_state(&xhr, XmlHttpRequest::LOADING).await;
    assert_eq!(xhr.response_text(), "first-");

    step_tx.send(()).unwrap();
    assert!(matches!(events.recv().await, Some(Outcome::Load(200))));
    assert_eq!(xhr.ready_state(), XmlHttpRequest::DONE);
    assert_eq!(xhr.response_text(), "first-second");

    let seen = sampler.await.unwrap();
    assert!(
        seen.windows(2).all(|pair| pair[0] < pair[1]),
        "ready state went backwards: {:?}",
        seen
    );
    assert_eq!(seen.first(), Some(&XmlHttpRequest::OPENED));
    assert_eq!(seen.last(), Some(&XmlHttpRequest::DONE));
}

#[tokio::test]
async fn test_request_headers_on_the_wire() {
    let server = TestServer::start("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n").await;
    let xhr = new_request();
    let mut events = watch(&xhr);

    xhr.open("post", &server.url("/cometd/handshake?jsonp=1")).unwrap();
    xhr.set_request_header("content-type", "text/plain").unwrap();
    xhr.set_request_header("Content-Type", "application/json;charset=UTF-8").unwrap();
    xhr.send(r#"[{"channel":"/meta/handshake"}]"#).unwrap();

    assert!(matches!(events.recv().await, Some(Outcome::Load(200))));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert!(request.starts_with("POST /cometd/handshake?jsonp=1 HTTP/1.1\r\n"));
    assert_eq!(header(request, "content-type"), Some("application/json;charset=UTF-8"));
    assert_eq!(header(request, "content-length"), Some("31"));
    assert_eq!(header(request, "host"), Some(server.addr.to_string().as_str()));
    assert!(request.ends_with(r#"[{"channel":"/meta/handshake"}]"#));
    assert!(header(request, "cookie").is_none());
}

#[tokio::test]
async fn test_empty_body_sends_zero_content_length() {
    let server = TestServer::start("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n").await;
    let xhr = new_request();
    let mut events = watch(&xhr);

    xhr.open("GET", &server.url("/")).unwrap();
    xhr.send(None::<&str>).unwrap();

    assert!(matches!(events.recv().await, Some(Outcome::Load(200))));
    assert_eq!(header(&server.requests()[0], "content-length"), Some("0"));
}

#[tokio::test]
async fn test_http_error_status_still_fires_onload() {
    let server =
        TestServer::start("HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\n\r\nnot found").await;
    let xhr = new_request();
    let mut events = watch(&xhr);

    xhr.open("GET", &server.url("/missing")).unwrap();
    xhr.send(RequestBody::Empty).unwrap();

    assert!(matches!(events.recv().await, Some(Outcome::Load(404))));
    assert_eq!(xhr.status_text(), "Not Found");
    assert_eq!(xhr.response_text(), "not found");
}

#[tokio::test]
async fn test_premature_close_fires_onerror_only() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await.unwrap();
        socket
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\npartial")
            .await
            .unwrap();
        socket.shutdown().await.unwrap();
    });

    let xhr = new_request();
    let mut events = watch(&xhr);
    xhr.open("GET", &format!("http://{}/", addr)).unwrap();
    xhr.send(RequestBody::Empty).unwrap();

    match events.recv().await {
        Some(Outcome::Error(error)) => assert_ne!(error.error, NetError::Aborted),
        other => panic!("expected error, got {:?}", other),
    }
    assert!(events.recv().await.is_none());
    assert_eq!(xhr.ready_state(), XmlHttpRequest::DONE);
    assert_eq!(xhr.status(), 200);
}

#[tokio::test]
async fn test_abort_in_flight_fires_onerror_once() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (received_tx, received_rx) = oneshot::channel();

    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        read_request(&mut socket).await.unwrap();
        let _ = received_tx.send(());
        // Hold the connection open without answering.
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    });

    let xhr = new_request();
    let mut events = watch(&xhr);
    xhr.open("GET", &format!("http://{}/cometd/connect", addr)).unwrap();
    xhr.send(RequestBody::Empty).unwrap();

    received_rx.await.unwrap();
    xhr.abort();

    match events.recv().await {
        Some(Outcome::Error(error)) => {
            assert_eq!(error.error, NetError::Aborted);
            assert!(error.error.is_abort());
        }
        other => panic!("expected error, got {:?}", other),
    }
    assert!(events.recv().await.is_none());
    assert_eq!(xhr.ready_state(), XmlHttpRequest::DONE);
    assert_eq!(xhr.status_text(), "request aborted");

    // A second abort is a no-op.
    xhr.abort();
    assert_eq!(xhr.ready_state(), XmlHttpRequest::DONE);
}

#[tokio::test]
async fn test_abort_after_completion_is_noop() {
    let server = TestServer::start("HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok").await;
    let xhr = new_request();
    let mut events = watch(&xhr);

    xhr.open("GET", &server.url("/")).unwrap();
    xhr.send(RequestBody::Empty).unwrap();
    assert!(matches!(events.recv().await, Some(Outcome::Load(200))));

    xhr.abort();
    assert_eq!(xhr.ready_state(), XmlHttpRequest::DONE);
    assert_eq!(xhr.status_text(), "OK");
}

#[tokio::test]
async fn test_connection_refused_fires_onerror() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let xhr = new_request();
    let mut events = watch(&xhr);
    xhr.open("GET", &format!("http://{}/", addr)).unwrap();
    xhr.send(RequestBody::Empty).unwrap();

    match events.recv().await {
        Some(Outcome::Error(error)) => {
            assert_eq!(error.error, NetError::ConnectionRefused);
            assert_eq!(Some(xhr.status_text()), error.message);
        }
        other => panic!("expected error, got {:?}", other),
    }
    assert_eq!(xhr.status(), 0);
}

#[tokio::test]
async fn test_send_twice_is_invalid_state() {
    let server = TestServer::start("HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n").await;
    let xhr = new_request();
    let mut events = watch(&xhr);

    xhr.open("GET", &server.url("/")).unwrap();
    xhr.send(RequestBody::Empty).unwrap();
    assert_eq!(xhr.send(RequestBody::Empty), Err(NetError::InvalidState));
    assert_eq!(xhr.set_request_header("X-Late", "1"), Err(NetError::InvalidState));
    assert_eq!(xhr.open("GET", &server.url("/")), Err(NetError::InvalidState));

    assert!(matches!(events.recv().await, Some(Outcome::Load(200))));
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn test_send_before_open_is_invalid_state() {
    let xhr = new_request();
    assert_eq!(xhr.send(RequestBody::Empty), Err(NetError::InvalidState));
    assert_eq!(xhr.ready_state(), XmlHttpRequest::UNSENT);
}

#[tokio::test]
async fn test_open_validation() {
    let xhr = new_request();
    assert_eq!(xhr.open("GET", "::not a url::"), Err(NetError::InvalidUrl));
    assert_eq!(xhr.open("GET", "file:///etc/hosts"), Err(NetError::InvalidUrl));
    assert_eq!(xhr.open("TRACE", "http://example.com/"), Err(NetError::MethodNotSupported));
    assert_eq!(xhr.ready_state(), XmlHttpRequest::UNSENT);
}
