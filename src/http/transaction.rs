use crate::base::context::HyperResultExt;
use crate::base::neterror::{NetError, TransportError};
use crate::http::streamfactory::{HttpStream, HttpStreamFactory};
use bytes::Bytes;
use http::{HeaderMap, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::ext::ReasonPhrase;
use std::sync::Arc;
use url::Url;

/// Receives response milestones as a transaction runs.
/// Mirrors the role of Chromium's URLRequest::Delegate.
pub trait TransactionDelegate: Send {
    /// Status line and headers arrived. Called at most once.
    fn on_response_started(&mut self, status: StatusCode, status_text: &str, headers: &HeaderMap);

    /// A non-empty body chunk arrived. Chunks are delivered in wire order.
    fn on_read_completed(&mut self, chunk: Bytes);
}

/// Internal state machine states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Idle,
    CreateStream,
    SendRequest,
    ReadBody,
    Done,
}

/// One HTTP/1.1 exchange over a pooled stream: acquire, write, read head,
/// stream the body. Never retries.
pub struct HttpNetworkTransaction {
    factory: Arc<HttpStreamFactory>,
    url: Url,
    state: State,
    request: Option<Request<Full<Bytes>>>,
    stream: Option<HttpStream>,
    body: Option<Incoming>,
    reused: bool,
}

impl HttpNetworkTransaction {
    pub fn new(factory: Arc<HttpStreamFactory>, url: Url, request: Request<Full<Bytes>>) -> Self {
        Self {
            factory,
            url,
            state: State::Idle,
            request: Some(request),
            stream: None,
            body: None,
            reused: false,
        }
    }

    /// Whether the exchange ran on a connection taken from the idle pool.
    pub fn is_reused(&self) -> bool {
        self.reused
    }

    /// Run the exchange to the end of the response body.
    ///
    /// `Ok(())` means the body ended cleanly; the stream has then been
    /// returned to its pool. On error the stream is discarded.
    pub async fn start(
        &mut self,
        delegate: &mut dyn TransactionDelegate,
    ) -> Result<(), TransportError> {
        if self.state != State::Idle {
            return Err(NetError::InvalidState.into());
        }
        self.state = State::CreateStream;

        let result = self.do_loop(delegate).await;
        if result.is_err() {
            self.state = State::Done;
            self.abandon_stream();
        }
        result
    }

    async fn do_loop(
        &mut self,
        delegate: &mut dyn TransactionDelegate,
    ) -> Result<(), TransportError> {
        loop {
            match self.state {
                State::Idle => return Ok(()),
                State::CreateStream => {
                    let (stream, reused) = self.factory.create_stream(&self.url).await?;
                    self.stream = Some(stream);
                    self.reused = reused;
                    self.state = State::SendRequest;
                }
                State::SendRequest => {
                    let request = self.request.take().ok_or(NetError::InvalidState)?;
                    let stream = self.stream.as_mut().ok_or(NetError::ConnectionClosed)?;

                    tracing::debug!(
                        method = %request.method(),
                        url = %self.url,
                        reused = self.reused,
                        "sending request"
                    );
                    let response = stream.send_request(request).await?;
                    let (parts, body) = response.into_parts();

                    let status_text = parts
                        .extensions
                        .get::<ReasonPhrase>()
                        .and_then(|reason| std::str::from_utf8(reason.as_bytes()).ok())
                        .or_else(|| parts.status.canonical_reason())
                        .unwrap_or("");

                    delegate.on_response_started(parts.status, status_text, &parts.headers);
                    self.body = Some(body);
                    self.state = State::ReadBody;
                }
                State::ReadBody => {
                    let body = self.body.as_mut().ok_or(NetError::EmptyResponse)?;
                    match body.frame().await {
                        Some(frame) => {
                            if let Ok(data) = frame.transport_context()?.into_data() {
                                if !data.is_empty() {
                                    delegate.on_read_completed(data);
                                }
                            }
                        }
                        None => {
                            self.body = None;
                            self.state = State::Done;
                        }
                    }
                }
                State::Done => {
                    if let Some(stream) = self.stream.take() {
                        self.factory.release_stream(&self.url, stream);
                    }
                    tracing::debug!(url = %self.url, "request complete");
                    return Ok(());
                }
            }
        }
    }

    /// Give up the stream without returning it to the idle list.
    fn abandon_stream(&mut self) {
        self.body = None;
        if self.stream.take().is_some() {
            self.factory.report_failure(&self.url);
        }
    }
}

impl Drop for HttpNetworkTransaction {
    // A transaction dropped mid-exchange (aborted) must not leak its pool slot.
    fn drop(&mut self) {
        self.abandon_stream();
    }
}
