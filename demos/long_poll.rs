//! Bayeux long-polling against a CometD server.
//!
//! ```text
//! RUST_LOG=cometnet=debug,cometd=debug cargo run --example long_poll -- http://localhost:8080/cometd
//! ```

use cometnet::cookies::CookieMonster;
use cometnet::xhr::RequestContext;
use cometnet::{runtime, TransportError, XmlHttpRequest};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

/// POST one Bayeux message batch and wait for the terminal callback.
async fn exchange(
    endpoint: &str,
    jar: &Arc<CookieMonster>,
    messages: Value,
) -> Result<Value, Box<dyn std::error::Error>> {
    let xhr = XmlHttpRequest::new();
    xhr.open("POST", endpoint)?;
    xhr.set_request_header("Content-Type", "application/json;charset=UTF-8")?;
    xhr.set_context(RequestContext::with_cookie_jar(jar.clone()));

    let (tx, rx) = oneshot::channel::<Result<String, TransportError>>();
    let tx = Arc::new(std::sync::Mutex::new(Some(tx)));
    let on_error = tx.clone();
    xhr.set_onload(move |xhr| {
        if let Some(tx) = tx.lock().unwrap().take() {
            let _ = tx.send(Ok(xhr.response_text()));
        }
    });
    xhr.set_onerror(move |_, error| {
        if let Some(tx) = on_error.lock().unwrap().take() {
            let _ = tx.send(Err(error.clone()));
        }
    });

    xhr.send(messages.to_string())?;
    let body = rx.await??;
    Ok(serde_json::from_str(&body)?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let base = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:8080/cometd".to_string());

    runtime::install();
    let runtime = runtime::current().ok_or("runtime not installed")?;
    let console = runtime.console();
    let jar = Arc::new(CookieMonster::new());

    let reply = exchange(
        &format!("{}/handshake", base),
        &jar,
        json!([{
            "channel": "/meta/handshake",
            "version": "1.0",
            "supportedConnectionTypes": ["long-polling"],
        }]),
    )
    .await?;

    let client_id = reply[0]["clientId"]
        .as_str()
        .ok_or("handshake reply carried no clientId")?
        .to_string();
    console.info(&format!("handshake ok, clientId={}", client_id));

    for _ in 0..5 {
        let reply = exchange(
            &format!("{}/connect", base),
            &jar,
            json!([{
                "channel": "/meta/connect",
                "clientId": client_id,
                "connectionType": "long-polling",
            }]),
        )
        .await?;
        console.log(&format!("connect reply: {}", reply));
    }

    exchange(
        &base,
        &jar,
        json!([{ "channel": "/meta/disconnect", "clientId": client_id }]),
    )
    .await?;
    console.info("disconnected");
    Ok(())
}
