#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio_tungstenite::tungstenite;

use statusboard_db::{Database, Store};
use statusboard_relay::Dispatcher;

pub type WsStream =
    tokio_tungstenite::WebSocketStream<tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>>;

/// Start a server backed by an in-memory store on an ephemeral port.
pub async fn start_test_server() -> SocketAddr {
    start_server_with_store(Arc::new(Database::open_in_memory().unwrap())).await
}

/// Start a server on an ephemeral port over the given store.
pub async fn start_server_with_store(store: Arc<dyn Store>) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app = statusboard_server::build_app(store, Dispatcher::new());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    tokio::time::sleep(Duration::from_millis(50)).await;
    addr
}

pub fn url(addr: SocketAddr, path: &str) -> String {
    format!("http://{}{}", addr, path)
}

/// Connect to the relay and wait for its `ready` frame.
pub async fn connect_relay(addr: SocketAddr) -> (WsStream, serde_json::Value) {
    let (mut stream, _response) = tokio_tungstenite::connect_async(format!("ws://{}/ws", addr))
        .await
        .expect("WebSocket connect failed");

    let ready = next_text(&mut stream, Duration::from_secs(2))
        .await
        .expect("relay should send ready");
    let ready: serde_json::Value = serde_json::from_str(&ready).unwrap();
    assert_eq!(ready["type"], "ready");
    (stream, ready)
}

/// Next text frame, or `None` if nothing arrives before the timeout.
pub async fn next_text(ws: &mut WsStream, timeout: Duration) -> Option<String> {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        if remaining.is_zero() {
            return None;
        }
        match tokio::time::timeout(remaining, ws.next()).await {
            Ok(Some(Ok(tungstenite::Message::Text(text)))) => return Some(text.as_str().to_string()),
            Ok(Some(Ok(_))) => {} // Ignore ping/pong
            Ok(Some(Err(_))) | Ok(None) => return None,
            Err(_) => return None, // Timeout
        }
    }
}
