use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use uuid::Uuid;

use statusboard_types::events::{InboundFrame, RelayEvent, SignalMessage};

const READY_TIMEOUT: Duration = Duration::from_secs(5);

type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// A party on the signaling relay.
pub struct RelayClient {
    stream: WsStream,
    connection_id: Uuid,
    peers: usize,
}

impl RelayClient {
    /// Connect and wait for the relay's `ready` frame. Once this returns,
    /// everything other parties send is delivered here.
    pub async fn connect(url: &str) -> Result<Self> {
        let (mut stream, _response) = tokio_tungstenite::connect_async(url)
            .await
            .with_context(|| format!("connecting to relay at {}", url))?;

        let (connection_id, peers) = tokio::time::timeout(READY_TIMEOUT, wait_ready(&mut stream))
            .await
            .context("timed out waiting for relay")??;

        debug!("Joined relay as {} with {} peers", connection_id, peers);
        Ok(Self {
            stream,
            connection_id,
            peers,
        })
    }

    pub fn connection_id(&self) -> Uuid {
        self.connection_id
    }

    /// Other parties connected when this one joined.
    pub fn peers(&self) -> usize {
        self.peers
    }

    pub async fn send(&mut self, message: &SignalMessage) -> Result<()> {
        let json = serde_json::to_string(message)?;
        self.stream
            .send(Message::Text(json.into()))
            .await
            .context("sending to relay")
    }

    /// Next signal from another party. `Ok(None)` once the relay closes.
    /// Frames that don't parse are skipped.
    pub async fn recv(&mut self) -> Result<Option<SignalMessage>> {
        while let Some(msg) = self.stream.next().await {
            match msg.context("reading from relay")? {
                Message::Text(text) => match serde_json::from_str::<InboundFrame>(text.as_str()) {
                    Ok(InboundFrame::Signal(signal)) => return Ok(Some(signal)),
                    Ok(InboundFrame::Relay(event)) => debug!("Relay event: {:?}", event),
                    Err(e) => warn!("Ignoring unreadable relay frame: {}", e),
                },
                Message::Close(_) => return Ok(None),
                _ => {} // ping/pong handled by tungstenite
            }
        }
        Ok(None)
    }

    pub async fn close(mut self) -> Result<()> {
        self.stream.close(None).await.context("closing relay connection")
    }
}

async fn wait_ready(stream: &mut WsStream) -> Result<(Uuid, usize)> {
    while let Some(msg) = stream.next().await {
        if let Message::Text(text) = msg? {
            if let Ok(RelayEvent::Ready { connection_id, peers }) =
                serde_json::from_str(text.as_str())
            {
                return Ok((connection_id, peers));
            }
        }
    }
    bail!("relay closed before it was ready")
}
