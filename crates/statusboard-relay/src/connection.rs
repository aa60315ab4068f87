use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, info, warn};

use statusboard_types::events::RelayEvent;

use crate::dispatcher::Dispatcher;

/// Heartbeat interval: the relay sends a Ping every 15 seconds.
/// If 2 consecutive Pongs are missed (~30s), the connection is dropped.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(15);

/// Handle a single relay connection: announce `ready`, then forward other
/// parties' frames out and this party's frames in until either side closes.
pub async fn handle_connection(socket: WebSocket, dispatcher: Dispatcher) {
    let (mut sender, mut receiver) = socket.split();

    let mut subscription = dispatcher.connect().await;
    let conn_id = subscription.id();
    let peers = dispatcher.peer_count().await.saturating_sub(1);

    info!("Relay party {} connected ({} other(s) online)", conn_id, peers);

    let ready = RelayEvent::Ready {
        connection_id: conn_id,
        peers,
    };
    let sent = match serde_json::to_string(&ready) {
        Ok(text) => sender.send(Message::Text(text.into())).await.is_ok(),
        Err(e) => {
            warn!("Failed to encode ready frame: {}", e);
            false
        }
    };
    if !sent {
        dispatcher.disconnect(conn_id).await;
        return;
    }

    let pong_received = Arc::new(AtomicBool::new(true));
    let pong_flag_send = pong_received.clone();
    let pong_flag_recv = pong_received.clone();

    // Forward other parties' frames -> client, with heartbeat
    let mut send_task = tokio::spawn(async move {
        let mut heartbeat = tokio::time::interval(HEARTBEAT_INTERVAL);
        heartbeat.tick().await;
        let mut missed_heartbeats: u8 = 0;

        loop {
            tokio::select! {
                relayed = subscription.recv() => {
                    let Some(relayed) = relayed else { break };
                    if sender.send(Message::Text(relayed.text.to_string().into())).await.is_err() {
                        break;
                    }
                }
                _ = heartbeat.tick() => {
                    if pong_flag_send.swap(false, Ordering::Acquire) {
                        missed_heartbeats = 0;
                    } else {
                        missed_heartbeats += 1;
                        if missed_heartbeats >= 2 {
                            warn!("Heartbeat timeout (missed {} pongs), dropping connection", missed_heartbeats);
                            break;
                        }
                    }
                    if sender.send(Message::Ping(Vec::new().into())).await.is_err() {
                        break;
                    }
                }
            }
        }
    });

    // Read frames from client and publish them
    let publisher = dispatcher.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => match publisher.publish_raw(conn_id, text.as_str()) {
                    Ok(kind) => debug!("{} -> {}", conn_id, kind),
                    Err(e) => {
                        warn!(
                            "{} sent a bad frame: {} -- raw: {}",
                            conn_id,
                            e,
                            text.as_str().chars().take(200).collect::<String>()
                        );
                    }
                },
                Message::Binary(data) => {
                    warn!("{} sent a binary frame ({} bytes), dropping", conn_id, data.len());
                }
                Message::Pong(_) => {
                    pong_flag_recv.store(true, Ordering::Release);
                }
                Message::Close(_) => break,
                Message::Ping(_) => {}
            }
        }
    });

    // Wait for either task to finish
    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    dispatcher.disconnect(conn_id).await;
    info!("Relay party {} disconnected", conn_id);
}
