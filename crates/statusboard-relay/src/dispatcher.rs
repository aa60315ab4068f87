use std::collections::HashSet;
use std::sync::Arc;

use tokio::sync::{RwLock, broadcast};
use tracing::{debug, warn};
use uuid::Uuid;

use statusboard_types::events::SignalMessage;

const BROADCAST_CAPACITY: usize = 1024;

/// One accepted signaling frame on its way to the other parties.
#[derive(Debug, Clone)]
pub struct Relayed {
    /// Connection that published it
    pub from: Uuid,
    pub message: Arc<SignalMessage>,
    /// The frame exactly as the sender wrote it
    pub text: Arc<str>,
}

/// Tracks connected parties and fans frames out to all of them except
/// the sender. Nothing is stored: a party sees only what is published
/// after it connected.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    broadcast_tx: broadcast::Sender<Relayed>,

    /// Live connection ids
    peers: RwLock<HashSet<Uuid>>,
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatcher {
    pub fn new() -> Self {
        let (broadcast_tx, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(DispatcherInner {
                broadcast_tx,
                peers: RwLock::new(HashSet::new()),
            }),
        }
    }

    /// Register a new party. The subscription is live before this returns,
    /// so anything published afterwards reaches it.
    pub async fn connect(&self) -> Subscription {
        let id = Uuid::new_v4();
        let rx = self.inner.broadcast_tx.subscribe();
        self.inner.peers.write().await.insert(id);
        Subscription { id, rx }
    }

    pub async fn disconnect(&self, id: Uuid) {
        self.inner.peers.write().await.remove(&id);
    }

    pub async fn peer_count(&self) -> usize {
        self.inner.peers.read().await.len()
    }

    /// Validate a raw frame and relay it. Returns the message kind, or the
    /// parse error for frames that are not one of the four signal types.
    pub fn publish_raw(&self, from: Uuid, text: &str) -> Result<&'static str, serde_json::Error> {
        let message: SignalMessage = serde_json::from_str(text)?;
        let kind = message.kind();
        self.send(Relayed {
            from,
            message: Arc::new(message),
            text: Arc::from(text),
        });
        Ok(kind)
    }

    fn send(&self, relayed: Relayed) {
        let kind = relayed.message.kind();
        // Err only means nobody is listening; there is no one to deliver to.
        match self.inner.broadcast_tx.send(relayed) {
            Ok(receivers) => debug!("Relayed {} to {} subscriber(s)", kind, receivers),
            Err(_) => debug!("Dropped {}: no subscribers", kind),
        }
    }
}

/// A party's view of the relay: every published frame except its own.
pub struct Subscription {
    id: Uuid,
    rx: broadcast::Receiver<Relayed>,
}

impl Subscription {
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Next frame from another party. `None` once the dispatcher is gone.
    /// Cancel-safe.
    pub async fn recv(&mut self) -> Option<Relayed> {
        loop {
            match self.rx.recv().await {
                Ok(relayed) if relayed.from == self.id => continue,
                Ok(relayed) => return Some(relayed),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!("Relay subscriber {} lagged by {} messages", self.id, n);
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }
}
