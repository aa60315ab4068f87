use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::priority::Priority;

/// Frames exchanged through the signaling relay. The relay forwards every
/// one of these unchanged to all other connected parties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum SignalMessage {
    /// WebRTC session description from the initiating side (opaque)
    Offer(serde_json::Value),

    /// WebRTC session description answering an offer (opaque)
    Answer(serde_json::Value),

    /// Trickled ICE candidate (opaque)
    IceCandidate(serde_json::Value),

    /// Text to pop up on every display
    DisplayMessage(DisplayMessage),
}

impl SignalMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Offer(_) => "offer",
            Self::Answer(_) => "answer",
            Self::IceCandidate(_) => "ice-candidate",
            Self::DisplayMessage(_) => "display-message",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayMessage {
    pub text: String,
    #[serde(default)]
    pub priority: Priority,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type", default = "default_display_kind")]
    pub kind: String,
}

impl DisplayMessage {
    pub fn popup(text: impl Into<String>, priority: Priority) -> Self {
        Self {
            text: text.into(),
            priority,
            timestamp: Utc::now(),
            kind: default_display_kind(),
        }
    }
}

fn default_display_kind() -> String {
    "popup".to_string()
}

/// Frames the relay itself originates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum RelayEvent {
    /// Sent once to a party right after it joined. `peers` counts the
    /// other parties connected at that moment.
    Ready { connection_id: Uuid, peers: usize },
}

/// Anything a party can receive from the relay.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum InboundFrame {
    Signal(SignalMessage),
    Relay(RelayEvent),
}
