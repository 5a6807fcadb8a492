//! HTTP request and response bodies for the broadcast gateway.

use serde::{Deserialize, Serialize};

use crate::destination::BROADCAST_ADDR;

/// Body of `POST /broadcast`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastRequest {
    /// Text to send. Must contain something other than whitespace.
    pub message: String,
    /// Target node. Falls back to `^all` when missing, null or empty.
    #[serde(rename = "destinationId", default)]
    pub destination_id: Option<String>,
}

impl BroadcastRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            destination_id: None,
        }
    }

    pub fn to(mut self, destination_id: impl Into<String>) -> Self {
        self.destination_id = Some(destination_id.into());
        self
    }

    /// True when the message has no visible content.
    pub fn is_blank(&self) -> bool {
        self.message.trim().is_empty()
    }

    /// The destination that will actually be used for the send.
    pub fn resolved_destination(&self) -> &str {
        match self.destination_id.as_deref() {
            Some(dest) if !dest.is_empty() => dest,
            _ => BROADCAST_ADDR,
        }
    }
}

/// Body returned by a successful `POST /broadcast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastResponse {
    pub status: String,
    pub message: String,
    /// The message text exactly as it was sent.
    pub text: String,
    #[serde(rename = "destinationId")]
    pub destination_id: String,
}

impl BroadcastResponse {
    pub fn success(text: impl Into<String>, destination_id: impl Into<String>) -> Self {
        Self {
            status: "success".to_string(),
            message: "Message broadcasted successfully".to_string(),
            text: text.into(),
            destination_id: destination_id.into(),
        }
    }
}

/// Body returned by `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    /// Whether a radio handle exists. The link itself is not checked.
    pub meshtastic_connected: bool,
}

impl HealthResponse {
    pub fn healthy(meshtastic_connected: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            meshtastic_connected,
        }
    }
}
