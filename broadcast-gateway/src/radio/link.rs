//! The gateway's single radio connection.

use std::sync::Arc;

use super::{MeshRadio, RadioError, SerialRadio};
use crate::config::DeviceConfig;

/// State of the radio connection, fixed for the life of the process.
///
/// Startup either produces a `Connected` link or records why it could not,
/// and the gateway keeps serving in degraded mode. There is no reconnect.
pub enum RadioLink {
    Connected(Arc<dyn MeshRadio>),
    Unavailable { reason: String },
}

impl RadioLink {
    /// Open the serial radio described by `config`. Never fails.
    pub async fn connect(config: &DeviceConfig) -> Self {
        tracing::info!("Initializing Meshtastic connection on {}", config.path);
        Self::from_open_result(SerialRadio::open(config).await)
    }

    /// Wrap the outcome of opening a radio, logging either way.
    pub fn from_open_result<R>(result: Result<R, RadioError>) -> Self
    where
        R: MeshRadio + 'static,
    {
        match result {
            Ok(radio) => {
                tracing::info!("Meshtastic connection established ({})", radio.describe());
                RadioLink::Connected(Arc::new(radio))
            }
            Err(e) => {
                tracing::error!("Failed to initialize Meshtastic connection: {}", e);
                RadioLink::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, RadioLink::Connected(_))
    }

    pub fn radio(&self) -> Option<&Arc<dyn MeshRadio>> {
        match self {
            RadioLink::Connected(radio) => Some(radio),
            RadioLink::Unavailable { .. } => None,
        }
    }

    /// Close the radio if there is one. Errors are logged, not returned.
    pub async fn shutdown(&self) {
        match self {
            RadioLink::Connected(radio) => {
                tracing::info!("Closing Meshtastic connection");
                match radio.close().await {
                    Ok(()) => tracing::info!("Meshtastic connection closed"),
                    Err(e) => tracing::error!("Error closing Meshtastic connection: {}", e),
                }
            }
            RadioLink::Unavailable { reason } => {
                tracing::debug!("No radio to close ({})", reason);
            }
        }
    }
}
