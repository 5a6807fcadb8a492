//! Mesh radio abstraction layer.
//!
//! This module defines the `MeshRadio` trait the HTTP layer talks to, and the
//! serial implementation that speaks the Meshtastic stream protocol.

pub mod framing;
mod link;
pub mod proto;
mod serial;

pub use link::RadioLink;
pub use serial::SerialRadio;

use std::time::Duration;

use async_trait::async_trait;
use mesh_common::DestinationError;

/// Errors raised by a radio driver.
#[derive(Debug, thiserror::Error)]
pub enum RadioError {
    #[error("serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protobuf encode error: {0}")]
    Encode(#[from] prost::EncodeError),

    #[error(transparent)]
    InvalidDestination(#[from] DestinationError),

    #[error("local node number not known yet")]
    LocalNodeUnknown,

    #[error("text payload is {len} bytes, radio accepts at most {max}")]
    PayloadTooLarge { len: usize, max: usize },

    #[error("radio did not finish config handshake within {0:?}")]
    HandshakeTimeout(Duration),

    #[error("radio connection is closed")]
    Closed,

    #[error("radio task failed: {0}")]
    TaskFailed(String),
}

/// A connected mesh radio.
///
/// Implementations own whatever serialization the underlying link needs;
/// callers may invoke `send_text` from many tasks at once.
#[async_trait]
pub trait MeshRadio: Send + Sync {
    /// Human readable description of the link, for logs.
    fn describe(&self) -> String;

    /// Send one text message to `destination` (see `mesh_common::Destination`).
    async fn send_text(&self, text: &str, destination: &str) -> Result<(), RadioError>;

    /// Release the link. Further sends fail with `RadioError::Closed`.
    async fn close(&self) -> Result<(), RadioError>;
}
