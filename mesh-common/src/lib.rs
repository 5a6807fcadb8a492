//! Mesh Broadcast Common Types
//!
//! Shared types used by the broadcast gateway and its HTTP clients.

pub mod broadcast;
pub mod destination;

pub use broadcast::{BroadcastRequest, BroadcastResponse, HealthResponse};
pub use destination::{
    Destination, DestinationError, BROADCAST_ADDR, BROADCAST_NUM, LOCAL_ADDR,
};
