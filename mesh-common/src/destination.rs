//! Destination identifiers for mesh text messages.
//!
//! Destinations travel over HTTP as strings and are resolved to a 32-bit node
//! number only when a packet is built. The accepted forms are:
//!
//! - `^all` - every node on the channel
//! - `^local` - the node the gateway is attached to
//! - `!abcd1234` - a node number in hex (the form nodes print for themselves)
//! - `2882400018` - a node number in decimal

use std::fmt;
use std::str::FromStr;

/// Destination string meaning "all nodes".
pub const BROADCAST_ADDR: &str = "^all";

/// Destination string meaning "the locally attached node".
pub const LOCAL_ADDR: &str = "^local";

/// Node number meaning "all nodes" on the wire.
pub const BROADCAST_NUM: u32 = 0xFFFF_FFFF;

/// Errors produced while parsing a destination string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DestinationError {
    #[error("destination id is empty")]
    Empty,

    #[error("invalid node id {0:?}: expected '!' followed by up to 8 hex digits")]
    InvalidHex(String),

    #[error("unknown destination {0:?}")]
    Unknown(String),
}

/// A parsed destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Broadcast,
    Local,
    Node(u32),
}

impl Destination {
    /// Resolve to a node number.
    ///
    /// `Local` needs the attached node's number, which is only known once the
    /// radio has reported it. Returns `None` in that case.
    pub fn node_num(&self, local: Option<u32>) -> Option<u32> {
        match self {
            Destination::Broadcast => Some(BROADCAST_NUM),
            Destination::Local => local,
            Destination::Node(num) => Some(*num),
        }
    }
}

impl FromStr for Destination {
    type Err = DestinationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(DestinationError::Empty);
        }
        if s == BROADCAST_ADDR {
            return Ok(Destination::Broadcast);
        }
        if s == LOCAL_ADDR {
            return Ok(Destination::Local);
        }
        if let Some(hex) = s.strip_prefix('!') {
            if hex.is_empty() || hex.len() > 8 {
                return Err(DestinationError::InvalidHex(s.to_string()));
            }
            return u32::from_str_radix(hex, 16)
                .map(Destination::Node)
                .map_err(|_| DestinationError::InvalidHex(s.to_string()));
        }
        if s.bytes().all(|b| b.is_ascii_digit()) {
            return s
                .parse::<u32>()
                .map(Destination::Node)
                .map_err(|_| DestinationError::Unknown(s.to_string()));
        }
        Err(DestinationError::Unknown(s.to_string()))
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Broadcast => write!(f, "{}", BROADCAST_ADDR),
            Destination::Local => write!(f, "{}", LOCAL_ADDR),
            Destination::Node(num) => write!(f, "!{:08x}", num),
        }
    }
}
